use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::models::section::{SectionName, SectionValue};

/// Server-assigned document identity. Opaque to the editor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub String);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// The remote API sends `null` for sections a new resume has never filled
/// in; treat that the same as a missing key.
fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Parses a server timestamp. Values without an offset are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    #[serde(default, deserialize_with = "null_default")]
    pub theme: String,
    #[serde(default, deserialize_with = "null_default")]
    pub color_palette: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_preview_url: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub full_name: String,
    #[serde(default, deserialize_with = "null_default")]
    pub designation: String,
    #[serde(default, deserialize_with = "null_default")]
    pub summary: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    #[serde(default, deserialize_with = "null_default")]
    pub email: String,
    #[serde(default, deserialize_with = "null_default")]
    pub phone: String,
    #[serde(default, deserialize_with = "null_default")]
    pub location: String,
    #[serde(default, rename = "linkedIn", skip_serializing_if = "Option::is_none")]
    pub linked_in: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkExperience {
    #[serde(default, deserialize_with = "null_default")]
    pub company: String,
    #[serde(default, deserialize_with = "null_default")]
    pub role: String,
    #[serde(default, deserialize_with = "null_default")]
    pub start_date: String,
    #[serde(default, deserialize_with = "null_default")]
    pub end_date: String,
    #[serde(default, deserialize_with = "null_default")]
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Education {
    #[serde(default, deserialize_with = "null_default")]
    pub degree: String,
    // The remote API capitalizes this one field.
    #[serde(rename = "Institution", default, deserialize_with = "null_default")]
    pub institution: String,
    #[serde(default, deserialize_with = "null_default")]
    pub start_date: String,
    #[serde(default, deserialize_with = "null_default")]
    pub end_date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Skill {
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    /// Percentage; the range is checked at the editing edge.
    #[serde(default, deserialize_with = "null_default")]
    pub progress: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(default, deserialize_with = "null_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_default")]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub live_demo: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Certification {
    #[serde(default, deserialize_with = "null_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_default")]
    pub issuer: String,
    #[serde(default, deserialize_with = "null_default")]
    pub year: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Language {
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    /// Percentage; the range is checked at the editing edge.
    #[serde(default, deserialize_with = "null_default")]
    pub progress: f64,
}

/// The resume being edited, in the remote API's wire shape.
///
/// Every field except `id` is replaceable. Sections are only ever replaced
/// whole, through [`Document::apply`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(alias = "_id")]
    pub id: DocumentId,
    #[serde(default, deserialize_with = "null_default")]
    pub user_id: String,
    #[serde(default, deserialize_with = "null_default")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_link: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub template: Template,
    #[serde(default, deserialize_with = "null_default")]
    pub profile_info: ProfileInfo,
    #[serde(default, deserialize_with = "null_default")]
    pub contact_info: ContactInfo,
    #[serde(default, deserialize_with = "null_default")]
    pub work_experience: Vec<WorkExperience>,
    #[serde(default, deserialize_with = "null_default")]
    pub education: Vec<Education>,
    #[serde(default, deserialize_with = "null_default")]
    pub skill: Vec<Skill>,
    #[serde(default, deserialize_with = "null_default")]
    pub project: Vec<Project>,
    #[serde(default, deserialize_with = "null_default")]
    pub certification: Vec<Certification>,
    #[serde(default, deserialize_with = "null_default")]
    pub languages: Vec<Language>,
    #[serde(default, deserialize_with = "null_default")]
    pub interests: Vec<String>,
    /// Kept verbatim; the server may omit the UTC offset. See [`parse_timestamp`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Document {
    /// Returns a new document with only `value`'s section replaced.
    ///
    /// `self` is left untouched; every other section and all metadata are
    /// carried over by structural copy.
    pub fn apply(&self, value: SectionValue) -> Document {
        let mut next = self.clone();
        match value {
            SectionValue::Profile(v) => next.profile_info = v,
            SectionValue::Contact(v) => next.contact_info = v,
            SectionValue::Experience(v) => next.work_experience = v,
            SectionValue::Education(v) => next.education = v,
            SectionValue::Skills(v) => next.skill = v,
            SectionValue::Projects(v) => next.project = v,
            SectionValue::Certifications(v) => next.certification = v,
            SectionValue::Languages(v) => next.languages = v,
            SectionValue::Interests(v) => next.interests = v,
            SectionValue::Template(v) => next.template = v,
        }
        next
    }

    /// Returns a new document with a replaced title.
    pub fn retitle(&self, title: String) -> Document {
        Document {
            title,
            ..self.clone()
        }
    }

    /// Current value of one section, as a section view would receive it.
    pub fn section(&self, name: SectionName) -> SectionValue {
        match name {
            SectionName::Profile => SectionValue::Profile(self.profile_info.clone()),
            SectionName::Contact => SectionValue::Contact(self.contact_info.clone()),
            SectionName::Experience => SectionValue::Experience(self.work_experience.clone()),
            SectionName::Education => SectionValue::Education(self.education.clone()),
            SectionName::Skills => SectionValue::Skills(self.skill.clone()),
            SectionName::Projects => SectionValue::Projects(self.project.clone()),
            SectionName::Certifications => {
                SectionValue::Certifications(self.certification.clone())
            }
            SectionName::Languages => SectionValue::Languages(self.languages.clone()),
            SectionName::Interests => SectionValue::Interests(self.interests.clone()),
            SectionName::Template => SectionValue::Template(self.template.clone()),
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_document(id: &str) -> Document {
    Document {
        id: DocumentId::from(id),
        user_id: "user-1".to_string(),
        title: "Backend Engineer".to_string(),
        thumbnail_link: None,
        template: Template {
            theme: "modern".to_string(),
            color_palette: vec!["#22c55e".to_string(), "#1f2937".to_string()],
        },
        profile_info: ProfileInfo {
            profile_preview_url: None,
            full_name: "Ada Lovelace".to_string(),
            designation: "Engineer".to_string(),
            summary: "Writes programs.".to_string(),
        },
        contact_info: ContactInfo {
            email: "ada@example.com".to_string(),
            ..Default::default()
        },
        work_experience: vec![WorkExperience {
            company: "Analytical Engines".to_string(),
            role: "Programmer".to_string(),
            start_date: "1842-01".to_string(),
            end_date: "1843-12".to_string(),
            description: "Notes on the engine.".to_string(),
        }],
        education: vec![],
        skill: vec![Skill {
            name: "Mathematics".to_string(),
            progress: 90.0,
        }],
        project: vec![],
        certification: vec![],
        languages: vec![],
        interests: vec!["poetry".to_string()],
        created_at: None,
        updated_at: None,
    }
}
