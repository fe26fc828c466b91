use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::models::resume::{
    Certification, ContactInfo, Education, Language, ProfileInfo, Project, Skill, Template,
    WorkExperience,
};

/// The ten independently editable parts of a resume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionName {
    Profile,
    Contact,
    Experience,
    Education,
    Skills,
    Projects,
    Certifications,
    Languages,
    Interests,
    Template,
}

impl SectionName {
    /// Editor order.
    pub const ALL: [SectionName; 10] = [
        SectionName::Profile,
        SectionName::Contact,
        SectionName::Experience,
        SectionName::Education,
        SectionName::Skills,
        SectionName::Projects,
        SectionName::Certifications,
        SectionName::Languages,
        SectionName::Interests,
        SectionName::Template,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionName::Profile => "profile",
            SectionName::Contact => "contact",
            SectionName::Experience => "experience",
            SectionName::Education => "education",
            SectionName::Skills => "skills",
            SectionName::Projects => "projects",
            SectionName::Certifications => "certifications",
            SectionName::Languages => "languages",
            SectionName::Interests => "interests",
            SectionName::Template => "template",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SectionName::Profile => "Profile",
            SectionName::Contact => "Contact",
            SectionName::Experience => "Experience",
            SectionName::Education => "Education",
            SectionName::Skills => "Skills",
            SectionName::Projects => "Projects",
            SectionName::Certifications => "Certifications",
            SectionName::Languages => "Languages",
            SectionName::Interests => "Interests",
            SectionName::Template => "Template",
        }
    }
}

impl fmt::Display for SectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown section '{0}'")]
pub struct UnknownSection(pub String);

impl FromStr for SectionName {
    type Err = UnknownSection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SectionName::ALL
            .into_iter()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| UnknownSection(s.to_string()))
    }
}

/// A whole-section replacement value.
///
/// Each variant carries the payload shape of its section, so a section name
/// and a mismatched value cannot be combined.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SectionValue {
    Profile(ProfileInfo),
    Contact(ContactInfo),
    Experience(Vec<WorkExperience>),
    Education(Vec<Education>),
    Skills(Vec<Skill>),
    Projects(Vec<Project>),
    Certifications(Vec<Certification>),
    Languages(Vec<Language>),
    Interests(Vec<String>),
    Template(Template),
}

impl SectionValue {
    pub fn name(&self) -> SectionName {
        match self {
            SectionValue::Profile(_) => SectionName::Profile,
            SectionValue::Contact(_) => SectionName::Contact,
            SectionValue::Experience(_) => SectionName::Experience,
            SectionValue::Education(_) => SectionName::Education,
            SectionValue::Skills(_) => SectionName::Skills,
            SectionValue::Projects(_) => SectionName::Projects,
            SectionValue::Certifications(_) => SectionName::Certifications,
            SectionValue::Languages(_) => SectionName::Languages,
            SectionValue::Interests(_) => SectionName::Interests,
            SectionValue::Template(_) => SectionName::Template,
        }
    }

    /// Decodes an untyped JSON body as the payload of `name`.
    pub fn from_json(name: SectionName, value: Value) -> Result<Self, serde_json::Error> {
        Ok(match name {
            SectionName::Profile => SectionValue::Profile(serde_json::from_value(value)?),
            SectionName::Contact => SectionValue::Contact(serde_json::from_value(value)?),
            SectionName::Experience => SectionValue::Experience(serde_json::from_value(value)?),
            SectionName::Education => SectionValue::Education(serde_json::from_value(value)?),
            SectionName::Skills => SectionValue::Skills(serde_json::from_value(value)?),
            SectionName::Projects => SectionValue::Projects(serde_json::from_value(value)?),
            SectionName::Certifications => {
                SectionValue::Certifications(serde_json::from_value(value)?)
            }
            SectionName::Languages => SectionValue::Languages(serde_json::from_value(value)?),
            SectionName::Interests => SectionValue::Interests(serde_json::from_value(value)?),
            SectionName::Template => SectionValue::Template(serde_json::from_value(value)?),
        })
    }
}
