//! Basic type and length checks applied to section values before they reach
//! the reducer. Anything rejected here never touches the document.

use thiserror::Error;

use crate::models::resume::Template;
use crate::models::{SectionName, SectionValue};

pub const MAX_TEXT_LEN: usize = 2000;
pub const MAX_LONG_TEXT_LEN: usize = 5000;
pub const MAX_NAME_LEN: usize = 120;
pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_INTEREST_LEN: usize = 60;
pub const MAX_ENTRIES: usize = 50;
pub const MAX_EMAIL_LEN: usize = 254;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{section}: {field} {reason}")]
pub struct SectionError {
    pub section: &'static str,
    pub field: String,
    pub reason: String,
}

impl SectionError {
    fn new(section: SectionName, field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            section: section.as_str(),
            field: field.into(),
            reason: reason.into(),
        }
    }
}

struct Checker {
    section: SectionName,
}

impl Checker {
    fn text(&self, field: &str, value: &str, max: usize) -> Result<(), SectionError> {
        let len = value.chars().count();
        if len > max {
            return Err(SectionError::new(
                self.section,
                field,
                format!("is {len} characters; at most {max} allowed"),
            ));
        }
        Ok(())
    }

    fn optional(&self, field: &str, value: &Option<String>) -> Result<(), SectionError> {
        match value {
            Some(v) => self.text(field, v, MAX_TEXT_LEN),
            None => Ok(()),
        }
    }

    fn entries<T>(&self, items: &[T]) -> Result<(), SectionError> {
        if items.len() > MAX_ENTRIES {
            return Err(SectionError::new(
                self.section,
                "entries",
                format!("has {} items; at most {MAX_ENTRIES} allowed", items.len()),
            ));
        }
        Ok(())
    }

    fn progress(&self, field: &str, value: f64) -> Result<(), SectionError> {
        if !(0.0..=100.0).contains(&value) {
            return Err(SectionError::new(
                self.section,
                field,
                format!("is {value}; must be between 0 and 100"),
            ));
        }
        Ok(())
    }
}

/// Checks `value` and returns it in normalized form.
///
/// Interests are a set: blank entries are rejected and case-insensitive
/// duplicates are dropped, keeping the first occurrence.
pub fn validate_section(value: SectionValue) -> Result<SectionValue, SectionError> {
    let c = Checker {
        section: value.name(),
    };
    match value {
        SectionValue::Profile(ref p) => {
            c.text("fullName", &p.full_name, MAX_NAME_LEN)?;
            c.text("designation", &p.designation, MAX_NAME_LEN)?;
            c.text("summary", &p.summary, MAX_LONG_TEXT_LEN)?;
            c.optional("profilePreviewUrl", &p.profile_preview_url)?;
        }
        SectionValue::Contact(ref contact) => {
            c.text("email", &contact.email, MAX_NAME_LEN)?;
            c.text("phone", &contact.phone, MAX_NAME_LEN)?;
            c.text("location", &contact.location, MAX_NAME_LEN)?;
            c.optional("linkedIn", &contact.linked_in)?;
            c.optional("github", &contact.github)?;
            c.optional("website", &contact.website)?;
        }
        SectionValue::Experience(ref items) => {
            c.entries(items)?;
            for (i, e) in items.iter().enumerate() {
                c.text(&format!("[{i}].company"), &e.company, MAX_NAME_LEN)?;
                c.text(&format!("[{i}].role"), &e.role, MAX_NAME_LEN)?;
                c.text(&format!("[{i}].startDate"), &e.start_date, MAX_NAME_LEN)?;
                c.text(&format!("[{i}].endDate"), &e.end_date, MAX_NAME_LEN)?;
                c.text(&format!("[{i}].description"), &e.description, MAX_LONG_TEXT_LEN)?;
            }
        }
        SectionValue::Education(ref items) => {
            c.entries(items)?;
            for (i, e) in items.iter().enumerate() {
                c.text(&format!("[{i}].degree"), &e.degree, MAX_NAME_LEN)?;
                c.text(&format!("[{i}].Institution"), &e.institution, MAX_NAME_LEN)?;
                c.text(&format!("[{i}].startDate"), &e.start_date, MAX_NAME_LEN)?;
                c.text(&format!("[{i}].endDate"), &e.end_date, MAX_NAME_LEN)?;
            }
        }
        SectionValue::Skills(ref items) => {
            c.entries(items)?;
            for (i, s) in items.iter().enumerate() {
                c.text(&format!("[{i}].name"), &s.name, MAX_NAME_LEN)?;
                c.progress(&format!("[{i}].progress"), s.progress)?;
            }
        }
        SectionValue::Projects(ref items) => {
            c.entries(items)?;
            for (i, p) in items.iter().enumerate() {
                c.text(&format!("[{i}].title"), &p.title, MAX_NAME_LEN)?;
                c.text(&format!("[{i}].description"), &p.description, MAX_LONG_TEXT_LEN)?;
                c.optional(&format!("[{i}].github"), &p.github)?;
                c.optional(&format!("[{i}].liveDemo"), &p.live_demo)?;
            }
        }
        SectionValue::Certifications(ref items) => {
            c.entries(items)?;
            for (i, cert) in items.iter().enumerate() {
                c.text(&format!("[{i}].title"), &cert.title, MAX_NAME_LEN)?;
                c.text(&format!("[{i}].issuer"), &cert.issuer, MAX_NAME_LEN)?;
                c.text(&format!("[{i}].year"), &cert.year, MAX_NAME_LEN)?;
            }
        }
        SectionValue::Languages(ref items) => {
            c.entries(items)?;
            for (i, l) in items.iter().enumerate() {
                c.text(&format!("[{i}].name"), &l.name, MAX_NAME_LEN)?;
                c.progress(&format!("[{i}].progress"), l.progress)?;
            }
        }
        SectionValue::Interests(items) => return normalize_interests(&c, items),
        SectionValue::Template(ref t) => check_template(&c, t)?,
    }
    Ok(value)
}

fn normalize_interests(c: &Checker, items: Vec<String>) -> Result<SectionValue, SectionError> {
    c.entries(&items)?;
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::with_capacity(items.len());
    for (i, item) in items.into_iter().enumerate() {
        let item = item.trim().to_string();
        if item.is_empty() {
            return Err(SectionError::new(c.section, format!("[{i}]"), "is empty"));
        }
        c.text(&format!("[{i}]"), &item, MAX_INTEREST_LEN)?;
        if seen.insert(item.to_lowercase()) {
            out.push(item);
        }
    }
    Ok(SectionValue::Interests(out))
}

fn check_template(c: &Checker, t: &Template) -> Result<(), SectionError> {
    if t.theme.trim().is_empty() {
        return Err(SectionError::new(c.section, "theme", "is empty"));
    }
    c.text("theme", &t.theme, MAX_NAME_LEN)?;
    for (i, color) in t.color_palette.iter().enumerate() {
        if !is_hex_color(color) {
            return Err(SectionError::new(
                c.section,
                format!("colorPalette[{i}]"),
                format!("'{color}' is not a #rgb or #rrggbb color"),
            ));
        }
    }
    Ok(())
}

fn is_hex_color(s: &str) -> bool {
    match s.strip_prefix('#') {
        Some(hex) => (hex.len() == 3 || hex.len() == 6) && hex.chars().all(|ch| ch.is_ascii_hexdigit()),
        None => false,
    }
}

/// Trims and checks a document title.
pub fn validate_title(title: &str) -> Result<String, SectionError> {
    let title = title.trim();
    let err = |reason: String| SectionError {
        section: "document",
        field: "title".to_string(),
        reason,
    };
    if title.is_empty() {
        return Err(err("is empty".to_string()));
    }
    let len = title.chars().count();
    if len > MAX_TITLE_LEN {
        return Err(err(format!(
            "is {len} characters; at most {MAX_TITLE_LEN} allowed"
        )));
    }
    Ok(title.to_string())
}

/// Trims and checks the address a resume is emailed to.
pub fn validate_recipient(email: &str) -> Result<String, SectionError> {
    let email = email.trim();
    let err = |reason: &str| SectionError {
        section: "email",
        field: "recipientEmail".to_string(),
        reason: reason.to_string(),
    };
    if email.is_empty() {
        return Err(err("is empty"));
    }
    if email.len() > MAX_EMAIL_LEN || email.chars().any(char::is_whitespace) {
        return Err(err("is not a valid email address"));
    }
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    };
    if !valid {
        return Err(err("is not a valid email address"));
    }
    Ok(email.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::resume::{Language, ProfileInfo, Skill};

    #[test]
    fn test_progress_out_of_range_rejected() {
        let err = validate_section(SectionValue::Languages(vec![Language {
            name: "French".to_string(),
            progress: 101.0,
        }]))
        .unwrap_err();
        assert_eq!(err.section, "languages");
        assert_eq!(err.field, "[0].progress");

        let err = validate_section(SectionValue::Skills(vec![Skill {
            name: "Go".to_string(),
            progress: -0.5,
        }]))
        .unwrap_err();
        assert_eq!(err.field, "[0].progress");
    }

    #[test]
    fn test_valid_skills_pass_unchanged() {
        let value = SectionValue::Skills(vec![Skill {
            name: "Rust".to_string(),
            progress: 100.0,
        }]);
        assert_eq!(validate_section(value.clone()).unwrap(), value);
    }

    #[test]
    fn test_long_summary_rejected() {
        let value = SectionValue::Profile(ProfileInfo {
            summary: "x".repeat(MAX_LONG_TEXT_LEN + 1),
            ..Default::default()
        });
        let err = validate_section(value).unwrap_err();
        assert_eq!(err.field, "summary");
    }

    #[test]
    fn test_interests_deduplicated_in_order() {
        let value = SectionValue::Interests(vec![
            " Chess ".to_string(),
            "hiking".to_string(),
            "chess".to_string(),
        ]);
        assert_eq!(
            validate_section(value).unwrap(),
            SectionValue::Interests(vec!["Chess".to_string(), "hiking".to_string()])
        );
    }

    #[test]
    fn test_blank_interest_rejected() {
        let value = SectionValue::Interests(vec!["  ".to_string()]);
        assert!(validate_section(value).is_err());
    }

    #[test]
    fn test_too_many_entries_rejected() {
        let items = vec![Skill::default(); MAX_ENTRIES + 1];
        let err = validate_section(SectionValue::Skills(items)).unwrap_err();
        assert_eq!(err.field, "entries");
    }

    #[test]
    fn test_template_colors() {
        let ok = Template {
            theme: "modern".to_string(),
            color_palette: vec!["#fff".to_string(), "#22c55e".to_string()],
        };
        assert!(validate_section(SectionValue::Template(ok)).is_ok());

        let bad = Template {
            theme: "modern".to_string(),
            color_palette: vec!["green".to_string()],
        };
        let err = validate_section(SectionValue::Template(bad)).unwrap_err();
        assert_eq!(err.field, "colorPalette[0]");

        let blank = Template::default();
        assert!(validate_section(SectionValue::Template(blank)).is_err());
    }

    #[test]
    fn test_title() {
        assert_eq!(validate_title("  My CV ").unwrap(), "My CV");
        assert!(validate_title("").is_err());
        assert!(validate_title(&"t".repeat(MAX_TITLE_LEN + 1)).is_err());
    }

    #[test]
    fn test_recipient() {
        assert_eq!(
            validate_recipient(" recruiter@company.com ").unwrap(),
            "recruiter@company.com"
        );
        for bad in ["", "recruiter", "@company.com", "a@b@company.com", "a@company", "a@.com", "a b@company.com"] {
            let err = validate_recipient(bad).unwrap_err();
            assert_eq!(err.field, "recipientEmail", "{bad}");
        }
    }
}
