use crate::models::{Document, SectionName};

/// Renders a document as plain markdown, in editor section order.
///
/// Empty sections are skipped. Template choice is presentation only and is
/// not rendered.
pub fn render_markdown(doc: &Document) -> String {
    let profile = &doc.profile_info;
    let name = if profile.full_name.trim().is_empty() {
        doc.title.as_str()
    } else {
        profile.full_name.as_str()
    };

    let mut md = format!("# {name}\n\n");
    if !profile.designation.is_empty() {
        md.push_str(&format!("_{}_\n\n", profile.designation));
    }
    if !profile.summary.is_empty() {
        md.push_str(&format!("{}\n\n", profile.summary));
    }

    for section in SectionName::ALL {
        let body = render_section(doc, section);
        if body.is_empty() {
            continue;
        }
        md.push_str(&format!("## {}\n\n", section.label()));
        md.push_str(&body);
        md.push('\n');
    }
    md
}

fn render_section(doc: &Document, section: SectionName) -> String {
    let mut out = String::new();
    match section {
        SectionName::Profile | SectionName::Template => {}
        SectionName::Contact => {
            let c = &doc.contact_info;
            let lines = [
                ("Email", Some(&c.email)),
                ("Phone", Some(&c.phone)),
                ("Location", Some(&c.location)),
                ("LinkedIn", c.linked_in.as_ref()),
                ("GitHub", c.github.as_ref()),
                ("Website", c.website.as_ref()),
            ];
            for (label, value) in lines {
                if let Some(v) = value.filter(|v| !v.is_empty()) {
                    out.push_str(&format!("- **{label}:** {v}\n"));
                }
            }
        }
        SectionName::Experience => {
            for e in &doc.work_experience {
                out.push_str(&format!(
                    "### {} at {}\n{}\n",
                    e.role,
                    e.company,
                    date_range(&e.start_date, &e.end_date)
                ));
                if !e.description.is_empty() {
                    out.push_str(&format!("\n{}\n", e.description));
                }
                out.push('\n');
            }
        }
        SectionName::Education => {
            for e in &doc.education {
                out.push_str(&format!(
                    "- {}, {} ({})\n",
                    e.degree,
                    e.institution,
                    date_range(&e.start_date, &e.end_date)
                ));
            }
        }
        SectionName::Skills => {
            for s in &doc.skill {
                out.push_str(&format!("- {} ({}%)\n", s.name, s.progress));
            }
        }
        SectionName::Projects => {
            for p in &doc.project {
                out.push_str(&format!("### {}\n", p.title));
                if !p.description.is_empty() {
                    out.push_str(&format!("{}\n", p.description));
                }
                for (label, link) in [("Source", &p.github), ("Demo", &p.live_demo)] {
                    if let Some(link) = link {
                        out.push_str(&format!("- {label}: {link}\n"));
                    }
                }
                out.push('\n');
            }
        }
        SectionName::Certifications => {
            for c in &doc.certification {
                out.push_str(&format!("- {}, {} ({})\n", c.title, c.issuer, c.year));
            }
        }
        SectionName::Languages => {
            for l in &doc.languages {
                out.push_str(&format!("- {} ({}%)\n", l.name, l.progress));
            }
        }
        SectionName::Interests => {
            if !doc.interests.is_empty() {
                out.push_str(&doc.interests.join(", "));
                out.push('\n');
            }
        }
    }
    out
}

fn date_range(start: &str, end: &str) -> String {
    match (start.is_empty(), end.is_empty()) {
        (true, true) => String::new(),
        (false, true) => format!("{start} - Present"),
        (true, false) => end.to_string(),
        (false, false) => format!("{start} - {end}"),
    }
}
