//! Per-record Markdown documents.

use tenderwatch_shared::{AttachmentFields, MatchedRecord, fields};

use crate::ids::filename_from_url;

/// Heading used when a record has no title in either language.
const FALLBACK_TITLE: &str = "Tender opportunity";

/// Render the document for one matched record.
///
/// Sections: title, Snapshot, Matching, Codes, Supporting documents (only
/// when the record lists attachments), Description (EN/FR), Notice links.
/// Empty descriptions and notice links are left out.
pub fn render_record_markdown(matched: &MatchedRecord) -> String {
    let row = matched.to_output_row();
    let value = |column: &str| row.get(column).trim().to_string();

    let title_en = value(fields::TITLE_EN);
    let title_fr = value(fields::TITLE_FR);
    let heading = [title_en.as_str(), title_fr.as_str()]
        .into_iter()
        .find(|t| !t.is_empty())
        .unwrap_or(FALLBACK_TITLE);

    let mut lines = vec![format!("# {heading}")];
    if !title_en.is_empty() && !title_fr.is_empty() && title_en != title_fr {
        lines.push(String::new());
        lines.push(format!("**Title (FR):** {title_fr}"));
    }

    section(
        &mut lines,
        "Snapshot",
        &[
            ("Reference", value(fields::REFERENCE_NUMBER)),
            ("Solicitation", value(fields::SOLICITATION_NUMBER)),
            ("Status", row.first_of(&fields::STATUS).to_string()),
            ("Closing date", value(fields::CLOSING_DATE)),
            ("Procurement category", value(fields::PROCUREMENT_CATEGORY)),
            (
                "Contracting entity",
                row.first_of(&fields::CONTRACTING_ENTITY).to_string(),
            ),
            (
                "Regions (opportunity)",
                row.first_of(&fields::OPPORTUNITY_REGION).to_string(),
            ),
            (
                "Regions (delivery)",
                row.first_of(&fields::DELIVERY_REGION).to_string(),
            ),
        ],
    );

    section(
        &mut lines,
        "Matching",
        &[
            ("Match regions", value(fields::MATCH_REGIONS)),
            ("Match industries", value(fields::MATCH_INDUSTRIES)),
            ("Match codes", value(fields::MATCH_CODES)),
            ("Match categories", value(fields::MATCH_CATEGORIES)),
            ("Match sources", value(fields::MATCH_SOURCES)),
            ("Match keywords", value(fields::MATCH_KEYWORDS)),
        ],
    );

    section(
        &mut lines,
        "Codes",
        &[
            ("UNSPSC", value(fields::UNSPSC)),
            ("UNSPSC description", value(fields::UNSPSC_DESCRIPTION)),
            ("GSIN", value(fields::GSIN)),
            ("GSIN description", value(fields::GSIN_DESCRIPTION)),
        ],
    );

    if !matched.attachments.urls.is_empty() {
        lines.push(String::new());
        lines.push("## Supporting documents".to_string());
        lines.extend(attachment_lines(&matched.attachments));
    }

    for (heading, column) in [
        ("Description (EN)", fields::DESCRIPTION_EN),
        ("Description (FR)", fields::DESCRIPTION_FR),
    ] {
        let text = value(column);
        if !text.is_empty() {
            lines.push(String::new());
            lines.push(format!("## {heading}"));
            lines.push(text);
        }
    }

    let notice_en = value(fields::NOTICE_URL_EN);
    let notice_fr = value(fields::NOTICE_URL_FR);
    if !notice_en.is_empty() || !notice_fr.is_empty() {
        lines.push(String::new());
        lines.push("## Notice links".to_string());
        if !notice_en.is_empty() {
            lines.push(format!("- English: {notice_en}"));
        }
        if !notice_fr.is_empty() {
            lines.push(format!("- French: {notice_fr}"));
        }
    }

    let mut out = lines.join("\n").trim().to_string();
    out.push('\n');
    out
}

fn section(lines: &mut Vec<String>, heading: &str, items: &[(&str, String)]) {
    lines.push(String::new());
    lines.push(format!("## {heading}"));
    for (label, value) in items {
        lines.push(format!("- {label}: {value}").trim_end().to_string());
    }
}

fn attachment_lines(attachments: &AttachmentFields) -> Vec<String> {
    let mut lines = Vec::new();

    if !attachments.working.is_empty() {
        for url in &attachments.working {
            lines.push(format!("- [{}]({url})", filename_from_url(url)));
        }
    } else if attachments.is_unverified()
        || (attachments.missing.is_empty() && !attachments.unchecked.is_empty())
    {
        lines.push("- Attachments found but not checked. Run with --check-attachments.".to_string());
    } else {
        lines.push("- No working attachment URLs found.".to_string());
    }

    if !attachments.missing.is_empty() {
        lines.push(format!("- Missing: {}", attachments.missing.len()));
    }
    if !attachments.unchecked.is_empty() {
        lines.push(format!("- Unchecked: {}", attachments.unchecked.len()));
    }
    if !attachments.downloaded.is_empty() {
        lines.push(format!("- Downloaded: {}", attachments.downloaded.len()));
    }

    lines
}
