//! Filesystem-safe names for record documents and downloaded attachments.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use tenderwatch_shared::{MatchedRecord, RawRecord, fields};

/// Filename used when a URL has no usable last path segment.
pub const DEFAULT_FILENAME: &str = "document";

static UNSAFE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9._-]").expect("valid filename regex"));
static DASH_RUN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-{2,}").expect("valid dash regex"));

/// Replace characters outside `[A-Za-z0-9._-]` with `-`, collapse runs of
/// `-`, and trim leading/trailing `-`. May return an empty string.
pub fn sanitize_filename(value: &str) -> String {
    let replaced = UNSAFE_RE.replace_all(value.trim(), "-");
    let collapsed = DASH_RUN_RE.replace_all(&replaced, "-");
    collapsed.trim_matches('-').to_string()
}

/// Identifier of one record at 1-based `position` in the sorted output.
///
/// Reference number first, then solicitation number. Amendments get an
/// `-amendment-<n>` suffix; records with neither number fall back to
/// `record-<position>` zero-padded to six digits.
pub fn record_id(record: &RawRecord, position: usize) -> String {
    let base = fields::RECORD_ID
        .columns
        .iter()
        .map(|column| sanitize_filename(record.get(column)))
        .find(|candidate| !candidate.is_empty());

    match base {
        Some(base) => {
            let amendment = sanitize_filename(record.get(fields::AMENDMENT_NUMBER));
            if amendment.is_empty() {
                base
            } else {
                format!("{base}-amendment-{amendment}")
            }
        }
        None => format!("record-{position:06}"),
    }
}

/// Identifiers for every record in output order, unique within the run.
///
/// A repeated identifier gets its record's position appended, then a
/// counter (`-2`, `-3`, ...) while that is also taken.
pub fn assign_record_ids(records: &[MatchedRecord]) -> Vec<String> {
    let mut used = HashSet::new();
    records
        .iter()
        .enumerate()
        .map(|(index, matched)| {
            let position = index + 1;
            let base = record_id(&matched.record, position);
            if used.insert(base.clone()) {
                return base;
            }

            let suffixed = format!("{base}-{position}");
            let mut candidate = suffixed.clone();
            let mut attempt = 2;
            while !used.insert(candidate.clone()) {
                candidate = format!("{suffixed}-{attempt}");
                attempt += 1;
            }
            candidate
        })
        .collect()
}

/// Percent-decoded last path segment of `url`, or [`DEFAULT_FILENAME`].
pub fn filename_from_url(url: &str) -> String {
    let segment = Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .unwrap_or_default();

    let decoded = urlencoding::decode(&segment).map(|d| d.into_owned()).ok();
    let decoded = decoded.unwrap_or(segment);

    if decoded.is_empty() {
        DEFAULT_FILENAME.to_string()
    } else {
        decoded
    }
}

/// Sanitized on-disk name for an attachment URL.
pub fn attachment_filename(url: &str) -> String {
    let name = sanitize_filename(&filename_from_url(url));
    if name.is_empty() {
        DEFAULT_FILENAME.to_string()
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tenderwatch_shared::{AttachmentFields, MatchProvenance};

    fn matched(pairs: &[(&str, &str)]) -> MatchedRecord {
        MatchedRecord {
            record: RawRecord::from_pairs(pairs.iter().copied()),
            provenance: MatchProvenance::default(),
            attachments: AttachmentFields::default(),
        }
    }

    #[test]
    fn sanitize_replaces_and_collapses() {
        assert_eq!(sanitize_filename(" PW-$XYZ-123 / 45 "), "PW-XYZ-123-45");
        assert_eq!(sanitize_filename("a..b_c"), "a..b_c");
        assert_eq!(sanitize_filename("///"), "");
        assert_eq!(sanitize_filename(""), "");
    }

    #[test]
    fn record_id_prefers_reference_then_solicitation() {
        let both = RawRecord::from_pairs([
            (fields::REFERENCE_NUMBER, "PW-24-001"),
            (fields::SOLICITATION_NUMBER, "SOL-9"),
        ]);
        assert_eq!(record_id(&both, 1), "PW-24-001");

        let solicitation_only = RawRecord::from_pairs([
            (fields::REFERENCE_NUMBER, " "),
            (fields::SOLICITATION_NUMBER, "SOL 9"),
        ]);
        assert_eq!(record_id(&solicitation_only, 1), "SOL-9");

        assert_eq!(record_id(&RawRecord::default(), 7), "record-000007");
    }

    #[test]
    fn amendments_get_a_distinct_id() {
        let original = RawRecord::from_pairs([(fields::REFERENCE_NUMBER, "PW-24-004")]);
        let amended = RawRecord::from_pairs([
            (fields::REFERENCE_NUMBER, "PW-24-004"),
            (fields::AMENDMENT_NUMBER, "001"),
        ]);
        assert_eq!(record_id(&original, 1), "PW-24-004");
        assert_eq!(record_id(&amended, 2), "PW-24-004-amendment-001");
    }

    #[test]
    fn duplicate_ids_get_position_suffix() {
        let records = vec![
            matched(&[(fields::REFERENCE_NUMBER, "PW-1")]),
            matched(&[(fields::REFERENCE_NUMBER, "PW-2")]),
            matched(&[(fields::REFERENCE_NUMBER, "PW-1")]),
            matched(&[]),
        ];
        assert_eq!(
            assign_record_ids(&records),
            vec!["PW-1", "PW-2", "PW-1-3", "record-000004"]
        );
    }

    #[test]
    fn suffixed_ids_never_reuse_a_taken_id() {
        let records = vec![
            matched(&[(fields::REFERENCE_NUMBER, "PW-1-3")]),
            matched(&[(fields::REFERENCE_NUMBER, "PW-1")]),
            matched(&[(fields::REFERENCE_NUMBER, "PW-1")]),
            matched(&[(fields::REFERENCE_NUMBER, "PW-1-3")]),
        ];
        let ids = assign_record_ids(&records);
        assert_eq!(ids, vec!["PW-1-3", "PW-1", "PW-1-3-2", "PW-1-3-4"]);

        let unique: HashSet<&String> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
    }

    #[test]
    fn filename_is_decoded_last_segment() {
        assert_eq!(
            filename_from_url("https://x.example/docs/Plan%20A.pdf?v=2"),
            "Plan A.pdf"
        );
        assert_eq!(filename_from_url("https://x.example/"), DEFAULT_FILENAME);
        assert_eq!(filename_from_url("not a url"), DEFAULT_FILENAME);
        assert_eq!(
            attachment_filename("https://x.example/docs/Plan%20A.pdf"),
            "Plan-A.pdf"
        );
        assert_eq!(attachment_filename("https://x.example/%24%24"), DEFAULT_FILENAME);
    }
}
