use std::sync::LazyLock;

use regex::Regex;

use crate::DeliveryStatus;

/// Identifiers of this length or shorter (after trimming) are dropped.
pub const MIN_IDENTIFIER_LEN: usize = 5;

static PHONE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\+?[1-9]\d{1,14}").expect("phone token pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipient {
    pub identifier: String,
    pub display_name: Option<String>,
    pub status: DeliveryStatus,
    pub error_detail: Option<String>,
}

impl Recipient {
    pub fn pending(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            display_name: None,
            status: DeliveryStatus::Pending,
            error_detail: None,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }
}

/// Parses newline-separated recipient input.
///
/// Each line is `identifier` or `identifier, display name` (comma or tab).
/// Lines whose identifier is too short are skipped. Duplicates are kept and
/// input order is preserved.
pub fn parse_recipients(raw: &str) -> Vec<Recipient> {
    raw.lines().filter_map(parse_line).collect()
}

fn parse_line(line: &str) -> Option<Recipient> {
    let line = line.trim();
    let (identifier, name) = match line.split_once([',', '\t']) {
        Some((identifier, name)) => (identifier.trim(), Some(name.trim())),
        None => (line, None),
    };
    if identifier.chars().count() <= MIN_IDENTIFIER_LEN {
        return None;
    }

    let recipient = Recipient::pending(identifier);
    Some(match name.filter(|name| !name.is_empty()) {
        Some(name) => recipient.with_display_name(name),
        None => recipient,
    })
}

/// Pulls phone-number-like tokens out of arbitrary text, in order of
/// appearance. File contents go through here regardless of their format.
pub fn extract_identifiers(text: &str) -> Vec<String> {
    PHONE_TOKEN
        .find_iter(text)
        .map(|found| found.as_str().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_and_blank_lines_are_dropped() {
        let parsed = parse_recipients("+966500000000\n\n  12345 \n   \n+14155552671  ");
        let ids: Vec<_> = parsed.iter().map(|r| r.identifier.as_str()).collect();
        assert_eq!(ids, vec!["+966500000000", "+14155552671"]);
        assert!(parsed.iter().all(|r| r.status == DeliveryStatus::Pending));
    }

    #[test]
    fn display_name_follows_comma_or_tab() {
        let parsed = parse_recipients("+966500000000, Sara\n+14155552671\tLee\n+4915112345678,");
        assert_eq!(parsed[0].display_name.as_deref(), Some("Sara"));
        assert_eq!(parsed[1].display_name.as_deref(), Some("Lee"));
        assert_eq!(parsed[2].display_name, None);
        assert_eq!(parsed[2].identifier, "+4915112345678");
    }

    #[test]
    fn duplicates_are_preserved() {
        let parsed = parse_recipients("+966500000000\n+966500000000\n");
        assert_eq!(parsed.len(), 2);
    }

    #[test]
    fn length_filter_applies_to_identifier_part() {
        assert!(parse_recipients("123, a very long display name").is_empty());
    }

    #[test]
    fn extraction_keeps_order() {
        assert_eq!(
            extract_identifiers("call +14155552671 or +966500000000 now"),
            vec!["+14155552671".to_string(), "+966500000000".to_string()]
        );
    }

    #[test]
    fn extraction_ignores_structure() {
        let csv = "name,phone\nSara,+966500000000\nLee,0412\n";
        assert_eq!(extract_identifiers(csv), vec!["+966500000000", "412"]);
        assert!(extract_identifiers("no numbers here").is_empty());
    }
}
