use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

static EMAIL_FIND_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\s@<>()\[\],;:]+@[^\s@<>()\[\],;:]+\.[^\s@<>()\[\],;:]+").unwrap());

const PERSONAL_DOMAINS: &[&str] = &[
    "gmail.com",
    "googlemail.com",
    "yahoo.com",
    "hotmail.com",
    "outlook.com",
    "live.com",
    "msn.com",
    "icloud.com",
    "me.com",
    "mac.com",
    "aol.com",
    "proton.me",
    "protonmail.com",
    "gmx.com",
    "gmx.de",
    "yandex.com",
    "fastmail.com",
];

const WORK_KEYWORDS: &[&str] = &["work", "office", "business", "corporate", "company"];
const PERSONAL_KEYWORDS: &[&str] = &["personal", "home", "private"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailKind {
    Personal,
    Work,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedEmail {
    pub address: String,
    pub kind: EmailKind,
}

/// Permissive single-address check: something@something.tld, no spaces.
pub fn is_valid_email(address: &str) -> bool {
    EMAIL_RE.is_match(address.trim())
}

/// Split a cell holding one or more addresses separated by `;` or `,`.
///
/// Each token may carry a label such as `jane@acme.com (work)`; the label
/// decides the kind, falling back to well-known consumer domains. Tokens with
/// no recognizable address are returned in `Err` with the offending text.
pub fn split_emails(cell: &str) -> Result<Vec<ParsedEmail>, String> {
    let mut out = Vec::new();
    for token in cell.split([';', ',']) {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let Some(m) = EMAIL_FIND_RE.find(token) else {
            return Err(token.to_string());
        };
        let address = m.as_str().trim_matches('.').to_lowercase();
        if !is_valid_email(&address) {
            return Err(token.to_string());
        }
        let context = format!("{}{}", &token[..m.start()], &token[m.end()..]).to_lowercase();
        let kind = classify(&address, &context);
        out.push(ParsedEmail { address, kind });
    }
    Ok(out)
}

fn classify(address: &str, context: &str) -> EmailKind {
    if WORK_KEYWORDS.iter().any(|k| context.contains(k)) {
        return EmailKind::Work;
    }
    if PERSONAL_KEYWORDS.iter().any(|k| context.contains(k)) {
        return EmailKind::Personal;
    }
    let domain = address.rsplit('@').next().unwrap_or("");
    if PERSONAL_DOMAINS.contains(&domain) {
        EmailKind::Personal
    } else {
        EmailKind::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_addresses() {
        assert!(is_valid_email("jane@x.com"));
        assert!(is_valid_email(" a.b+c@sub.example.org "));
        assert!(!is_valid_email("jane@"));
        assert!(!is_valid_email("not an email"));
        assert!(!is_valid_email("jane@x"));
    }

    #[test]
    fn splits_and_classifies_by_label() {
        let parsed = split_emails("Jane@Acme.com (work); jane@fastmail.com (personal)").unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].address, "jane@acme.com");
        assert_eq!(parsed[0].kind, EmailKind::Work);
        assert_eq!(parsed[1].kind, EmailKind::Personal);
    }

    #[test]
    fn classifies_by_domain_without_label() {
        let parsed = split_emails("a@gmail.com, b@acme.io").unwrap();
        assert_eq!(parsed[0].kind, EmailKind::Personal);
        assert_eq!(parsed[1].kind, EmailKind::Other);
    }

    #[test]
    fn angle_bracket_form() {
        let parsed = split_emails("Jane Doe <jane@x.com>").unwrap();
        assert_eq!(parsed[0].address, "jane@x.com");
    }

    #[test]
    fn reports_bad_token() {
        assert_eq!(split_emails("good@x.com; nope").unwrap_err(), "nope");
    }

    #[test]
    fn empty_cell_is_empty_list() {
        assert!(split_emails(" ; ").unwrap().is_empty());
    }
}
