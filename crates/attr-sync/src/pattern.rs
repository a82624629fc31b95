//! Username pattern parsing for attribute derivation.

use std::collections::HashMap;

/// Attribute name for the classification marking.
pub const CLASSIFICATION_ATTR: &str = "classification";
/// Attribute name for the nationality code.
pub const NATIONALITY_ATTR: &str = "nationality";
/// Attribute name for the need-to-know compartment.
pub const NEED_TO_KNOW_ATTR: &str = "needToKnow";

/// Known classification markings and their display forms. Anything outside
/// the lexicon falls back to per-word title case.
const CLASSIFICATION_LEXICON: [(&str, &str); 5] = [
    ("secret", "Secret"),
    ("top-secret", "Top Secret"),
    ("classified", "Classified"),
    ("unclassified", "Unclassified"),
    ("confidential", "Confidential"),
];

/// The decomposition of a username that matched the
/// `{classification}-{nationality}-{needToKnow}` pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUsername {
    /// Display form of the classification, e.g. `Top Secret`.
    pub classification: String,
    /// Raw lower-case hyphenated classification, e.g. `top-secret`.
    pub classification_raw: String,
    /// Nationality token, upper-cased.
    pub nationality: String,
    /// Need-to-know token, upper-cased.
    pub need_to_know: String,
}

impl ParsedUsername {
    /// The attribute map this parse result implies for the user.
    pub fn desired_attributes(&self) -> HashMap<String, Vec<String>> {
        let mut attrs = HashMap::new();
        attrs.insert(
            CLASSIFICATION_ATTR.to_string(),
            vec![self.classification.clone()],
        );
        attrs.insert(NATIONALITY_ATTR.to_string(), vec![self.nationality.clone()]);
        attrs.insert(
            NEED_TO_KNOW_ATTR.to_string(),
            vec![self.need_to_know.clone()],
        );
        attrs
    }
}

/// Parse a username of the form `{classification}-{nationality}-{needToKnow}`.
///
/// The last hyphen-delimited token is the need-to-know, the second-to-last
/// is the nationality, and everything before (rejoined with hyphens) is the
/// classification, which may itself contain a hyphen (`top-secret-gbr-bbb`).
/// Returns None when fewer than three tokens are present.
///
/// No token validation is performed beyond the split, so any username with
/// three or more hyphen-delimited tokens parses — including ones that are
/// not classification markings at all. Tighten with care: real deployments
/// rely on the permissive match.
pub fn parse_username(username: &str) -> Option<ParsedUsername> {
    let tokens: Vec<&str> = username.split('-').collect();
    if tokens.len() < 3 {
        return None;
    }

    let need_to_know = tokens[tokens.len() - 1].to_uppercase();
    let nationality = tokens[tokens.len() - 2].to_uppercase();
    let classification_raw = tokens[..tokens.len() - 2].join("-").to_lowercase();
    let classification = display_classification(&classification_raw);

    Some(ParsedUsername {
        classification,
        classification_raw,
        nationality,
        need_to_know,
    })
}

/// Resolve the display form of a raw classification token.
fn display_classification(raw: &str) -> String {
    for (token, display) in CLASSIFICATION_LEXICON {
        if raw == token {
            return display.to_string();
        }
    }
    title_case_words(raw)
}

/// Title-case each hyphen-separated word and join with spaces.
fn title_case_words(raw: &str) -> String {
    raw.split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}
