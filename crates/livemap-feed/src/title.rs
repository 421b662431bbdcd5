//! Incident title parsing.
//!
//! Feed titles look like `Vehicle Fire (BELMONT, City of Belmont, CAD-ID: 12345)`.
//! Anything that does not fit that shape parses to all-empty fields, which
//! callers treat as "no store key".

use std::sync::LazyLock;

use regex::Regex;

static TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(.+?) \(([^,]+), (.+?), CAD-ID: (\d+)\)").expect("valid title regex")
});

/// Structured fields extracted from an incident title.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedTitle {
    pub incident_type: String,
    /// Upper-cased and trimmed.
    pub suburb: String,
    pub local_council: String,
    /// The CAD-ID digits. Empty when the title did not match.
    pub case_id: String,
}

/// Parses an incident title into its type, suburb, council, and CAD-ID.
///
/// Returns [`ParsedTitle::default`] (all fields empty) when the title does not
/// carry a `(<suburb>, <council>, CAD-ID: <digits>)` group.
#[must_use]
pub fn parse_title(title: &str) -> ParsedTitle {
    let Some(caps) = TITLE_RE.captures(title) else {
        return ParsedTitle::default();
    };

    let group = |idx: usize| caps.get(idx).map_or("", |m| m.as_str());

    ParsedTitle {
        incident_type: group(1).to_string(),
        suburb: group(2).to_uppercase().trim().to_string(),
        local_council: group(3).to_string(),
        case_id: group(4).to_string(),
    }
}
