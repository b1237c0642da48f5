// ********* Header cell parsing **********

use std::error::Error;
use std::fmt::Display;

use log::warn;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::vocab;

// This will match any code at the beginning of the string, starting with a
// digit and ending with a separator. Early editions of the questionnaire use
// a colon, later ones a plain space, eg:
//   1: Governance
//   1.1: International Framework
//   1.1.1aa: ...
//   3.2 Some title
// The optional `C ` marker flags companion questionnaire codes.
static VALID_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(C )?(\d)([^\s:]*)(:| )").unwrap());

/// A parsed header cell: the indicator or theme it declares.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ParsedCode {
    pub code: String,
    pub title: String,
    pub level: u8,
}

/// The two code families found in the questionnaire, with different level
/// derivation rules.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum CodeKind {
    Indicator,
    Theme,
}

/// Errors raised when a code violates the structure the parser understands.
/// These are fatal: they indicate that the spreadsheet schema has changed.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum CodeError {
    InvalidDotCount { code: String },
}

impl Error for CodeError {}

impl Display for CodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodeError::InvalidDotCount { code } => {
                write!(f, "code {:?} has an unsupported dot structure", code)
            }
        }
    }
}

pub fn parse_indicator_cell(text: &str) -> Result<Option<ParsedCode>, CodeError> {
    parse_cell(text, CodeKind::Indicator)
}

pub fn parse_theme_cell(text: &str) -> Result<Option<ParsedCode>, CodeError> {
    parse_cell(text, CodeKind::Theme)
}

/// Parses one header cell into `(code, title, level)`.
///
/// Returns `Ok(None)` when the cell does not encode an indicator or theme at
/// all; such cells are simply skipped by the caller.
pub fn parse_cell(text: &str, kind: CodeKind) -> Result<Option<ParsedCode>, CodeError> {
    if let Some(caps) = VALID_CODE.captures(text) {
        let code = format!("{}{}", &caps[2], &caps[3]);
        // Year companions and derived codes can also match the leading
        // pattern when followed by text. They keep their synthesized titles.
        if !is_special_token(&code) {
            let separator = &caps[4];
            let title = clean_title(text, &code, separator);
            let level = match kind {
                CodeKind::Indicator => indicator_level(&code)?,
                CodeKind::Theme => theme_level(&code),
            };
            return Ok(Some(ParsedCode { code, title, level }));
        }
    }

    let first_token = match text.split_whitespace().next() {
        Some(t) => t,
        None => return Ok(None),
    };

    // A "year" companion field, eg `1.1.1_year`.
    if first_token.contains("_year") {
        return Ok(Some(ParsedCode {
            code: first_token.to_string(),
            title: "Year".to_string(),
            level: 4,
        }));
    }

    // A derived indicator, eg `3.2.1a_gp`: the title is synthesized from the
    // modifier tags.
    let normalized = first_token.replace("inc_", "inc-");
    let has_modifier = normalized
        .split('_')
        .skip(1)
        .any(|part| vocab::modifier_label(part).is_some());
    if has_modifier {
        return Ok(Some(derived_indicator(first_token, &normalized)));
    }

    Ok(None)
}

fn is_special_token(token: &str) -> bool {
    if token.contains("_year") {
        return true;
    }
    token
        .replace("inc_", "inc-")
        .split('_')
        .skip(1)
        .any(|part| vocab::modifier_label(part).is_some())
}

/// Strips the code, the `C ` companion marker and the separator from the cell
/// text, leaving the human-readable title.
///
/// Later editions pad titles with non-breaking spaces and a stray leading or
/// trailing dot.
fn clean_title(text: &str, code: &str, separator: &str) -> String {
    let rest = text.strip_prefix("C ").unwrap_or(text);
    let rest = rest.replacen(&format!("{}{}", code, separator), "", 1);
    let rest = rest.replace('\u{a0}', " ");
    let rest = rest.trim();
    let rest = rest.strip_prefix('.').unwrap_or(rest);
    let rest = rest.strip_suffix('.').unwrap_or(rest);
    rest.trim().to_string()
}

/// Derives the hierarchy level from the dot structure of an indicator code.
pub fn indicator_level(code: &str) -> Result<u8, CodeError> {
    match code.matches('.').count() {
        // 1
        0 => Ok(1),
        // 1.2
        1 => Ok(2),
        2 => {
            let bare: String = code.chars().filter(|c| *c != '.').collect();
            if bare.chars().all(|c| c.is_ascii_digit()) {
                // 1.3.4
                Ok(3)
            } else {
                // 1.5.6a or 1.5.6a_dis
                Ok(4)
            }
        }
        // 2.3.1.4, only present in the editions with four-level codes
        3 => Ok(4),
        _ => Err(CodeError::InvalidDotCount {
            code: code.to_string(),
        }),
    }
}

/// Derives the hierarchy level of a theme code.
///
/// Themes split by trailing letters rather than dot count: `1` is a top-level
/// theme, `1A` a subtheme. Codes with several dot-delimited components only
/// appear in the richer theme schema and are the most granular variants.
pub fn theme_level(code: &str) -> u8 {
    if code.split('.').count() > 1 {
        return 4;
    }
    match code.chars().last() {
        Some(c) if c.is_alphabetic() => 2,
        _ => 1,
    }
}

/// Last resort for codes without a literal title in the spreadsheet: build
/// one of the form `School type: Modifier - Modifier`.
fn derived_indicator(token: &str, normalized: &str) -> ParsedCode {
    let mut parts = normalized.split('_');
    let base_code = parts.next().unwrap_or("");
    let mut labels: Vec<&str> = Vec::new();
    for part in parts {
        match vocab::modifier_label(part) {
            Some(label) => labels.push(label),
            None => warn!("Unknown modifier tag {:?} in {:?}", part, token),
        }
    }
    let modifiers = labels.join(" - ");
    let title = match vocab::type_label(base_code) {
        Some(type_label) => format!("{}: {}", type_label, modifiers),
        None => {
            warn!("No school or indicator type found for {:?}", base_code);
            modifiers
        }
    };
    ParsedCode {
        code: token.to_string(),
        title,
        level: 4,
    }
}

/// A derived code carries a trailing letter or modifier tag (eg `1.2a` or
/// `3.2.1a_gp`), as opposed to the plain numeric codes.
pub fn is_derived_code(code: &str) -> bool {
    code.chars().last().map_or(false, |c| c.is_alphabetic())
}

/// Level-1 codes are the single-digit category codes.
pub fn is_level1_code(code: &str) -> bool {
    code.len() == 1 && code.chars().all(|c| c.is_ascii_digit())
}

/// The level-2, non-derived codes (exactly one dot, no trailing letter) are
/// the ones rendered as percentages and fed into the category means.
pub fn is_level2_score_code(code: &str) -> bool {
    code.matches('.').count() == 1 && !is_derived_code(code)
}
