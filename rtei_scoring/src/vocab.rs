// ********* Fixed vocabularies **********

// These tables are data on purpose: survey editions add entries without
// changing any parsing logic.

/// Modifier tags used by derived (disaggregated) indicators, mapped to the
/// label shown in the synthesized title.
///
/// The income ratio tags are stored with underscores in the spreadsheet
/// (`inc_hmp`) and normalized to `inc-hmp` before lookup.
pub const MODIFIERS: &[(&str, &str)] = &[
    ("gp", "Gender Parity"),
    ("ad", "Advantaged Group"),
    ("resp", "Residential Parity"),
    ("disp", "Disability Parity"),
    ("inc-hmp", "High to Medium Quartile Income Ratio"),
    ("inc-mlp", "Medium to Low Quartile Income Ratio"),
    ("oosc", "Out of School Children"),
    ("over", "Overage Learners"),
];

/// School types, keyed by the trailing letter of the base indicator code.
pub const SCHOOL_TYPES: &[(char, &str)] = &[
    ('a', "Primary schools"),
    ('b', "Secondary schools"),
    ('c', "TVET"),
    ('d', "Tertiary schools"),
];

/// Per-indicator type labels, keyed by the full base code.
///
/// For these indicators the trailing letter does not denote a school type:
/// the learning outcomes family (3.3.4x) is split by subject instead.
pub const INDICATOR_TYPES: &[(&str, &str)] = &[
    ("3.3.4a", "Reading"),
    ("3.3.4b", "Mathematics"),
];

pub fn modifier_label(tag: &str) -> Option<&'static str> {
    MODIFIERS
        .iter()
        .find(|(t, _)| *t == tag)
        .map(|(_, label)| *label)
}

/// Looks up the school/indicator type label for a base code such as `3.2.1a`.
///
/// The full base code takes precedence over the trailing letter, since the
/// same letter means different things for different indicators.
pub fn type_label(base_code: &str) -> Option<&'static str> {
    if let Some((_, label)) = INDICATOR_TYPES.iter().find(|(c, _)| *c == base_code) {
        return Some(label);
    }
    let last = base_code.chars().last()?;
    SCHOOL_TYPES
        .iter()
        .find(|(c, _)| *c == last)
        .map(|(_, label)| *label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn school_type_from_trailing_letter() {
        assert_eq!(type_label("3.2.1a"), Some("Primary schools"));
        assert_eq!(type_label("1.5.6d"), Some("Tertiary schools"));
    }

    #[test]
    fn indicator_type_overrides_trailing_letter() {
        assert_eq!(type_label("3.3.4a"), Some("Reading"));
        assert_eq!(type_label("3.3.4b"), Some("Mathematics"));
    }

    #[test]
    fn unknown_type_is_none() {
        assert_eq!(type_label("1.2.3"), None);
        assert_eq!(type_label("1.2.3z"), None);
    }
}
