// ********* Catalog data structures **********

use std::collections::{HashMap, HashSet};

use log::debug;

/// A node in the questionnaire hierarchy, as laid out in the spreadsheet.
///
/// The positional references are plain cell coordinates resolved while
/// scanning the header rows; they are absent for codes that only appear in
/// the title rows (typically the level-1 categories).
#[derive(Debug, Clone, PartialEq)]
pub struct Indicator {
    pub code: String,
    pub title: String,
    pub level: u8,
    /// Whether the indicator belongs to the core questionnaire rather than
    /// the companion one. Later editions drop the distinction and mark
    /// everything as core.
    pub core: bool,
    /// Column holding the raw values for this indicator.
    pub column: Option<usize>,
    /// Column holding the free-text "Response" rendering, when present.
    pub response_column: Option<usize>,
}

/// A cross-cutting theme, keyed by an alphanumeric code (`1`, `1A`, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub code: String,
    pub title: String,
    pub level: u8,
    /// Row of the themes sheet holding this theme's per-country scores.
    pub row: Option<usize>,
    /// The base indicators feeding this theme's composite score.
    pub indicators: Vec<MappedIndicator>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MappedIndicator {
    pub code: String,
    pub title: String,
}

/// The nested view of an indicator, produced for output.
///
/// Children always sit exactly one level below their parent; a level-4 node
/// never has children.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorNode {
    pub code: String,
    pub title: String,
    pub level: u8,
    pub core: bool,
    pub children: Vec<IndicatorNode>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThemeNode {
    pub code: String,
    pub title: String,
    pub level: u8,
    pub indicators: Vec<MappedIndicator>,
    pub children: Vec<ThemeNode>,
}

/// Unions the core and companion catalogs, core entries taking precedence on
/// code collision, and orders the result by ascending lexicographic code.
///
/// Lexicographic order is not hierarchical order for multi-digit segments
/// (`1.10` sorts before `1.2`); this ordering is user-visible and must be
/// kept.
pub fn merge_catalogs(core: Vec<Indicator>, companion: Vec<Indicator>) -> Vec<Indicator> {
    let mut out = core;
    let core_codes: HashSet<String> = out.iter().map(|i| i.code.clone()).collect();
    for indicator in companion {
        if !core_codes.contains(&indicator.code) {
            out.push(indicator);
        }
    }
    out.sort_by(|a, b| a.code.cmp(&b.code));
    out
}

/// Builds the parent/children tree out of a flat catalog.
///
/// An entry is a child of the parent whose code it strictly extends, with a
/// level exactly one above. The parent is located by probing the child's
/// code prefixes against a code index, so the whole pass stays linear in the
/// catalog size.
pub fn nest_indicators(catalog: &[Indicator]) -> Vec<IndicatorNode> {
    let by_code: HashMap<&str, &Indicator> =
        catalog.iter().map(|i| (i.code.as_str(), i)).collect();

    let mut children_of: HashMap<&str, Vec<&Indicator>> = HashMap::new();
    let mut roots: Vec<&Indicator> = Vec::new();
    for indicator in catalog {
        if indicator.level == 1 {
            roots.push(indicator);
            continue;
        }
        match parent_of(indicator, &by_code) {
            Some(parent_code) => children_of.entry(parent_code).or_default().push(indicator),
            None => debug!("No parent entry in the catalog for {:?}", indicator.code),
        }
    }

    roots
        .iter()
        .map(|root| indicator_node(root, &children_of))
        .collect()
}

fn parent_of<'a>(
    indicator: &Indicator,
    by_code: &HashMap<&'a str, &'a Indicator>,
) -> Option<&'a str> {
    let mut found: Option<&'a str> = None;
    for (idx, _) in indicator.code.char_indices().skip(1) {
        if let Some(parent) = by_code.get(&indicator.code[..idx]) {
            if parent.level + 1 == indicator.level {
                // Keep probing: the longest matching prefix wins.
                found = Some(parent.code.as_str());
            }
        }
    }
    found
}

fn indicator_node(
    indicator: &Indicator,
    children_of: &HashMap<&str, Vec<&Indicator>>,
) -> IndicatorNode {
    let children = children_of
        .get(indicator.code.as_str())
        .map(|entries| {
            entries
                .iter()
                .map(|child| indicator_node(child, children_of))
                .collect()
        })
        .unwrap_or_default();
    IndicatorNode {
        code: indicator.code.clone(),
        title: indicator.title.clone(),
        level: indicator.level,
        core: indicator.core,
        children,
    }
}

/// Nests themes: a subtheme belongs to the theme whose code equals its own
/// code with the alphabetic characters stripped (`1A` under `1`).
pub fn nest_themes(themes: &[Theme]) -> Vec<ThemeNode> {
    let mut children_of: HashMap<String, Vec<&Theme>> = HashMap::new();
    let mut roots: Vec<&Theme> = Vec::new();
    for theme in themes {
        if theme.level == 1 {
            roots.push(theme);
            continue;
        }
        let parent_code: String = theme
            .code
            .chars()
            .filter(|c| !c.is_alphabetic())
            .collect();
        children_of.entry(parent_code).or_default().push(theme);
    }

    roots
        .iter()
        .map(|root| theme_node(root, &children_of))
        .collect()
}

fn theme_node(theme: &Theme, children_of: &HashMap<String, Vec<&Theme>>) -> ThemeNode {
    let children = children_of
        .get(&theme.code)
        .map(|entries| {
            entries
                .iter()
                .map(|child| theme_node(child, children_of))
                .collect()
        })
        .unwrap_or_default();
    ThemeNode {
        code: theme.code.clone(),
        title: theme.title.clone(),
        level: theme.level,
        indicators: theme.indicators.clone(),
        children,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indicator(code: &str, level: u8, core: bool) -> Indicator {
        Indicator {
            code: code.to_string(),
            title: format!("Title {}", code),
            level,
            core,
            column: None,
            response_column: None,
        }
    }

    #[test]
    fn merge_prefers_core_entries() {
        let core = vec![indicator("1", 1, true), indicator("1.2", 2, true)];
        let companion = vec![indicator("1.2", 2, false), indicator("1.1", 2, false)];
        let merged = merge_catalogs(core, companion);
        let codes: Vec<&str> = merged.iter().map(|i| i.code.as_str()).collect();
        assert_eq!(codes, vec!["1", "1.1", "1.2"]);
        assert!(merged.iter().find(|i| i.code == "1.2").unwrap().core);
    }

    #[test]
    fn merge_order_is_lexicographic() {
        let core = vec![
            indicator("1.10", 2, true),
            indicator("1.2", 2, true),
            indicator("1", 1, true),
        ];
        let merged = merge_catalogs(core, vec![]);
        let codes: Vec<&str> = merged.iter().map(|i| i.code.as_str()).collect();
        // 1.10 sorts before 1.2: plain string ordering, not numeric.
        assert_eq!(codes, vec!["1", "1.10", "1.2"]);
    }

    #[test]
    fn nesting_follows_code_prefix_and_level() {
        let catalog = merge_catalogs(
            vec![
                indicator("1", 1, true),
                indicator("1.1", 2, true),
                indicator("1.1.1", 3, true),
                indicator("1.1.1a", 4, true),
                indicator("1.2", 2, true),
                indicator("2", 1, true),
            ],
            vec![],
        );
        let nested = nest_indicators(&catalog);
        assert_eq!(nested.len(), 2);
        let first = &nested[0];
        assert_eq!(first.code, "1");
        assert_eq!(first.children.len(), 2);
        assert_eq!(first.children[0].code, "1.1");
        assert_eq!(first.children[0].children[0].code, "1.1.1");
        assert_eq!(first.children[0].children[0].children[0].code, "1.1.1a");
        assert!(nested[1].children.is_empty());
    }

    #[test]
    fn nesting_skips_levels_without_parents() {
        // 1.1.1 has no level-2 parent in the catalog: it is left out of the
        // tree rather than attached to the wrong node.
        let catalog = vec![indicator("1", 1, true), indicator("1.1.1", 3, true)];
        let nested = nest_indicators(&catalog);
        assert_eq!(nested.len(), 1);
        assert!(nested[0].children.is_empty());
    }

    fn theme(code: &str, level: u8) -> Theme {
        Theme {
            code: code.to_string(),
            title: format!("Theme {}", code),
            level,
            row: None,
            indicators: vec![],
        }
    }

    #[test]
    fn themes_nest_by_numeric_characters() {
        let themes = vec![theme("1", 1), theme("1A", 2), theme("1B", 2), theme("2", 1)];
        let nested = nest_themes(&themes);
        assert_eq!(nested.len(), 2);
        assert_eq!(nested[0].children.len(), 2);
        assert_eq!(nested[0].children[0].code, "1A");
        assert!(nested[1].children.is_empty());
    }
}
