// ********* Score aggregation **********

use std::collections::BTreeMap;

use crate::codes::{is_level1_code, is_level2_score_code};

/// The literal written to the output files in place of the in-sheet no-data
/// marker.
pub const NO_DATA: &str = "No data";

/// One computed value for a country and an indicator code.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Num(f64),
    /// A textual response token, or a sentinel such as "Insufficient data".
    Text(String),
    /// The in-sheet no-data marker (999 in the later schema).
    NoData,
    /// An empty cell.
    Missing,
}

impl Value {
    pub fn as_num(&self) -> Option<f64> {
        match self {
            Value::Num(x) => Some(*x),
            _ => None,
        }
    }
}

/// Per-country values, keyed by indicator code. The catalog is kept in
/// ascending lexicographic code order, which a BTreeMap reproduces, so runs
/// stay byte-stable.
pub type ValueMap = BTreeMap<String, Value>;

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// The percentage heuristic for level-2 scores: a raw fraction up to and
/// including 1 is a 0-1 ratio and gets multiplied by 100, anything above is
/// already a percentage.
///
/// This misreads legitimate sub-1% percentages (0.5 meaning 0.5%), but it is
/// what determines the published score scale and is kept as-is.
pub fn rescale_percentage(value: f64) -> f64 {
    if value <= 1.0 {
        value * 100.0
    } else {
        value
    }
}

/// Theme scores are expressed as a 0-1 fraction in the sheet and always
/// rescaled to a percentage for output.
pub fn theme_score(value: f64) -> f64 {
    round2(value * 100.0)
}

/// Adds the level-1 category scores: for each category digit, the mean of the
/// collected level-2 non-derived values whose code starts with it.
///
/// Categories with no contributing values are omitted rather than zeroed.
pub fn add_main_scores(values: &mut ValueMap) {
    let mut buckets: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for (code, value) in values.iter() {
        if code == "index" || !is_level2_score_code(code) {
            continue;
        }
        if let Value::Num(x) = value {
            buckets
                .entry(code[..1].to_string())
                .or_default()
                .push(rescale_percentage(*x));
        }
    }
    for (category, collected) in buckets {
        let mean = collected.iter().sum::<f64>() / collected.len() as f64;
        values.insert(category, Value::Num(round2(mean)));
    }
}

/// Adds the overall `index` score: the mean of whichever of the five
/// category scores are present.
pub fn add_index_score(values: &mut ValueMap) {
    let mut collected: Vec<f64> = Vec::new();
    for category in ["1", "2", "3", "4", "5"] {
        if let Some(Value::Num(x)) = values.get(category) {
            collected.push(*x);
        }
    }
    if collected.is_empty() {
        return;
    }
    let mean = collected.iter().sum::<f64>() / collected.len() as f64;
    values.insert("index".to_string(), Value::Num(round2(mean)));
}

/// The chart normalization pass: every value in the level-1/level-2 filtered
/// set becomes its proportional contribution to a 100%-stacked bar.
///
/// Level-2 values are divided by the number of numeric siblings under the
/// same category, level-1 values by the number of level-1 values. Sentinel
/// strings pass through unscaled; the overall index is kept as-is.
pub fn c3_scores(values: &ValueMap) -> ValueMap {
    let mut level1_count = 0usize;
    let mut category_counts: BTreeMap<String, usize> = BTreeMap::new();
    for (code, value) in values.iter() {
        if value.as_num().is_none() {
            continue;
        }
        if is_level1_code(code) {
            level1_count += 1;
        } else if is_level2_score_code(code) {
            *category_counts.entry(code[..1].to_string()).or_insert(0) += 1;
        }
    }

    let mut out = ValueMap::new();
    for (code, value) in values.iter() {
        if code == "index" {
            out.insert(code.clone(), value.clone());
            continue;
        }
        match value {
            Value::Num(x) => {
                let divisor = if is_level1_code(code) {
                    level1_count
                } else if is_level2_score_code(code) {
                    category_counts
                        .get(&code[..1])
                        .copied()
                        .unwrap_or_default()
                } else {
                    continue;
                };
                if divisor > 0 {
                    out.insert(code.clone(), Value::Num(round2(x / divisor as f64)));
                }
            }
            Value::Text(_) => {
                out.insert(code.clone(), value.clone());
            }
            Value::NoData | Value::Missing => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(entries: &[(&str, Value)]) -> ValueMap {
        entries
            .iter()
            .map(|(code, value)| (code.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn category_mean_of_level2_scores() {
        let mut map = values(&[
            ("1.1", Value::Num(80.0)),
            ("1.2", Value::Num(60.0)),
            ("2.1", Value::Num(55.0)),
        ]);
        add_main_scores(&mut map);
        assert_eq!(map.get("1"), Some(&Value::Num(70.0)));
        assert_eq!(map.get("2"), Some(&Value::Num(55.0)));
    }

    #[test]
    fn fractions_are_rescaled_in_the_mean() {
        let mut map = values(&[("3.1", Value::Num(0.5)), ("3.2", Value::Num(70.0))]);
        add_main_scores(&mut map);
        assert_eq!(map.get("3"), Some(&Value::Num(60.0)));
    }

    #[test]
    fn no_data_is_excluded_from_the_mean() {
        let mut map = values(&[
            ("1.1", Value::Num(80.0)),
            ("1.2", Value::NoData),
            ("1.3", Value::Text("Insufficient data".to_string())),
        ]);
        add_main_scores(&mut map);
        assert_eq!(map.get("1"), Some(&Value::Num(80.0)));
    }

    #[test]
    fn empty_categories_are_omitted() {
        let mut map = values(&[("1.1", Value::NoData)]);
        add_main_scores(&mut map);
        assert_eq!(map.get("1"), None);
    }

    #[test]
    fn index_is_the_mean_of_present_categories() {
        let mut map = values(&[("1", Value::Num(70.0)), ("2", Value::Num(55.0))]);
        add_index_score(&mut map);
        assert_eq!(map.get("index"), Some(&Value::Num(62.5)));
    }

    #[test]
    fn index_is_omitted_without_categories() {
        let mut map = values(&[("1.1", Value::NoData)]);
        add_index_score(&mut map);
        assert_eq!(map.get("index"), None);
    }

    #[test]
    fn percentage_boundary_is_inclusive() {
        assert_eq!(rescale_percentage(1.0), 100.0);
        assert_eq!(rescale_percentage(1.0001), 1.0001);
        assert_eq!(rescale_percentage(0.8), 80.0);
    }

    #[test]
    fn c3_divides_by_sibling_counts() {
        let map = values(&[
            ("1", Value::Num(70.0)),
            ("1.1", Value::Num(80.0)),
            ("1.2", Value::Num(60.0)),
            ("2", Value::Num(55.0)),
            ("2.1", Value::Num(55.0)),
            ("index", Value::Num(62.5)),
        ]);
        let c3 = c3_scores(&map);
        assert_eq!(c3.get("1"), Some(&Value::Num(35.0)));
        assert_eq!(c3.get("1.1"), Some(&Value::Num(40.0)));
        assert_eq!(c3.get("1.2"), Some(&Value::Num(30.0)));
        assert_eq!(c3.get("2.1"), Some(&Value::Num(55.0)));
        assert_eq!(c3.get("index"), Some(&Value::Num(62.5)));
    }

    #[test]
    fn c3_passes_sentinel_strings_through() {
        let map = values(&[
            ("1.1", Value::Num(80.0)),
            ("1.2", Value::Text("Insufficient data".to_string())),
        ]);
        let c3 = c3_scores(&map);
        // Only 1.1 is numeric: it is its own single sibling.
        assert_eq!(c3.get("1.1"), Some(&Value::Num(80.0)));
        assert_eq!(
            c3.get("1.2"),
            Some(&Value::Text("Insufficient data".to_string()))
        );
    }

    #[test]
    fn theme_scores_are_rescaled() {
        assert_eq!(theme_score(0.75), 75.0);
        assert_eq!(theme_score(0.333), 33.3);
    }
}
