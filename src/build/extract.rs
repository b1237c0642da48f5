// Reads per-country values out of the loaded sheets using the catalog's
// positional references, and applies the scoring rules.

use std::collections::{BTreeMap, HashMap, HashSet};

use calamine::DataType;
use log::{debug, warn};
use rand::Rng;
use rtei_scoring::{
    add_index_score, add_main_scores, is_derived_code, is_level2_score_code, rescale_percentage,
    round2, theme_score, Indicator, Theme, Value, ValueMap,
};

use crate::build::catalog::FIRST_COUNTRY_ROW;
use crate::build::context::PipelineContext;

/// The raw cell value that marks missing data in the later schema.
const NO_DATA_MARKER: f64 = 999.0;

/// Enrollment above 100% of the age cohort counts as full enrollment.
const CLAMPED_INDICATOR: &str = "2.4";

/// Which slice of the catalog to extract.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ExtractOptions {
    pub max_level: u8,
    /// Include the letter-suffixed derived codes.
    pub derived: bool,
    /// Render free-text responses (with their year qualifier) instead of the
    /// raw values, where a response column exists.
    pub responses: bool,
}

impl ExtractOptions {
    /// The full per-country view, down to the derived indicators.
    pub const FULL: ExtractOptions = ExtractOptions {
        max_level: 4,
        derived: true,
        responses: true,
    };
    /// The level-1/level-2 numeric scores view.
    pub const SCORES: ExtractOptions = ExtractOptions {
        max_level: 2,
        derived: false,
        responses: false,
    };
}

/// One country row of the core questionnaire sheet, with the name already
/// resolved against the reference table.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CountryRow {
    pub iso2: String,
    pub name: String,
    pub row: usize,
}

/// The extracted values for one country.
#[derive(Debug, Clone, PartialEq)]
pub struct CountryData {
    pub iso2: String,
    pub name: String,
    pub values: ValueMap,
    /// Random placeholder data rather than survey data. Kept separable so
    /// the demo fill never leaks into the real per-country outputs.
    pub synthetic: bool,
}

/// The resolvable country rows, in sheet order. Unresolvable names are
/// warned about and excluded rather than defaulted.
pub fn country_rows(ctx: &PipelineContext) -> Vec<CountryRow> {
    let mut out: Vec<CountryRow> = Vec::new();
    for row in FIRST_COUNTRY_ROW..ctx.core.num_rows() {
        let name = match ctx.core.text(row, 0) {
            Some(n) => n,
            None => continue,
        };
        match ctx.countries.resolve(&name) {
            Some(country) => out.push(CountryRow {
                iso2: country.iso2.clone(),
                name: country.name.clone(),
                row,
            }),
            None => warn!(
                "Could not get a country code for {:?}; excluding the row",
                name
            ),
        }
    }
    out
}

/// Extracts every country with the given options and adds the roll-up
/// scores. With the random fill enabled, reference-table countries missing
/// from the spreadsheet are appended as synthetic entries.
pub fn extract_countries(
    ctx: &PipelineContext,
    catalog: &[Indicator],
    opts: &ExtractOptions,
) -> Vec<CountryData> {
    let rows = country_rows(ctx);
    let overrides = summary_overrides(ctx, catalog);

    let mut out: Vec<CountryData> = Vec::new();
    for country_row in &rows {
        let mut values = values_for_country(ctx, catalog, country_row.row, opts);
        roll_up(&mut values, overrides.get(&country_row.iso2));
        out.push(CountryData {
            iso2: country_row.iso2.clone(),
            name: country_row.name.clone(),
            values,
            synthetic: false,
        });
    }

    if ctx.config.with_random_data {
        let present: HashSet<&str> = rows.iter().map(|r| r.iso2.as_str()).collect();
        for country in ctx.countries.iter() {
            if present.contains(country.iso2.as_str()) {
                continue;
            }
            let mut values = random_fill(catalog);
            roll_up(&mut values, None);
            out.push(CountryData {
                iso2: country.iso2.clone(),
                name: country.name.clone(),
                values,
                synthetic: true,
            });
        }
    }

    out
}

/// Reads the values of one country row, applying the per-indicator rules:
/// the 999 no-data marker, the enrollment clamp, the percentage rescaling of
/// level-2 scores, and the response rendering.
pub fn values_for_country(
    ctx: &PipelineContext,
    catalog: &[Indicator],
    row: usize,
    opts: &ExtractOptions,
) -> ValueMap {
    let by_code: HashMap<&str, &Indicator> =
        catalog.iter().map(|i| (i.code.as_str(), i)).collect();

    let mut out = ValueMap::new();
    for indicator in catalog {
        if indicator.level > opts.max_level {
            continue;
        }
        if !opts.derived && is_derived_code(&indicator.code) {
            continue;
        }
        let col = match indicator.column {
            Some(c) => c,
            None => continue,
        };
        let sheet = ctx.sheet_for(indicator.core);
        let mut value = read_value(sheet.cell(row, col));

        if let Value::Num(x) = value {
            if x == NO_DATA_MARKER {
                value = Value::NoData;
            }
        }
        if indicator.code == CLAMPED_INDICATOR {
            if let Value::Num(x) = value {
                if x >= 1.0 {
                    value = Value::Num(1.0);
                }
            }
        }
        if let Value::Num(x) = value {
            // The rescaling heuristic sees the raw value; rounding happens
            // at storage.
            value = if is_level2_score_code(&indicator.code) {
                Value::Num(round2(rescale_percentage(x)))
            } else {
                Value::Num(round2(x))
            };
        }
        if opts.responses {
            if let Some(response_col) = indicator.response_column {
                if let Some(text) = sheet.text(row, response_col) {
                    let year = year_for(ctx, &by_code, &indicator.code, row);
                    value = render_response(text, year);
                }
            }
        }
        out.insert(indicator.code.clone(), value);
    }
    out
}

fn read_value(cell: Option<&DataType>) -> Value {
    match cell {
        Some(DataType::Float(f)) => Value::Num(*f),
        Some(DataType::Int(i)) => Value::Num(*i as f64),
        Some(DataType::String(s)) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                Value::Missing
            } else {
                Value::Text(trimmed.to_string())
            }
        }
        _ => Value::Missing,
    }
}

/// The year qualifier for a code, read from its `<code>_year` companion
/// entry when one exists.
fn year_for(
    ctx: &PipelineContext,
    by_code: &HashMap<&str, &Indicator>,
    code: &str,
    row: usize,
) -> Option<String> {
    let companion = by_code.get(format!("{}_year", code).as_str())?;
    let col = companion.column?;
    ctx.sheet_for(companion.core).text(row, col)
}

fn render_response(text: String, year: Option<String>) -> Value {
    let lower = text.to_lowercase();
    let is_sentinel = lower == "no data" || lower == "insufficient data";
    match year {
        Some(y) if !is_sentinel => Value::Text(format!("{} ({})", text, y)),
        _ => Value::Text(text),
    }
}

fn roll_up(values: &mut ValueMap, overrides: Option<&Vec<(String, f64)>>) {
    add_main_scores(values);
    if let Some(scores) = overrides {
        for (code, score) in scores {
            values.insert(code.clone(), Value::Num(*score));
        }
    }
    add_index_score(values);
}

/// Pre-computed level-1 scores from the summary sheet, per ISO-2 code.
/// Columns are matched to the catalog by case-insensitive title equality;
/// unmatched columns are warned about and skipped.
fn summary_overrides(
    ctx: &PipelineContext,
    catalog: &[Indicator],
) -> BTreeMap<String, Vec<(String, f64)>> {
    let mut out: BTreeMap<String, Vec<(String, f64)>> = BTreeMap::new();
    let sheet = match &ctx.summary {
        Some(s) => s,
        None => return out,
    };

    let mut columns: Vec<(usize, String)> = Vec::new();
    for col in 1..sheet.row_len(0) {
        let label = match sheet.text(0, col) {
            Some(l) => l,
            None => continue,
        };
        match catalog
            .iter()
            .find(|i| i.title.eq_ignore_ascii_case(&label))
        {
            Some(indicator) => columns.push((col, indicator.code.clone())),
            None => warn!("No indicator title matches summary column {:?}", label),
        }
    }

    for row in 1..sheet.num_rows() {
        let name = match sheet.text(row, 0) {
            Some(n) => n,
            None => continue,
        };
        let country = match ctx.countries.resolve(&name) {
            Some(c) => c,
            None => {
                warn!(
                    "Could not get a country code for {:?} in the summary sheet",
                    name
                );
                continue;
            }
        };
        let mut scores: Vec<(String, f64)> = Vec::new();
        for (col, code) in &columns {
            if let Value::Num(x) = read_value(sheet.cell(row, *col)) {
                scores.push((code.clone(), round2(rescale_percentage(x))));
            }
        }
        debug!("Summary scores for {}: {:?}", country.iso2, scores);
        out.insert(country.iso2.clone(), scores);
    }
    out
}

/// Per-country theme scores, read from each theme's row of the themes sheet.
/// In-sheet values are 0-1 fractions; non-numeric cells are missing, not
/// zero.
pub fn theme_scores(
    ctx: &PipelineContext,
    themes: &[Theme],
) -> BTreeMap<String, BTreeMap<String, Option<f64>>> {
    let mut out: BTreeMap<String, BTreeMap<String, Option<f64>>> = BTreeMap::new();
    let sheet = match &ctx.themes {
        Some(s) => s,
        None => return out,
    };

    for col in 1..sheet.row_len(0) {
        let name = match sheet.text(0, col) {
            Some(n) => n,
            None => continue,
        };
        let country = match ctx.countries.resolve(&name) {
            Some(c) => c,
            None => {
                warn!(
                    "Could not get a country code for {:?} in the themes sheet",
                    name
                );
                continue;
            }
        };
        let mut scores: BTreeMap<String, Option<f64>> = BTreeMap::new();
        for theme in themes {
            let row = match theme.row {
                Some(r) => r,
                None => continue,
            };
            let score = read_value(sheet.cell(row, col)).as_num().map(theme_score);
            scores.insert(theme.code.clone(), score);
        }
        out.insert(country.iso2.clone(), scores);
    }
    out
}

/// Uniform random scores in [0, 100] for the level-1/level-2 slice of the
/// catalog. Placeholder rendering only.
fn random_fill(catalog: &[Indicator]) -> ValueMap {
    let mut rng = rand::thread_rng();
    let mut out = ValueMap::new();
    for indicator in catalog {
        if indicator.level <= 2 && !is_derived_code(&indicator.code) {
            out.insert(
                indicator.code.clone(),
                Value::Num(rng.gen_range(0..=100) as f64),
            );
        }
    }
    out
}
