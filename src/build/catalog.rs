// Scans the questionnaire header rows and assembles the indicator and theme
// catalogs.

use std::collections::HashMap;

use log::{debug, warn};
use rtei_scoring::{
    merge_catalogs, parse_indicator_cell, parse_theme_cell, Indicator, MappedIndicator, Theme,
};
use snafu::prelude::*;

use crate::build::context::{PipelineContext, SheetData};
use crate::build::{BadCodeSnafu, BuildResult};

/// The rows of the questionnaire sheets that carry header text. Titles are
/// duplicated on row 1 by spreadsheet convention, so it is skipped.
pub const HEADER_ROWS: &[usize] = &[0, 2, 3];

/// The header row that fixes the value columns.
pub const POSITIONS_ROW: usize = 3;

/// The first row holding country data.
pub const FIRST_COUNTRY_ROW: usize = 4;

/// Scans one questionnaire sheet into a flat catalog, in first-seen order.
///
/// A code can show up several times across the header rows (title row vs
/// positions row). The first occurrence creates the entry; an occurrence on
/// the positions row fills in the value column, and a further one there
/// designates the free-text "Response" column for the same code.
pub fn indicators_from_sheet(sheet: &SheetData, core: bool) -> BuildResult<Vec<Indicator>> {
    let mut out: Vec<Indicator> = Vec::new();
    let mut seen: HashMap<String, usize> = HashMap::new();

    for &row in HEADER_ROWS {
        for col in 0..sheet.row_len(row) {
            let text = match sheet.text(row, col) {
                Some(t) => t,
                None => continue,
            };
            let parsed = match parse_indicator_cell(&text).context(BadCodeSnafu {})? {
                Some(p) => p,
                None => {
                    debug!("Skipping header cell {:?}", text);
                    continue;
                }
            };

            if let Some(&idx) = seen.get(&parsed.code) {
                if row == POSITIONS_ROW {
                    let entry = &mut out[idx];
                    if entry.column.is_none() {
                        entry.column = Some(col);
                    } else if entry.response_column.is_none() && entry.column != Some(col) {
                        entry.response_column = Some(col);
                    }
                }
                continue;
            }

            seen.insert(parsed.code.clone(), out.len());
            out.push(Indicator {
                code: parsed.code,
                title: parsed.title,
                level: parsed.level,
                core,
                column: if row == POSITIONS_ROW { Some(col) } else { None },
                response_column: None,
            });
        }
    }

    Ok(out)
}

/// The combined catalog: core questionnaire plus companion, core entries
/// winning on collision, ordered by code.
pub fn all_indicators(ctx: &PipelineContext) -> BuildResult<Vec<Indicator>> {
    let core = indicators_from_sheet(&ctx.core, true)?;
    let companion = match &ctx.companion {
        Some(sheet) => indicators_from_sheet(sheet, false)?,
        None => Vec::new(),
    };
    Ok(merge_catalogs(core, companion))
}

/// Scans the themes sheet: one theme per row, header text in column 0,
/// countries across row 0.
pub fn themes_from_sheet(sheet: &SheetData) -> BuildResult<Vec<Theme>> {
    let mut out: Vec<Theme> = Vec::new();
    for row in 1..sheet.num_rows() {
        let text = match sheet.text(row, 0) {
            Some(t) => t,
            None => continue,
        };
        let parsed = match parse_theme_cell(&text).context(BadCodeSnafu {})? {
            Some(p) => p,
            None => {
                debug!("Skipping theme cell {:?}", text);
                continue;
            }
        };
        if out.iter().any(|t| t.code == parsed.code) {
            continue;
        }
        out.push(Theme {
            code: parsed.code,
            title: parsed.title,
            level: parsed.level,
            row: Some(row),
            indicators: Vec::new(),
        });
    }
    Ok(out)
}

/// The theme catalog with the indicator mappings attached. Empty when the
/// workbook has no themes sheet.
pub fn all_themes(ctx: &PipelineContext, catalog: &[Indicator]) -> BuildResult<Vec<Theme>> {
    let sheet = match &ctx.themes {
        Some(s) => s,
        None => return Ok(Vec::new()),
    };
    let mut themes = themes_from_sheet(sheet)?;
    if let Some(map_sheet) = &ctx.theme_map {
        apply_theme_mappings(&mut themes, map_sheet, catalog);
    }
    Ok(themes)
}

/// Reads the theme-to-indicator mapping sheet: theme code in column 0,
/// indicator code in column 1, optional title in column 2 for indicators
/// that are not part of the catalog.
fn apply_theme_mappings(themes: &mut [Theme], map_sheet: &SheetData, catalog: &[Indicator]) {
    let titles: HashMap<&str, &str> = catalog
        .iter()
        .map(|i| (i.code.as_str(), i.title.as_str()))
        .collect();

    for row in 1..map_sheet.num_rows() {
        let theme_code = match map_sheet.text(row, 0) {
            Some(t) => t,
            None => continue,
        };
        let indicator_code = match map_sheet.text(row, 1) {
            Some(t) => t,
            None => continue,
        };
        let title = match titles.get(indicator_code.as_str()) {
            Some(t) => t.to_string(),
            None => map_sheet.text(row, 2).unwrap_or_else(|| {
                warn!(
                    "No title found for mapped indicator {:?} of theme {:?}",
                    indicator_code, theme_code
                );
                String::new()
            }),
        };
        match themes.iter_mut().find(|t| t.code == theme_code) {
            Some(theme) => theme.indicators.push(MappedIndicator {
                code: indicator_code,
                title,
            }),
            None => warn!(
                "Theme {:?} from the mapping sheet is not in the themes sheet",
                theme_code
            ),
        }
    }
}
