// The pipeline context: the workbook sheets, the country reference table and
// the run configuration, loaded once and passed by reference everywhere.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fs;

use calamine::{open_workbook, DataType, Reader, Xlsx};
use log::{debug, info};
use serde_json::Value as JSValue;
use snafu::prelude::*;

use crate::args::Args;
use crate::build::countries::CountryTable;
use crate::build::{
    BuildResult, MissingSheetSnafu, OpeningJsonSnafu, OpeningWorkbookSnafu, ParsingJsonSnafu,
    ReadingSheetSnafu,
};

pub const CORE_SHEET: &str = "Core Questionnaire";
pub const COMPANION_SHEET: &str = "Companion Questionnaire";
pub const THEMES_SHEET: &str = "Transversal Themes";
pub const THEME_MAP_SHEET: &str = "Themes x Indicators";
pub const SUMMARY_SHEET: &str = "Summary";

pub const DEFAULT_INPUT_FILE: &str = "data/rtei_data.xlsx";
pub const DEFAULT_COUNTRIES_FILE: &str = "data/countries.json";
pub const DEFAULT_OUTPUT_DIR: &str = "rtei/static/data";

#[derive(Debug, Clone)]
pub struct BuildConfig {
    pub input_file: String,
    pub countries_file: String,
    pub output_dir: String,
    pub with_random_data: bool,
    pub reference_dir: Option<String>,
}

impl BuildConfig {
    pub fn from_args(args: &Args) -> BuildConfig {
        BuildConfig {
            input_file: args
                .input
                .clone()
                .unwrap_or_else(|| DEFAULT_INPUT_FILE.to_string()),
            countries_file: args
                .countries
                .clone()
                .unwrap_or_else(|| DEFAULT_COUNTRIES_FILE.to_string()),
            output_dir: args
                .output_dir
                .clone()
                .unwrap_or_else(|| DEFAULT_OUTPUT_DIR.to_string()),
            with_random_data: args.with_random_data,
            reference_dir: args.reference.clone(),
        }
    }
}

/// One worksheet, materialized into an owned grid so the rest of the
/// pipeline can address cells without going back to the workbook handle.
#[derive(Debug, Clone, Default)]
pub struct SheetData {
    rows: Vec<Vec<DataType>>,
}

impl SheetData {
    pub fn from_range(range: &calamine::Range<DataType>) -> SheetData {
        SheetData {
            rows: range.rows().map(|r| r.to_vec()).collect(),
        }
    }

    pub fn from_rows(rows: Vec<Vec<DataType>>) -> SheetData {
        SheetData { rows }
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn row_len(&self, row: usize) -> usize {
        self.rows.get(row).map(|r| r.len()).unwrap_or(0)
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&DataType> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// A trimmed string rendering of a cell, or `None` for empty cells.
    /// Whole floats render without the decimal part, the way the codes are
    /// written in the sheet.
    pub fn text(&self, row: usize, col: usize) -> Option<String> {
        match self.cell(row, col) {
            Some(DataType::String(s)) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            Some(DataType::Float(f)) => {
                if f.fract() == 0.0 {
                    Some(format!("{}", *f as i64))
                } else {
                    Some(format!("{}", f))
                }
            }
            Some(DataType::Int(i)) => Some(format!("{}", i)),
            Some(DataType::Bool(b)) => Some(format!("{}", b)),
            _ => None,
        }
    }
}

/// An in-process memoizing cache for parsed JSON reference files, keyed by
/// path. Entries are never invalidated within a run; callers must not mutate
/// what they get back.
#[derive(Default)]
pub struct JsonCache {
    cache: HashMap<String, JSValue>,
}

impl JsonCache {
    pub fn get(&mut self, path: &str) -> BuildResult<&JSValue> {
        match self.cache.entry(path.to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                debug!("Reading JSON file {:?}", path);
                let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
                let js: JSValue =
                    serde_json::from_str(&contents).context(ParsingJsonSnafu { path })?;
                Ok(entry.insert(js))
            }
        }
    }
}

pub struct PipelineContext {
    pub core: SheetData,
    pub companion: Option<SheetData>,
    pub themes: Option<SheetData>,
    pub theme_map: Option<SheetData>,
    pub summary: Option<SheetData>,
    pub countries: CountryTable,
    pub config: BuildConfig,
}

impl PipelineContext {
    /// Opens the workbook and the country table and materializes every named
    /// sheet. The workbook handle is dropped afterwards: all reads go
    /// through the owned grids.
    pub fn from_config(config: BuildConfig) -> BuildResult<PipelineContext> {
        let mut cache = JsonCache::default();
        let countries = CountryTable::load(&config.countries_file, &mut cache)?;

        info!("Opening workbook {:?}", config.input_file);
        let mut workbook: Xlsx<_> =
            open_workbook(&config.input_file).context(OpeningWorkbookSnafu {
                path: config.input_file.clone(),
            })?;

        let core = required_sheet(&mut workbook, CORE_SHEET)?;
        let companion = optional_sheet(&mut workbook, COMPANION_SHEET)?;
        let themes = optional_sheet(&mut workbook, THEMES_SHEET)?;
        let theme_map = optional_sheet(&mut workbook, THEME_MAP_SHEET)?;
        let summary = optional_sheet(&mut workbook, SUMMARY_SHEET)?;

        Ok(PipelineContext {
            core,
            companion,
            themes,
            theme_map,
            summary,
            countries,
            config,
        })
    }

    /// Assembles a context out of already-loaded parts. Used by the tests to
    /// run the pipeline against in-memory fixtures.
    pub fn from_parts(
        config: BuildConfig,
        core: SheetData,
        companion: Option<SheetData>,
        themes: Option<SheetData>,
        theme_map: Option<SheetData>,
        summary: Option<SheetData>,
        countries: CountryTable,
    ) -> PipelineContext {
        PipelineContext {
            core,
            companion,
            themes,
            theme_map,
            summary,
            countries,
            config,
        }
    }

    /// The sheet holding an indicator's values: the core questionnaire sheet
    /// or the companion one. Editions without a companion sheet mark every
    /// indicator as core.
    pub fn sheet_for(&self, core: bool) -> &SheetData {
        if core {
            &self.core
        } else {
            self.companion.as_ref().unwrap_or(&self.core)
        }
    }
}

fn required_sheet(workbook: &mut Xlsx<std::io::BufReader<fs::File>>, name: &str) -> BuildResult<SheetData> {
    let range = workbook
        .worksheet_range(name)
        .context(MissingSheetSnafu { name })?
        .context(ReadingSheetSnafu { name })?;
    Ok(SheetData::from_range(&range))
}

fn optional_sheet(
    workbook: &mut Xlsx<std::io::BufReader<fs::File>>,
    name: &str,
) -> BuildResult<Option<SheetData>> {
    if !workbook.sheet_names().iter().any(|s| s == name) {
        debug!("Worksheet {:?} not present in the workbook", name);
        return Ok(None);
    }
    let range = workbook
        .worksheet_range(name)
        .context(MissingSheetSnafu { name })?
        .context(ReadingSheetSnafu { name })?;
    Ok(Some(SheetData::from_range(&range)))
}
