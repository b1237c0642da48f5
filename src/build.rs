use snafu::{prelude::*, Snafu};

use crate::args::Args;

pub mod catalog;
pub mod context;
pub mod countries;
pub mod extract;
pub mod writers;

use crate::build::context::{BuildConfig, PipelineContext};

#[derive(Debug, Snafu)]
pub enum BuildError {
    #[snafu(display("Error opening workbook {path}"))]
    OpeningWorkbook {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("Worksheet {name} is missing from the workbook"))]
    MissingSheet { name: String },
    #[snafu(display("Error reading worksheet {name}"))]
    ReadingSheet {
        source: calamine::XlsxError,
        name: String,
    },
    #[snafu(display("Error reading {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("The spreadsheet schema changed in a way the parser cannot interpret"))]
    BadCode { source: rtei_scoring::CodeError },
    #[snafu(display("Error serializing {name}"))]
    SerializingJson {
        source: serde_json::Error,
        name: String,
    },
    #[snafu(display("Error writing {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing {path}"))]
    WritingCsv { source: csv::Error, path: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type BuildResult<T> = Result<T, BuildError>;

pub fn run_build(args: &Args) -> BuildResult<()> {
    let config = BuildConfig::from_args(args);
    let ctx = PipelineContext::from_config(config)?;
    produce(&ctx, args.output.as_str())
}

/// Produces the requested output kind (or all of them) from a loaded
/// pipeline context.
pub fn produce(ctx: &PipelineContext, output: &str) -> BuildResult<()> {
    let catalog = catalog::all_indicators(ctx)?;
    match output {
        "indicators-json" => writers::write_indicators_json(ctx, &catalog),
        "indicators-csv" => writers::write_indicators_csv(ctx, &catalog),
        "themes-json" => {
            let themes = catalog::all_themes(ctx, &catalog)?;
            writers::write_themes_json(ctx, &themes)
        }
        "scores-per-country" => writers::write_scores_per_country(ctx, &catalog),
        "c3-scores-per-country" => {
            let themes = catalog::all_themes(ctx, &catalog)?;
            writers::write_c3_scores_per_country(ctx, &catalog, &themes)
        }
        "indicators-per-country" => writers::write_country_files(ctx, &catalog),
        "countries-with-data" => writers::write_countries_with_data(ctx),
        "all" => {
            let themes = catalog::all_themes(ctx, &catalog)?;
            writers::write_indicators_json(ctx, &catalog)?;
            writers::write_indicators_csv(ctx, &catalog)?;
            writers::write_themes_json(ctx, &themes)?;
            writers::write_scores_per_country(ctx, &catalog)?;
            writers::write_c3_scores_per_country(ctx, &catalog, &themes)?;
            writers::write_country_files(ctx, &catalog)?;
            writers::write_countries_with_data(ctx)
        }
        x => whatever!("Unknown output type {:?}", x),
    }
}
