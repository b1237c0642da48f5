use clap::Parser;

/// Builds the data files needed for powering the visualizations of the Right
/// to Education Index website.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// The output to produce: one of indicators-json, indicators-csv,
    /// themes-json, scores-per-country, c3-scores-per-country,
    /// indicators-per-country, countries-with-data or all.
    #[clap(value_parser)]
    pub output: String,

    /// (file path) The questionnaire workbook in Excel (xlsx) format.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (file path) The JSON country reference table.
    #[clap(long, value_parser)]
    pub countries: Option<String>,

    /// (directory) Destination directory for the generated files. The
    /// directory must exist.
    #[clap(short, long, value_parser)]
    pub output_dir: Option<String>,

    /// (directory or empty) If specified, every generated JSON file is
    /// compared against the previously published copy found there, and the
    /// differences are printed.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// If passed as an argument, countries present in the reference table but
    /// absent from the spreadsheet are filled with random placeholder scores.
    /// Only meant for demo rendering, never for real data.
    #[clap(long, takes_value = false)]
    pub with_random_data: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
