// Serializes the catalog, the per-country values and the aggregated scores
// into the artifact set consumed by the website.

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use snafu::prelude::*;
use text_diff::print_diff;

use rtei_scoring::{
    c3_scores, nest_indicators, nest_themes, Indicator, IndicatorNode, Theme, ThemeNode, Value,
    ValueMap, NO_DATA,
};

use crate::build::context::{BuildConfig, PipelineContext};
use crate::build::extract::{self, ExtractOptions};
use crate::build::{BuildResult, SerializingJsonSnafu, WritingCsvSnafu, WritingOutputSnafu};

/// The nested indicator catalog, `indicators.json`.
pub fn write_indicators_json(ctx: &PipelineContext, catalog: &[Indicator]) -> BuildResult<()> {
    let nested = nest_indicators(catalog);
    let js = JSValue::Array(nested.iter().map(indicator_node_to_json).collect());
    write_json(ctx, "indicators.json", &js)
}

/// The flat catalog, `indicators.csv`.
pub fn write_indicators_csv(ctx: &PipelineContext, catalog: &[Indicator]) -> BuildResult<()> {
    let path = out_path(ctx, "indicators.csv");
    let display = path.display().to_string();
    let mut writer = csv::Writer::from_path(&path).context(WritingCsvSnafu {
        path: display.clone(),
    })?;
    writer
        .write_record(["code", "title", "core", "level"])
        .context(WritingCsvSnafu {
            path: display.clone(),
        })?;
    for indicator in catalog {
        writer
            .write_record([
                indicator.code.clone(),
                indicator.title.clone(),
                indicator.core.to_string(),
                indicator.level.to_string(),
            ])
            .context(WritingCsvSnafu {
                path: display.clone(),
            })?;
    }
    writer
        .flush()
        .context(WritingOutputSnafu { path: display })?;
    info!("Wrote {}", path.display());
    Ok(())
}

/// The nested theme catalog with the mapped indicator lists, `themes.json`.
pub fn write_themes_json(ctx: &PipelineContext, themes: &[Theme]) -> BuildResult<()> {
    if themes.is_empty() {
        warn!("No themes found in the workbook; writing an empty themes file");
    }
    let nested = nest_themes(themes);
    let js = JSValue::Array(nested.iter().map(theme_node_to_json).collect());
    write_json(ctx, "themes.json", &js)
}

/// The level-1/level-2 scores with their roll-ups, as both
/// `scores_per_country.json` and `scores_per_country.csv`.
pub fn write_scores_per_country(ctx: &PipelineContext, catalog: &[Indicator]) -> BuildResult<()> {
    let data = extract::extract_countries(ctx, catalog, &ExtractOptions::SCORES);

    let mut obj = JSMap::new();
    for country in &data {
        obj.insert(country.iso2.clone(), values_to_json(&country.values));
    }
    write_json(ctx, "scores_per_country.json", &JSValue::Object(obj))?;

    let path = out_path(ctx, "scores_per_country.csv");
    let display = path.display().to_string();
    let mut writer = csv::Writer::from_path(&path).context(WritingCsvSnafu {
        path: display.clone(),
    })?;
    writer
        .write_record(["country_code", "indicator_code", "value"])
        .context(WritingCsvSnafu {
            path: display.clone(),
        })?;
    for country in &data {
        for (code, value) in &country.values {
            writer
                .write_record([country.iso2.clone(), code.clone(), value_to_csv(value)])
                .context(WritingCsvSnafu {
                    path: display.clone(),
                })?;
        }
    }
    writer
        .flush()
        .context(WritingOutputSnafu { path: display })?;
    info!("Wrote {}", path.display());
    Ok(())
}

/// The chart-ready view, `c3_scores_per_country.json`: one object per real
/// country with the proportional scores, the theme scores and the display
/// name.
pub fn write_c3_scores_per_country(
    ctx: &PipelineContext,
    catalog: &[Indicator],
    themes: &[Theme],
) -> BuildResult<()> {
    let data = extract::extract_countries(ctx, catalog, &ExtractOptions::SCORES);
    let theme_scores = extract::theme_scores(ctx, themes);

    let mut array: Vec<JSValue> = Vec::new();
    for country in data.iter().filter(|c| !c.synthetic) {
        let mut obj = JSMap::new();
        obj.insert("name".to_string(), json!(country.name));
        for (code, value) in c3_scores(&country.values) {
            obj.insert(code, value_to_json(&value));
        }
        if let Some(scores) = theme_scores.get(&country.iso2) {
            for (code, score) in scores {
                let js = match score {
                    Some(x) => json!(x),
                    None => JSValue::Null,
                };
                obj.insert(format!("t{}", code), js);
            }
        }
        array.push(JSValue::Object(obj));
    }
    write_json(ctx, "c3_scores_per_country.json", &JSValue::Array(array))
}

/// One `<ISO2>.json` file per real country, with the full per-indicator
/// values.
pub fn write_country_files(ctx: &PipelineContext, catalog: &[Indicator]) -> BuildResult<()> {
    let data = extract::extract_countries(ctx, catalog, &ExtractOptions::FULL);
    for country in data.iter().filter(|c| !c.synthetic) {
        let file_name = format!("{}.json", country.iso2);
        write_json(ctx, &file_name, &values_to_json(&country.values))?;
    }
    Ok(())
}

/// The `countries_with_data.json` index, ISO-2 code to display name. Only
/// countries with real survey data are listed.
pub fn write_countries_with_data(ctx: &PipelineContext) -> BuildResult<()> {
    let mut obj = JSMap::new();
    for row in extract::country_rows(ctx) {
        let name = ctx
            .countries
            .name_for(&row.iso2)
            .unwrap_or(row.name.as_str())
            .to_string();
        obj.insert(row.iso2, json!(name));
    }
    write_json(ctx, "countries_with_data.json", &JSValue::Object(obj))
}

fn indicator_node_to_json(node: &IndicatorNode) -> JSValue {
    json!({
        "code": node.code,
        "title": node.title,
        "level": node.level,
        "core": node.core,
        "children": node
            .children
            .iter()
            .map(indicator_node_to_json)
            .collect::<Vec<JSValue>>(),
    })
}

fn theme_node_to_json(node: &ThemeNode) -> JSValue {
    json!({
        "code": node.code,
        "title": node.title,
        "level": node.level,
        "indicators": node
            .indicators
            .iter()
            .map(|m| json!({"code": m.code, "title": m.title}))
            .collect::<Vec<JSValue>>(),
        "children": node
            .children
            .iter()
            .map(theme_node_to_json)
            .collect::<Vec<JSValue>>(),
    })
}

fn values_to_json(values: &ValueMap) -> JSValue {
    let mut obj = JSMap::new();
    for (code, value) in values {
        obj.insert(code.clone(), value_to_json(value));
    }
    JSValue::Object(obj)
}

fn value_to_json(value: &Value) -> JSValue {
    match value {
        Value::Num(x) => json!(x),
        Value::Text(s) => json!(s),
        Value::NoData => json!(NO_DATA),
        Value::Missing => JSValue::Null,
    }
}

fn value_to_csv(value: &Value) -> String {
    match value {
        Value::Num(x) => format!("{}", x),
        Value::Text(s) => s.clone(),
        Value::NoData => NO_DATA.to_string(),
        Value::Missing => String::new(),
    }
}

fn out_path(ctx: &PipelineContext, file_name: &str) -> PathBuf {
    Path::new(&ctx.config.output_dir).join(file_name)
}

/// Serializes and writes one JSON artifact. Write failures are fatal: there
/// is no partial-output recovery.
fn write_json(ctx: &PipelineContext, file_name: &str, js: &JSValue) -> BuildResult<()> {
    let pretty = serde_json::to_string_pretty(js).context(SerializingJsonSnafu {
        name: file_name.to_string(),
    })?;
    let path = out_path(ctx, file_name);
    fs::write(&path, &pretty).context(WritingOutputSnafu {
        path: path.display().to_string(),
    })?;
    info!("Wrote {}", path.display());
    check_reference(&ctx.config, file_name, &pretty);
    Ok(())
}

/// Compares a produced artifact against the previously published copy, when
/// a reference directory was given. Differences are printed but do not abort
/// the build.
fn check_reference(config: &BuildConfig, file_name: &str, produced: &str) {
    let reference_dir = match &config.reference_dir {
        Some(d) => d,
        None => return,
    };
    let reference_path = Path::new(reference_dir).join(file_name);
    match fs::read_to_string(&reference_path) {
        Ok(reference) => {
            if reference != produced {
                warn!(
                    "Found differences with the reference file {}",
                    reference_path.display()
                );
                print_diff(reference.as_str(), produced, "\n");
            }
        }
        Err(e) => warn!(
            "Could not read the reference file {}: {}",
            reference_path.display(),
            e
        ),
    }
}
