use log::{debug, info, warn};

use snafu::{prelude::*, Snafu};

use std::fs;

use serde_json::Value as JSValue;
use text_diff::print_diff;

use survey_tally::{
    query, CanonicalRecord, ColumnBinding, ColumnPlan, Filter, FilterLogic, FilterSet,
    HeaderNormalizer, RowNormalizer, SchemaError, SchemaRegistry,
};

use crate::args::Args;

pub mod io_csv;
pub mod report;
pub mod rules;
pub mod schema_reader;
pub mod synth;

#[derive(Debug, Snafu)]
pub enum SvyError {
    #[snafu(display("Error opening csv file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Csv file {path} has no header row"))]
    EmptyCsv { path: String },
    #[snafu(display(""))]
    CsvLineParse { source: csv::Error },
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display(""))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Schema file {path} has no top-level 'questions' key"))]
    MissingQuestions { path: String },
    #[snafu(display("Unknown question type {tag:?} for question {id:?}"))]
    UnknownTypeTag { tag: String, id: String },
    #[snafu(display("{source}"))]
    Schema { source: SchemaError },
    #[snafu(display("Error writing file {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type SvyResult<T> = Result<T, SvyError>;

/// Parses one `--filter` option: `question=value`, `question!=value` to
/// negate, `|` between alternative values for the same question.
fn parse_filter_spec(spec: &str) -> SvyResult<Filter> {
    let (question, value, negate) = if let Some((q, v)) = spec.split_once("!=") {
        (q, v, true)
    } else if let Some((q, v)) = spec.split_once('=') {
        (q, v, false)
    } else {
        whatever!(
            "filter {:?} is not of the form 'question=value' or 'question!=value'",
            spec
        )
    };
    let question = question.trim();
    let values: Vec<&str> = value.split('|').map(|v| v.trim()).filter(|v| !v.is_empty()).collect();
    if question.is_empty() || values.is_empty() {
        whatever!("filter {:?} is missing a question or a value", spec)
    }
    let filter = if values.len() > 1 {
        Filter::any_of(question, &values)
    } else {
        Filter::equals(question, values[0])
    };
    Ok(if negate { filter.negated() } else { filter })
}

fn parse_filter_logic(s: Option<&str>) -> SvyResult<FilterLogic> {
    match s {
        None | Some("and") => Ok(FilterLogic::And),
        Some("or") => Ok(FilterLogic::Or),
        Some(x) => whatever!("unknown filter logic {:?} (expected 'and' or 'or')", x),
    }
}

fn build_filter_set(
    schema: &SchemaRegistry,
    specs: &[String],
    logic: Option<&str>,
) -> SvyResult<FilterSet> {
    let mut set = FilterSet::new(parse_filter_logic(logic)?);
    for spec in specs {
        let filter = parse_filter_spec(spec)?;
        set.add(schema, filter).context(SchemaSnafu {})?;
    }
    Ok(set)
}

/// Binds the export columns to the schema through the header rules.
/// Columns whose normalized question is not in the registry are dropped.
fn build_column_plan(
    schema: &SchemaRegistry,
    headers: &[String],
    normalizer: &HeaderNormalizer,
) -> ColumnPlan {
    let mut bindings: Vec<ColumnBinding> = Vec::new();
    for (col, header) in headers.iter().enumerate() {
        let norm = normalizer.normalize(header);
        if !schema.contains(&norm.id) {
            debug!("column {} ({:?}) has no schema question, dropping", col, header);
            continue;
        }
        bindings.push(ColumnBinding {
            column: col,
            question: norm.id,
            item: norm.sub_label,
        });
    }
    ColumnPlan::new(bindings)
}

fn write_json(path: &str, js: &JSValue) -> SvyResult<()> {
    let pretty = serde_json::to_string_pretty(js).context(ParsingJsonSnafu {})?;
    if path == "stdout" {
        println!("{}", pretty);
    } else {
        fs::write(path, pretty).context(WritingOutputSnafu { path })?;
        info!("wrote {}", path);
    }
    Ok(())
}

fn read_reference(path: &str) -> SvyResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

/// The whole pipeline: read, schema (loaded or synthesized), normalize,
/// filter, and write whatever outputs were asked for.
pub fn run_analysis(args: &Args) -> SvyResult<()> {
    let export = io_csv::read_export(&args.input)?;
    let normalizer = rules::normalizer();

    // In synthesis mode the plan comes from the synthesis pass itself, so
    // columns skipped over a key collision stay out of normalization too.
    let (schema, plan) = match &args.schema {
        Some(path) => {
            let schema = schema_reader::read_schema(path)?;
            let plan = build_column_plan(&schema, &export.headers, &normalizer);
            (schema, plan)
        }
        None => {
            let synthesized = synth::synthesize(&export, &normalizer, args.comma_lists)?;
            report::print_schema_summary(&synthesized);
            (synthesized.schema, synthesized.plan)
        }
    };
    let mut row_normalizer = RowNormalizer::new(&schema, &plan);
    row_normalizer.comma_fallback = args.comma_lists;
    let records = row_normalizer.normalize_all(&export.rows);

    let filters = build_filter_set(&schema, &args.filter, args.filter_logic.as_deref())?;
    let kept: Vec<CanonicalRecord> = filters.apply(&records);
    info!(
        "{} of {} respondents match the filters",
        kept.len(),
        records.len()
    );

    if let Some(out) = &args.out {
        let js = report::records_json(&schema, &kept);
        write_json(out, &js)?;
    }

    if let Some(question) = &args.counts {
        let tally = query::flat_counts(&schema, &kept, question).context(SchemaSnafu {})?;
        println!("{}:", question);
        for (key, count) in tally.entries() {
            println!("  {}: {}", key, count);
        }
    }

    if args.report.is_some() || args.reference.is_some() {
        let report_js = report::aggregate_report(&schema, &kept)?;
        let pretty = serde_json::to_string_pretty(&report_js).context(ParsingJsonSnafu {})?;
        if let Some(path) = &args.report {
            write_json(path, &report_js)?;
        }
        // The reference report, if provided for comparison
        if let Some(path) = &args.reference {
            let reference = read_reference(path)?;
            let pretty_ref =
                serde_json::to_string_pretty(&reference).context(ParsingJsonSnafu {})?;
            if pretty_ref != pretty {
                warn!("Found differences with the reference report");
                print_diff(pretty_ref.as_str(), pretty.as_str(), "\n");
                whatever!("Difference detected between produced report and reference report")
            }
            info!("produced report matches the reference");
        }
    }

    Ok(())
}
