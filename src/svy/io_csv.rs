// Primitives for reading CSV survey exports.

use log::{debug, info};
use snafu::prelude::*;

use crate::svy::{CsvLineParseSnafu, CsvOpenSnafu, EmptyCsvSnafu, SvyResult};

/// A raw export: the header row and the data rows, as strings.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CsvExport {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

pub fn read_export(path: &str) -> SvyResult<CsvExport> {
    info!("Attempting to read survey export {:?}", path);
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    let mut records = rdr.into_records();

    let header_r = records.next().context(EmptyCsvSnafu { path })?;
    let header = header_r.context(CsvLineParseSnafu {})?;
    let headers: Vec<String> = header.iter().map(|h| h.trim().to_string()).collect();
    debug!("header: {:?}", headers);

    let mut rows: Vec<Vec<String>> = Vec::new();
    for line_r in records {
        let line = line_r.context(CsvLineParseSnafu {})?;
        rows.push(line.iter().map(|c| c.to_string()).collect());
    }
    info!("read {} data rows, {} columns", rows.len(), headers.len());
    Ok(CsvExport { headers, rows })
}
