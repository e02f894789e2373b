//! CSV ingestion of GPS observations.
//!
//! Format per the reference layout: UTF-8, header line, comma-separated,
//! with longitude/latitude/speed/heading at columns 3, 4, 7, 6
//! (zero-indexed). Rows with fewer than 8 columns are skipped with a
//! warning rather than aborting the whole run.

use std::io::Read;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::MatchError;

/// One GPS fix: longitude/latitude (WGS84), speed (consistent unit, e.g.
/// m/s), heading (degrees clockwise from north, 0-360).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub lon: f64,
    pub lat: f64,
    pub speed: f64,
    pub heading: f64,
}

const LON_COL: usize = 3;
const LAT_COL: usize = 4;
const SPEED_COL: usize = 6;
const HEADING_COL: usize = 7;
const MIN_COLUMNS: usize = 8;

/// Reads observations from a headered CSV stream, skipping malformed rows
/// with a warning rather than aborting the whole run.
pub fn read_observations<R: Read>(reader: R) -> Result<Vec<Observation>, MatchError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut observations = Vec::new();

    for (row_idx, result) in rdr.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(err) => {
                warn!("row {row_idx}: failed to parse CSV record: {err}");
                continue;
            }
        };

        if record.len() < MIN_COLUMNS {
            warn!(
                "row {row_idx}: expected at least {MIN_COLUMNS} columns, got {}; skipping",
                record.len()
            );
            continue;
        }

        let parsed = [LON_COL, LAT_COL, SPEED_COL, HEADING_COL]
            .iter()
            .map(|&col| record.get(col).unwrap_or("").trim().parse::<f64>())
            .collect::<Result<Vec<f64>, _>>();

        match parsed {
            Ok(values) => observations.push(Observation {
                lon: values[0],
                lat: values[1],
                speed: values[2],
                heading: values[3],
            }),
            Err(err) => {
                warn!("row {row_idx}: unparseable numeric field: {err}; skipping");
            }
        }
    }

    Ok(observations)
}
