//! Ingestion boundary: CSV rows in, typed incidents out. All or nothing.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use chrono::NaiveDate;
use log::info;
use serde::Deserialize;

use crate::engine::CrossFilter;
use crate::types::{Incident, XfError, XfResult, DATE_FORMAT};

/// One CSV row before normalization. Extra columns are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawIncidentRow {
    #[serde(rename = "SourceAgency")]
    pub source_agency: String,
    #[serde(rename = "Category")]
    pub category: String,
    #[serde(rename = "Environment")]
    pub environment: String,
    pub date: String,
    pub year: String,
    #[serde(rename = "ConfirmedLatitude")]
    pub latitude: String,
    #[serde(rename = "ConfirmedLongitude")]
    pub longitude: String,
}

/// Read raw rows from CSV with a header line.
pub fn read_rows<R: Read>(reader: R) -> XfResult<Vec<RawIncidentRow>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for result in csv_reader.deserialize::<RawIncidentRow>() {
        rows.push(result.map_err(map_csv_error)?);
    }
    Ok(rows)
}

/// Normalize one raw row. `row` is the 1-based data row number used in errors.
pub fn normalize(row: usize, raw: RawIncidentRow) -> XfResult<Incident> {
    let category = required_text(row, "Category", &raw.category)?;
    let environment = required_text(row, "Environment", &raw.environment)?;

    let date = NaiveDate::parse_from_str(raw.date.trim(), DATE_FORMAT)
        .map_err(|e| XfError::ingest(row, "date", format!("'{}': {}", raw.date, e)))?;

    let year = raw
        .year
        .trim()
        .parse::<i32>()
        .map_err(|e| XfError::ingest(row, "year", format!("'{}': {}", raw.year, e)))?;

    let latitude = parse_coordinate(row, "ConfirmedLatitude", &raw.latitude)?;
    let longitude = parse_coordinate(row, "ConfirmedLongitude", &raw.longitude)?;

    Ok(Incident {
        source_agency: raw.source_agency.trim().to_string(),
        category,
        environment,
        date,
        year,
        latitude,
        longitude,
    })
}

fn required_text(row: usize, field: &str, value: &str) -> XfResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(XfError::ingest(row, field, "empty value"));
    }
    Ok(value.to_string())
}

fn parse_coordinate(row: usize, field: &str, value: &str) -> XfResult<f64> {
    let parsed = value
        .trim()
        .parse::<f64>()
        .map_err(|e| XfError::ingest(row, field, format!("'{}': {}", value, e)))?;
    if !parsed.is_finite() {
        return Err(XfError::ingest(row, field, format!("'{}' is not finite", value)));
    }
    Ok(parsed)
}

/// Read and normalize every incident from a CSV stream.
pub fn load_incidents<R: Read>(reader: R) -> XfResult<Vec<Incident>> {
    read_rows(reader)?
        .into_iter()
        .enumerate()
        .map(|(i, raw)| normalize(i + 1, raw))
        .collect()
}

/// Read and normalize every incident from a CSV file.
pub fn load_incidents_from_path(path: &Path) -> XfResult<Vec<Incident>> {
    let file = File::open(path)?;
    let incidents = load_incidents(BufReader::new(file))?;
    info!("Read {} incidents from {}", incidents.len(), path.display());
    Ok(incidents)
}

/// Replace the coordinator's records with the incidents of a CSV stream.
/// On any bad row the coordinator keeps its previous records.
pub fn load_into<R: Read>(xf: &mut CrossFilter<Incident>, reader: R) -> XfResult<()> {
    let rows = read_rows(reader)?;
    xf.try_load(rows, normalize)
}

fn map_csv_error(err: csv::Error) -> XfError {
    let reason = err.to_string();
    let row = err
        .position()
        .map(|p| p.record() as usize)
        .unwrap_or_default();

    match err.into_kind() {
        csv::ErrorKind::Io(e) => XfError::Io(e),
        csv::ErrorKind::Deserialize { err, .. } => {
            let field = err
                .field()
                .map(|f| format!("column {}", f + 1))
                .unwrap_or_else(|| "row".to_string());
            XfError::Ingest { row, field, reason }
        }
        kind => XfError::Ingest {
            row,
            field: "row".to_string(),
            reason: format!("{:?}", kind),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "SourceAgency,Category,Environment,date,year,ConfirmedLatitude,ConfirmedLongitude\n";

    #[test]
    fn parses_typed_fields() {
        let csv = format!("{}Police,Land,Land,2019-03-04,2019,-41.2,174.78\n", HEADER);
        let incidents = load_incidents(csv.as_bytes()).unwrap();
        assert_eq!(incidents.len(), 1);
        assert_eq!(incidents[0].year, 2019);
        assert_eq!(incidents[0].geo(), "-41.2,174.78");
        assert_eq!(incidents[0].date_label(), "2019-03-04");
    }

    #[test]
    fn bad_date_names_row_and_field() {
        let csv = format!(
            "{}Police,Land,Land,2019-03-04,2019,-41,174\nRCCNZ,Air,Air,04/03/2019,2019,-41,174\n",
            HEADER
        );
        match load_incidents(csv.as_bytes()) {
            Err(XfError::Ingest { row, field, .. }) => {
                assert_eq!(row, 2);
                assert_eq!(field, "date");
            }
            other => panic!("expected ingest error, got {:?}", other),
        }
    }

    #[test]
    fn missing_column_is_an_ingest_error() {
        let csv = "SourceAgency,Category,date\nPolice,Land,2019-03-04\n";
        assert!(matches!(
            load_incidents(csv.as_bytes()),
            Err(XfError::Ingest { .. })
        ));
    }
}
