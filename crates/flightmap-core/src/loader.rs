// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::config::{delimiter_byte, SourceConfig};
use crate::MapError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dataset {
    PreCovid,
    Current,
}

impl Dataset {
    pub fn name(&self) -> &'static str {
        match self {
            Dataset::PreCovid => "pre-covid",
            Dataset::Current => "current",
        }
    }
}

/// A delimited table as read: one header row, string cells.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == column)
    }

    pub fn require_column(&self, column: &str) -> Result<usize, MapError> {
        self.column_index(column)
            .ok_or_else(|| MapError::SchemaMismatch {
                table: self.name.clone(),
                column: column.to_string(),
            })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Opens and reads a delimited file, checking that every `required`
/// column is present in the header.
pub fn load_table<P: AsRef<Path>>(
    path: P,
    delimiter: u8,
    required: &[&str],
) -> Result<Table, MapError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| MapError::source_unavailable(path, e))?;
    let name = path.display().to_string();
    let table = read_table(file, &name, delimiter, required)?;
    log::info!(
        "[Loader] {} rows, {} columns from {:?}",
        table.len(),
        table.headers.len(),
        path
    );
    Ok(table)
}

pub fn read_table<R: Read>(
    reader: R,
    name: &str,
    delimiter: u8,
    required: &[&str],
) -> Result<Table, MapError> {
    let unreadable = |e: csv::Error| MapError::SourceUnavailable {
        path: name.into(),
        reason: e.to_string(),
    };

    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()
        .map_err(unreadable)?
        .iter()
        .map(str::to_string)
        .collect();

    let table_name = name.to_string();
    let mut table = Table {
        name: table_name,
        headers,
        rows: Vec::new(),
    };
    for column in required {
        table.require_column(column)?;
    }

    let width = table.headers.len();
    for record in rdr.records() {
        let record = record.map_err(unreadable)?;
        let mut row: Vec<String> = record.iter().map(str::to_string).collect();
        // Short rows are padded so column indices stay valid
        if row.len() < width {
            row.resize(width, String::new());
        }
        if row.iter().all(String::is_empty) {
            continue;
        }
        table.rows.push(row);
    }

    Ok(table)
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteRecord {
    pub code: String,
    pub fields: Vec<String>,
}

/// A route list belonging to one dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteTable {
    pub dataset: Dataset,
    pub headers: Vec<String>,
    pub key_index: usize,
    pub records: Vec<RouteRecord>,
}

impl RouteTable {
    pub fn load<P: AsRef<Path>>(
        path: P,
        dataset: Dataset,
        sources: &SourceConfig,
    ) -> Result<Self, MapError> {
        let delimiter = delimiter_byte(sources.route_delimiter)?;
        let table = load_table(path, delimiter, &[sources.key_column.as_str()])?;
        Self::from_table(table, dataset, &sources.key_column)
    }

    pub fn from_table(table: Table, dataset: Dataset, key_column: &str) -> Result<Self, MapError> {
        let key_index = table.require_column(key_column)?;
        let records = table
            .rows
            .into_iter()
            .map(|fields| RouteRecord {
                code: fields[key_index].clone(),
                fields,
            })
            .collect();

        Ok(Self {
            dataset,
            headers: table.headers,
            key_index,
            records,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AirportRecord {
    pub code: String,
    pub lon: f64,
    pub lat: f64,
    pub fields: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AirportTable {
    pub headers: Vec<String>,
    pub key_index: usize,
    pub records: Vec<AirportRecord>,
}

impl AirportTable {
    pub fn load<P: AsRef<Path>>(path: P, sources: &SourceConfig) -> Result<Self, MapError> {
        let delimiter = delimiter_byte(sources.airport_delimiter)?;
        let required = [
            sources.key_column.as_str(),
            sources.lon_column.as_str(),
            sources.lat_column.as_str(),
        ];
        let table = load_table(path, delimiter, &required)?;
        Self::from_table(table, sources)
    }

    pub fn from_table(table: Table, sources: &SourceConfig) -> Result<Self, MapError> {
        let key_index = table.require_column(&sources.key_column)?;
        let lon_index = table.require_column(&sources.lon_column)?;
        let lat_index = table.require_column(&sources.lat_column)?;

        // Rows without usable coordinates cannot be joined and are left out
        let mut records = Vec::with_capacity(table.rows.len());
        let mut skipped = 0;
        for fields in table.rows {
            let code = fields[key_index].clone();
            let parsed = parse_coordinate(&code, &sources.lon_column, &fields[lon_index])
                .and_then(|lon| {
                    parse_coordinate(&code, &sources.lat_column, &fields[lat_index])
                        .map(|lat| (lon, lat))
                });
            match parsed {
                Ok((lon, lat)) => records.push(AirportRecord {
                    code,
                    lon,
                    lat,
                    fields,
                }),
                Err(e) => {
                    log::debug!("[Loader] Skipping airport row: {}", e);
                    skipped += 1;
                }
            }
        }
        if skipped > 0 {
            log::warn!(
                "[Loader] {} airport rows without usable coordinates skipped",
                skipped
            );
        }

        Ok(Self {
            headers: table.headers,
            key_index,
            records,
        })
    }
}

fn parse_coordinate(code: &str, column: &str, value: &str) -> Result<f64, MapError> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| MapError::InvalidCoordinate {
            code: code.to_string(),
            column: column.to_string(),
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_semicolon_routes() {
        let data = "Sihtkoht;IATA;Lennufirma\nLondon;LHR;Airbaltic\nRiga; RIX ;Airbaltic\n";
        let table = read_table(Cursor::new(data), "routes", b';', &["IATA"]).unwrap();

        assert_eq!(table.headers, vec!["Sihtkoht", "IATA", "Lennufirma"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[1][1], "RIX");

        let routes = RouteTable::from_table(table, Dataset::Current, "IATA").unwrap();
        assert_eq!(routes.key_index, 1);
        assert_eq!(routes.records[0].code, "LHR");
        assert_eq!(routes.records[1].fields, vec!["Riga", "RIX", "Airbaltic"]);
    }

    #[test]
    fn test_missing_key_column_is_schema_mismatch() {
        let data = "City;Code\nLondon;LHR\n";
        let err = read_table(Cursor::new(data), "routes", b';', &["IATA"]).unwrap_err();
        match err {
            MapError::SchemaMismatch { table, column } => {
                assert_eq!(table, "routes");
                assert_eq!(column, "IATA");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_wrong_delimiter_hides_key_column() {
        // A comma file read with ';' collapses into one header cell
        let data = "Name,IATA,Longitude,Latitude\nHeathrow,LHR,-0.45,51.47\n";
        assert!(matches!(
            read_table(Cursor::new(data), "airports", b';', &["IATA"]),
            Err(MapError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_short_and_blank_rows() {
        let data = "City;IATA;Carrier\nRiga;RIX\n;;\n";
        let table = read_table(Cursor::new(data), "routes", b';', &["IATA"]).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows[0], vec!["Riga", "RIX", ""]);
    }

    #[test]
    fn test_airport_coordinates_parsed() {
        let data = "Name,IATA,Longitude,Latitude\nHeathrow,LHR,-0.45,51.47\n";
        let table = read_table(Cursor::new(data), "airports", b',', &[]).unwrap();
        let airports = AirportTable::from_table(table, &SourceConfig::default()).unwrap();

        assert_eq!(airports.key_index, 1);
        let lhr = &airports.records[0];
        assert_eq!(lhr.code, "LHR");
        assert_eq!(lhr.lon, -0.45);
        assert_eq!(lhr.lat, 51.47);
    }

    #[test]
    fn test_unusable_coordinates_skipped() {
        let data = "IATA,Longitude,Latitude\nZZZ,,\nLHR,-0.45,51.47\nQQQ,west,10.0\n";
        let table = read_table(Cursor::new(data), "airports", b',', &[]).unwrap();
        let airports = AirportTable::from_table(table, &SourceConfig::default()).unwrap();

        let codes: Vec<&str> = airports.records.iter().map(|a| a.code.as_str()).collect();
        assert_eq!(codes, vec!["LHR"]);
    }

    #[test]
    fn test_coordinate_error_names_row() {
        let err = parse_coordinate("LHR", "Longitude", "west").unwrap_err();
        assert!(matches!(
            err,
            MapError::InvalidCoordinate { ref code, ref value, .. } if code == "LHR" && value == "west"
        ));
        assert!(parse_coordinate("LHR", "Latitude", "inf").is_err());
    }

    #[test]
    fn test_missing_file_is_source_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_table(dir.path().join("nope.csv"), b';', &["IATA"]).unwrap_err();
        assert!(matches!(err, MapError::SourceUnavailable { .. }));
    }
}
