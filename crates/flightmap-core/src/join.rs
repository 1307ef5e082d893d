// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use crate::geodesic::GeoPoint;
use crate::loader::{AirportRecord, AirportTable, Dataset, RouteRecord, RouteTable};
use crate::MapError;

/// A route row with the coordinates of its destination airport.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedRoute {
    pub code: String,
    pub position: GeoPoint,
    pub route_fields: Vec<String>,
    pub airport_fields: Vec<String>,
}

/// Inner join of routes against airports on the airport code.
///
/// Routes keep their input order. Unmatched routes are dropped. When the
/// airport list repeats a code, the first occurrence wins.
pub fn join(routes: &[RouteRecord], airports: &[AirportRecord]) -> Vec<JoinedRoute> {
    let mut lookup: HashMap<&str, &AirportRecord> = HashMap::with_capacity(airports.len());
    for airport in airports {
        if lookup.contains_key(airport.code.as_str()) {
            log::debug!("[Join] Duplicate airport code '{}' ignored", airport.code);
            continue;
        }
        lookup.insert(airport.code.as_str(), airport);
    }

    routes
        .iter()
        .filter_map(|route| match lookup.get(route.code.as_str()) {
            Some(airport) => Some(JoinedRoute {
                code: route.code.clone(),
                position: GeoPoint::new(airport.lon, airport.lat),
                route_fields: route.fields.clone(),
                airport_fields: airport.fields.clone(),
            }),
            None => {
                log::debug!("[Join] No airport for route code '{}'", route.code);
                None
            }
        })
        .collect()
}

/// Joined routes of one dataset plus the merged header needed to export them.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedTable {
    pub dataset: Dataset,
    pub headers: Vec<String>,
    pub routes: Vec<JoinedRoute>,
    airport_key_index: usize,
}

impl JoinedTable {
    pub fn build(routes: &RouteTable, airports: &AirportTable) -> Self {
        let joined = join(&routes.records, &airports.records);
        let dropped = routes.records.len() - joined.len();
        if dropped > 0 {
            log::warn!(
                "[Join] {}: {} of {} routes have no matching airport",
                routes.dataset.name(),
                dropped,
                routes.records.len()
            );
        }
        log::info!(
            "[Join] {}: {} routes joined",
            routes.dataset.name(),
            joined.len()
        );

        Self {
            dataset: routes.dataset,
            headers: merged_headers(routes, airports),
            routes: joined,
            airport_key_index: airports.key_index,
        }
    }

    /// Route cells followed by the airport's non-key cells.
    pub fn row(&self, route: &JoinedRoute) -> Vec<String> {
        let mut row = route.route_fields.clone();
        row.extend(
            route
                .airport_fields
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != self.airport_key_index)
                .map(|(_, v)| v.clone()),
        );
        row
    }

    pub fn export_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), MapError> {
        let path = path.as_ref();
        let failed = |reason: String| MapError::Export {
            path: path.to_path_buf(),
            reason,
        };

        let file = File::create(path).map_err(|e| failed(e.to_string()))?;
        let mut wtr = csv::WriterBuilder::new().flexible(true).from_writer(file);
        wtr.write_record(&self.headers)
            .map_err(|e| failed(e.to_string()))?;
        for route in &self.routes {
            wtr.write_record(self.row(route))
                .map_err(|e| failed(e.to_string()))?;
        }
        wtr.flush().map_err(|e| failed(e.to_string()))?;

        log::info!(
            "[Join] Exported {} {} rows to {:?}",
            self.routes.len(),
            self.dataset.name(),
            path
        );
        Ok(())
    }
}

/// Route headers, then airport headers without the key. A name present on
/// both sides gets `_x` on the route column and `_y` on the airport column.
fn merged_headers(routes: &RouteTable, airports: &AirportTable) -> Vec<String> {
    let airport_cols: Vec<&String> = airports
        .headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != airports.key_index)
        .map(|(_, h)| h)
        .collect();

    let mut headers: Vec<String> = routes
        .headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            if i != routes.key_index && airport_cols.contains(&h) {
                format!("{}_x", h)
            } else {
                h.clone()
            }
        })
        .collect();

    let route_cols: Vec<&String> = routes
        .headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != routes.key_index)
        .map(|(_, h)| h)
        .collect();
    headers.extend(airport_cols.into_iter().map(|h| {
        if route_cols.contains(&h) {
            format!("{}_y", h)
        } else {
            h.clone()
        }
    }));
    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(code: &str) -> RouteRecord {
        RouteRecord {
            code: code.to_string(),
            fields: vec![code.to_string()],
        }
    }

    fn airport(code: &str, lon: f64, lat: f64) -> AirportRecord {
        AirportRecord {
            code: code.to_string(),
            lon,
            lat,
            fields: vec![code.to_string(), lon.to_string(), lat.to_string()],
        }
    }

    #[test]
    fn test_single_match() {
        let joined = join(&[route("LHR")], &[airport("LHR", -0.45, 51.47)]);
        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].code, "LHR");
        assert_eq!(joined[0].position, GeoPoint::new(-0.45, 51.47));
    }

    #[test]
    fn test_unmatched_dropped() {
        let joined = join(&[route("XXX")], &[airport("LHR", -0.45, 51.47)]);
        assert!(joined.is_empty());
    }

    #[test]
    fn test_empty_airports() {
        assert!(join(&[route("LHR"), route("RIX")], &[]).is_empty());
        assert!(join(&[], &[airport("LHR", -0.45, 51.47)]).is_empty());
    }

    #[test]
    fn test_only_known_codes_and_order_kept() {
        let routes = [route("RIX"), route("XXX"), route("LHR"), route("RIX")];
        let airports = [airport("LHR", -0.45, 51.47), airport("RIX", 23.97, 56.92)];
        let joined = join(&routes, &airports);

        let codes: Vec<&str> = joined.iter().map(|j| j.code.as_str()).collect();
        assert_eq!(codes, vec!["RIX", "LHR", "RIX"]);
        assert!(joined.len() <= routes.len());
        for j in &joined {
            assert!(airports.iter().any(|a| a.code == j.code));
        }
    }

    #[test]
    fn test_duplicate_airport_first_wins() {
        let airports = [airport("LHR", -0.45, 51.47), airport("LHR", 99.0, 9.0)];
        let first = join(&[route("LHR")], &airports);
        let second = join(&[route("LHR")], &airports);

        assert_eq!(first.len(), 1);
        assert_eq!(first[0].position, GeoPoint::new(-0.45, 51.47));
        assert_eq!(first, second);
    }

    fn tables() -> (RouteTable, AirportTable) {
        let routes = RouteTable {
            dataset: Dataset::PreCovid,
            headers: vec!["Name".into(), "IATA".into()],
            key_index: 1,
            records: vec![RouteRecord {
                code: "LHR".into(),
                fields: vec!["London".into(), "LHR".into()],
            }],
        };
        let airports = AirportTable {
            headers: vec![
                "Name".into(),
                "IATA".into(),
                "Longitude".into(),
                "Latitude".into(),
            ],
            key_index: 1,
            records: vec![AirportRecord {
                code: "LHR".into(),
                lon: -0.45,
                lat: 51.47,
                fields: vec!["Heathrow".into(), "LHR".into(), "-0.45".into(), "51.47".into()],
            }],
        };
        (routes, airports)
    }

    #[test]
    fn test_merged_headers_suffix_collisions() {
        let (routes, airports) = tables();
        let table = JoinedTable::build(&routes, &airports);
        assert_eq!(
            table.headers,
            vec!["Name_x", "IATA", "Name_y", "Longitude", "Latitude"]
        );
        assert_eq!(
            table.row(&table.routes[0]),
            vec!["London", "LHR", "Heathrow", "-0.45", "51.47"]
        );
    }

    #[test]
    fn test_export_csv() {
        let (routes, airports) = tables();
        let table = JoinedTable::build(&routes, &airports);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pre_covid_flights.csv");
        table.export_csv(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            written,
            "Name_x,IATA,Name_y,Longitude,Latitude\nLondon,LHR,Heathrow,-0.45,51.47\n"
        );
    }

    #[test]
    fn test_export_to_missing_dir_fails() {
        let (routes, airports) = tables();
        let table = JoinedTable::build(&routes, &airports);
        let dir = tempfile::tempdir().unwrap();
        let err = table
            .export_csv(dir.path().join("no/such/dir/out.csv"))
            .unwrap_err();
        assert!(matches!(err, MapError::Export { .. }));
    }
}
