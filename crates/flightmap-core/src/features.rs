// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use geojson::{GeoJson, Geometry, Value};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use crate::config::BackgroundConfig;
use crate::geodesic::GeoPoint;
use crate::MapError;

pub type Polyline = Vec<GeoPoint>;

/// Vector geometry for the background layers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Background {
    /// Exterior rings of land polygons, filled on the base image.
    pub land: Vec<Polyline>,
    pub coastlines: Vec<Polyline>,
    pub borders: Vec<Polyline>,
}

impl Background {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Loads the configured GeoJSON files. Unset paths give empty layers.
    pub fn load(config: &BackgroundConfig) -> Result<Self, MapError> {
        Ok(Self {
            land: load_optional(config.land_path.as_deref(), "land", Shape::Rings)?,
            coastlines: load_optional(config.coastline_path.as_deref(), "coastline", Shape::Lines)?,
            borders: load_optional(config.border_path.as_deref(), "border", Shape::Lines)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Shape {
    /// Polygon exterior rings only.
    Rings,
    /// Every line, including polygon outlines.
    Lines,
}

fn load_optional(path: Option<&Path>, layer: &str, shape: Shape) -> Result<Vec<Polyline>, MapError> {
    let Some(path) = path else {
        log::warn!("[Features] No {} data configured; layer left empty", layer);
        return Ok(Vec::new());
    };

    let file = File::open(path).map_err(|e| MapError::source_unavailable(path, e))?;
    let lines = read_geojson(BufReader::new(file), shape)
        .map_err(|e| MapError::source_unavailable(path, e))?;
    log::info!(
        "[Features] {} {} polylines from {:?}",
        lines.len(),
        layer,
        path
    );
    Ok(lines)
}

fn read_geojson<R: Read>(reader: R, shape: Shape) -> Result<Vec<Polyline>, geojson::Error> {
    let geojson = GeoJson::from_reader(reader)?;
    let mut out = Vec::new();
    match geojson {
        GeoJson::FeatureCollection(collection) => {
            for feature in collection.features {
                if let Some(geometry) = feature.geometry {
                    collect_geometry(&geometry, shape, &mut out);
                }
            }
        }
        GeoJson::Feature(feature) => {
            if let Some(geometry) = feature.geometry {
                collect_geometry(&geometry, shape, &mut out);
            }
        }
        GeoJson::Geometry(geometry) => collect_geometry(&geometry, shape, &mut out),
    }
    Ok(out)
}

fn collect_geometry(geometry: &Geometry, shape: Shape, out: &mut Vec<Polyline>) {
    match &geometry.value {
        Value::LineString(line) if shape == Shape::Lines => out.push(to_polyline(line)),
        Value::MultiLineString(lines) if shape == Shape::Lines => {
            out.extend(lines.iter().map(|l| to_polyline(l)));
        }
        Value::Polygon(rings) => push_rings(rings, shape, out),
        Value::MultiPolygon(polygons) => {
            for rings in polygons {
                push_rings(rings, shape, out);
            }
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                collect_geometry(g, shape, out);
            }
        }
        _ => {}
    }
}

fn push_rings(rings: &[Vec<Vec<f64>>], shape: Shape, out: &mut Vec<Polyline>) {
    match shape {
        Shape::Rings => out.extend(rings.first().map(|r| to_polyline(r))),
        Shape::Lines => out.extend(rings.iter().map(|r| to_polyline(r))),
    }
}

fn to_polyline(positions: &[Vec<f64>]) -> Polyline {
    positions
        .iter()
        .filter(|p| p.len() >= 2)
        .map(|p| GeoPoint::new(p[0], p[1]))
        .collect()
}
