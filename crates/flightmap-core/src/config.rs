// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use serde::de::{DeserializeOwned, Error as _};
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::geodesic::GeoPoint;
use crate::projection::Extent;
use crate::MapError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const YELLOW: Rgb = Rgb(255, 255, 0);
    pub const BLUE: Rgb = Rgb(0, 0, 255);
    pub const RED: Rgb = Rgb(255, 0, 0);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineStyle {
    Solid,
    Dashed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerGlyph {
    Star,
    Circle,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Corner {
    UpperLeft,
    UpperRight,
    LowerLeft,
    LowerRight,
}

/// Styling for one family of route lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteStyle {
    pub line_color: Rgb,
    pub marker_color: Rgb,
    pub marker: MarkerGlyph,
    pub line_style: LineStyle,
    pub alpha: f64,
    /// Points.
    pub line_width: f64,
    /// Glyph size at the line ends, points.
    pub marker_size: f64,
    /// Destination marker size, points.
    pub dot_size: f64,
    pub label: Option<String>,
}

impl Default for RouteStyle {
    fn default() -> Self {
        Self::pre_covid()
    }
}

impl RouteStyle {
    fn pre_covid() -> Self {
        Self {
            line_color: Rgb::YELLOW,
            marker_color: Rgb::BLUE,
            marker: MarkerGlyph::Star,
            line_style: LineStyle::Solid,
            alpha: 0.7,
            line_width: 2.0,
            marker_size: 10.0,
            dot_size: 5.5,
            label: None,
        }
    }

    fn current() -> Self {
        Self {
            line_color: Rgb::BLUE,
            marker_color: Rgb::RED,
            line_style: LineStyle::Dashed,
            ..Self::pre_covid()
        }
    }
}

/// A partial style in JSON is laid over the built-in style of its own
/// dataset, so the two datasets keep distinct defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    #[serde(deserialize_with = "pre_covid_style")]
    pub pre_covid: RouteStyle,
    #[serde(deserialize_with = "current_style")]
    pub current: RouteStyle,
}

fn pre_covid_style<'de, D: Deserializer<'de>>(d: D) -> Result<RouteStyle, D::Error> {
    overlay(RouteStyle::pre_covid(), d)
}

fn current_style<'de, D: Deserializer<'de>>(d: D) -> Result<RouteStyle, D::Error> {
    overlay(RouteStyle::current(), d)
}

/// Replaces the fields of `base` named in the incoming JSON object.
fn overlay<'de, T, D>(base: T, d: D) -> Result<T, D::Error>
where
    T: Serialize + DeserializeOwned,
    D: Deserializer<'de>,
{
    let value = match serde_json::Value::deserialize(d)? {
        serde_json::Value::Object(changes) => {
            let mut value = serde_json::to_value(base).map_err(D::Error::custom)?;
            if let Some(fields) = value.as_object_mut() {
                fields.extend(changes);
            }
            value
        }
        other => other,
    };
    serde_json::from_value(value).map_err(D::Error::custom)
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            pre_covid: RouteStyle::pre_covid(),
            current: RouteStyle::current(),
        }
    }
}

/// One representative legend entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegendEntryStyle {
    pub label: String,
    pub color: Rgb,
    pub marker: MarkerGlyph,
    pub line_style: LineStyle,
    pub line_width: f64,
    pub marker_size: f64,
}

impl Default for LegendEntryStyle {
    fn default() -> Self {
        Self::pre_covid()
    }
}

impl LegendEntryStyle {
    fn pre_covid() -> Self {
        Self {
            label: "Pre-Covid (2020)".to_string(),
            color: Rgb::YELLOW,
            marker: MarkerGlyph::Star,
            line_style: LineStyle::Solid,
            line_width: 5.0,
            marker_size: 10.0,
        }
    }

    fn current() -> Self {
        Self {
            label: "2023".to_string(),
            color: Rgb::BLUE,
            line_style: LineStyle::Dashed,
            line_width: 2.0,
            ..Self::pre_covid()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegendConfig {
    #[serde(deserialize_with = "pre_covid_entry")]
    pub pre_covid: LegendEntryStyle,
    #[serde(deserialize_with = "current_entry")]
    pub current: LegendEntryStyle,
    pub corner: Corner,
    pub font_size: f64,
}

fn pre_covid_entry<'de, D: Deserializer<'de>>(d: D) -> Result<LegendEntryStyle, D::Error> {
    overlay(LegendEntryStyle::pre_covid(), d)
}

fn current_entry<'de, D: Deserializer<'de>>(d: D) -> Result<LegendEntryStyle, D::Error> {
    overlay(LegendEntryStyle::current(), d)
}

impl Default for LegendConfig {
    fn default() -> Self {
        Self {
            pre_covid: LegendEntryStyle::pre_covid(),
            current: LegendEntryStyle::current(),
            corner: Corner::UpperLeft,
            font_size: 12.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TitleConfig {
    pub heading: String,
    pub subtitle: String,
    pub attribution: String,
    pub font_size: f64,
}

impl Default for TitleConfig {
    fn default() -> Self {
        Self {
            heading: "Direct Flights from Tallinn".to_string(),
            subtitle: "Yellow: 2020 (Pre-Covid) | Blue: 2023".to_string(),
            attribution: "Glen Kink".to_string(),
            font_size: 20.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    pub font_size: f64,
    pub bold: bool,
    pub color: Rgb,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            font_size: 12.0,
            bold: true,
            color: Rgb::BLACK,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FigureConfig {
    /// Inches, as the dpi is applied to points too.
    pub width: f64,
    pub height: f64,
    pub dpi: f64,
}

impl Default for FigureConfig {
    fn default() -> Self {
        Self {
            width: 20.0,
            height: 10.0,
            dpi: 100.0,
        }
    }
}

impl FigureConfig {
    pub fn pixel_size(&self) -> (u32, u32) {
        (
            (self.width * self.dpi).round().max(1.0) as u32,
            (self.height * self.dpi).round().max(1.0) as u32,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundConfig {
    pub ocean: Rgb,
    pub land: Rgb,
    pub land_path: Option<PathBuf>,
    pub coastline_path: Option<PathBuf>,
    pub coastline_width: f64,
    pub border_path: Option<PathBuf>,
    pub border_width: f64,
    /// Degrees between graticule lines; 0 disables them.
    pub graticule_step: f64,
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            ocean: Rgb(156, 192, 214),
            land: Rgb(222, 208, 170),
            land_path: Some(PathBuf::from("data/land.geojson")),
            coastline_path: Some(PathBuf::from("data/coastline.geojson")),
            coastline_width: 2.0,
            border_path: Some(PathBuf::from("data/borders.geojson")),
            border_width: 1.0,
            graticule_step: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub pre_covid: PathBuf,
    pub current: PathBuf,
    pub airports: PathBuf,
    pub route_delimiter: char,
    pub airport_delimiter: char,
    pub key_column: String,
    pub lon_column: String,
    pub lat_column: String,
    pub pre_covid_export: Option<PathBuf>,
    pub current_export: Option<PathBuf>,
    pub output: PathBuf,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            pre_covid: PathBuf::from("data/otselennud20.csv"),
            current: PathBuf::from("data/otselennud23.csv"),
            airports: PathBuf::from("data/airports.dat"),
            route_delimiter: ';',
            airport_delimiter: ',',
            key_column: "IATA".to_string(),
            lon_column: "Longitude".to_string(),
            lat_column: "Latitude".to_string(),
            pre_covid_export: Some(PathBuf::from("pre_covid_flights.csv")),
            current_export: Some(PathBuf::from("flights_23.csv")),
            output: PathBuf::from("lennud.png"),
        }
    }
}

/// All map parameters. Every field has a built-in default, and a JSON
/// file only needs to name the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub sources: SourceConfig,
    pub origin: GeoPoint,
    pub origin_name: String,
    pub extent: Extent,
    pub figure: FigureConfig,
    pub background: BackgroundConfig,
    pub styles: StyleConfig,
    pub legend: LegendConfig,
    pub title: TitleConfig,
    pub label: LabelConfig,
    /// Maximum arc between great-circle samples, degrees.
    pub geodesic_step: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            sources: SourceConfig::default(),
            origin: GeoPoint::new(24.8004, 59.4162),
            origin_name: "Tallinn".to_string(),
            extent: Extent::default(),
            figure: FigureConfig::default(),
            background: BackgroundConfig::default(),
            styles: StyleConfig::default(),
            legend: LegendConfig::default(),
            title: TitleConfig::default(),
            label: LabelConfig::default(),
            geodesic_step: 0.5,
        }
    }
}

impl MapConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, MapError> {
        let path = path.as_ref();
        let content =
            fs::read_to_string(path).map_err(|e| MapError::source_unavailable(path, e))?;
        let config: MapConfig = serde_json::from_str(&content).map_err(|e| {
            log::error!("[Config] JSON parse error for {:?}: {}", path, e);
            MapError::Config(format!("{:?}: {}", path, e))
        })?;
        log::debug!("[Config] Loaded {:?}", path);
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, MapError> {
        serde_json::to_string_pretty(self).map_err(|e| MapError::Config(e.to_string()))
    }
}

/// CSV delimiters must be single ASCII bytes.
pub fn delimiter_byte(c: char) -> Result<u8, MapError> {
    if c.is_ascii() {
        Ok(c as u8)
    } else {
        Err(MapError::Config(format!("delimiter {:?} is not ASCII", c)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_published_map() {
        let config = MapConfig::default();
        assert_eq!(config.origin, GeoPoint::new(24.8004, 59.4162));
        assert_eq!(config.figure.pixel_size(), (2000, 1000));
        assert_eq!(config.styles.pre_covid.line_style, LineStyle::Solid);
        assert_eq!(config.styles.current.line_style, LineStyle::Dashed);
        assert_eq!(config.styles.current.marker_color, Rgb::RED);
        assert_eq!(config.legend.corner, Corner::UpperLeft);
        assert_eq!(config.sources.route_delimiter, ';');
        assert_eq!(config.sources.pre_covid, PathBuf::from("data/otselennud20.csv"));
        assert_eq!(
            config.background.coastline_path,
            Some(PathBuf::from("data/coastline.geojson"))
        );
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{
            "origin": { "lon": -0.45, "lat": 51.47 },
            "title": { "heading": "Direct Flights from London" },
            "sources": { "output": "london.png", "pre_covid_export": null }
        }"#;
        let config: MapConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.origin, GeoPoint::new(-0.45, 51.47));
        assert_eq!(config.title.heading, "Direct Flights from London");
        assert_eq!(config.title.font_size, 20.0);
        assert_eq!(config.sources.output, PathBuf::from("london.png"));
        assert_eq!(config.sources.pre_covid_export, None);
        assert_eq!(config.sources.key_column, "IATA");
        assert_eq!(config.extent, Extent::default());
    }

    #[test]
    fn test_partial_style_keeps_dataset_defaults() {
        let json = r#"{
            "styles": { "current": { "line_color": [0, 128, 0] } },
            "legend": { "current": { "label": "2024" } }
        }"#;
        let config: MapConfig = serde_json::from_str(json).unwrap();

        let current = &config.styles.current;
        assert_eq!(current.line_color, Rgb(0, 128, 0));
        assert_eq!(current.marker_color, Rgb::RED);
        assert_eq!(current.line_style, LineStyle::Dashed);
        assert_eq!(config.styles.pre_covid, StyleConfig::default().pre_covid);

        assert_eq!(config.legend.current.label, "2024");
        assert_eq!(config.legend.current.line_style, LineStyle::Dashed);
        assert_eq!(config.legend.pre_covid.line_width, 5.0);
    }

    #[test]
    fn test_bad_style_field_rejected() {
        let json = r#"{ "styles": { "pre_covid": { "line_style": "dotted" } } }"#;
        assert!(serde_json::from_str::<MapConfig>(json).is_err());
    }

    #[test]
    fn test_load_reports_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(MapConfig::load(&path), Err(MapError::Config(_))));
        assert!(matches!(
            MapConfig::load(dir.path().join("missing.json")),
            Err(MapError::SourceUnavailable { .. })
        ));
    }

    #[test]
    fn test_delimiter_byte() {
        assert_eq!(delimiter_byte(';').unwrap(), b';');
        assert!(delimiter_byte('¦').is_err());
    }
}
