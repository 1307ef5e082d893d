// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

pub mod canvas;
pub mod composer;
pub mod config;
pub mod features;
pub mod geodesic;
pub mod join;
pub mod loader;
pub mod projection;
pub mod render;

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::composer::Composer;
use crate::config::MapConfig;
use crate::features::Background;
use crate::join::JoinedTable;
use crate::loader::{AirportTable, Dataset, RouteTable};

pub use crate::canvas::MapCanvas;
pub use crate::geodesic::GeoPoint;

#[derive(Error, Debug)]
pub enum MapError {
    #[error("Source unavailable: {path:?}: {reason}")]
    SourceUnavailable { path: PathBuf, reason: String },
    #[error("Schema mismatch in {table}: missing column '{column}'")]
    SchemaMismatch { table: String, column: String },
    #[error("Invalid {column} value '{value}' for airport '{code}'")]
    InvalidCoordinate {
        code: String,
        column: String,
        value: String,
    },
    #[error("Invalid origin: lon {lon}, lat {lat}")]
    InvalidOrigin { lon: f64, lat: f64 },
    #[error("Invalid map extent: {0}")]
    InvalidExtent(String),
    #[error("Export to {path:?} failed: {reason}")]
    Export { path: PathBuf, reason: String },
    #[error("Render error: {0}")]
    Render(String),
    #[error("Config error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MapError {
    pub(crate) fn source_unavailable(path: &Path, reason: impl ToString) -> Self {
        MapError::SourceUnavailable {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

/// The three input tables, loaded and typed.
#[derive(Debug, Clone)]
pub struct Datasets {
    pub pre_covid: RouteTable,
    pub current: RouteTable,
    pub airports: AirportTable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DatasetSummary {
    pub dataset: Dataset,
    pub loaded: usize,
    pub joined: usize,
    pub dropped: usize,
    /// Destination code and great-circle distance in km of the longest route.
    pub longest: Option<(String, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    pub datasets: Vec<DatasetSummary>,
    pub exports: Vec<PathBuf>,
    pub image: PathBuf,
}

/// Top-level driver: load, join, optionally export, compose and render.
pub struct FlightMap {
    pub config: MapConfig,
}

impl FlightMap {
    pub fn new(config: MapConfig) -> Self {
        Self { config }
    }

    pub fn load(&self) -> Result<Datasets, MapError> {
        let sources = &self.config.sources;
        let pre_covid = RouteTable::load(&sources.pre_covid, Dataset::PreCovid, sources)?;
        let current = RouteTable::load(&sources.current, Dataset::Current, sources)?;
        let airports = AirportTable::load(&sources.airports, sources)?;
        Ok(Datasets {
            pre_covid,
            current,
            airports,
        })
    }

    pub fn merge(&self, data: &Datasets) -> (JoinedTable, JoinedTable) {
        (
            JoinedTable::build(&data.pre_covid, &data.airports),
            JoinedTable::build(&data.current, &data.airports),
        )
    }

    /// Writes the configured joined exports and returns the paths written.
    pub fn export(
        &self,
        pre_covid: &JoinedTable,
        current: &JoinedTable,
    ) -> Result<Vec<PathBuf>, MapError> {
        let sources = &self.config.sources;
        let mut written = Vec::new();
        for (table, target) in [
            (pre_covid, &sources.pre_covid_export),
            (current, &sources.current_export),
        ] {
            if let Some(path) = target {
                table.export_csv(path)?;
                written.push(path.clone());
            }
        }
        Ok(written)
    }

    pub fn compose(
        &self,
        pre_covid: &JoinedTable,
        current: &JoinedTable,
    ) -> Result<MapCanvas, MapError> {
        let background = Background::load(&self.config.background)?;
        composer::compose(&self.config, background, &pre_covid.routes, &current.routes)
    }

    /// Runs the whole pipeline. Configuration is validated before any
    /// source is opened, so a bad origin never leaves partial artifacts.
    pub fn run(&self, export: bool) -> Result<PipelineReport, MapError> {
        Composer::validate(&self.config)?;

        let data = self.load()?;
        let (pre_covid, current) = self.merge(&data);

        let exports = if export {
            self.export(&pre_covid, &current)?
        } else {
            Vec::new()
        };

        let canvas = self.compose(&pre_covid, &current)?;
        let image = self.config.sources.output.clone();
        render::render_png(&canvas, &image)?;
        log::info!("[FlightMap] Map written to {:?}", image);

        let datasets = vec![
            self.summarize(&data.pre_covid, &pre_covid),
            self.summarize(&data.current, &current),
        ];

        Ok(PipelineReport {
            datasets,
            exports,
            image,
        })
    }

    fn summarize(&self, routes: &RouteTable, joined: &JoinedTable) -> DatasetSummary {
        let origin = self.config.origin;
        let longest = joined
            .routes
            .iter()
            .map(|r| (r.code.clone(), geodesic::haversine_km(origin, r.position)))
            .max_by(|a, b| a.1.total_cmp(&b.1));

        DatasetSummary {
            dataset: routes.dataset,
            loaded: routes.records.len(),
            joined: joined.routes.len(),
            dropped: routes.records.len() - joined.routes.len(),
            longest,
        }
    }
}
