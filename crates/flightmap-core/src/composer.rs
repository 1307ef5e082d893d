// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use crate::canvas::{
    BaseImage, FeatureLayer, Label, Layer, Legend, LegendLine, LineHandle, MapCanvas, Marker,
    RouteLine, TitleBlock,
};
use crate::config::{LegendEntryStyle, MapConfig, Rgb, RouteStyle};
use crate::features::Background;
use crate::geodesic::{self, GeoPoint};
use crate::join::JoinedRoute;
use crate::loader::Dataset;
use crate::MapError;

/// Builds a [`MapCanvas`] layer by layer for one configuration.
pub struct Composer<'a> {
    config: &'a MapConfig,
    canvas: MapCanvas,
}

impl<'a> Composer<'a> {
    pub fn validate(config: &MapConfig) -> Result<(), MapError> {
        if !config.origin.is_valid() {
            return Err(MapError::InvalidOrigin {
                lon: config.origin.lon,
                lat: config.origin.lat,
            });
        }
        config.extent.validate()
    }

    /// Canvas setup: validates the origin and extent, then stacks the base
    /// image, coastlines and borders.
    pub fn new(config: &'a MapConfig, background: Background) -> Result<Self, MapError> {
        Self::validate(config)?;

        let mut canvas = MapCanvas::new(
            config.extent,
            config.origin,
            config.figure.pixel_size(),
            config.figure.dpi,
        );

        let bg = &config.background;
        canvas.push(Layer::BaseImage(BaseImage {
            ocean: bg.ocean,
            land_color: bg.land,
            land: background.land,
            graticule: BaseImage::graticule(&config.extent, bg.graticule_step),
        }));
        canvas.push(Layer::Coastlines(FeatureLayer {
            color: Rgb::BLACK,
            width: bg.coastline_width,
            lines: background.coastlines,
        }));
        canvas.push(Layer::Borders(FeatureLayer {
            color: Rgb::BLACK,
            width: bg.border_width,
            lines: background.borders,
        }));

        log::debug!(
            "[Composer] Canvas {}x{} px, origin {} ({}, {})",
            canvas.size.0,
            canvas.size.1,
            config.origin_name,
            config.origin.lon,
            config.origin.lat
        );

        Ok(Self { config, canvas })
    }

    /// Draws one great-circle route from the origin with a marker and a
    /// code label at the destination.
    pub fn draw_route(
        &mut self,
        dataset: Option<Dataset>,
        code: &str,
        destination: GeoPoint,
        style: &RouteStyle,
    ) -> LineHandle {
        let origin = self.config.origin;
        let path = geodesic::great_circle(origin, destination, self.config.geodesic_step);

        let handle = self.canvas.push_route(RouteLine {
            dataset,
            path,
            color: style.line_color,
            line_style: style.line_style,
            alpha: style.alpha,
            width: style.line_width,
            end_marker: style.marker,
            end_marker_size: style.marker_size,
            label: style.label.clone(),
        });
        self.canvas.push(Layer::Marker(Marker {
            position: destination,
            color: style.marker_color,
            glyph: style.marker,
            size: style.dot_size,
        }));
        self.canvas.push(Layer::Label(Label {
            position: destination,
            text: code.to_string(),
            font_size: self.config.label.font_size,
            bold: self.config.label.bold,
            color: self.config.label.color,
        }));

        log::debug!(
            "[Composer] {} -> {}: {:.0} km",
            self.config.origin_name,
            code,
            geodesic::haversine_km(origin, destination)
        );
        handle
    }

    /// Draws every joined route of a dataset, in row order.
    pub fn draw_dataset(
        &mut self,
        dataset: Dataset,
        routes: &[JoinedRoute],
        style: &RouteStyle,
    ) -> Vec<LineHandle> {
        routes
            .iter()
            .map(|r| self.draw_route(Some(dataset), &r.code, r.position, style))
            .collect()
    }

    /// Adds the title block and the two-entry legend.
    pub fn decorate(&mut self) {
        let config = self.config;
        let title = &config.title;
        self.canvas.push(Layer::Title(TitleBlock {
            lines: vec![
                title.heading.clone(),
                title.subtitle.clone(),
                title.attribution.clone(),
            ],
            font_size: title.font_size,
        }));

        let legend = &config.legend;
        self.canvas.push(Layer::Legend(Legend {
            entries: [
                representative_line(&legend.pre_covid),
                representative_line(&legend.current),
            ],
            corner: legend.corner,
            font_size: legend.font_size,
        }));
    }

    pub fn finish(self) -> MapCanvas {
        self.canvas
    }
}

pub fn representative_line(entry: &LegendEntryStyle) -> LegendLine {
    LegendLine {
        label: entry.label.clone(),
        color: entry.color,
        marker: entry.marker,
        line_style: entry.line_style,
        width: entry.line_width,
        marker_size: entry.marker_size,
    }
}

/// Canvas setup, both datasets (pre-covid first), then title and legend.
pub fn compose(
    config: &MapConfig,
    background: Background,
    pre_covid: &[JoinedRoute],
    current: &[JoinedRoute],
) -> Result<MapCanvas, MapError> {
    let mut composer = Composer::new(config, background)?;
    composer.draw_dataset(Dataset::PreCovid, pre_covid, &config.styles.pre_covid);
    composer.draw_dataset(Dataset::Current, current, &config.styles.current);
    composer.decorate();

    let canvas = composer.finish();
    log::info!(
        "[Composer] {} routes on {} layers",
        pre_covid.len() + current.len(),
        canvas.layers().len()
    );
    Ok(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::LayerKind;
    use crate::config::LineStyle;

    fn joined(code: &str, lon: f64, lat: f64) -> JoinedRoute {
        JoinedRoute {
            code: code.to_string(),
            position: GeoPoint::new(lon, lat),
            route_fields: vec![code.to_string()],
            airport_fields: Vec::new(),
        }
    }

    #[test]
    fn test_setup_stacks_background_in_order() {
        let config = MapConfig::default();
        let canvas = Composer::new(&config, Background::empty()).unwrap().finish();
        let kinds: Vec<LayerKind> = canvas.layers().iter().map(|l| l.kind()).collect();
        assert_eq!(
            kinds,
            vec![LayerKind::BaseImage, LayerKind::Coastlines, LayerKind::Borders]
        );
        match &canvas.layers()[1] {
            Layer::Coastlines(layer) => assert_eq!(layer.width, 2.0),
            other => panic!("unexpected layer {:?}", other),
        }
    }

    #[test]
    fn test_invalid_origin_rejected() {
        let config = MapConfig {
            origin: GeoPoint::new(24.8, 120.0),
            ..MapConfig::default()
        };
        assert!(matches!(
            Composer::new(&config, Background::empty()),
            Err(MapError::InvalidOrigin { .. })
        ));
    }

    #[test]
    fn test_draw_route_adds_line_marker_label() {
        let config = MapConfig::default();
        let mut composer = Composer::new(&config, Background::empty()).unwrap();
        let handle = composer.draw_route(None, "LHR", GeoPoint::new(-0.45, 51.47), &config.styles.current);
        let canvas = composer.finish();

        let line = canvas.line(handle).unwrap();
        assert_eq!(line.path.first(), Some(&config.origin));
        assert_eq!(line.path.last(), Some(&GeoPoint::new(-0.45, 51.47)));
        assert!(line.path.len() > 2);
        assert_eq!(line.line_style, LineStyle::Dashed);

        assert_eq!(canvas.count(LayerKind::Marker), 1);
        match canvas.layers().last() {
            Some(Layer::Label(label)) => assert_eq!(label.text, "LHR"),
            other => panic!("expected label, got {:?}", other),
        }
    }

    #[test]
    fn test_object_counts_match_rows() {
        let config = MapConfig::default();
        let pre = vec![joined("LHR", -0.45, 51.47), joined("RIX", 23.97, 56.92)];
        let cur = vec![
            joined("CDG", 2.55, 49.01),
            joined("FRA", 8.57, 50.03),
            joined("HEL", 24.96, 60.32),
        ];
        let canvas = compose(&config, Background::empty(), &pre, &cur).unwrap();

        assert_eq!(canvas.count(LayerKind::Route), 5);
        assert_eq!(canvas.count(LayerKind::Marker), 5);
        assert_eq!(canvas.count(LayerKind::Label), 5);

        // Dataset-then-row order
        let codes: Vec<String> = canvas
            .layers()
            .iter()
            .filter_map(|l| match l {
                Layer::Label(label) => Some(label.text.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(codes, vec!["LHR", "RIX", "CDG", "FRA", "HEL"]);
        let datasets: Vec<Option<Dataset>> = canvas.routes().map(|r| r.dataset).collect();
        assert_eq!(datasets[1], Some(Dataset::PreCovid));
        assert_eq!(datasets[2], Some(Dataset::Current));
    }

    #[test]
    fn test_legend_independent_of_rows() {
        let config = MapConfig::default();
        let empty = compose(&config, Background::empty(), &[], &[]).unwrap();
        let full = compose(
            &config,
            Background::empty(),
            &[joined("LHR", -0.45, 51.47)],
            &[joined("CDG", 2.55, 49.01)],
        )
        .unwrap();

        assert_eq!(empty.count(LayerKind::Route), 0);
        assert_eq!(empty.count(LayerKind::Legend), 1);
        assert_eq!(empty.legend(), full.legend());

        let legend = full.legend().unwrap();
        assert_eq!(legend.entries[0].label, "Pre-Covid (2020)");
        assert_eq!(legend.entries[0].width, 5.0);
        assert_eq!(legend.entries[1].line_style, LineStyle::Dashed);
    }

    #[test]
    fn test_title_lines() {
        let config = MapConfig::default();
        let canvas = compose(&config, Background::empty(), &[], &[]).unwrap();
        let title = canvas.title().unwrap();
        assert_eq!(title.lines[0], "Direct Flights from Tallinn");
        assert_eq!(title.lines.len(), 3);
        assert_eq!(canvas.count(LayerKind::Title), 1);
    }
}
