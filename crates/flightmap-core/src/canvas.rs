// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! The composed map as plain data: a projection, an extent and an ordered
//! stack of layers. The renderer walks the stack bottom to top.

use crate::config::{Corner, LineStyle, MarkerGlyph, Rgb};
use crate::features::Polyline;
use crate::geodesic::GeoPoint;
use crate::loader::Dataset;
use crate::projection::{Extent, LambertCylindrical};

#[derive(Debug, Clone, PartialEq)]
pub struct BaseImage {
    pub ocean: Rgb,
    pub land_color: Rgb,
    pub land: Vec<Polyline>,
    pub graticule: Vec<Polyline>,
}

impl BaseImage {
    /// Meridians and parallels every `step` degrees inside the extent.
    pub fn graticule(extent: &Extent, step: f64) -> Vec<Polyline> {
        if step <= 0.0 {
            return Vec::new();
        }
        let mut lines = Vec::new();

        let mut lon = (extent.lon_min / step).ceil() * step;
        while lon <= extent.lon_max {
            lines.push(vec![
                GeoPoint::new(lon, extent.lat_min),
                GeoPoint::new(lon, extent.lat_max),
            ]);
            lon += step;
        }

        let mut lat = (extent.lat_min / step).ceil() * step;
        while lat <= extent.lat_max {
            lines.push(vec![
                GeoPoint::new(extent.lon_min, lat),
                GeoPoint::new(extent.lon_max, lat),
            ]);
            lat += step;
        }
        lines
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureLayer {
    pub color: Rgb,
    /// Points.
    pub width: f64,
    pub lines: Vec<Polyline>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteLine {
    pub dataset: Option<Dataset>,
    pub path: Vec<GeoPoint>,
    pub color: Rgb,
    pub line_style: LineStyle,
    pub alpha: f64,
    pub width: f64,
    /// Glyph drawn at both ends of the line.
    pub end_marker: MarkerGlyph,
    pub end_marker_size: f64,
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub position: GeoPoint,
    pub color: Rgb,
    pub glyph: MarkerGlyph,
    pub size: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub position: GeoPoint,
    pub text: String,
    pub font_size: f64,
    pub bold: bool,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TitleBlock {
    pub lines: Vec<String>,
    pub font_size: f64,
}

/// A line sample shown in the legend. Not tied to any drawn route.
#[derive(Debug, Clone, PartialEq)]
pub struct LegendLine {
    pub label: String,
    pub color: Rgb,
    pub marker: MarkerGlyph,
    pub line_style: LineStyle,
    pub width: f64,
    pub marker_size: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Legend {
    pub entries: [LegendLine; 2],
    pub corner: Corner,
    pub font_size: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Layer {
    BaseImage(BaseImage),
    Coastlines(FeatureLayer),
    Borders(FeatureLayer),
    Route(RouteLine),
    Marker(Marker),
    Label(Label),
    Title(TitleBlock),
    Legend(Legend),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    BaseImage,
    Coastlines,
    Borders,
    Route,
    Marker,
    Label,
    Title,
    Legend,
}

impl Layer {
    pub fn kind(&self) -> LayerKind {
        match self {
            Layer::BaseImage(_) => LayerKind::BaseImage,
            Layer::Coastlines(_) => LayerKind::Coastlines,
            Layer::Borders(_) => LayerKind::Borders,
            Layer::Route(_) => LayerKind::Route,
            Layer::Marker(_) => LayerKind::Marker,
            Layer::Label(_) => LayerKind::Label,
            Layer::Title(_) => LayerKind::Title,
            Layer::Legend(_) => LayerKind::Legend,
        }
    }
}

/// Opaque reference to a route line on a canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LineHandle(usize);

#[derive(Debug, Clone, PartialEq)]
pub struct MapCanvas {
    pub projection: LambertCylindrical,
    pub extent: Extent,
    pub origin: GeoPoint,
    /// Pixels.
    pub size: (u32, u32),
    pub dpi: f64,
    layers: Vec<Layer>,
}

impl MapCanvas {
    pub(crate) fn new(extent: Extent, origin: GeoPoint, size: (u32, u32), dpi: f64) -> Self {
        Self {
            projection: LambertCylindrical,
            extent,
            origin,
            size,
            dpi,
            layers: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, layer: Layer) {
        self.layers.push(layer);
    }

    pub(crate) fn push_route(&mut self, line: RouteLine) -> LineHandle {
        self.layers.push(Layer::Route(line));
        LineHandle(self.layers.len() - 1)
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn count(&self, kind: LayerKind) -> usize {
        self.layers.iter().filter(|l| l.kind() == kind).count()
    }

    pub fn line(&self, handle: LineHandle) -> Option<&RouteLine> {
        match self.layers.get(handle.0) {
            Some(Layer::Route(line)) => Some(line),
            _ => None,
        }
    }

    pub fn routes(&self) -> impl Iterator<Item = &RouteLine> {
        self.layers.iter().filter_map(|l| match l {
            Layer::Route(line) => Some(line),
            _ => None,
        })
    }

    pub fn legend(&self) -> Option<&Legend> {
        self.layers.iter().find_map(|l| match l {
            Layer::Legend(legend) => Some(legend),
            _ => None,
        })
    }

    pub fn title(&self) -> Option<&TitleBlock> {
        self.layers.iter().find_map(|l| match l {
            Layer::Title(title) => Some(title),
            _ => None,
        })
    }

    /// Typographic points to pixels.
    pub fn px(&self, points: f64) -> f64 {
        points * self.dpi / 72.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graticule_default_extent() {
        let lines = BaseImage::graticule(&Extent::default(), 10.0);
        // Meridians -20..40, parallels 30..70
        assert_eq!(lines.len(), 7 + 5);
        assert_eq!(lines[0][0], GeoPoint::new(-20.0, 25.0));
        assert!(BaseImage::graticule(&Extent::default(), 0.0).is_empty());
    }

    #[test]
    fn test_handles_resolve_only_routes() {
        let mut canvas = MapCanvas::new(Extent::default(), GeoPoint::new(0.0, 0.0), (10, 10), 72.0);
        canvas.push(Layer::Title(TitleBlock {
            lines: vec!["t".into()],
            font_size: 10.0,
        }));
        let handle = canvas.push_route(RouteLine {
            dataset: None,
            path: vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 1.0)],
            color: Rgb::RED,
            line_style: LineStyle::Solid,
            alpha: 1.0,
            width: 1.0,
            end_marker: MarkerGlyph::Star,
            end_marker_size: 10.0,
            label: None,
        });

        assert!(canvas.line(handle).is_some());
        assert_eq!(canvas.line(LineHandle(0)), None);
        assert_eq!(canvas.count(LayerKind::Route), 1);
        assert_eq!(canvas.px(12.0), 12.0);
    }
}
