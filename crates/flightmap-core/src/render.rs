// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::element::DashedPathElement;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::Path;

use crate::canvas::{
    BaseImage, FeatureLayer, Label, Layer, Legend, MapCanvas, Marker, RouteLine, TitleBlock,
};
use crate::config::{Corner, LineStyle, MarkerGlyph, Rgb};
use crate::features::Polyline;
use crate::projection::ProjectedBounds;
use crate::MapError;

type MapChart<'a, DB> = ChartContext<'a, DB, Cartesian2d<RangedCoordf64, RangedCoordf64>>;
type DrawResult<DB> = Result<(), DrawingAreaErrorKind<<DB as DrawingBackend>::ErrorType>>;

// Fractions of the figure reserved around the map (left, top, right, bottom).
const AXES_BOX: (f64, f64, f64, f64) = (0.125, 0.12, 0.9, 0.89);

// Dash on/off lengths in multiples of the line width.
const DASH_ON: f64 = 3.7;
const DASH_OFF: f64 = 1.6;

/// Rasterizes the canvas into a PNG file. The backend is flushed and
/// released before this returns.
pub fn render_png<P: AsRef<Path>>(canvas: &MapCanvas, path: P) -> Result<(), MapError> {
    let path = path.as_ref();
    let root = BitMapBackend::new(path, canvas.size).into_drawing_area();
    draw(canvas, &root).map_err(|e| MapError::Render(e.to_string()))?;
    root.present()
        .map_err(|e| MapError::Render(format!("{:?}: {}", path, e)))?;
    log::debug!("[Render] {}x{} px to {:?}", canvas.size.0, canvas.size.1, path);
    Ok(())
}

/// Figure margins in pixels (top, bottom, left, right) leaving a plot area
/// with the aspect ratio of the projected extent, centred in the axes box.
pub fn plot_margins(size: (u32, u32), bounds: &ProjectedBounds) -> (u32, u32, u32, u32) {
    let (w, h) = (size.0 as f64, size.1 as f64);
    let (l, t, r, b) = AXES_BOX;
    let (avail_w, avail_h) = ((r - l) * w, (b - t) * h);

    let scale = (avail_w / bounds.width()).min(avail_h / bounds.height());
    let pad_x = (avail_w - bounds.width() * scale) / 2.0;
    let pad_y = (avail_h - bounds.height() * scale) / 2.0;

    let left = (l * w + pad_x).round();
    let top = (t * h + pad_y).round();
    let right = ((1.0 - r) * w + pad_x).round();
    let bottom = ((1.0 - b) * h + pad_y).round();
    (top as u32, bottom as u32, left as u32, right as u32)
}

pub fn draw<DB: DrawingBackend>(
    canvas: &MapCanvas,
    root: &DrawingArea<DB, Shift>,
) -> DrawResult<DB> {
    let bounds = canvas.projection.bounds(&canvas.extent);
    let (top, bottom, left, right) = plot_margins(canvas.size, &bounds);

    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(root)
        .margin_top(top)
        .margin_bottom(bottom)
        .margin_left(left)
        .margin_right(right)
        .build_cartesian_2d(bounds.x_min..bounds.x_max, bounds.y_min..bounds.y_max)?;

    let mut painter = Painter {
        canvas,
        chart: &mut chart,
    };
    for layer in canvas.layers() {
        match layer {
            Layer::BaseImage(base) => painter.base(base)?,
            Layer::Coastlines(lines) | Layer::Borders(lines) => painter.features(lines)?,
            Layer::Route(route) => painter.route(route)?,
            Layer::Marker(marker) => painter.marker(marker)?,
            Layer::Label(label) => painter.label(label)?,
            Layer::Title(_) | Layer::Legend(_) => {}
        }
    }

    // Series are not clipped to the plot area, so the margins are repainted
    // before the frame and the overlays go on top.
    let (xs, ys) = painter.chart.plotting_area().get_pixel_range();
    let (w, h) = (canvas.size.0 as i32, canvas.size.1 as i32);
    for corners in [
        [(0, 0), (w, ys.start)],
        [(0, ys.end), (w, h)],
        [(0, ys.start), (xs.start, ys.end)],
        [(xs.end, ys.start), (w, ys.end)],
    ] {
        root.draw(&Rectangle::new(corners, WHITE.filled()))?;
    }
    root.draw(&Rectangle::new(
        [(xs.start, ys.start), (xs.end - 1, ys.end - 1)],
        BLACK.stroke_width(1),
    ))?;

    for layer in canvas.layers() {
        match layer {
            Layer::Title(title) => {
                let center_x = xs.start + (xs.end - xs.start) / 2;
                draw_title(root, canvas, title, center_x, ys.start)?
            }
            Layer::Legend(legend) => painter.legend(legend)?,
            _ => {}
        }
    }
    Ok(())
}

struct Painter<'c, 'a, DB: DrawingBackend> {
    canvas: &'c MapCanvas,
    chart: &'c mut MapChart<'a, DB>,
}

impl<'c, 'a, DB: DrawingBackend + 'a> Painter<'c, 'a, DB> {
    fn project(&self, line: &Polyline) -> Vec<(f64, f64)> {
        line.iter().map(|p| self.canvas.projection.project(*p)).collect()
    }

    fn stroke(&self, color: Rgb, alpha: f64, width_pt: f64) -> ShapeStyle {
        rgba(color, alpha).stroke_width(self.width_px(width_pt))
    }

    fn width_px(&self, points: f64) -> u32 {
        self.canvas.px(points).round().max(1.0) as u32
    }

    fn base(&mut self, base: &BaseImage) -> DrawResult<DB> {
        self.chart.plotting_area().fill(&rgb(base.ocean))?;

        let extent = self.canvas.extent;
        let land: Vec<Vec<(f64, f64)>> = base
            .land
            .iter()
            .filter(|ring| {
                ring.iter().any(|p| p.lon >= extent.lon_min)
                    && ring.iter().any(|p| p.lon <= extent.lon_max)
                    && ring.iter().any(|p| p.lat >= extent.lat_min)
                    && ring.iter().any(|p| p.lat <= extent.lat_max)
            })
            .map(|ring| self.project(ring))
            .collect();
        let fill = rgb(base.land_color).filled();
        self.chart
            .draw_series(land.into_iter().map(|ring| Polygon::new(ring, fill)))?;

        let grid = RGBAColor(255, 255, 255, 0.6).stroke_width(1);
        for line in &base.graticule {
            let points = self.project(line);
            self.chart.draw_series(LineSeries::new(points, grid))?;
        }
        Ok(())
    }

    fn features(&mut self, layer: &FeatureLayer) -> DrawResult<DB> {
        let style = self.stroke(layer.color, 1.0, layer.width);
        for line in &layer.lines {
            let points = self.project(line);
            self.chart.draw_series(LineSeries::new(points, style))?;
        }
        Ok(())
    }

    fn route(&mut self, route: &RouteLine) -> DrawResult<DB> {
        let style = self.stroke(route.color, route.alpha, route.width);
        let points = self.project(&route.path);

        match route.line_style {
            LineStyle::Solid => {
                self.chart.draw_series(LineSeries::new(points.clone(), style))?;
            }
            LineStyle::Dashed => {
                let (on, off) = dash_lengths(style.stroke_width);
                self.chart
                    .draw_series(DashedLineSeries::new(points.clone(), on, off, style))?;
            }
        }

        let r = self.canvas.px(route.end_marker_size) / 2.0;
        let fill = rgba(route.color, route.alpha).filled();
        let ends = [points.first(), points.last()];
        let glyph = glyph_points(route.end_marker, r);
        self.chart.draw_series(
            ends.into_iter()
                .flatten()
                .map(|&end| EmptyElement::<_, DB>::at(end) + Polygon::new(glyph.clone(), fill)),
        )?;
        Ok(())
    }

    fn marker(&mut self, marker: &Marker) -> DrawResult<DB> {
        let at = self.canvas.projection.project(marker.position);
        let r = self.canvas.px(marker.size) / 2.0;
        let glyph = Polygon::new(glyph_points(marker.glyph, r), rgb(marker.color).filled());
        self.chart
            .draw_series(std::iter::once(EmptyElement::<_, DB>::at(at) + glyph))?;
        Ok(())
    }

    fn label(&mut self, label: &Label) -> DrawResult<DB> {
        let at = self.canvas.projection.project(label.position);
        let weight = if label.bold {
            FontStyle::Bold
        } else {
            FontStyle::Normal
        };
        let style = FontDesc::new(FontFamily::SansSerif, self.canvas.px(label.font_size), weight)
            .color(&rgb(label.color))
            .pos(Pos::new(HPos::Left, VPos::Bottom));
        let offset = (self.canvas.px(2.0).round() as i32, -(self.canvas.px(2.0).round() as i32));
        self.chart.draw_series(std::iter::once(
            EmptyElement::<_, DB>::at(at) + Text::new(label.text.clone(), offset, style),
        ))?;
        Ok(())
    }

    /// Both entries are empty series that exist only to carry a label and
    /// a sample line into the series legend.
    fn legend(&mut self, legend: &Legend) -> DrawResult<DB> {
        let f = self.canvas.px(legend.font_size);
        let sample = (2.0 * f).round() as i32;

        for entry in &legend.entries {
            let style = self.stroke(entry.color, 1.0, entry.width);
            // The legend hands each sample its left end; the glyph sits mid-line
            let glyph: Vec<(i32, i32)> =
                glyph_points(entry.marker, self.canvas.px(entry.marker_size) / 2.0)
                    .into_iter()
                    .map(|(x, y)| (x + sample / 2, y))
                    .collect();
            let fill = rgb(entry.color).filled();
            let line = vec![(0, 0), (sample, 0)];

            let anno = self
                .chart
                .draw_series(std::iter::empty::<PathElement<(f64, f64)>>())?
                .label(entry.label.clone());
            match entry.line_style {
                LineStyle::Solid => anno.legend(move |at| {
                    EmptyElement::<_, DB>::at(at)
                        + PathElement::new(line.clone(), style)
                        + Polygon::new(glyph.clone(), fill)
                }),
                LineStyle::Dashed => {
                    let (on, off) = dash_lengths(style.stroke_width);
                    anno.legend(move |at| {
                        EmptyElement::<_, DB>::at(at)
                            + DashedPathElement::new(line.clone(), on, off, style)
                            + Polygon::new(glyph.clone(), fill)
                    })
                }
            };
        }

        self.chart
            .configure_series_labels()
            .position(label_position(legend.corner))
            .legend_area_size(sample + (0.6 * f).round() as i32)
            .margin((0.5 * f).round() as i32)
            .label_font(FontDesc::new(FontFamily::SansSerif, f, FontStyle::Normal).color(&BLACK))
            .background_style(RGBAColor(255, 255, 255, 0.8).filled())
            .border_style(RGBAColor(204, 204, 204, 1.0))
            .draw()
    }
}

fn draw_title<DB: DrawingBackend>(
    root: &DrawingArea<DB, Shift>,
    canvas: &MapCanvas,
    title: &TitleBlock,
    center_x: i32,
    map_top: i32,
) -> DrawResult<DB> {
    let size = canvas.px(title.font_size);
    let style = FontDesc::new(FontFamily::SansSerif, size, FontStyle::Normal)
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Bottom));
    let n = title.lines.len();
    for (i, line) in title.lines.iter().enumerate() {
        let y = map_top as f64 - 0.3 * size - (n - 1 - i) as f64 * 1.2 * size;
        root.draw_text(line, &style, (center_x, y.round() as i32))?;
    }
    Ok(())
}

fn label_position(corner: Corner) -> SeriesLabelPosition {
    match corner {
        Corner::UpperLeft => SeriesLabelPosition::UpperLeft,
        Corner::UpperRight => SeriesLabelPosition::UpperRight,
        Corner::LowerLeft => SeriesLabelPosition::LowerLeft,
        Corner::LowerRight => SeriesLabelPosition::LowerRight,
    }
}

fn dash_lengths(stroke_width: u32) -> (u32, u32) {
    let w = stroke_width as f64;
    ((DASH_ON * w).round() as u32, (DASH_OFF * w).round() as u32)
}

/// Pixel offsets of a glyph outline around its centre, y downward.
pub fn glyph_points(glyph: MarkerGlyph, radius: f64) -> Vec<(i32, i32)> {
    let outline: Vec<(f64, f64)> = match glyph {
        MarkerGlyph::Star => star_points(radius),
        MarkerGlyph::Circle => (0..24)
            .map(|i| {
                let angle = i as f64 * std::f64::consts::TAU / 24.0;
                (radius * angle.cos(), radius * angle.sin())
            })
            .collect(),
        MarkerGlyph::Square => vec![
            (-radius, -radius),
            (radius, -radius),
            (radius, radius),
            (-radius, radius),
        ],
    };
    outline
        .into_iter()
        .map(|(x, y)| (x.round() as i32, y.round() as i32))
        .collect()
}

/// Five-pointed star, first vertex straight up, outer and inner radii
/// alternating.
pub fn star_points(radius: f64) -> Vec<(f64, f64)> {
    let inner = radius * 0.382;
    (0..10)
        .map(|i| {
            let r = if i % 2 == 0 { radius } else { inner };
            let angle = -std::f64::consts::FRAC_PI_2 + i as f64 * std::f64::consts::PI / 5.0;
            (r * angle.cos(), r * angle.sin())
        })
        .collect()
}

fn rgb(c: Rgb) -> RGBColor {
    RGBColor(c.0, c.1, c.2)
}

fn rgba(c: Rgb, alpha: f64) -> RGBAColor {
    RGBAColor(c.0, c.1, c.2, alpha)
}
