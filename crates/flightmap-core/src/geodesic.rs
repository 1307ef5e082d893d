// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

use serde::{Deserialize, Serialize};

/// Mean earth radius (IUGG) in kilometres.
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

/// A geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lon: f64,
    pub lat: f64,
}

impl GeoPoint {
    pub const fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    pub fn is_valid(&self) -> bool {
        self.lon.is_finite()
            && self.lat.is_finite()
            && (-180.0..=180.0).contains(&self.lon)
            && (-90.0..=90.0).contains(&self.lat)
    }

    fn to_unit_vector(self) -> [f64; 3] {
        let (lat, lon) = (self.lat.to_radians(), self.lon.to_radians());
        [lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin()]
    }

    fn from_unit_vector(v: [f64; 3]) -> Self {
        let lat = v[2].atan2((v[0] * v[0] + v[1] * v[1]).sqrt());
        let lon = v[1].atan2(v[0]);
        Self::new(lon.to_degrees(), lat.to_degrees())
    }
}

/// Central angle between two points, in radians.
pub fn central_angle(a: GeoPoint, b: GeoPoint) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();
    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let h = h.clamp(0.0, 1.0);
    2.0 * h.sqrt().atan2((1.0 - h).sqrt())
}

pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    EARTH_RADIUS_KM * central_angle(a, b)
}

/// Samples the great circle from `a` to `b` with at most `max_step_deg`
/// degrees of arc between consecutive points. Endpoints are returned
/// exactly, apart from longitude unwrapping: the path never jumps by 360°.
///
/// Antipodal pairs have no unique great circle; they come back as the
/// two endpoints only.
pub fn great_circle(a: GeoPoint, b: GeoPoint, max_step_deg: f64) -> Vec<GeoPoint> {
    let d = central_angle(a, b);
    if d < 1e-12 || std::f64::consts::PI - d < 1e-6 {
        return vec![a, b];
    }
    let sin_d = d.sin();

    let step = if max_step_deg > 0.0 { max_step_deg } else { 1.0 };
    let segments = (d.to_degrees() / step).ceil().max(1.0) as usize;
    let (va, vb) = (a.to_unit_vector(), b.to_unit_vector());

    let mut points = Vec::with_capacity(segments + 1);
    points.push(a);
    for i in 1..segments {
        let f = i as f64 / segments as f64;
        let wa = ((1.0 - f) * d).sin() / sin_d;
        let wb = (f * d).sin() / sin_d;
        let v = [
            wa * va[0] + wb * vb[0],
            wa * va[1] + wb * vb[1],
            wa * va[2] + wb * vb[2],
        ];
        points.push(GeoPoint::from_unit_vector(v));
    }
    points.push(b);

    unwrap_longitudes(&mut points);
    points
}

fn unwrap_longitudes(points: &mut [GeoPoint]) {
    for i in 1..points.len() {
        let prev = points[i - 1].lon;
        let mut lon = points[i].lon;
        while lon - prev > 180.0 {
            lon -= 360.0;
        }
        while lon - prev < -180.0 {
            lon += 360.0;
        }
        points[i].lon = lon;
    }
}
