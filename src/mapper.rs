//! Value-to-pixel mapping and horizontal sample placement.

use crate::geom::SurfacePoint;

/// Map a value into a pixel height within `[0, surface_height]`.
///
/// Uses `floor(value / maximum * surface_height)` clamped to the surface.
/// A non-positive or non-finite maximum maps everything to zero; the scale
/// floor keeps that from happening in normal operation, but the mapper
/// guards anyway rather than divide by zero.
pub fn to_pixel_height(value: f64, maximum: f64, surface_height: u32) -> u32 {
    if !value.is_finite() || !maximum.is_finite() || maximum <= 0.0 {
        return 0;
    }
    let raw = (value / maximum * f64::from(surface_height)).floor();
    if raw <= 0.0 {
        0
    } else if raw >= f64::from(surface_height) {
        surface_height
    } else {
        raw as u32
    }
}

/// X positions for consecutive samples, walking right-to-left.
///
/// Starts two pixels in from the right edge (clear of the border stroke)
/// and stops once the next column would touch the reserved label edge.
/// Create via [`sample_columns`].
#[derive(Debug, Clone)]
pub struct SampleColumns {
    next: i64,
    reserved_left: i64,
    step: i64,
}

impl Iterator for SampleColumns {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if self.next <= self.reserved_left {
            return None;
        }
        let column = self.next;
        self.next -= self.step;
        Some(column as u32)
    }
}

/// Walk sample columns from the right surface edge toward the reserved
/// label edge, one sample per `step` pixels.
///
/// Yields nothing when the surface is narrower than the reserved area or
/// `step` is zero.
pub fn sample_columns(surface_width: u32, reserved_left: u32, step: u32) -> SampleColumns {
    let start = i64::from(surface_width) - 2;
    SampleColumns {
        // A zero step would never terminate; treat it as an empty walk.
        next: if step == 0 { i64::from(reserved_left) } else { start },
        reserved_left: i64::from(reserved_left),
        step: i64::from(step.max(1)),
    }
}

/// One pixel-space segment of a trend polyline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelSegment {
    /// Segment start.
    pub from: SurfacePoint,
    /// Segment end.
    pub to: SurfacePoint,
}

impl PixelSegment {
    /// Create a new segment.
    pub const fn new(from: SurfacePoint, to: SurfacePoint) -> Self {
        Self { from, to }
    }
}

/// Build the connected trend polyline for one series.
///
/// `values` is ordered newest first, matching the right-to-left column
/// walk. Each sample's point connects to the previously placed (more
/// recent) point rather than the axis; the first point is seeded with a
/// zero-value predecessor so the initial segment rises from the baseline.
/// The walk stops when either the values or the columns run out.
pub fn trend_segments(
    values: impl IntoIterator<Item = f64>,
    maximum: f64,
    surface_height: u32,
    columns: SampleColumns,
    connector_reach: u32,
    out: &mut Vec<PixelSegment>,
) {
    out.clear();
    let bottom = surface_height as i64;
    let mut previous_height = 0_u32;
    for (value, column) in values.into_iter().zip(columns) {
        let height = to_pixel_height(value, maximum, surface_height);
        let from = SurfacePoint::new(column as i32, (bottom - i64::from(height)) as i32);
        let to = SurfacePoint::new(
            (column + connector_reach) as i32,
            (bottom - i64::from(previous_height)) as i32,
        );
        out.push(PixelSegment::new(from, to));
        previous_height = height;
    }
}
