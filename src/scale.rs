//! Axis auto-scaling from the visible sample window.

use crate::error::{GraphError, Result};
use crate::sample::Sample;

/// Which series of each sample participate in rendering and scaling.
///
/// A hidden series contributes nothing to the axis maximum, so toggling a
/// spiky series off immediately rescales the chart to the one left visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesVisibility {
    /// Show the primary series.
    pub primary: bool,
    /// Show the secondary series.
    pub secondary: bool,
}

impl SeriesVisibility {
    /// Both series visible.
    pub const ALL: Self = Self {
        primary: true,
        secondary: true,
    };

    /// Only the primary series visible.
    pub const PRIMARY_ONLY: Self = Self {
        primary: true,
        secondary: false,
    };
}

impl Default for SeriesVisibility {
    fn default() -> Self {
        Self::ALL
    }
}

/// Derives a padded axis maximum from whatever is currently visible.
///
/// The result is `max(observed, floor) * (1 + padding)`. It is recomputed
/// every render pass and never cached: eviction changes the visible window
/// each frame, so yesterday's maximum is already stale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AutoScale {
    floor: f64,
    padding: f64,
}

impl AutoScale {
    /// Create a scale with an explicit floor and padding fraction.
    pub fn new(floor: f64, padding: f64) -> Result<Self> {
        if !floor.is_finite() || floor <= 0.0 {
            return Err(GraphError::InvalidScale(
                "scale floor must be a positive finite value".into(),
            ));
        }
        if !padding.is_finite() || padding < 0.0 {
            return Err(GraphError::InvalidScale(
                "padding fraction must be non-negative and finite".into(),
            ));
        }
        Ok(Self { floor, padding })
    }

    /// Access the minimum floor.
    pub fn floor(&self) -> f64 {
        self.floor
    }

    /// Access the padding fraction.
    pub fn padding(&self) -> f64 {
        self.padding
    }

    /// Compute the axis maximum for the given samples and visibility.
    pub fn axis_maximum(&self, samples: &[Sample], visible: SeriesVisibility) -> f64 {
        let mut observed = 0.0_f64;
        for sample in samples {
            if visible.primary {
                observed = observed.max(sample.primary);
            }
            if visible.secondary {
                observed = observed.max(sample.secondary);
            }
        }
        observed.max(self.floor) * (1.0 + self.padding)
    }
}

impl Default for AutoScale {
    /// Floor of 10 with one-fifth headroom.
    fn default() -> Self {
        Self {
            floor: 10.0,
            padding: 0.2,
        }
    }
}

/// Format an axis tick value as a compact magnitude label.
pub fn format_magnitude(value: f64) -> String {
    const MEGA: f64 = 1_000_000.0;
    const KILO: f64 = 1_000.0;

    if value >= MEGA {
        format!("{:.1}M", value / MEGA)
    } else if value >= KILO {
        format!("{:.0}K", value / KILO)
    } else {
        format!("{value:.0}")
    }
}
