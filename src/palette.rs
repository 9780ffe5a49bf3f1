//! Swappable chart color palettes.

use std::fmt;

use crate::surface::Color;

/// Capability interface supplying every color a chart renderer needs.
///
/// Render logic depends only on this trait, never on a concrete palette, so
/// hosts can restyle a chart per instance. Replacing a palette on a live
/// chart takes effect at the next render pass; there is no mid-draw swap.
pub trait Palette: fmt::Debug + Send + Sync {
    /// Fill behind the plotted area.
    fn surface_fill(&self) -> Color;

    /// Border and axis furniture color.
    fn border(&self) -> Color;

    /// Background grid line color.
    fn grid(&self) -> Color;

    /// Label text color.
    fn text(&self) -> Color;

    /// Color of the primary series (upload, used, or the single accent).
    fn primary_series(&self) -> Color;

    /// Color of the secondary series (download or free).
    fn secondary_series(&self) -> Color;
}

/// Dual-series palette for network throughput charts: green upload over
/// blue download on a black surface.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThroughputPalette;

impl Palette for ThroughputPalette {
    fn surface_fill(&self) -> Color {
        Color::BLACK
    }

    fn border(&self) -> Color {
        Color::WHITE
    }

    fn grid(&self) -> Color {
        Color::rgb8(0x20, 0x20, 0x20)
    }

    fn text(&self) -> Color {
        Color::WHITE
    }

    fn primary_series(&self) -> Color {
        Color::rgb8(0x00, 0xFF, 0x00)
    }

    fn secondary_series(&self) -> Color {
        Color::rgb8(0x00, 0x00, 0xFF)
    }
}

/// Used-versus-available palette for resource usage charts.
#[derive(Debug, Clone, Copy, Default)]
pub struct UsagePalette;

impl Palette for UsagePalette {
    fn surface_fill(&self) -> Color {
        Color::BLACK
    }

    fn border(&self) -> Color {
        Color::WHITE
    }

    fn grid(&self) -> Color {
        Color::rgb8(0x30, 0x30, 0x30)
    }

    fn text(&self) -> Color {
        Color::rgb8(0xCD, 0xD6, 0xF4)
    }

    fn primary_series(&self) -> Color {
        Color::rgb8(0xFF, 0x8C, 0x00)
    }

    fn secondary_series(&self) -> Color {
        Color::rgb8(0x32, 0xCD, 0x32)
    }
}

/// Single-accent palette for categorical bar charts.
///
/// The accent is the fallback bar color when an icon's dominant color
/// cannot be sampled.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccentPalette;

impl Palette for AccentPalette {
    fn surface_fill(&self) -> Color {
        Color::rgb8(0x1E, 0x1E, 0x2E)
    }

    fn border(&self) -> Color {
        Color::rgb8(0xCD, 0xD6, 0xF4)
    }

    fn grid(&self) -> Color {
        Color::rgb8(0x31, 0x32, 0x44)
    }

    fn text(&self) -> Color {
        Color::rgb8(0xCD, 0xD6, 0xF4)
    }

    fn primary_series(&self) -> Color {
        Color::rgb8(0xCB, 0xA6, 0xF7)
    }

    fn secondary_series(&self) -> Color {
        self.primary_series()
    }
}
