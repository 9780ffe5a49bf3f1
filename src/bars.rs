//! Categorical bar charts ranked by value.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::error::Result;
use crate::geom::{SurfacePoint, SurfaceRect};
use crate::mapper::to_pixel_height;
use crate::palette::Palette;
use crate::scale::format_magnitude;
use crate::surface::{Color, DrawSurface, IconProvider, IconSource, TextOrientation};

/// Left margin before the first bar slot.
const LEFT_MARGIN: u32 = 15;
/// Horizontal stride between consecutive bar slots.
const SLOT_STRIDE: u32 = 20;
/// Bar width within a slot.
const BAR_WIDTH: u32 = 10;
/// Minimum bar height so zero and near-zero values stay visible as a stub.
const MIN_BAR_HEIGHT: u32 = 20;
/// Bars at least this tall take a vertical label near the base; shorter
/// bars get a horizontal label beside the bar.
const LABEL_ROTATE_THRESHOLD: u32 = 40;
/// Vertical gap between a bar top and its icon.
const ICON_GAP: i32 = 14;

/// A named ranked entry in a categorical bar chart.
///
/// Identity is the name: adding a category whose name already exists
/// updates the stored value instead of inserting a duplicate.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    name: String,
    value: f64,
    icon: String,
}

impl Category {
    /// Create a category with a logical icon name.
    pub fn new(name: impl Into<String>, value: f64, icon: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value,
            icon: icon.into(),
        }
    }

    /// Category name; this is its identity.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current rank value.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Logical icon name resolved through an [`IconProvider`].
    pub fn icon(&self) -> &str {
        &self.icon
    }
}

/// Computed geometry for one bar slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarGeometry {
    /// Left edge of the bar.
    pub x: i32,
    /// Bar width in pixels.
    pub width: u32,
    /// Bar height in pixels, stub floor applied.
    pub height: u32,
    /// How the value label is drawn for this bar.
    pub label: TextOrientation,
}

/// Color at an icon's geometric center pixel.
///
/// Deliberately a single-pixel read, not an average; for flag-like icons
/// the center pixel is a good stand-in for the dominant color.
pub fn dominant_color(icon: &dyn IconSource) -> Option<Color> {
    icon.pixel(icon.width() / 2, icon.height() / 2)
}

/// Ranks categories and renders them as proportional bars.
///
/// Categories are laid out in ascending value order, each in a fixed-width
/// slot, with the bar colored by its icon's dominant color. This chart has
/// no scheduler of its own; the host repaints it on whatever cadence it
/// likes.
#[derive(Debug)]
pub struct CategoricalBarChart {
    categories: Vec<Category>,
    palette: Arc<dyn Palette>,
    draw_values: bool,
}

impl CategoricalBarChart {
    /// Create an empty chart.
    pub fn new(palette: Arc<dyn Palette>) -> Self {
        Self {
            categories: Vec::new(),
            palette,
            draw_values: true,
        }
    }

    /// Insert a category, or update the value of an existing one with the
    /// same name.
    pub fn add(&mut self, category: Category) {
        if let Some(existing) = self
            .categories
            .iter_mut()
            .find(|existing| existing.name == category.name)
        {
            existing.value = category.value;
            return;
        }
        self.categories.push(category);
    }

    /// Remove a category by name. Returns whether anything was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.categories.len();
        self.categories.retain(|category| category.name != name);
        self.categories.len() != before
    }

    /// Drop all categories.
    pub fn clear(&mut self) {
        self.categories.clear();
    }

    /// Number of categories.
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Check whether the chart has no categories.
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Access the categories in insertion order.
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Whether value labels are drawn.
    pub fn draw_values(&self) -> bool {
        self.draw_values
    }

    /// Toggle value labels.
    pub fn set_draw_values(&mut self, draw_values: bool) {
        self.draw_values = draw_values;
    }

    /// Replace the palette. Takes effect at the next render pass.
    pub fn set_palette(&mut self, palette: Arc<dyn Palette>) {
        self.palette = palette;
    }

    /// Surface width that fits every slot plus the left margin.
    pub fn recommended_width(&self) -> u32 {
        LEFT_MARGIN + self.categories.len() as u32 * SLOT_STRIDE
    }

    /// Compute the sorted bar layout for a surface height.
    ///
    /// The sort is stable and ascending by value, so equal-valued
    /// categories keep their insertion order.
    pub fn layout(&self, surface_height: u32) -> Vec<(&Category, BarGeometry)> {
        let mut sorted: Vec<&Category> = self.categories.iter().collect();
        sorted.sort_by(|a, b| a.value.partial_cmp(&b.value).unwrap_or(Ordering::Equal));

        let observed_max = sorted.iter().fold(0.0_f64, |max, c| max.max(c.value));
        let stub = MIN_BAR_HEIGHT.min(surface_height);

        sorted
            .into_iter()
            .enumerate()
            .map(|(slot, category)| {
                let height =
                    to_pixel_height(category.value, observed_max, surface_height).max(stub);
                let geometry = BarGeometry {
                    x: (LEFT_MARGIN + slot as u32 * SLOT_STRIDE) as i32,
                    width: BAR_WIDTH,
                    height,
                    label: if height >= LABEL_ROTATE_THRESHOLD {
                        TextOrientation::Vertical
                    } else {
                        TextOrientation::Horizontal
                    },
                };
                (category, geometry)
            })
            .collect()
    }

    /// Render the chart. An empty category set paints background and
    /// border only.
    pub fn render(&self, surface: &mut dyn DrawSurface, icons: &dyn IconProvider) -> Result<()> {
        let width = surface.width();
        let height = surface.height();
        if width == 0 || height == 0 {
            return Ok(());
        }

        surface.fill_rect(
            SurfaceRect::new(1, 1, width.saturating_sub(1), height.saturating_sub(1)),
            self.palette.surface_fill(),
        );
        surface.draw_rect(
            SurfaceRect::new(0, 0, width.saturating_sub(1), height.saturating_sub(1)),
            self.palette.border(),
        );

        for (category, geometry) in self.layout(height) {
            let icon = icons.icon(category.icon());
            let color = icon
                .and_then(dominant_color)
                .unwrap_or_else(|| self.palette.primary_series());
            let top = height as i32 - geometry.height as i32;

            surface.fill_rect(
                SurfaceRect::new(geometry.x, top, geometry.width, geometry.height),
                color,
            );

            if let Some(icon) = icon {
                let icon_top = top - ICON_GAP - icon.height() as i32;
                surface.draw_image(icon, SurfacePoint::new(geometry.x - 3, icon_top));
            }

            if self.draw_values {
                let label = format_magnitude(category.value);
                let (origin, orientation) = match geometry.label {
                    TextOrientation::Horizontal => (
                        SurfacePoint::new(geometry.x + geometry.width as i32 + 2, top),
                        TextOrientation::Horizontal,
                    ),
                    TextOrientation::Vertical => (
                        SurfacePoint::new(
                            geometry.x + geometry.width as i32 - 2,
                            height as i32 - 6,
                        ),
                        TextOrientation::Vertical,
                    ),
                };
                surface.draw_text(&label, origin, self.palette.text(), orientation);
            }
        }

        Ok(())
    }
}
