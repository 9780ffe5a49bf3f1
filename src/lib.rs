//! scrollgraph renders live, scrolling time-series and categorical bar
//! charts behind a minimal drawing-surface interface.
//!
//! The crate is the chart engine only: bounded sample buffers with
//! eviction, axis auto-scaling, the scrolling-grid illusion, periodic
//! redraw scheduling, and proportional bar layout. Hosts implement
//! [`DrawSurface`] on their GUI toolkit of choice and delegate paint
//! events to a [`ChartEngine`] or [`CategoricalBarChart`].

#![forbid(unsafe_code)]

pub mod bars;
pub mod chart;
pub mod error;
pub mod geom;
pub mod mapper;
pub mod palette;
pub mod sample;
pub mod scale;
pub mod scheduler;
pub mod scroll;
pub mod surface;

pub use bars::{BarGeometry, CategoricalBarChart, Category, dominant_color};
pub use chart::{ChartConfig, ChartEngine, GridConfig, TrendStyle};
pub use error::{GraphError, Result};
pub use geom::{SurfacePoint, SurfaceRect, SurfaceSize};
pub use mapper::{PixelSegment, SampleColumns, sample_columns, to_pixel_height, trend_segments};
pub use palette::{AccentPalette, Palette, ThroughputPalette, UsagePalette};
pub use sample::{CapacityPolicy, Sample, SampleBuffer};
pub use scale::{AutoScale, SeriesVisibility, format_magnitude};
pub use scheduler::{RedrawScheduler, RepaintTarget};
pub use scroll::ScrollCursor;
pub use surface::{Color, DrawSurface, IconProvider, IconSource, Stroke, TextOrientation};
