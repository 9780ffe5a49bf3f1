//! Time-series chart engine: buffer, scale, cursor, and the render pass.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use crate::error::{GraphError, Result};
use crate::geom::{SurfacePoint, SurfaceRect};
use crate::mapper::{PixelSegment, sample_columns, to_pixel_height, trend_segments};
use crate::palette::{Palette, ThroughputPalette, UsagePalette};
use crate::sample::{CapacityPolicy, Sample, SampleBuffer};
use crate::scale::{AutoScale, SeriesVisibility, format_magnitude};
use crate::scheduler::{RedrawScheduler, RepaintTarget};
use crate::scroll::ScrollCursor;
use crate::surface::{Color, DrawSurface, Stroke, TextOrientation};

/// How a time-series chart draws its samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrendStyle {
    /// Connected polyline per visible series.
    Line {
        /// Horizontal pixels consumed per sample.
        px_step: u32,
        /// How far each segment reaches back toward its predecessor.
        connector_reach: u32,
        /// Polyline stroke width.
        stroke_width: f32,
    },
    /// Filled vertical columns for both series, taller drawn first so the
    /// shorter one stays visible in front.
    Columns {
        /// Horizontal pixels consumed per sample.
        px_step: u32,
        /// Column width in pixels.
        column_width: u32,
    },
}

/// Background grid and axis furniture configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridConfig {
    /// Pixels between repeating grid lines.
    pub spacing: u32,
    /// Phase-shift the vertical grid lines with the scroll cursor.
    pub scrolling: bool,
    /// Labeled tick divisions in the left gutter; zero disables them.
    pub divisions: u32,
    /// Pixels reserved at the left edge for labels or a side panel.
    pub reserved_left: u32,
    /// Outline the reserved area as a separate panel.
    pub side_panel: bool,
}

/// Complete configuration of a time-series chart engine.
#[derive(Debug, Clone, Copy)]
pub struct ChartConfig {
    /// Buffer eviction policy.
    pub capacity: CapacityPolicy,
    /// Redraw scheduler interval.
    pub tick_interval: Duration,
    /// Axis auto-scaling parameters.
    pub scale: AutoScale,
    /// Initial grid scroll cursor.
    pub cursor: ScrollCursor,
    /// Grid and gutter layout.
    pub grid: GridConfig,
    /// Series drawing style.
    pub style: TrendStyle,
}

impl ChartConfig {
    /// Coarse network-style chart: one-second ticks, a static thousand-sample
    /// buffer evicted in batches, and a scrolling grid behind a polyline.
    pub fn throughput() -> Self {
        Self {
            capacity: CapacityPolicy::Fixed {
                capacity: 1000,
                batch: 100,
            },
            tick_interval: Duration::from_millis(1000),
            scale: AutoScale::default(),
            cursor: ScrollCursor::default(),
            grid: GridConfig {
                spacing: 13,
                scrolling: true,
                divisions: 0,
                reserved_left: 71,
                side_panel: true,
            },
            style: TrendStyle::Line {
                px_step: 4,
                connector_reach: 5,
                stroke_width: 2.0,
            },
        }
    }

    /// Smooth usage chart: fifty-millisecond ticks, width-driven capacity
    /// evicting one sample per frame, and a labeled left gutter in front of
    /// filled columns.
    pub fn usage() -> Self {
        Self {
            capacity: CapacityPolicy::WidthDriven { margin: 50 },
            tick_interval: Duration::from_millis(50),
            scale: AutoScale::default(),
            cursor: ScrollCursor::default(),
            grid: GridConfig {
                spacing: 13,
                scrolling: false,
                divisions: 5,
                reserved_left: 60,
                side_panel: false,
            },
            style: TrendStyle::Columns {
                px_step: 2,
                column_width: 2,
            },
        }
    }
}

/// A live scrolling chart, composed into a host widget.
///
/// The host owns the engine, forwards paint events to
/// [`render`](Self::render), and feeds it through [`push`](Self::push) from
/// any producer thread. Rendering must happen on whichever thread owns the
/// drawing surface; the engine itself has no thread affinity.
#[derive(Debug)]
pub struct ChartEngine {
    buffer: Mutex<SampleBuffer>,
    cursor: Mutex<ScrollCursor>,
    visible: Mutex<SeriesVisibility>,
    palette: RwLock<Arc<dyn Palette>>,
    scale: AutoScale,
    grid: GridConfig,
    style: TrendStyle,
    tick_interval: Duration,
    live: AtomicBool,
    scheduler: Mutex<Option<RedrawScheduler>>,
}

impl ChartEngine {
    /// Chart preset for coarse network throughput.
    pub fn throughput() -> Self {
        Self::from_parts(ChartConfig::throughput(), Arc::new(ThroughputPalette))
    }

    /// Chart preset for smooth resource usage.
    pub fn usage() -> Self {
        Self::from_parts(ChartConfig::usage(), Arc::new(UsagePalette))
    }

    /// Build a chart from an explicit configuration.
    pub fn with_config(config: ChartConfig, palette: Arc<dyn Palette>) -> Result<Self> {
        if let CapacityPolicy::Fixed { capacity, batch } = config.capacity {
            // Variant fields are public, so the validated constructors can
            // be bypassed; reject bad values here as well.
            CapacityPolicy::fixed_with_batch(capacity, batch)?;
        }
        if config.tick_interval.is_zero() {
            return Err(GraphError::InvalidInterval(
                "tick interval must be positive".into(),
            ));
        }
        Ok(Self::from_parts(config, palette))
    }

    fn from_parts(config: ChartConfig, palette: Arc<dyn Palette>) -> Self {
        Self {
            buffer: Mutex::new(SampleBuffer::new(config.capacity)),
            cursor: Mutex::new(config.cursor),
            visible: Mutex::new(SeriesVisibility::default()),
            palette: RwLock::new(palette),
            scale: config.scale,
            grid: config.grid,
            style: config.style,
            tick_interval: config.tick_interval,
            live: AtomicBool::new(true),
            scheduler: Mutex::new(None),
        }
    }

    /// Append a sample. Safe to call from a producer thread while a render
    /// pass is in progress.
    pub fn push(&self, sample: Sample) {
        self.buffer.lock().expect("sample buffer lock").push(sample);
    }

    /// The most recently pushed sample, or [`Sample::ZERO`] when none
    /// exists yet.
    pub fn last_sample(&self) -> Sample {
        self.buffer.lock().expect("sample buffer lock").last()
    }

    /// Number of samples currently buffered.
    pub fn sample_count(&self) -> usize {
        self.buffer.lock().expect("sample buffer lock").len()
    }

    /// Choose which series are rendered and contribute to the scale.
    pub fn set_visible_series(&self, flags: SeriesVisibility) {
        *self.visible.lock().expect("series visibility lock") = flags;
    }

    /// Currently visible series.
    pub fn visible_series(&self) -> SeriesVisibility {
        *self.visible.lock().expect("series visibility lock")
    }

    /// Replace the palette. Takes effect at the next render pass; a pass
    /// already drawing keeps the palette it started with.
    pub fn set_palette(&self, palette: Arc<dyn Palette>) {
        *self.palette.write().expect("palette lock") = palette;
    }

    /// Scheduler interval this chart was configured with.
    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Whether the chart is live. Becomes false the moment
    /// [`dispose`](Self::dispose) is called, even if a tick is pending.
    pub fn is_running(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    /// Mark the chart disposed and stop its scheduler promptly.
    pub fn dispose(&self) {
        self.live.store(false, Ordering::SeqCst);
        if let Some(scheduler) = self
            .scheduler
            .lock()
            .expect("scheduler slot lock")
            .as_ref()
        {
            scheduler.shutdown();
        }
    }

    /// Start the internal redraw scheduler, driving `target` once per tick.
    ///
    /// Optional: a chart rendered on the host's own cadence never needs
    /// this. Must be called from within a tokio runtime. Disposed charts
    /// ignore the call.
    pub fn start_scheduler(&self, target: Arc<dyn RepaintTarget>) -> Result<()> {
        if !self.is_running() {
            return Ok(());
        }
        let mut slot = self.scheduler.lock().expect("scheduler slot lock");
        if slot.is_none() {
            let mut scheduler = RedrawScheduler::new(self.tick_interval)?;
            scheduler.start();
            *slot = Some(scheduler);
        }
        if let Some(scheduler) = slot.as_ref() {
            scheduler.register(target);
        }
        Ok(())
    }

    /// Run one render pass against the host surface.
    ///
    /// Evicts excess samples, recomputes the axis maximum from the visible
    /// window, advances the grid cursor, and emits drawing calls. An empty
    /// buffer paints background and furniture only. The buffer lock is held
    /// for the eviction and snapshot step, never while drawing.
    pub fn render(&self, surface: &mut dyn DrawSurface) -> Result<()> {
        let width = surface.width();
        let height = surface.height();
        if width == 0 || height == 0 {
            return Ok(());
        }

        let samples = {
            let mut buffer = self.buffer.lock().expect("sample buffer lock");
            buffer.evict_excess(width);
            buffer.snapshot()
        };
        let visible = self.visible_series();
        let palette = Arc::clone(&self.palette.read().expect("palette lock"));
        let maximum = self.scale.axis_maximum(&samples, visible);
        let grid_offset = self
            .cursor
            .lock()
            .expect("scroll cursor lock")
            .advance();

        self.paint_background(surface, palette.as_ref(), grid_offset, maximum);

        match self.style {
            TrendStyle::Line {
                px_step,
                connector_reach,
                stroke_width,
            } => self.paint_trend_lines(
                surface,
                &samples,
                visible,
                maximum,
                px_step,
                connector_reach,
                stroke_width,
                palette.as_ref(),
            ),
            TrendStyle::Columns {
                px_step,
                column_width,
            } => self.paint_columns(
                surface,
                &samples,
                visible,
                maximum,
                px_step,
                column_width,
                palette.as_ref(),
            ),
        }

        self.paint_border(surface, palette.as_ref());
        Ok(())
    }

    fn paint_background(
        &self,
        surface: &mut dyn DrawSurface,
        palette: &dyn Palette,
        grid_offset: u32,
        maximum: f64,
    ) {
        let width = surface.width();
        let height = surface.height();
        let reserved = self.grid.reserved_left;

        surface.fill_rect(
            SurfaceRect::new(1, 1, width.saturating_sub(1), height.saturating_sub(1)),
            palette.surface_fill(),
        );

        surface.set_stroke(Stroke::new(palette.grid(), 1.0));
        if self.grid.scrolling && self.grid.spacing > 0 {
            let mut y = 0;
            while y < height {
                surface.draw_line(
                    SurfacePoint::new(reserved as i32, y as i32),
                    SurfacePoint::new(width as i32 - 1, y as i32),
                );
                y += self.grid.spacing;
            }
            let mut x = reserved + grid_offset;
            while x < width {
                surface.draw_line(
                    SurfacePoint::new(x as i32, 1),
                    SurfacePoint::new(x as i32, height as i32),
                );
                x += self.grid.spacing;
            }
        }

        if self.grid.divisions > 0 {
            let step = height / self.grid.divisions;
            if step > 0 {
                let tick_start = reserved.saturating_sub(5);
                let part = maximum / f64::from(self.grid.divisions);
                let mut line = 0_u32;
                let mut y = 0;
                while y < height {
                    surface.draw_line(
                        SurfacePoint::new(tick_start as i32, y as i32),
                        SurfacePoint::new(reserved as i32, y as i32),
                    );
                    let label = format_magnitude(maximum - part * f64::from(line));
                    surface.draw_text(
                        &label,
                        SurfacePoint::new(5, y as i32 + 15),
                        palette.text(),
                        TextOrientation::Horizontal,
                    );
                    line += 1;
                    y += step;
                }
                surface.draw_line(
                    SurfacePoint::new(reserved as i32, 0),
                    SurfacePoint::new(reserved as i32, height as i32),
                );
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn paint_trend_lines(
        &self,
        surface: &mut dyn DrawSurface,
        samples: &[Sample],
        visible: SeriesVisibility,
        maximum: f64,
        px_step: u32,
        connector_reach: u32,
        stroke_width: f32,
        palette: &dyn Palette,
    ) {
        let width = surface.width();
        let height = surface.height();
        let mut segments: Vec<PixelSegment> = Vec::new();

        let series: [(bool, Color, fn(&Sample) -> f64); 2] = [
            (visible.primary, palette.primary_series(), |s| s.primary),
            (visible.secondary, palette.secondary_series(), |s| {
                s.secondary
            }),
        ];

        for (shown, color, pick) in series {
            if !shown {
                continue;
            }
            trend_segments(
                samples.iter().rev().map(pick),
                maximum,
                height,
                sample_columns(width, self.grid.reserved_left, px_step),
                connector_reach,
                &mut segments,
            );
            surface.set_stroke(Stroke::new(color, stroke_width));
            for segment in &segments {
                surface.draw_line(segment.from, segment.to);
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn paint_columns(
        &self,
        surface: &mut dyn DrawSurface,
        samples: &[Sample],
        visible: SeriesVisibility,
        maximum: f64,
        px_step: u32,
        column_width: u32,
        palette: &dyn Palette,
    ) {
        let height = surface.height();
        let columns = sample_columns(surface.width(), self.grid.reserved_left, px_step);

        for (sample, x) in samples.iter().rev().zip(columns) {
            let primary = (
                to_pixel_height(sample.primary, maximum, height),
                palette.primary_series(),
                visible.primary,
            );
            let secondary = (
                to_pixel_height(sample.secondary, maximum, height),
                palette.secondary_series(),
                visible.secondary,
            );
            let (back, front) = if secondary.0 > primary.0 {
                (secondary, primary)
            } else {
                (primary, secondary)
            };
            for (bar_height, color, shown) in [back, front] {
                if shown && bar_height > 0 {
                    surface.fill_rect(
                        SurfaceRect::new(
                            x as i32,
                            (height - bar_height) as i32,
                            column_width,
                            bar_height,
                        ),
                        color,
                    );
                }
            }
        }
    }

    fn paint_border(&self, surface: &mut dyn DrawSurface, palette: &dyn Palette) {
        let width = surface.width();
        let height = surface.height();
        let reserved = self.grid.reserved_left;
        let border = palette.border();

        if self.grid.side_panel && reserved >= 3 && width > reserved {
            surface.draw_rect(SurfaceRect::new(0, 0, reserved - 3, height), border);
            surface.draw_rect(
                SurfaceRect::new(reserved as i32, 0, width - reserved, height),
                border,
            );
        } else {
            surface.draw_rect(SurfaceRect::new(0, 0, width, height), border);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::IconSource;

    #[derive(Debug, Clone, PartialEq)]
    enum Op {
        Fill(SurfaceRect, Color),
        Rect(SurfaceRect, Color),
        Line(SurfacePoint, SurfacePoint, Color),
        Text(String, SurfacePoint),
    }

    struct RecordingSurface {
        width: u32,
        height: u32,
        stroke: Stroke,
        ops: Vec<Op>,
    }

    impl RecordingSurface {
        fn new(width: u32, height: u32) -> Self {
            Self {
                width,
                height,
                stroke: Stroke::default(),
                ops: Vec::new(),
            }
        }

        fn lines_with_color(&self, color: Color) -> Vec<(SurfacePoint, SurfacePoint)> {
            self.ops
                .iter()
                .filter_map(|op| match op {
                    Op::Line(from, to, c) if *c == color => Some((*from, *to)),
                    _ => None,
                })
                .collect()
        }

        fn fills_with_color(&self, color: Color) -> Vec<SurfaceRect> {
            self.ops
                .iter()
                .filter_map(|op| match op {
                    Op::Fill(rect, c) if *c == color => Some(*rect),
                    _ => None,
                })
                .collect()
        }
    }

    impl DrawSurface for RecordingSurface {
        fn width(&self) -> u32 {
            self.width
        }

        fn height(&self) -> u32 {
            self.height
        }

        fn set_stroke(&mut self, stroke: Stroke) {
            self.stroke = stroke;
        }

        fn fill_rect(&mut self, rect: SurfaceRect, color: Color) {
            self.ops.push(Op::Fill(rect, color));
        }

        fn draw_rect(&mut self, rect: SurfaceRect, color: Color) {
            self.ops.push(Op::Rect(rect, color));
        }

        fn draw_line(&mut self, from: SurfacePoint, to: SurfacePoint) {
            self.ops.push(Op::Line(from, to, self.stroke.color));
        }

        fn draw_image(&mut self, _icon: &dyn IconSource, _origin: SurfacePoint) {}

        fn draw_text(
            &mut self,
            text: &str,
            origin: SurfacePoint,
            _color: Color,
            _orientation: TextOrientation,
        ) {
            self.ops.push(Op::Text(text.to_string(), origin));
        }
    }

    #[test]
    fn worked_example_scales_the_newest_sample_to_83_pixels() {
        let engine = ChartEngine::throughput();
        engine.push(Sample::new(10.0, 20.0));
        engine.push(Sample::new(30.0, 5.0));

        let mut surface = RecordingSurface::new(200, 100);
        engine.render(&mut surface).expect("render succeeds");

        // Observed max 30, floor 10, padding 0.2 -> maximum 36; the newest
        // primary value 30 lands at floor(30 / 36 * 100) = 83 pixels, drawn
        // at y = 100 - 83 in the rightmost column.
        let up = ThroughputPalette.primary_series();
        let lines = surface.lines_with_color(up);
        assert_eq!(lines.first().map(|(from, _)| *from), Some(SurfacePoint::new(198, 17)));
    }

    #[test]
    fn empty_buffer_renders_background_only() {
        let engine = ChartEngine::throughput();
        let mut surface = RecordingSurface::new(200, 100);
        engine.render(&mut surface).expect("render succeeds");

        assert!(surface.lines_with_color(ThroughputPalette.primary_series()).is_empty());
        assert!(!surface.fills_with_color(ThroughputPalette.surface_fill()).is_empty());
    }

    #[test]
    fn zero_sized_surface_is_a_noop() {
        let engine = ChartEngine::throughput();
        let mut surface = RecordingSurface::new(0, 100);
        engine.render(&mut surface).expect("render succeeds");
        assert!(surface.ops.is_empty());
    }

    #[test]
    fn hidden_series_is_not_drawn_and_does_not_scale() {
        let engine = ChartEngine::throughput();
        engine.push(Sample::new(15.0, 900.0));
        engine.set_visible_series(SeriesVisibility::PRIMARY_ONLY);

        let mut surface = RecordingSurface::new(200, 100);
        engine.render(&mut surface).expect("render succeeds");

        assert!(surface.lines_with_color(ThroughputPalette.secondary_series()).is_empty());
        // Maximum is 15 * 1.2 = 18, so the primary lands at floor(15/18*100).
        let lines = surface.lines_with_color(ThroughputPalette.primary_series());
        assert_eq!(lines.first().map(|(from, _)| from.y), Some(100 - 83));
    }

    #[test]
    fn width_driven_render_evicts_to_surface_width() {
        let engine = ChartEngine::usage();
        for i in 0..400 {
            engine.push(Sample::single(f64::from(i)));
        }

        let mut surface = RecordingSurface::new(300, 100);
        engine.render(&mut surface).expect("render succeeds");

        assert_eq!(engine.sample_count(), 250);
    }

    #[test]
    fn usage_gutter_draws_tick_labels() {
        let engine = ChartEngine::usage();
        engine.push(Sample::new(100.0, 40.0));

        let mut surface = RecordingSurface::new(300, 100);
        engine.render(&mut surface).expect("render succeeds");

        let labels: Vec<String> = surface
            .ops
            .iter()
            .filter_map(|op| match op {
                Op::Text(text, _) => Some(text.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(labels.len(), 5);
        // Topmost label carries the axis maximum (100 * 1.2 = 120).
        assert_eq!(labels[0], "120");
    }

    #[test]
    fn palette_swap_takes_effect_on_the_next_pass() {
        let engine = ChartEngine::throughput();
        let mut surface = RecordingSurface::new(200, 100);
        engine.render(&mut surface).expect("render succeeds");
        assert!(!surface.fills_with_color(ThroughputPalette.surface_fill()).is_empty());

        engine.set_palette(Arc::new(UsagePalette));
        let mut surface = RecordingSurface::new(200, 100);
        engine.render(&mut surface).expect("render succeeds");
        assert!(!surface.fills_with_color(UsagePalette.surface_fill()).is_empty());
    }

    #[test]
    fn dispose_is_immediate() {
        let engine = ChartEngine::throughput();
        assert!(engine.is_running());
        engine.dispose();
        assert!(!engine.is_running());
    }

    #[test]
    fn last_sample_defaults_to_zero() {
        let engine = ChartEngine::throughput();
        assert_eq!(engine.last_sample(), Sample::ZERO);
        engine.push(Sample::new(1.0, 2.0));
        assert_eq!(engine.last_sample(), Sample::new(1.0, 2.0));
    }

    #[test]
    fn invalid_configurations_are_rejected() {
        let mut config = ChartConfig::throughput();
        config.tick_interval = Duration::ZERO;
        assert!(ChartEngine::with_config(config, Arc::new(ThroughputPalette)).is_err());

        let mut config = ChartConfig::throughput();
        config.capacity = CapacityPolicy::Fixed {
            capacity: 0,
            batch: 1,
        };
        assert!(ChartEngine::with_config(config, Arc::new(ThroughputPalette)).is_err());
    }

    mod scheduling {
        use super::*;
        use std::sync::atomic::AtomicUsize;

        #[derive(Debug)]
        struct WidgetTarget {
            engine: Arc<ChartEngine>,
            repaints: AtomicUsize,
        }

        impl RepaintTarget for WidgetTarget {
            fn is_live(&self) -> bool {
                self.engine.is_running()
            }

            fn request_repaint(&self) -> crate::error::Result<()> {
                self.repaints.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }

        #[tokio::test(start_paused = true)]
        async fn dispose_stops_scheduler_ticks_within_one_interval() {
            let engine = Arc::new(ChartEngine::usage());
            let target = Arc::new(WidgetTarget {
                engine: Arc::clone(&engine),
                repaints: AtomicUsize::new(0),
            });
            engine
                .start_scheduler(Arc::clone(&target) as Arc<dyn RepaintTarget>)
                .expect("scheduler starts");

            tokio::time::sleep(Duration::from_millis(120)).await;
            tokio::task::yield_now().await;
            assert_eq!(target.repaints.load(Ordering::SeqCst), 2);

            engine.dispose();
            assert!(!engine.is_running());

            let seen = target.repaints.load(Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(300)).await;
            tokio::task::yield_now().await;
            assert_eq!(target.repaints.load(Ordering::SeqCst), seen);
        }

        #[tokio::test(start_paused = true)]
        async fn start_after_dispose_is_ignored() {
            let engine = Arc::new(ChartEngine::usage());
            engine.dispose();
            let target = Arc::new(WidgetTarget {
                engine: Arc::clone(&engine),
                repaints: AtomicUsize::new(0),
            });
            engine
                .start_scheduler(Arc::clone(&target) as Arc<dyn RepaintTarget>)
                .expect("call is accepted");

            tokio::time::sleep(Duration::from_millis(200)).await;
            tokio::task::yield_now().await;
            assert_eq!(target.repaints.load(Ordering::SeqCst), 0);
        }
    }
}
