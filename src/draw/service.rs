use crate::draw::composite::RgbaBuffer;
use crate::draw::error::DrawError;
use crate::draw::history::SnapshotHistory;
use crate::draw::input::{StrokeSession, StrokeSummary};
use crate::draw::messages::{EventOutcome, ExportOutcome, InputEvent};
use crate::draw::model::{Color, Point, Size, StrokeStyle};
use crate::draw::perf::{perf_debug_from_env, RasterPerfSnapshot, RasterPerfStats};
use crate::draw::render::DirtyRect;
use crate::draw::save::ExportSink;
use crate::draw::settings::DrawSettings;
use std::sync::Arc;
use std::time::Instant;

/// Display collaborator. Receives the canvas after every init, move, undo
/// and redo. Holding on to the `Arc` is allowed; the engine then draws the
/// next sample into a fresh copy instead of the published buffer.
pub trait CanvasSink {
    fn canvas_updated(&mut self, canvas: &Arc<RgbaBuffer>);
}

impl<F> CanvasSink for F
where
    F: FnMut(&Arc<RgbaBuffer>),
{
    fn canvas_updated(&mut self, canvas: &Arc<RgbaBuffer>) {
        self(canvas)
    }
}

struct Surface {
    live: Arc<RgbaBuffer>,
    history: SnapshotHistory,
    viewport: Size,
}

/// Single-threaded drawing engine: style controls, one stroke at a time,
/// snapshot history, display and export collaborators.
pub struct DrawEngine {
    settings: DrawSettings,
    style: StrokeStyle,
    surface: Option<Surface>,
    session: StrokeSession,
    sink: Option<Box<dyn CanvasSink>>,
    perf: RasterPerfStats,
}

impl Default for DrawEngine {
    fn default() -> Self {
        Self::new(DrawSettings::default())
    }
}

impl DrawEngine {
    pub fn new(mut settings: DrawSettings) -> Self {
        settings.sanitize();
        let mut perf = RasterPerfStats::default();
        perf.set_enabled(settings.perf_stats || perf_debug_from_env());
        Self {
            style: settings.default_style(),
            settings,
            surface: None,
            session: StrokeSession::default(),
            sink: None,
            perf,
        }
    }

    pub fn settings(&self) -> &DrawSettings {
        &self.settings
    }

    pub fn set_canvas_sink(&mut self, sink: Box<dyn CanvasSink>) {
        self.sink = Some(sink);
        self.notify();
    }

    /// Canvas side length for a viewport: `viewport.width * canvas_scale`.
    pub fn canvas_side_for(&self, viewport: Size) -> u32 {
        (viewport.width * self.settings.canvas_scale).ceil().max(1.0) as u32
    }

    /// Creates the blank square canvas and seeds history with it. Calling it
    /// again while idle starts over with a fresh canvas and empty history.
    pub fn initialize(&mut self, viewport: Size) -> Result<(), DrawError> {
        if self.session.state().is_active() {
            return Err(DrawError::StrokeInProgress);
        }
        if !viewport.is_drawable() {
            return Err(DrawError::InvalidViewport {
                width: viewport.width,
                height: viewport.height,
            });
        }

        let side = self.canvas_side_for(viewport);
        if side > self.settings.max_canvas_side {
            tracing::warn!(
                side,
                max = self.settings.max_canvas_side,
                "requested canvas exceeds the size limit"
            );
            return Err(DrawError::InvalidViewport {
                width: viewport.width,
                height: viewport.height,
            });
        }
        let live = Arc::new(RgbaBuffer::new(side, side, self.settings.background));
        tracing::info!(
            side,
            viewport_width = viewport.width,
            viewport_height = viewport.height,
            "draw canvas initialized"
        );
        self.surface = Some(Surface {
            history: SnapshotHistory::new(Arc::clone(&live)),
            live,
            viewport,
        });
        self.notify();
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.surface.is_some()
    }

    pub fn is_stroking(&self) -> bool {
        self.session.state().is_active()
    }

    pub fn style(&self) -> StrokeStyle {
        self.style
    }

    /// Takes effect at the next `stroke_start`.
    pub fn set_color(&mut self, color: Color) {
        self.style.color = color;
        tracing::debug!(?color, "draw color changed");
    }

    /// Palette offered by the style controls.
    pub fn quick_colors(&self) -> &[Color] {
        &self.settings.quick_colors
    }

    /// Sets the color to palette entry `index`; effective next stroke.
    pub fn select_quick_color(&mut self, index: usize) -> Result<Color, DrawError> {
        let color = *self
            .settings
            .quick_colors
            .get(index)
            .ok_or(DrawError::UnknownQuickColor(index))?;
        self.set_color(color);
        Ok(color)
    }

    /// Takes effect at the next `stroke_start`. Values outside the
    /// configured range are clamped.
    pub fn set_width(&mut self, width: f32) -> Result<f32, DrawError> {
        if !(width.is_finite() && width > 0.0) {
            tracing::warn!(width, "rejected stroke width");
            return Err(DrawError::InvalidWidth(width));
        }
        self.style.width = self.settings.clamp_width(width);
        tracing::debug!(width = self.style.width, "draw width changed");
        Ok(self.style.width)
    }

    pub fn stroke_start(&mut self, point: Point, viewport: Size) -> Result<Point, DrawError> {
        let surface = self.surface.as_mut().ok_or(DrawError::MissingCanvas)?;
        let mapped = self
            .session
            .on_start(point, viewport, surface.live.size(), self.style)
            .inspect_err(|err| tracing::warn!(%err, "stroke start rejected"))?;
        surface.viewport = viewport;
        tracing::debug!(x = mapped.x, y = mapped.y, style = ?self.style, "stroke started");
        Ok(mapped)
    }

    pub fn stroke_move(&mut self, point: Point) -> Result<Option<DirtyRect>, DrawError> {
        let surface = self.surface.as_mut().ok_or(DrawError::MissingCanvas)?;
        let started = Instant::now();
        let touched = self
            .session
            .on_move(point, &mut surface.live)
            .inspect_err(|err| tracing::warn!(%err, "stroke move rejected"))?;
        self.perf.record(started.elapsed(), touched);
        self.notify();
        Ok(touched)
    }

    pub fn stroke_end(&mut self) -> Result<StrokeSummary, DrawError> {
        let surface = self.surface.as_mut().ok_or(DrawError::MissingCanvas)?;
        let summary = self
            .session
            .on_end(&surface.live, &mut surface.history)
            .inspect_err(|err| tracing::warn!(%err, "stroke end rejected"))?;
        tracing::debug!(
            segments = summary.segments,
            history_len = surface.history.len(),
            cursor = summary.history_index,
            "stroke committed"
        );
        if self.perf.is_enabled() {
            let perf = self.perf.snapshot();
            tracing::debug!(
                avg_ms = perf.avg_ms,
                p95_ms = perf.p95_ms,
                worst_ms = perf.worst_ms,
                samples = perf.samples,
                "stroke raster cost"
            );
        }
        Ok(summary)
    }

    /// `Ok(false)` when already at the oldest snapshot.
    pub fn undo(&mut self) -> Result<bool, DrawError> {
        self.navigate(SnapshotHistory::undo, "undo")
    }

    /// `Ok(false)` when already at the newest snapshot.
    pub fn redo(&mut self) -> Result<bool, DrawError> {
        self.navigate(SnapshotHistory::redo, "redo")
    }

    fn navigate(
        &mut self,
        step: fn(&mut SnapshotHistory) -> Option<Arc<RgbaBuffer>>,
        label: &str,
    ) -> Result<bool, DrawError> {
        if self.session.state().is_active() {
            return Err(DrawError::StrokeInProgress);
        }
        let surface = self.surface.as_mut().ok_or(DrawError::MissingCanvas)?;
        let Some(snapshot) = step(&mut surface.history) else {
            tracing::debug!(cursor = surface.history.cursor(), "{label} has nothing to do");
            return Ok(false);
        };
        surface.live = snapshot;
        tracing::debug!(cursor = surface.history.cursor(), "{label} applied");
        self.notify();
        Ok(true)
    }

    /// Dispatches a collaborator event. `StrokeStart` without a viewport
    /// reuses the last known one.
    pub fn handle(&mut self, event: InputEvent) -> Result<EventOutcome, DrawError> {
        match event {
            InputEvent::StrokeStart { x, y, viewport } => {
                let viewport = match viewport {
                    Some(viewport) => viewport,
                    None => self.viewport().ok_or(DrawError::MissingCanvas)?,
                };
                self.stroke_start(Point::new(x, y), viewport)?;
                Ok(EventOutcome::StrokeStarted)
            }
            InputEvent::StrokeMove { x, y } => Ok(match self.stroke_move(Point::new(x, y))? {
                Some(_) => EventOutcome::CanvasUpdated,
                None => EventOutcome::NoChange,
            }),
            InputEvent::StrokeEnd => {
                let summary = self.stroke_end()?;
                Ok(EventOutcome::StrokeCommitted {
                    history_index: summary.history_index,
                })
            }
            InputEvent::Undo => Ok(if self.undo()? {
                EventOutcome::CanvasUpdated
            } else {
                EventOutcome::NoChange
            }),
            InputEvent::Redo => Ok(if self.redo()? {
                EventOutcome::CanvasUpdated
            } else {
                EventOutcome::NoChange
            }),
            InputEvent::SetColor { color } => {
                self.set_color(color);
                Ok(EventOutcome::StyleChanged)
            }
            InputEvent::SetWidth { width } => {
                self.set_width(width)?;
                Ok(EventOutcome::StyleChanged)
            }
            InputEvent::SelectQuickColor { index } => {
                self.select_quick_color(index)?;
                Ok(EventOutcome::StyleChanged)
            }
        }
    }

    pub fn perf_snapshot(&self) -> RasterPerfSnapshot {
        self.perf.snapshot()
    }

    pub fn viewport(&self) -> Option<Size> {
        self.surface.as_ref().map(|s| s.viewport)
    }

    pub fn live_canvas(&self) -> Result<&Arc<RgbaBuffer>, DrawError> {
        self.surface
            .as_ref()
            .map(|s| &s.live)
            .ok_or(DrawError::MissingCanvas)
    }

    pub fn canvas_size(&self) -> Option<Size> {
        self.surface.as_ref().map(|s| s.live.size())
    }

    pub fn history(&self) -> Option<&SnapshotHistory> {
        self.surface.as_ref().map(|s| &s.history)
    }

    pub fn history_len(&self) -> usize {
        self.history().map_or(0, SnapshotHistory::len)
    }

    pub fn history_cursor(&self) -> Option<usize> {
        self.history().map(SnapshotHistory::cursor)
    }

    pub fn can_undo(&self) -> bool {
        !self.is_stroking() && self.history().is_some_and(SnapshotHistory::can_undo)
    }

    pub fn can_redo(&self) -> bool {
        !self.is_stroking() && self.history().is_some_and(SnapshotHistory::can_redo)
    }

    /// Owned copy of the live canvas for external persistence.
    pub fn export_image(&self) -> Result<RgbaBuffer, DrawError> {
        self.live_canvas().map(|live| (**live).clone())
    }

    /// Hands a copy of the live canvas to `sink`. Failures are reported in
    /// the outcome and never disturb the drawing session.
    pub fn export_to(&self, sink: &mut dyn ExportSink) -> ExportOutcome {
        let image = match self.export_image() {
            Ok(image) => image,
            Err(err) => {
                tracing::error!(%err, "draw export skipped");
                return ExportOutcome::Failed(err.to_string());
            }
        };
        match sink.export(&image) {
            Ok(path) => {
                tracing::info!(path = %path.display(), "draw canvas exported");
                ExportOutcome::Saved(path)
            }
            Err(err) => {
                tracing::error!(error = %format!("{err:#}"), "draw export failed");
                ExportOutcome::Failed(format!("{err:#}"))
            }
        }
    }

    fn notify(&mut self) {
        let (Some(sink), Some(surface)) = (self.sink.as_mut(), self.surface.as_ref()) else {
            return;
        };
        sink.canvas_updated(&surface.live);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::error::EventKind;
    use crate::draw::state::SessionState;
    use std::cell::RefCell;
    use std::path::PathBuf;
    use std::rc::Rc;

    const VIEWPORT: Size = Size::new(400.0, 400.0);

    fn engine() -> DrawEngine {
        let mut engine = DrawEngine::default();
        engine.initialize(VIEWPORT).expect("initialize");
        engine
    }

    fn stroke(engine: &mut DrawEngine, points: &[(f32, f32)]) {
        let (first, rest) = points.split_first().expect("at least one point");
        engine
            .stroke_start(Point::new(first.0, first.1), VIEWPORT)
            .expect("start");
        for (x, y) in rest {
            engine.stroke_move(Point::new(*x, *y)).expect("move");
        }
        engine.stroke_end().expect("end");
    }

    #[test]
    fn events_before_initialize_report_missing_canvas() {
        let mut engine = DrawEngine::default();
        assert_eq!(
            engine.stroke_start(Point::new(1.0, 1.0), VIEWPORT),
            Err(DrawError::MissingCanvas)
        );
        assert_eq!(engine.undo(), Err(DrawError::MissingCanvas));
        assert_eq!(engine.export_image(), Err(DrawError::MissingCanvas));
        assert!(engine.live_canvas().is_err());
        assert_eq!(engine.history_len(), 0);
        assert!(!engine.is_initialized());
    }

    #[test]
    fn perf_stats_follow_settings() {
        let mut engine = DrawEngine::new(DrawSettings {
            perf_stats: true,
            ..DrawSettings::default()
        });
        engine.initialize(VIEWPORT).expect("initialize");
        assert!(engine.is_initialized());
        stroke(&mut engine, &[(100.0, 100.0), (110.0, 100.0), (120.0, 100.0)]);

        let snapshot = engine.perf_snapshot();
        assert!(snapshot.enabled);
        assert_eq!(snapshot.samples, 2);
        assert!(snapshot.dirty_pixels_last > 0);
        assert!(snapshot.worst_ms >= snapshot.avg_ms);
    }

    #[test]
    fn canvas_is_twice_viewport_width_and_white() {
        let engine = engine();
        let live = engine.live_canvas().expect("canvas");
        assert_eq!((live.width, live.height), (800, 800));
        assert!(live.pixels.iter().all(|b| *b == 255));
        assert_eq!(engine.history_len(), 1);
        assert_eq!(engine.history_cursor(), Some(0));
    }

    #[test]
    fn style_changes_apply_to_next_stroke_only() {
        let mut engine = engine();
        engine
            .stroke_start(Point::new(100.0, 100.0), VIEWPORT)
            .expect("start");
        engine.set_color(Color::rgba(255, 0, 0, 255));
        engine.stroke_move(Point::new(120.0, 100.0)).expect("move");
        engine.stroke_end().expect("end");

        let live = engine.live_canvas().expect("canvas");
        assert_eq!(live.pixel(210, 200), Some(Color::BLACK));

        stroke(&mut engine, &[(100.0, 150.0), (120.0, 150.0)]);
        let live = engine.live_canvas().expect("canvas");
        assert_eq!(live.pixel(210, 300), Some(Color::rgba(255, 0, 0, 255)));
    }

    #[test]
    fn oversized_viewport_is_rejected_before_allocating() {
        let mut engine = DrawEngine::default();
        let huge = Size::new(1e6, 1e6);
        assert_eq!(
            engine.initialize(huge),
            Err(DrawError::InvalidViewport {
                width: 1e6,
                height: 1e6,
            })
        );
        assert!(!engine.is_initialized());

        let mut engine = DrawEngine::new(DrawSettings {
            max_canvas_side: 1000,
            ..DrawSettings::default()
        });
        engine.initialize(Size::new(500.0, 100.0)).expect("exactly at the limit");
        assert_eq!(engine.canvas_size(), Some(Size::new(1000.0, 1000.0)));
        assert!(engine.initialize(Size::new(500.5, 100.0)).is_err());
        assert_eq!(engine.canvas_size(), Some(Size::new(1000.0, 1000.0)));
    }

    #[test]
    fn quick_colors_come_from_settings() {
        let palette = vec![Color::rgba(1, 2, 3, 255), Color::rgba(4, 5, 6, 255)];
        let mut engine = DrawEngine::new(DrawSettings {
            quick_colors: palette.clone(),
            ..DrawSettings::default()
        });
        assert_eq!(engine.quick_colors(), palette.as_slice());

        assert_eq!(engine.select_quick_color(1), Ok(Color::rgba(4, 5, 6, 255)));
        assert_eq!(engine.style().color, Color::rgba(4, 5, 6, 255));
        assert_eq!(
            engine.handle(InputEvent::SelectQuickColor { index: 2 }),
            Err(DrawError::UnknownQuickColor(2))
        );
        assert_eq!(engine.style().color, Color::rgba(4, 5, 6, 255));
        assert_eq!(
            engine.handle(InputEvent::SelectQuickColor { index: 0 }),
            Ok(EventOutcome::StyleChanged)
        );
        assert_eq!(engine.style().color, Color::rgba(1, 2, 3, 255));
    }

    #[test]
    fn width_is_validated_and_clamped() {
        let mut engine = engine();
        assert_eq!(engine.set_width(0.0), Err(DrawError::InvalidWidth(0.0)));
        assert!(engine.set_width(f32::NAN).is_err());
        assert_eq!(engine.set_width(1000.0), Ok(100.0));
        assert_eq!(engine.set_width(3.0), Ok(3.0));
        assert_eq!(engine.style().width, 3.0);
    }

    #[test]
    fn undo_redo_swap_live_canvas_to_stored_snapshots() {
        let mut engine = engine();
        stroke(&mut engine, &[(100.0, 100.0), (120.0, 120.0)]);
        let after_stroke = Arc::clone(engine.live_canvas().expect("canvas"));

        assert_eq!(engine.undo(), Ok(true));
        assert_eq!(engine.live_canvas().expect("canvas").pixel(210, 210), Some(Color::WHITE));
        assert_eq!(engine.undo(), Ok(false));

        assert_eq!(engine.redo(), Ok(true));
        assert_eq!(**engine.live_canvas().expect("canvas"), *after_stroke);
        assert_eq!(engine.redo(), Ok(false));
    }

    #[test]
    fn drawing_after_undo_never_touches_stored_snapshots() {
        let mut engine = engine();
        stroke(&mut engine, &[(100.0, 100.0), (120.0, 120.0)]);
        engine.undo().expect("undo");

        let pristine = engine.history().and_then(|h| h.snapshot(0)).cloned().expect("pristine");
        stroke(&mut engine, &[(10.0, 10.0), (30.0, 30.0)]);
        assert!(pristine.pixels.iter().all(|b| *b == 255));
        assert_eq!(engine.history_len(), 2);
        assert!(!engine.can_redo());
    }

    #[test]
    fn undo_during_stroke_is_rejected() {
        let mut engine = engine();
        engine
            .stroke_start(Point::new(1.0, 1.0), VIEWPORT)
            .expect("start");
        assert_eq!(engine.undo(), Err(DrawError::StrokeInProgress));
        assert_eq!(engine.redo(), Err(DrawError::StrokeInProgress));
        assert_eq!(engine.initialize(VIEWPORT), Err(DrawError::StrokeInProgress));
        assert!(!engine.can_undo());
        assert!(engine.is_stroking());
    }

    #[test]
    fn out_of_order_events_leave_engine_usable() {
        let mut engine = engine();
        assert_eq!(
            engine.stroke_end().map(|s| s.segments),
            Err(DrawError::Precondition {
                event: EventKind::StrokeEnd,
                state: SessionState::Idle,
            })
        );
        assert_eq!(engine.history_len(), 1);
        stroke(&mut engine, &[(1.0, 1.0), (2.0, 2.0)]);
        assert_eq!(engine.history_len(), 2);
    }

    #[test]
    fn sink_sees_init_moves_and_history_navigation() {
        let seen = Rc::new(RefCell::new(0usize));
        let counter = Rc::clone(&seen);
        let mut engine = DrawEngine::default();
        engine.set_canvas_sink(Box::new(move |_: &Arc<RgbaBuffer>| {
            *counter.borrow_mut() += 1;
        }));
        engine.initialize(VIEWPORT).expect("initialize");
        assert_eq!(*seen.borrow(), 1);

        stroke(&mut engine, &[(100.0, 100.0), (110.0, 100.0), (120.0, 100.0)]);
        assert_eq!(*seen.borrow(), 3);

        engine.undo().expect("undo");
        engine.redo().expect("redo");
        engine.redo().expect("redo noop");
        assert_eq!(*seen.borrow(), 5);
    }

    #[test]
    fn handle_dispatches_serialized_events() {
        let mut engine = engine();
        let events = [
            InputEvent::SetWidth { width: 4.0 },
            InputEvent::StrokeStart {
                x: 100.0,
                y: 100.0,
                viewport: None,
            },
            InputEvent::StrokeMove { x: 120.0, y: 120.0 },
            InputEvent::StrokeEnd,
            InputEvent::Undo,
            InputEvent::Undo,
        ];
        let outcomes: Vec<_> = events
            .into_iter()
            .map(|e| engine.handle(e).expect("handled"))
            .collect();
        assert_eq!(
            outcomes,
            vec![
                EventOutcome::StyleChanged,
                EventOutcome::StrokeStarted,
                EventOutcome::CanvasUpdated,
                EventOutcome::StrokeCommitted { history_index: 1 },
                EventOutcome::CanvasUpdated,
                EventOutcome::NoChange,
            ]
        );
    }

    struct FailingSink;

    impl ExportSink for FailingSink {
        fn export(&mut self, _image: &RgbaBuffer) -> anyhow::Result<PathBuf> {
            Err(anyhow::anyhow!("photo library unavailable"))
        }
    }

    struct CapturingSink(Option<RgbaBuffer>);

    impl ExportSink for CapturingSink {
        fn export(&mut self, image: &RgbaBuffer) -> anyhow::Result<PathBuf> {
            self.0 = Some(image.clone());
            Ok(PathBuf::from("memory"))
        }
    }

    #[test]
    fn export_reports_failures_and_keeps_session_alive() {
        let mut engine = engine();
        let outcome = engine.export_to(&mut FailingSink);
        assert_eq!(
            outcome,
            ExportOutcome::Failed("photo library unavailable".to_owned())
        );

        stroke(&mut engine, &[(100.0, 100.0), (120.0, 120.0)]);
        let mut capture = CapturingSink(None);
        assert!(engine.export_to(&mut capture).is_saved());
        assert_eq!(
            capture.0.as_ref(),
            Some(&**engine.live_canvas().expect("canvas"))
        );
    }

    #[test]
    fn export_without_canvas_is_reported() {
        let engine = DrawEngine::default();
        let mut capture = CapturingSink(None);
        assert!(matches!(
            engine.export_to(&mut capture),
            ExportOutcome::Failed(_)
        ));
        assert!(capture.0.is_none());
    }
}
