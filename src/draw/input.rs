use crate::draw::composite::RgbaBuffer;
use crate::draw::curve::CurveBuilder;
use crate::draw::error::{DrawError, EventKind};
use crate::draw::history::SnapshotHistory;
use crate::draw::mapper::map_to_canvas;
use crate::draw::model::{Point, Size, StrokeStyle};
use crate::draw::render::{stroke_segment, DirtyRect};
use crate::draw::state::SessionState;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
struct ActiveStroke {
    style: StrokeStyle,
    viewport: Size,
    canvas: Size,
    curve: CurveBuilder,
    segments: usize,
    dirty: Option<DirtyRect>,
}

/// What a finished stroke left behind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeSummary {
    pub style: StrokeStyle,
    pub segments: usize,
    pub dirty: Option<DirtyRect>,
    pub history_index: usize,
}

/// Drives one stroke at a time from pointer samples to a committed snapshot.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StrokeSession {
    active: Option<ActiveStroke>,
}

impl StrokeSession {
    pub fn state(&self) -> SessionState {
        if self.active.is_some() {
            SessionState::Active
        } else {
            SessionState::Idle
        }
    }

    /// Style captured for the stroke in progress.
    pub fn style(&self) -> Option<StrokeStyle> {
        self.active.as_ref().map(|stroke| stroke.style)
    }

    fn check(&self, event: EventKind) -> Result<SessionState, DrawError> {
        let state = self.state();
        state
            .next(event)
            .ok_or(DrawError::Precondition { event, state })
    }

    /// Maps `raw` and opens the curve there. Returns the canvas-space point.
    pub fn on_start(
        &mut self,
        raw: Point,
        viewport: Size,
        canvas: Size,
        style: StrokeStyle,
    ) -> Result<Point, DrawError> {
        self.check(EventKind::StrokeStart)?;
        if !viewport.is_drawable() {
            return Err(DrawError::InvalidViewport {
                width: viewport.width,
                height: viewport.height,
            });
        }

        let point = map_to_canvas(raw, viewport, canvas);
        let mut curve = CurveBuilder::default();
        curve.begin(point);
        self.active = Some(ActiveStroke {
            style,
            viewport,
            canvas,
            curve,
            segments: 0,
            dirty: None,
        });
        Ok(point)
    }

    /// Extends the curve and strokes the new segment into `live`.
    ///
    /// `live` is copied before drawing if anything else (history, display)
    /// still holds it, so published snapshots never change.
    pub fn on_move(
        &mut self,
        raw: Point,
        live: &mut Arc<RgbaBuffer>,
    ) -> Result<Option<DirtyRect>, DrawError> {
        let state = self.state();
        let stroke = self.active.as_mut().ok_or(DrawError::Precondition {
            event: EventKind::StrokeMove,
            state,
        })?;

        let point = map_to_canvas(raw, stroke.viewport, stroke.canvas);
        let Some(segment) = stroke.curve.extend(point) else {
            return Ok(None);
        };
        stroke.segments += 1;

        let touched = stroke_segment(Arc::make_mut(live), &segment, &stroke.style);
        if let Some(rect) = touched {
            stroke.dirty = Some(stroke.dirty.map_or(rect, |d| d.union(rect)));
        }
        Ok(touched)
    }

    /// Closes the curve and commits `live` as a new history snapshot, even
    /// when no segment was drawn.
    pub fn on_end(
        &mut self,
        live: &Arc<RgbaBuffer>,
        history: &mut SnapshotHistory,
    ) -> Result<StrokeSummary, DrawError> {
        let state = self.state();
        let mut stroke = self.active.take().ok_or(DrawError::Precondition {
            event: EventKind::StrokeEnd,
            state,
        })?;
        stroke.curve.end();
        history.commit(Arc::clone(live));
        Ok(StrokeSummary {
            style: stroke.style,
            segments: stroke.segments,
            dirty: stroke.dirty,
            history_index: history.cursor(),
        })
    }
}
