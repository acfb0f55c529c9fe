use crate::draw::model::{Color, Point, Size};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Events delivered by the input source and the UI controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    StrokeStart {
        x: f32,
        y: f32,
        #[serde(default)]
        viewport: Option<Size>,
    },
    StrokeMove {
        x: f32,
        y: f32,
    },
    StrokeEnd,
    Undo,
    Redo,
    SetColor {
        color: Color,
    },
    SetWidth {
        width: f32,
    },
    SelectQuickColor {
        index: usize,
    },
}

impl InputEvent {
    pub fn point(&self) -> Option<Point> {
        match self {
            InputEvent::StrokeStart { x, y, .. } | InputEvent::StrokeMove { x, y } => {
                Some(Point::new(*x, *y))
            }
            _ => None,
        }
    }
}

/// What the engine did with an [`InputEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    StrokeStarted,
    CanvasUpdated,
    StrokeCommitted { history_index: usize },
    NoChange,
    StyleChanged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Saved(PathBuf),
    Failed(String),
}

impl ExportOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, ExportOutcome::Saved(_))
    }
}
