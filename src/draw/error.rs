use crate::draw::state::SessionState;

/// Input event names used in precondition reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    StrokeStart,
    StrokeMove,
    StrokeEnd,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::StrokeStart => "stroke_start",
            EventKind::StrokeMove => "stroke_move",
            EventKind::StrokeEnd => "stroke_end",
        }
    }
}

/// Recoverable engine errors. None of these leave the engine in a
/// different state than before the rejected call.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawError {
    Precondition {
        event: EventKind,
        state: SessionState,
    },
    MissingCanvas,
    InvalidViewport {
        width: f32,
        height: f32,
    },
    InvalidWidth(f32),
    StrokeInProgress,
    UnknownQuickColor(usize),
}

impl std::fmt::Display for DrawError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DrawError::Precondition { event, state } => {
                write!(f, "{} is not valid while {:?}", event.as_str(), state)
            }
            DrawError::MissingCanvas => write!(f, "canvas has not been initialized"),
            DrawError::InvalidViewport { width, height } => {
                write!(f, "viewport {width}x{height} cannot back a canvas")
            }
            DrawError::InvalidWidth(width) => {
                write!(f, "stroke width {width} must be a positive finite number")
            }
            DrawError::StrokeInProgress => write!(f, "a stroke is in progress"),
            DrawError::UnknownQuickColor(index) => {
                write!(f, "no quick color at palette index {index}")
            }
        }
    }
}

impl std::error::Error for DrawError {}
