use crate::draw::error::EventKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Active,
}

impl SessionState {
    pub fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }

    /// State after `event`, or `None` when the event is out of order.
    pub fn next(self, event: EventKind) -> Option<SessionState> {
        match (self, event) {
            (SessionState::Idle, EventKind::StrokeStart) => Some(SessionState::Active),
            (SessionState::Active, EventKind::StrokeMove) => Some(SessionState::Active),
            (SessionState::Active, EventKind::StrokeEnd) => Some(SessionState::Idle),
            _ => None,
        }
    }
}

pub fn can_transition(from: SessionState, to: SessionState) -> bool {
    matches!(
        (from, to),
        (SessionState::Idle, SessionState::Active) | (SessionState::Active, SessionState::Idle)
    ) || from == to
}
