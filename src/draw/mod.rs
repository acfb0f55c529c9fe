pub mod composite;
pub mod curve;
pub mod error;
pub mod history;
pub mod input;
pub mod mapper;
pub mod messages;
pub mod model;
pub mod perf;
pub mod render;
pub mod save;
pub mod service;
pub mod settings;
pub mod settings_store;
pub mod state;

pub use composite::RgbaBuffer;
pub use error::DrawError;
pub use messages::{EventOutcome, ExportOutcome, InputEvent};
pub use model::{Color, Point, Size, StrokeStyle};
pub use service::{CanvasSink, DrawEngine};
