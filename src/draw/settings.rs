use crate::draw::model::{Color, StrokeStyle};
use serde::{Deserialize, Serialize};

/// Hard ceiling for `max_canvas_side`: a 1 GiB RGBA canvas.
pub const CANVAS_SIDE_CEILING: u32 = 16_384;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DrawSettings {
    #[serde(default = "default_color")]
    pub default_color: Color,
    #[serde(default = "default_width", alias = "line_width")]
    pub default_width: f32,
    #[serde(default = "default_min_width")]
    pub min_width: f32,
    #[serde(default = "default_max_width")]
    pub max_width: f32,
    #[serde(default = "default_canvas_scale")]
    pub canvas_scale: f32,
    #[serde(default = "default_background")]
    pub background: Color,
    #[serde(default = "default_max_canvas_side")]
    pub max_canvas_side: u32,
    #[serde(default = "default_quick_colors")]
    pub quick_colors: Vec<Color>,
    #[serde(default)]
    pub debug_logging: bool,
    #[serde(default)]
    pub perf_stats: bool,
    #[serde(default = "default_export_subdir")]
    pub export_subdir: String,
}

fn default_color() -> Color {
    Color::BLACK
}

fn default_width() -> f32 {
    10.0
}

fn default_min_width() -> f32 {
    1.0
}

fn default_max_width() -> f32 {
    100.0
}

fn default_canvas_scale() -> f32 {
    2.0
}

fn default_background() -> Color {
    Color::WHITE
}

fn default_max_canvas_side() -> u32 {
    8192
}

fn default_export_subdir() -> String {
    "freehand_exports".to_owned()
}

fn default_quick_colors() -> Vec<Color> {
    vec![
        Color::rgba(0, 0, 0, 255),
        Color::rgba(255, 59, 48, 255),
        Color::rgba(255, 149, 0, 255),
        Color::rgba(255, 204, 0, 255),
        Color::rgba(52, 199, 89, 255),
        Color::rgba(0, 122, 255, 255),
        Color::rgba(175, 82, 222, 255),
    ]
}

impl Default for DrawSettings {
    fn default() -> Self {
        Self {
            default_color: default_color(),
            default_width: default_width(),
            min_width: default_min_width(),
            max_width: default_max_width(),
            canvas_scale: default_canvas_scale(),
            background: default_background(),
            max_canvas_side: default_max_canvas_side(),
            quick_colors: default_quick_colors(),
            debug_logging: false,
            perf_stats: false,
            export_subdir: default_export_subdir(),
        }
    }
}

impl DrawSettings {
    /// Repairs values a hand-edited settings file can get wrong.
    pub fn sanitize(&mut self) {
        if !(self.min_width.is_finite() && self.min_width > 0.0) {
            self.min_width = default_min_width();
        }
        if !(self.max_width.is_finite() && self.max_width > 0.0) {
            self.max_width = default_max_width();
        }
        if self.min_width > self.max_width {
            std::mem::swap(&mut self.min_width, &mut self.max_width);
        }
        if !self.default_width.is_finite() {
            self.default_width = default_width();
        }
        self.default_width = self.clamp_width(self.default_width);
        if !(self.canvas_scale.is_finite() && self.canvas_scale > 0.0) {
            self.canvas_scale = default_canvas_scale();
        }
        if self.max_canvas_side == 0 {
            self.max_canvas_side = default_max_canvas_side();
        }
        self.max_canvas_side = self.max_canvas_side.min(CANVAS_SIDE_CEILING);
        if self.quick_colors.is_empty() {
            self.quick_colors = default_quick_colors();
        }
        if self.export_subdir.trim().is_empty() {
            self.export_subdir = default_export_subdir();
        }
    }

    pub fn clamp_width(&self, width: f32) -> f32 {
        width.clamp(self.min_width, self.max_width)
    }

    pub fn default_style(&self) -> StrokeStyle {
        StrokeStyle {
            color: self.default_color,
            width: self.default_width,
            ..StrokeStyle::default()
        }
    }
}
