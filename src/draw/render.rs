use crate::draw::composite::RgbaBuffer;
use crate::draw::curve::CurveSegment;
use crate::draw::model::{LineCap, Point, StrokeStyle};

/// Extra pixels around a stroke's geometric bounds reserved for the
/// anti-aliased fringe.
const AA_PAD: f32 = 1.0;
/// Pixel coordinates are limited to this magnitude before integer
/// conversion. Far larger than any canvas side, far below `i32::MAX`.
const COORD_LIMIT: f32 = 16_777_216.0;

/// NaN maps to 0, like a saturating cast.
fn pixel_coord(value: f32) -> i32 {
    value.clamp(-COORD_LIMIT, COORD_LIMIT) as i32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirtyRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl DirtyRect {
    /// Smallest integer rect covering `min..=max` grown by `pad` on each side.
    /// Coordinates are limited to `±COORD_LIMIT` first, so far off-canvas
    /// geometry stays representable and still clips against the canvas.
    pub fn from_bounds(min: Point, max: Point, pad: f32) -> Self {
        let x0 = pixel_coord((min.x - pad).floor());
        let y0 = pixel_coord((min.y - pad).floor());
        let x1 = pixel_coord((max.x + pad).ceil());
        let y1 = pixel_coord((max.y + pad).ceil());
        Self {
            x: x0,
            y: y0,
            width: x1.saturating_sub(x0).max(1),
            height: y1.saturating_sub(y0).max(1),
        }
    }

    pub fn union(self, other: DirtyRect) -> DirtyRect {
        let min_x = self.x.min(other.x);
        let min_y = self.y.min(other.y);
        let max_x = self.right().max(other.right());
        let max_y = self.bottom().max(other.bottom());
        DirtyRect {
            x: min_x,
            y: min_y,
            width: max_x.saturating_sub(min_x).max(1),
            height: max_y.saturating_sub(min_y).max(1),
        }
    }

    pub fn clamp(self, width: u32, height: u32) -> Option<DirtyRect> {
        let max_w = i32::try_from(width).unwrap_or(i32::MAX);
        let max_h = i32::try_from(height).unwrap_or(i32::MAX);
        let x0 = self.x.clamp(0, max_w);
        let y0 = self.y.clamp(0, max_h);
        let x1 = self.right().clamp(0, max_w);
        let y1 = self.bottom().clamp(0, max_h);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(DirtyRect {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
        })
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && y >= self.y && x < self.right() && y < self.bottom()
    }

    fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    fn area(&self) -> usize {
        self.width.max(0) as usize * self.height.max(0) as usize
    }
}

/// Pixels a stroked segment may touch, before clipping to the canvas.
pub fn segment_dirty_bounds(segment: &CurveSegment, style: &StrokeStyle) -> DirtyRect {
    let (min, max) = segment.bounds();
    DirtyRect::from_bounds(min, max, style.half_width() + AA_PAD)
}

/// Returns a new canvas equal to `base` with `segment` stroked on top.
pub fn composite(base: &RgbaBuffer, segment: &CurveSegment, style: &StrokeStyle) -> RgbaBuffer {
    let mut output = base.clone();
    stroke_segment(&mut output, segment, style);
    output
}

/// Strokes `segment` into `canvas` in place and returns the clipped region
/// that was written, or `None` when nothing on the canvas was touched.
pub fn stroke_segment(
    canvas: &mut RgbaBuffer,
    segment: &CurveSegment,
    style: &StrokeStyle,
) -> Option<DirtyRect> {
    if !(style.width.is_finite() && style.width > 0.0) || style.color.a == 0 {
        return None;
    }
    let clip = segment_dirty_bounds(segment, style).clamp(canvas.width, canvas.height)?;
    let coverage = rasterize_coverage(&segment.flatten(), style, clip);

    let mut touched: Option<DirtyRect> = None;
    for row in 0..clip.height {
        for col in 0..clip.width {
            let c = coverage[(row * clip.width + col) as usize];
            if c <= 0.0 {
                continue;
            }
            let (x, y) = (clip.x + col, clip.y + row);
            canvas.blend_pixel(x as u32, y as u32, style.color, c);
            let px = DirtyRect {
                x,
                y,
                width: 1,
                height: 1,
            };
            touched = Some(touched.map_or(px, |t| t.union(px)));
        }
    }
    touched
}

/// Per-pixel coverage of the stroked polyline inside `clip`, row-major.
/// Overlapping pieces take the max so joints are not blended twice.
fn rasterize_coverage(points: &[Point], style: &StrokeStyle, clip: DirtyRect) -> Vec<f32> {
    let mut coverage = vec![0.0f32; clip.area()];
    let half = style.half_width();
    let reach = half + AA_PAD;

    let pieces: Vec<(Point, Point)> = match points {
        [] => return coverage,
        [only] => vec![(*only, *only)],
        _ => points.windows(2).map(|w| (w[0], w[1])).collect(),
    };

    for (a, b) in pieces {
        let piece_bounds = DirtyRect::from_bounds(
            Point::new(a.x.min(b.x), a.y.min(b.y)),
            Point::new(a.x.max(b.x), a.y.max(b.y)),
            reach,
        );
        let Some(area) = intersect_dirty_rect(piece_bounds, clip) else {
            continue;
        };
        for y in area.y..area.bottom() {
            for x in area.x..area.right() {
                let center = Point::new(x as f32 + 0.5, y as f32 + 0.5);
                let dist = point_segment_distance(center, a, b, style.cap);
                let c = (half + 0.5 - dist).clamp(0.0, 1.0);
                if c <= 0.0 {
                    continue;
                }
                let idx = ((y - clip.y) * clip.width + (x - clip.x)) as usize;
                if coverage[idx] < c {
                    coverage[idx] = c;
                }
            }
        }
    }
    coverage
}

fn intersect_dirty_rect(a: DirtyRect, b: DirtyRect) -> Option<DirtyRect> {
    let x0 = a.x.max(b.x);
    let y0 = a.y.max(b.y);
    let x1 = a.right().min(b.right());
    let y1 = a.bottom().min(b.bottom());
    if x1 <= x0 || y1 <= y0 {
        return None;
    }
    Some(DirtyRect {
        x: x0,
        y: y0,
        width: x1 - x0,
        height: y1 - y0,
    })
}

/// Distance from `point` to the piece `start..end`. With round caps the
/// nearest point is clamped onto the piece, so the ends bulge into
/// half-discs and consecutive pieces meet in round joins.
fn point_segment_distance(point: Point, start: Point, end: Point, cap: LineCap) -> f32 {
    let vx = end.x - start.x;
    let vy = end.y - start.y;
    let wx = point.x - start.x;
    let wy = point.y - start.y;
    let len_sq = vx * vx + vy * vy;
    if len_sq <= f32::EPSILON {
        return point.distance(start);
    }
    let t = match cap {
        LineCap::Round => ((wx * vx + wy * vy) / len_sq).clamp(0.0, 1.0),
    };
    point.distance(Point::new(start.x + vx * t, start.y + vy * t))
}
