use crate::draw::model::Point;

/// Upper bound on line pieces per flattened segment.
const MAX_FLATTEN_STEPS: usize = 64;
/// Target length of one flattened piece, in canvas pixels.
const FLATTEN_STEP_PX: f32 = 2.0;

/// One quadratic piece of a stroke, in canvas space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveSegment {
    pub start: Point,
    pub control: Point,
    pub end: Point,
}

impl CurveSegment {
    pub fn point_at(&self, t: f32) -> Point {
        let mt = 1.0 - t;
        let a = mt * mt;
        let b = 2.0 * mt * t;
        let c = t * t;
        Point {
            x: a * self.start.x + b * self.control.x + c * self.end.x,
            y: a * self.start.y + b * self.control.y + c * self.end.y,
        }
    }

    /// Polyline approximation including both endpoints.
    pub fn flatten(&self) -> Vec<Point> {
        let hull = self.start.distance(self.control) + self.control.distance(self.end);
        let steps = ((hull / FLATTEN_STEP_PX).ceil() as usize).clamp(1, MAX_FLATTEN_STEPS);
        (0..=steps)
            .map(|step| self.point_at(step as f32 / steps as f32))
            .collect()
    }

    /// Axis-aligned bounds of the control polygon, which contain the curve.
    pub fn bounds(&self) -> (Point, Point) {
        let xs = [self.start.x, self.control.x, self.end.x];
        let ys = [self.start.y, self.control.y, self.end.y];
        let min = Point::new(
            xs.iter().copied().fold(f32::INFINITY, f32::min),
            ys.iter().copied().fold(f32::INFINITY, f32::min),
        );
        let max = Point::new(
            xs.iter().copied().fold(f32::NEG_INFINITY, f32::max),
            ys.iter().copied().fold(f32::NEG_INFINITY, f32::max),
        );
        (min, max)
    }
}

/// Anchor point followed by quadratic segments, each starting where the
/// previous one ended.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Path {
    origin: Option<Point>,
    segments: Vec<CurveSegment>,
}

impl Path {
    pub fn move_to(&mut self, point: Point) {
        self.origin = Some(point);
        self.segments.clear();
    }

    pub fn current_point(&self) -> Option<Point> {
        self.segments.last().map(|s| s.end).or(self.origin)
    }

    pub fn quad_to(&mut self, control: Point, end: Point) -> Option<CurveSegment> {
        let start = self.current_point()?;
        let segment = CurveSegment {
            start,
            control,
            end,
        };
        self.segments.push(segment);
        Some(segment)
    }

    pub fn origin(&self) -> Option<Point> {
        self.origin
    }

    pub fn segments(&self) -> &[CurveSegment] {
        &self.segments
    }

    pub fn clear(&mut self) {
        self.origin = None;
        self.segments.clear();
    }
}

/// Running-midpoint smoother: each raw sample becomes the control point of
/// the next segment and the midpoint between samples becomes its endpoint.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CurveBuilder {
    last_point: Option<Point>,
    path: Path,
}

impl CurveBuilder {
    pub fn begin(&mut self, point: Point) {
        self.path.move_to(point);
        self.last_point = Some(point);
    }

    /// Returns `None` when `begin` has not been called.
    pub fn extend(&mut self, point: Point) -> Option<CurveSegment> {
        let last = self.last_point?;
        let segment = self.path.quad_to(last, last.midpoint(point))?;
        self.last_point = Some(point);
        Some(segment)
    }

    /// Drops the path. The last raw sample is never drawn as an endpoint.
    pub fn end(&mut self) -> Path {
        self.last_point = None;
        std::mem::take(&mut self.path)
    }

    pub fn last_point(&self) -> Option<Point> {
        self.last_point
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
