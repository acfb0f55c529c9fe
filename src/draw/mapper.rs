use crate::draw::model::{Point, Size};

/// Maps a viewport-space point onto the canvas pixel grid.
///
/// The canvas is shown aspect-fit inside the viewport, so one axis of the
/// canvas is stretched to the viewport's aspect ratio and the overflow is
/// split evenly on both sides. No clamping: points outside the viewport map
/// outside the canvas and the rasterizer clips them.
pub fn map_to_canvas(point: Point, viewport: Size, canvas: Size) -> Point {
    let mut adjusted = canvas;
    let mut offset = Size::default();

    if viewport.aspect_ratio() < canvas.aspect_ratio() {
        adjusted.height = canvas.width * viewport.height / viewport.width;
        offset.height = (adjusted.height - canvas.height) / 2.0;
    } else {
        adjusted.width = canvas.height * viewport.width / viewport.height;
        offset.width = (adjusted.width - canvas.width) / 2.0;
    }

    Point {
        x: point.x * adjusted.width / viewport.width - offset.width,
        y: point.y * adjusted.height / viewport.height - offset.height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Point, b: Point) {
        assert!(
            (a.x - b.x).abs() < 1e-3 && (a.y - b.y).abs() < 1e-3,
            "{a:?} != {b:?}"
        );
    }

    #[test]
    fn tall_viewport_centers_square_canvas_vertically() {
        let viewport = Size::new(300.0, 600.0);
        let canvas = Size::new(400.0, 400.0);

        approx(
            map_to_canvas(Point::new(150.0, 300.0), viewport, canvas),
            Point::new(200.0, 200.0),
        );
        // Top edge of the letterboxed canvas sits 150pt down the viewport.
        approx(
            map_to_canvas(Point::new(0.0, 150.0), viewport, canvas),
            Point::new(0.0, 0.0),
        );
        approx(
            map_to_canvas(Point::new(300.0, 450.0), viewport, canvas),
            Point::new(400.0, 400.0),
        );
    }

    #[test]
    fn wide_viewport_centers_square_canvas_horizontally() {
        let viewport = Size::new(600.0, 300.0);
        let canvas = Size::new(400.0, 400.0);

        approx(
            map_to_canvas(Point::new(300.0, 150.0), viewport, canvas),
            Point::new(200.0, 200.0),
        );
        approx(
            map_to_canvas(Point::new(150.0, 0.0), viewport, canvas),
            Point::new(0.0, 0.0),
        );
    }

    #[test]
    fn matching_aspect_is_a_plain_scale() {
        let viewport = Size::new(400.0, 400.0);
        let canvas = Size::new(800.0, 800.0);
        approx(
            map_to_canvas(Point::new(100.0, 120.0), viewport, canvas),
            Point::new(200.0, 240.0),
        );
    }

    #[test]
    fn points_outside_viewport_are_not_clamped() {
        let viewport = Size::new(300.0, 600.0);
        let canvas = Size::new(400.0, 400.0);
        let mapped = map_to_canvas(Point::new(-30.0, 10.0), viewport, canvas);
        assert!(mapped.x < 0.0);
        assert!(mapped.y < 0.0);
    }

    #[test]
    fn identical_inputs_map_identically() {
        let viewport = Size::new(375.0, 667.0);
        let canvas = Size::new(750.0, 750.0);
        let p = Point::new(12.5, 400.25);
        assert_eq!(
            map_to_canvas(p, viewport, canvas),
            map_to_canvas(p, viewport, canvas)
        );
    }
}
