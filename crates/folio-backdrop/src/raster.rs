//! Gradient fills and blurred strokes on a [`Surface`].

use crate::color::{sample_stops, ColorStop, Rgba};
use crate::scene::Point;
use crate::surface::Surface;

/// Line segments per cubic when flattening a band.
const CURVE_STEPS: usize = 24;

/// Box passes used to approximate a gaussian blur.
const BLUR_PASSES: usize = 3;

/// Radial gradient centred on `center` (pixels), spread over the whole surface.
pub fn fill_radial(surface: &mut Surface, center: Point, radius: f32, stops: &[ColorStop]) {
    if radius <= 0.0 {
        return;
    }
    surface.paint_with(|x, y| {
        let distance = ((x - center.x).powi(2) + (y - center.y).powi(2)).sqrt();
        sample_stops(stops, distance / radius)
    });
}

/// A linear gradient between two pixel positions.
#[derive(Debug, Clone)]
pub struct LinearGradient<'a> {
    start: Point,
    delta: Point,
    length_sq: f32,
    stops: &'a [ColorStop],
}

impl<'a> LinearGradient<'a> {
    pub fn new(start: Point, end: Point, stops: &'a [ColorStop]) -> Self {
        let delta = Point::new(end.x - start.x, end.y - start.y);
        Self {
            start,
            delta,
            length_sq: delta.x * delta.x + delta.y * delta.y,
            stops,
        }
    }

    pub fn sample(&self, x: f32, y: f32) -> Rgba {
        if self.length_sq <= f32::EPSILON {
            return sample_stops(self.stops, 0.0);
        }
        let t = ((x - self.start.x) * self.delta.x + (y - self.start.y) * self.delta.y)
            / self.length_sq;
        sample_stops(self.stops, t)
    }
}

/// Point on the cubic bezier `p0, c1, c2, p3` at `t`.
pub fn cubic_point(p0: Point, c1: Point, c2: Point, p3: Point, t: f32) -> Point {
    let u = 1.0 - t;
    let (a, b, c, d) = (u * u * u, 3.0 * u * u * t, 3.0 * u * t * t, t * t * t);
    Point::new(
        a * p0.x + b * c1.x + c * c2.x + d * p3.x,
        a * p0.y + b * c1.y + c * c2.y + d * p3.y,
    )
}

/// Flatten a chain of cubic segments into a polyline.
pub fn flatten(segments: &[(Point, Point, Point, Point)]) -> Vec<Point> {
    let mut points = Vec::with_capacity(segments.len() * CURVE_STEPS + 1);
    for (i, &(p0, c1, c2, p3)) in segments.iter().enumerate() {
        let first = if i == 0 { 0 } else { 1 };
        for step in first..=CURVE_STEPS {
            points.push(cubic_point(p0, c1, c2, p3, step as f32 / CURVE_STEPS as f32));
        }
    }
    points
}

/// Per-pixel coverage in `0..=1`.
#[derive(Debug, Clone)]
pub struct Coverage {
    width: usize,
    height: usize,
    values: Vec<f32>,
}

impl Coverage {
    pub fn new(width: u32, height: u32) -> Self {
        let (width, height) = (width as usize, height as usize);
        Self {
            width,
            height,
            values: vec![0.0; width * height],
        }
    }

    pub fn at(&self, x: u32, y: u32) -> f32 {
        let (x, y) = (x as usize, y as usize);
        if x >= self.width || y >= self.height {
            return 0.0;
        }
        self.values[y * self.width + x]
    }

    pub fn max_value(&self) -> f32 {
        self.values.iter().copied().fold(0.0, f32::max)
    }

    /// Stroke `points` with round caps and joins, antialiased over one pixel.
    pub fn stroke(&mut self, points: &[Point], line_width: f32) {
        let half = line_width / 2.0;
        let reach = half + 1.0;

        for pair in points.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let min_x = (a.x.min(b.x) - reach).floor().max(0.0) as usize;
            let min_y = (a.y.min(b.y) - reach).floor().max(0.0) as usize;
            let max_x = ((a.x.max(b.x) + reach).ceil().max(0.0) as usize).min(self.width);
            let max_y = ((a.y.max(b.y) + reach).ceil().max(0.0) as usize).min(self.height);

            for y in min_y..max_y {
                for x in min_x..max_x {
                    let d = segment_distance(x as f32 + 0.5, y as f32 + 0.5, a, b);
                    let c = (half + 0.5 - d).clamp(0.0, 1.0);
                    let slot = &mut self.values[y * self.width + x];
                    if c > *slot {
                        *slot = c;
                    }
                }
            }
        }
    }

    /// Approximate a gaussian blur with standard deviation `sigma` pixels.
    /// Outside the surface counts as empty.
    pub fn blur(&mut self, sigma: f32) {
        if sigma < 0.5 || self.values.is_empty() {
            return;
        }
        let mut scratch = vec![0.0; self.width.max(self.height)];
        let mut column = vec![0.0; self.height];

        for size in box_sizes(sigma, BLUR_PASSES) {
            let radius = (size - 1) / 2;

            for row in self.values.chunks_mut(self.width) {
                box_blur_line(row, &mut scratch[..row.len()], radius);
                row.copy_from_slice(&scratch[..row.len()]);
            }

            for x in 0..self.width {
                for y in 0..self.height {
                    column[y] = self.values[y * self.width + x];
                }
                box_blur_line(&column, &mut scratch[..self.height], radius);
                for y in 0..self.height {
                    self.values[y * self.width + x] = scratch[y];
                }
            }
        }
    }
}

/// Blurred stroke of `points` coloured by `gradient`, composited at `alpha`.
pub fn stroke_band(
    surface: &mut Surface,
    points: &[Point],
    line_width: f32,
    blur: f32,
    gradient: &LinearGradient<'_>,
    alpha: f32,
) {
    let mut coverage = Coverage::new(surface.width(), surface.height());
    coverage.stroke(points, line_width);
    coverage.blur(blur);

    surface.paint_with(|x, y| {
        let c = coverage.at(x as u32, y as u32);
        if c <= 0.0 {
            return Rgba::TRANSPARENT;
        }
        gradient.sample(x, y).scale_alpha(c * alpha)
    });
}

fn segment_distance(px: f32, py: f32, a: Point, b: Point) -> f32 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq <= f32::EPSILON {
        0.0
    } else {
        (((px - a.x) * dx + (py - a.y) * dy) / len_sq).clamp(0.0, 1.0)
    };
    let (cx, cy) = (a.x + t * dx, a.y + t * dy);
    ((px - cx).powi(2) + (py - cy).powi(2)).sqrt()
}

/// Odd box widths whose successive application approximates a gaussian.
fn box_sizes(sigma: f32, passes: usize) -> Vec<usize> {
    let n = passes as f32;
    let ideal = (12.0 * sigma * sigma / n + 1.0).sqrt();
    let mut lower = ideal.floor() as usize;
    if lower % 2 == 0 {
        lower = lower.saturating_sub(1).max(1);
    }
    let upper = lower + 2;

    let l = lower as f32;
    let m = ((12.0 * sigma * sigma - n * l * l - 4.0 * n * l - 3.0 * n) / (-4.0 * l - 4.0))
        .round()
        .max(0.0) as usize;

    (0..passes)
        .map(|i| if i < m { lower } else { upper })
        .collect()
}

fn box_blur_line(input: &[f32], output: &mut [f32], radius: usize) {
    let n = input.len();
    if n == 0 {
        return;
    }
    let norm = 1.0 / (2 * radius + 1) as f32;
    let mut acc: f32 = input[..(radius + 1).min(n)].iter().sum();

    for x in 0..n {
        output[x] = (acc * norm).max(0.0);
        if x + radius + 1 < n {
            acc += input[x + radius + 1];
        }
        if x >= radius {
            acc -= input[x - radius];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f32, b: f32, eps: f32) -> bool {
        (a - b).abs() < eps
    }

    #[test]
    fn test_cubic_endpoints() {
        let (p0, c1, c2, p3) = (
            Point::new(0.0, 0.0),
            Point::new(1.0, 2.0),
            Point::new(3.0, 2.0),
            Point::new(4.0, 0.0),
        );
        assert_eq!(cubic_point(p0, c1, c2, p3, 0.0), p0);
        assert_eq!(cubic_point(p0, c1, c2, p3, 1.0), p3);
        let mid = cubic_point(p0, c1, c2, p3, 0.5);
        assert!(close(mid.x, 2.0, 1e-5));
        assert!(close(mid.y, 1.5, 1e-5));
    }

    #[test]
    fn test_flatten_shares_joints() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        let c = Point::new(20.0, 0.0);
        let points = flatten(&[(a, a, b, b), (b, b, c, c)]);
        assert_eq!(points.len(), 2 * CURVE_STEPS + 1);
        assert_eq!(points[0], a);
        assert_eq!(points[CURVE_STEPS], b);
        assert_eq!(points[points.len() - 1], c);
    }

    #[test]
    fn test_stroke_has_round_caps() {
        let mut coverage = Coverage::new(40, 20);
        coverage.stroke(&[Point::new(10.0, 10.0), Point::new(30.0, 10.0)], 8.0);

        assert_eq!(coverage.at(20, 10), 1.0);
        // Inside the cap, beyond the endpoint along the axis.
        assert_eq!(coverage.at(7, 9), 1.0);
        // Outside the cap radius at the corner.
        assert_eq!(coverage.at(6, 5), 0.0);
        assert_eq!(coverage.at(20, 2), 0.0);
    }

    #[test]
    fn test_box_sizes_are_odd_and_growing() {
        let sizes = box_sizes(70.0, 3);
        assert_eq!(sizes.len(), 3);
        assert!(sizes.iter().all(|s| s % 2 == 1));
        assert!(sizes.windows(2).all(|w| w[0] <= w[1]));

        // Three boxes of width w have variance 3 * (w^2 - 1) / 12.
        let variance: f32 = sizes
            .iter()
            .map(|&w| ((w * w) as f32 - 1.0) / 12.0)
            .sum();
        assert!(close(variance.sqrt(), 70.0, 2.0));
    }

    #[test]
    fn test_blur_preserves_mass_away_from_edges() {
        let mut coverage = Coverage::new(64, 64);
        coverage.values[32 * 64 + 32] = 1.0;
        coverage.blur(3.0);

        let total: f32 = coverage.values.iter().sum();
        assert!(close(total, 1.0, 1e-3));
        assert!(coverage.at(32, 32) < 1.0);
        assert!(coverage.at(32, 32) >= coverage.at(36, 32));
        assert!(coverage.at(36, 32) > 0.0);
    }

    #[test]
    fn test_linear_gradient_projects_onto_axis() {
        let stops = [
            ColorStop::new(0.0, Rgba::opaque(0.0, 0.0, 0.0)),
            ColorStop::new(1.0, Rgba::opaque(200.0, 0.0, 0.0)),
        ];
        let gradient = LinearGradient::new(Point::new(0.0, 0.0), Point::new(10.0, 0.0), &stops);
        assert!(close(gradient.sample(5.0, 99.0).r, 100.0, 1e-3));
        assert_eq!(gradient.sample(-5.0, 0.0).r, 0.0);
        assert_eq!(gradient.sample(50.0, 0.0).r, 200.0);
    }

    #[test]
    fn test_radial_fill_fades_out() {
        let mut surface = Surface::new(20, 1).unwrap();
        surface.fill(Rgba::opaque(250.0, 250.0, 250.0));
        let stops = [
            ColorStop::new(0.0, Rgba::new(0.0, 0.0, 0.0, 1.0)),
            ColorStop::new(1.0, Rgba::new(0.0, 0.0, 0.0, 0.0)),
        ];
        fill_radial(&mut surface, Point::new(0.5, 0.5), 10.0, &stops);

        assert_eq!(surface.pixel(0, 0), Some([0.0, 0.0, 0.0]));
        assert!(surface.pixel(5, 0).unwrap()[0] > 0.0);
        assert_eq!(surface.pixel(15, 0), Some([250.0, 250.0, 250.0]));
    }
}
