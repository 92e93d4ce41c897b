//! The parametric scene: drifting blobs, bezier bands and a central light.
//!
//! Positions are fractions of the surface size. Radii are derived from the
//! diagonal of a 1920x1080 reference screen so the look does not depend on
//! the window. Times are in milliseconds.

use crate::color::{ColorStop, Rgba};

pub const REFERENCE_WIDTH: f32 = 1920.0;
pub const REFERENCE_HEIGHT: f32 = 1080.0;

pub const DEFAULT_INTENSITY: f32 = 0.7;

/// `#FAFAFA`
pub const BACKGROUND: Rgba = Rgba::opaque(250.0, 250.0, 250.0);

/// Alpha of the overlay-blended noise layer.
pub const NOISE_ALPHA: f32 = 0.03;

/// Alpha of the wide, blurrier second stroke of each band, before intensity.
pub const HALO_ALPHA: f32 = 0.4;
pub const HALO_SCALE: f32 = 1.5;

pub fn reference_diagonal() -> f32 {
    (REFERENCE_WIDTH * REFERENCE_WIDTH + REFERENCE_HEIGHT * REFERENCE_HEIGHT).sqrt()
}

fn blob_base_radius() -> f32 {
    reference_diagonal() * 0.8
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Convert from surface fractions to pixels.
    pub fn to_pixels(self, width: f32, height: f32) -> Point {
        Point::new(self.x * width, self.y * height)
    }
}

/// A radial gradient whose centre drifts on a Lissajous path.
#[derive(Debug, Clone, PartialEq)]
pub struct Blob {
    pub base: Point,
    /// In pixels.
    pub radius: f32,
    pub move_range_x: f32,
    pub move_range_y: f32,
    pub speed_x: f32,
    pub speed_y: f32,
    pub stops: Vec<ColorStop>,
}

impl Blob {
    /// Centre at time `t`, in surface fractions.
    pub fn center(&self, t: f32) -> Point {
        Point::new(
            self.base.x + (t * self.speed_x).sin() * self.move_range_x,
            self.base.y + (t * self.speed_y).cos() * self.move_range_y,
        )
    }
}

/// A thick blurred stroke along a chain of cubic beziers.
#[derive(Debug, Clone, PartialEq)]
pub struct Band {
    pub anchors: [Point; 4],
    pub controls: [Point; 3],
    pub gradient_start: Point,
    pub gradient_end: Point,
    pub stops: Vec<ColorStop>,
    pub move_range: f32,
    pub speed: f32,
    /// In pixels.
    pub line_width: f32,
    /// Blur standard deviation in pixels.
    pub blur: f32,
}

/// Geometry of a band at a given time, in surface fractions.
#[derive(Debug, Clone, PartialEq)]
pub struct BandPose {
    pub anchors: [Point; 4],
    pub controls: [Point; 3],
    pub gradient_start: Point,
    pub gradient_end: Point,
}

impl BandPose {
    /// The cubic segments as `(start, control1, control2, end)`.
    ///
    /// Segment `i` uses controls `i` and `i + 1`; the last one reuses its
    /// only control for both.
    pub fn segments(&self) -> [(Point, Point, Point, Point); 3] {
        let c = &self.controls;
        let a = &self.anchors;
        [
            (a[0], c[0], c[1], a[1]),
            (a[1], c[1], c[2], a[2]),
            (a[2], c[2], c[2], a[3]),
        ]
    }
}

impl Band {
    pub fn pose(&self, t: f32) -> BandPose {
        let phase = t * self.speed;
        let range = self.move_range;

        let mut anchors = self.anchors;
        for (i, p) in anchors.iter_mut().enumerate() {
            let i = i as f32;
            p.x += (phase + i * 0.5).sin() * range;
            p.y += (phase + i * 0.7).cos() * range;
        }

        let mut controls = self.controls;
        for (i, p) in controls.iter_mut().enumerate() {
            let i = i as f32;
            p.x += (phase + i * 0.6).cos() * range;
            p.y += (phase + i * 0.8).sin() * range;
        }

        let half = range * 0.5;
        BandPose {
            anchors,
            controls,
            gradient_start: Point::new(
                self.gradient_start.x + phase.sin() * half,
                self.gradient_start.y + phase.cos() * half,
            ),
            gradient_end: Point::new(
                self.gradient_end.x + phase.cos() * half,
                self.gradient_end.y + phase.sin() * half,
            ),
        }
    }
}

/// Static white glow.
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    pub center: Point,
    pub radius: f32,
    pub stops: Vec<ColorStop>,
}

/// Everything drawn each frame, with opacities already scaled by intensity.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub intensity: f32,
    pub blobs: Vec<Blob>,
    pub bands: Vec<Band>,
    pub light: Light,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(DEFAULT_INTENSITY)
    }
}

impl Scene {
    /// Build the scene. `intensity` runs from 0 (soft) to 1 (saturated).
    pub fn new(intensity: f32) -> Self {
        let o = |alpha: f32| alpha * intensity;
        let stop = |offset: f32, r: f32, g: f32, b: f32, a: f32| {
            ColorStop::new(offset, Rgba::new(r, g, b, a))
        };
        let base_radius = blob_base_radius();

        let blobs = vec![
            Blob {
                base: Point::new(0.15, 0.85),
                radius: base_radius * 0.8,
                move_range_x: 0.03,
                move_range_y: 0.02,
                speed_x: 0.0003,
                speed_y: 0.0004,
                stops: vec![
                    stop(0.0, 99.0, 179.0, 237.0, o(0.9)),
                    stop(0.4, 147.0, 197.0, 253.0, o(0.6)),
                    stop(0.7, 191.0, 219.0, 254.0, o(0.3)),
                    stop(1.0, 191.0, 219.0, 254.0, 0.0),
                ],
            },
            Blob {
                base: Point::new(0.4, 0.5),
                radius: base_radius * 0.85,
                move_range_x: 0.04,
                move_range_y: 0.03,
                speed_x: 0.0002,
                speed_y: 0.0003,
                stops: vec![
                    stop(0.0, 167.0, 139.0, 250.0, o(0.85)),
                    stop(0.4, 196.0, 181.0, 253.0, o(0.6)),
                    stop(0.7, 221.0, 214.0, 254.0, o(0.3)),
                    stop(1.0, 221.0, 214.0, 254.0, 0.0),
                ],
            },
            Blob {
                base: Point::new(0.75, 0.25),
                radius: base_radius * 0.75,
                move_range_x: 0.025,
                move_range_y: 0.035,
                speed_x: 0.00035,
                speed_y: 0.00025,
                stops: vec![
                    stop(0.0, 244.0, 114.0, 182.0, o(0.75)),
                    stop(0.4, 251.0, 207.0, 232.0, o(0.6)),
                    stop(0.7, 252.0, 231.0, 243.0, o(0.3)),
                    stop(1.0, 252.0, 231.0, 243.0, 0.0),
                ],
            },
            Blob {
                base: Point::new(0.85, 0.6),
                radius: base_radius * 0.7,
                move_range_x: 0.03,
                move_range_y: 0.04,
                speed_x: 0.00025,
                speed_y: 0.0004,
                stops: vec![
                    stop(0.0, 251.0, 207.0, 232.0, o(0.65)),
                    stop(0.5, 254.0, 242.0, 242.0, o(0.35)),
                    stop(1.0, 254.0, 242.0, 242.0, 0.0),
                ],
            },
        ];

        let bands = vec![
            Band {
                anchors: [
                    Point::new(0.2, 0.6),
                    Point::new(0.35, 0.45),
                    Point::new(0.55, 0.4),
                    Point::new(0.7, 0.55),
                ],
                controls: [
                    Point::new(0.27, 0.5),
                    Point::new(0.45, 0.35),
                    Point::new(0.62, 0.45),
                ],
                gradient_start: Point::new(0.35, 0.5),
                gradient_end: Point::new(0.6, 0.4),
                stops: vec![
                    stop(0.0, 196.0, 181.0, 253.0, o(0.6)),
                    stop(0.5, 221.0, 214.0, 254.0, o(0.4)),
                    stop(1.0, 233.0, 213.0, 255.0, 0.0),
                ],
                move_range: 0.04,
                speed: 0.00025,
                line_width: 350.0,
                blur: 70.0,
            },
            Band {
                anchors: [
                    Point::new(0.1, 0.1),
                    Point::new(0.25, 0.15),
                    Point::new(0.4, 0.2),
                    Point::new(0.5, 0.1),
                ],
                controls: [
                    Point::new(0.17, 0.08),
                    Point::new(0.32, 0.12),
                    Point::new(0.45, 0.15),
                ],
                gradient_start: Point::new(0.25, 0.15),
                gradient_end: Point::new(0.45, 0.25),
                stops: vec![
                    stop(0.0, 147.0, 197.0, 253.0, o(0.55)),
                    stop(0.5, 191.0, 219.0, 254.0, o(0.35)),
                    stop(1.0, 224.0, 242.0, 254.0, 0.0),
                ],
                move_range: 0.04,
                speed: 0.00028,
                line_width: 300.0,
                blur: 60.0,
            },
            Band {
                anchors: [
                    Point::new(0.5, 0.8),
                    Point::new(0.65, 0.75),
                    Point::new(0.8, 0.7),
                    Point::new(0.95, 0.8),
                ],
                controls: [
                    Point::new(0.57, 0.72),
                    Point::new(0.72, 0.68),
                    Point::new(0.87, 0.75),
                ],
                gradient_start: Point::new(0.6, 0.75),
                gradient_end: Point::new(0.85, 0.7),
                stops: vec![
                    stop(0.0, 244.0, 114.0, 182.0, o(0.5)),
                    stop(0.5, 251.0, 207.0, 232.0, o(0.3)),
                    stop(1.0, 252.0, 231.0, 243.0, 0.0),
                ],
                move_range: 0.03,
                speed: 0.00032,
                line_width: 320.0,
                blur: 65.0,
            },
        ];

        let light = Light {
            center: Point::new(0.5, 0.35),
            radius: reference_diagonal() * 0.5,
            stops: vec![
                stop(0.0, 255.0, 255.0, 255.0, o(0.5)),
                stop(0.5, 255.0, 255.0, 255.0, o(0.2)),
                stop(1.0, 255.0, 255.0, 255.0, 0.0),
            ],
        };

        Self {
            intensity,
            blobs,
            bands,
            light,
        }
    }

    /// Alpha of the second, wider stroke of each band.
    pub fn halo_alpha(&self) -> f32 {
        HALO_ALPHA * self.intensity
    }
}
