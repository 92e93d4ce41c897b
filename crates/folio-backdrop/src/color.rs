//! Colours and gradient stops.

/// Straight (non-premultiplied) colour; channels in `0..=255`, alpha in `0..=1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }

    /// Same colour with alpha multiplied by `factor`.
    pub fn scale_alpha(self, factor: f32) -> Self {
        Self {
            a: (self.a * factor).clamp(0.0, 1.0),
            ..self
        }
    }
}

/// A colour at a position along a gradient.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    pub offset: f32,
    pub color: Rgba,
}

impl ColorStop {
    pub const fn new(offset: f32, color: Rgba) -> Self {
        Self { offset, color }
    }
}

/// Colour at `t` along sorted `stops`.
///
/// Interpolation happens on premultiplied values, so fading towards a
/// transparent stop does not drag the hue towards that stop's colour.
pub fn sample_stops(stops: &[ColorStop], t: f32) -> Rgba {
    let Some(first) = stops.first() else {
        return Rgba::TRANSPARENT;
    };
    if t <= first.offset {
        return first.color;
    }

    for pair in stops.windows(2) {
        let (from, to) = (pair[0], pair[1]);
        if t <= to.offset {
            let span = to.offset - from.offset;
            let k = if span > 0.0 { (t - from.offset) / span } else { 1.0 };
            return lerp_premultiplied(from.color, to.color, k);
        }
    }

    stops[stops.len() - 1].color
}

fn lerp_premultiplied(from: Rgba, to: Rgba, k: f32) -> Rgba {
    let a = from.a + (to.a - from.a) * k;
    if a <= f32::EPSILON {
        return Rgba::TRANSPARENT;
    }
    let channel = |c0: f32, c1: f32| (c0 * from.a + (c1 * to.a - c0 * from.a) * k) / a;
    Rgba::new(
        channel(from.r, to.r),
        channel(from.g, to.g),
        channel(from.b, to.b),
        a,
    )
}
