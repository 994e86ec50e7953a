use std::ops::{ Add, Sub, Mul };

use serde::{ Serialize, Deserialize };

use crate::feq;

/// A color, or more generally a per-channel radiance or transmission factor.
///
/// Represented with red-green-blue (RGB) values. Radiance values are
/// conventionally in `0.0..=1.0`; transmission filters accumulated along a ray
/// start at white and are multiplied channel by channel.
///
/// In scene files a color is written as a three-element array.
///
/// # Examples
///
/// Attenuate white light by a filter:
///
/// ```
/// # use voxel_optics::color::Color;
/// let filter = Color::rgb(0.5, 1.0, 0.25);
/// assert_eq!(Color::white() * filter, Color::rgb(0.5, 1.0, 0.25));
/// ```
#[derive(Copy, Clone, Debug, Default, PartialOrd, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

/// Approximate, component-wise equality (see `feq`).
impl PartialEq for Color {
    fn eq(&self, other: &Color) -> bool {
        feq(self.r, other.r) &&
            feq(self.g, other.g) &&
            feq(self.b, other.b)
    }
}

impl From<[f64; 3]> for Color {
    fn from(v: [f64; 3]) -> Color {
        Color { r: v[0], g: v[1], b: v[2] }
    }
}

impl From<Color> for [f64; 3] {
    fn from(c: Color) -> [f64; 3] {
        [c.r, c.g, c.b]
    }
}

impl Color {
    pub fn rgb(r: f64, g: f64, b: f64) -> Color {
        Color { r, g, b }
    }

    /// A grey with every channel set to `v`.
    pub fn grey(v: f64) -> Color {
        Color { r: v, g: v, b: v }
    }

    pub fn black() -> Color {
        Color::grey(0.0)
    }

    pub fn white() -> Color {
        Color::grey(1.0)
    }

    pub fn red() -> Color {
        Color::rgb(1.0, 0.0, 0.0)
    }

    pub fn green() -> Color {
        Color::rgb(0.0, 1.0, 0.0)
    }

    pub fn blue() -> Color {
        Color::rgb(0.0, 0.0, 1.0)
    }

    pub fn yellow() -> Color {
        Color::rgb(1.0, 1.0, 0.0)
    }

    pub fn magenta() -> Color {
        Color::rgb(1.0, 0.0, 1.0)
    }

    /// Computes the Hadamard (component-wise) product of two colors.
    pub fn hadamard(c1: &Color, c2: &Color) -> Color {
        Color {
            r: c1.r * c2.r,
            g: c1.g * c2.g,
            b: c1.b * c2.b,
        }
    }

    /// The Beer-Lambert transmission `exp(-alpha * distance)` per channel,
    /// where `self` holds the absorption coefficients `alpha`.
    pub fn beer_lambert(&self, distance: f64) -> Color {
        Color {
            r: (-self.r * distance).exp(),
            g: (-self.g * distance).exp(),
            b: (-self.b * distance).exp(),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.r.is_finite() && self.g.is_finite() && self.b.is_finite()
    }
}

impl Add<Color> for Color {
    type Output = Color;

    fn add(self, other: Color) -> Self::Output {
        Color {
            r: self.r + other.r,
            g: self.g + other.g,
            b: self.b + other.b,
        }
    }
}

impl Sub<Color> for Color {
    type Output = Color;

    fn sub(self, other: Color) -> Self::Output {
        Color {
            r: self.r - other.r,
            g: self.g - other.g,
            b: self.b - other.b,
        }
    }
}

impl Mul<f64> for Color {
    type Output = Color;

    fn mul(self, other: f64) -> Self::Output {
        Color {
            r: self.r * other,
            g: self.g * other,
            b: self.b * other,
        }
    }
}

impl Mul<Color> for f64 {
    type Output = Color;

    fn mul(self, other: Color) -> Self::Output {
        other * self
    }
}

/// For colors `c1` and `c2`, `c1 * c2` is shorthand for
/// `Color::hadamard(&c1, &c2)`.
impl Mul<Color> for Color {
    type Output = Color;

    fn mul(self, other: Color) -> Self::Output {
        Color::hadamard(&self, &other)
    }
}

/// The colors returned instead of a traced result when a ray is abandoned.
///
/// Every per-ray failure becomes one of these, so misconfigured volumes show
/// up as unusual pixels rather than aborting a render.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sentinels {
    /// The step budget of a volume ran out.
    pub exhausted: Color,

    /// The renderer's recursion depth ran out.
    pub recursion_limit: Color,

    /// A ray inside a volume found nothing to hit.
    pub lost: Color,

    /// Per-voxel parameters could not be computed.
    pub parameter_failure: Color,
}

impl Default for Sentinels {
    fn default() -> Sentinels {
        Sentinels {
            exhausted: Color::magenta(),
            recursion_limit: Color::black(),
            lost: Color::red(),
            parameter_failure: Color::yellow(),
        }
    }
}

#[test]
fn add_colors() {
    let c1 = Color::rgb(0.9, 0.6, 0.75);
    let c2 = Color::rgb(0.7, 0.1, 0.25);

    assert_eq!(c1 + c2, Color::rgb(1.6, 0.7, 1.0));
}

#[test]
fn multiply_colors() {
    let c1 = Color::rgb(1.0, 0.2, 0.4);
    let c2 = Color::rgb(0.9, 1.0, 0.1);

    assert_eq!(c1 * c2, Color::rgb(0.9, 0.2, 0.04));
}

#[test]
fn zero_absorption_transmits_everything() {
    let alpha = Color::black();

    assert_eq!(alpha.beer_lambert(12.5), Color::white());
}

#[test]
fn beer_lambert_composes_over_distance() {
    let alpha = Color::rgb(0.3, 1.2, 2.0);
    let whole = alpha.beer_lambert(1.5);
    let split = alpha.beer_lambert(0.5) * alpha.beer_lambert(1.0);

    assert_eq!(whole, split);
}

#[test]
fn sentinels_are_distinct_from_black_where_it_matters() {
    let s = Sentinels::default();

    assert_ne!(s.exhausted, Color::black());
    assert_ne!(s.lost, Color::black());
    assert_ne!(s.parameter_failure, Color::black());
    assert_ne!(s.exhausted, s.lost);
}

#[test]
fn color_from_json_array() {
    let c: Color = serde_json::from_str("[0.25, 0.5, 1.0]").unwrap();

    assert_eq!(c, Color::rgb(0.25, 0.5, 1.0));
}
