//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! arguments carried by [`Operation`](super::backend::Operation) requests and
//! accepted by the [`DecodedImage`](super::decoded::DecodedImage) methods.
//!
//! ## Types
//!
//! - [`Quality`]: JPEG encoding quality (0 to 100, default 85). Clamped on construction.
//! - [`Size`]: Target dimensions for a resize.
//! - [`Rect`]: Crop box as `(left, top, right, bottom)`, right/bottom exclusive.
//!
//! `Size` and `Rect` parse from the CLI forms `WxH` and `L,T,R,B`.

use std::fmt;
use std::str::FromStr;

/// Quality setting for JPEG encoding (0-100).
///
/// Only [`Quality::new`] and [`Default`] construct one, so the value is
/// always in range:
///
/// ```compile_fail
/// use imagestate::imaging::Quality;
/// let too_high = Quality(500);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.min(100))
    }

    pub fn value(self) -> u32 {
        self.0
    }

    /// Value handed to the JPEG encoder, which has no quality 0.
    pub fn encoder_value(self) -> u8 {
        self.0.clamp(1, 100) as u8
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(85)
    }
}

/// Target dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Size {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
        let width = w
            .trim()
            .parse()
            .map_err(|_| format!("invalid width '{w}'"))?;
        let height = h
            .trim()
            .parse()
            .map_err(|_| format!("invalid height '{h}'"))?;
        Ok(Self { width, height })
    }
}

/// Crop rectangle. `right` and `bottom` are exclusive.
///
/// Coordinates are signed: a box may start left of or above the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rect {
    pub left: i64,
    pub top: i64,
    pub right: i64,
    pub bottom: i64,
}

impl Rect {
    pub fn new(left: i64, top: i64, right: i64, bottom: i64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {})",
            self.left, self.top, self.right, self.bottom
        )
    }
}

impl FromStr for Rect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s
            .split(',')
            .map(|p| p.trim().parse::<i64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| format!("invalid crop box '{s}': {e}"))?;
        match parts.as_slice() {
            [left, top, right, bottom] => Ok(Self::new(*left, *top, *right, *bottom)),
            _ => Err(format!("expected LEFT,TOP,RIGHT,BOTTOM, got '{s}'")),
        }
    }
}
