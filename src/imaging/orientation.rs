//! EXIF orientation and the geometric primitives used to undo it.
//!
//! JPEG cameras store pixels in sensor order and record the intended display
//! orientation in EXIF tag `0x0112`. Decoding normalises this away so every
//! later operation sees upright pixels.
//!
//! | Tag | Stored as | Transforms (left to right) |
//! |---|---|---|
//! | 1 | top-left | none |
//! | 2 | top-right | flip-horizontal |
//! | 3 | bottom-right | rotate-180 |
//! | 4 | bottom-left | rotate-180, flip-horizontal |
//! | 5 | left-top | rotate-270, flip-horizontal |
//! | 6 | right-top | rotate-270 |
//! | 7 | right-bottom | rotate-90, flip-horizontal |
//! | 8 | left-bottom | rotate-90 |
//!
//! Rotations in [`Transpose`] are counter-clockwise.

use super::backend::BackendError;

/// A single lossless geometric remap. Rotations are counter-clockwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transpose {
    FlipHorizontal,
    Rotate90,
    Rotate180,
    Rotate270,
}

impl Transpose {
    /// True for the quarter turns, which exchange width and height.
    pub fn swaps_dimensions(self) -> bool {
        matches!(self, Self::Rotate90 | Self::Rotate270)
    }
}

/// EXIF orientation tag values, named by where row 0 / column 0 sit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Orientation {
    #[default]
    TopLeft = 1,
    TopRight = 2,
    BottomRight = 3,
    BottomLeft = 4,
    LeftTop = 5,
    RightTop = 6,
    RightBottom = 7,
    LeftBottom = 8,
}

impl Orientation {
    /// Create from an EXIF orientation value.
    ///
    /// Values outside 1-8 are a decode error, not a silent default.
    pub fn from_exif(value: u16) -> Result<Self, BackendError> {
        match value {
            1 => Ok(Self::TopLeft),
            2 => Ok(Self::TopRight),
            3 => Ok(Self::BottomRight),
            4 => Ok(Self::BottomLeft),
            5 => Ok(Self::LeftTop),
            6 => Ok(Self::RightTop),
            7 => Ok(Self::RightBottom),
            8 => Ok(Self::LeftBottom),
            other => Err(BackendError::Decode(format!(
                "EXIF orientation {other} is outside 1-8"
            ))),
        }
    }

    pub fn exif_value(self) -> u16 {
        self as u16
    }

    /// Transforms that bring stored pixels upright, applied in order.
    pub fn transforms(self) -> &'static [Transpose] {
        use Transpose::*;
        match self {
            Self::TopLeft => &[],
            Self::TopRight => &[FlipHorizontal],
            Self::BottomRight => &[Rotate180],
            Self::BottomLeft => &[Rotate180, FlipHorizontal],
            Self::LeftTop => &[Rotate270, FlipHorizontal],
            Self::RightTop => &[Rotate270],
            Self::RightBottom => &[Rotate90, FlipHorizontal],
            Self::LeftBottom => &[Rotate90],
        }
    }

    /// Upright dimensions for the given stored dimensions.
    pub fn display_dimensions(self, stored_width: u32, stored_height: u32) -> (u32, u32) {
        if self.transforms().iter().any(|t| t.swaps_dimensions()) {
            (stored_height, stored_width)
        } else {
            (stored_width, stored_height)
        }
    }
}
