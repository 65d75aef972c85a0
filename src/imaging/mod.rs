//! Image codec backend: decode, operate, encode, extract raw pixels.
//!
//! | Stage | Where |
//! |---|---|
//! | **Decode** JPEG / PNG / GIF (+ EXIF orientation) | [`decode`], [`exif`], [`orientation`] |
//! | **Operate** size, alpha, animation, resize, crop | [`DecodedImage`] |
//! | **Encode** JPEG / PNG / GIF | [`encode`] |
//! | **Extract** packed RGB / RGBA | [`buffer`] |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for geometry and sample packing (unit testable)
//! - **Parameters**: Value types describing operation arguments
//! - **Backend**: [`ImageBackend`] trait, typed states/operations, [`RustBackend`]

pub mod backend;
pub mod buffer;
pub mod calculations;
pub mod decode;
pub mod decoded;
pub mod encode;
pub mod exif;
pub mod orientation;
mod params;
pub mod rust_backend;

pub use backend::{
    BackendError, Capabilities, ConverterEdge, ImageBackend, ImageFile, Operation, OperationKind,
    OperationOutput, State, StateKind, available_backends,
};
pub use buffer::{PackedBuffer, RgbBuffer, RgbaBuffer};
pub use decode::FileFormat;
pub use decoded::{ColorMode, DecodedImage, Metadata, Palette};
pub use orientation::{Orientation, Transpose};
pub use params::{Quality, Rect, Size};
pub use rust_backend::RustBackend;
