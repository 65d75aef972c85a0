//! Backend trait, error type, and the typed state/operation vocabulary.
//!
//! A resolver outside this crate models an image as a sequence of **states**
//! (file bytes, decoded image, raw pixel buffers) connected by **operations**
//! (transforms within a state) and **converters** (transforms between
//! states). Every backend declares, up front, exactly which
//! `(state, operation)` pairs and `(from, to)` converter edges it can execute
//! (see [`Capabilities`]). The declaration is plain data, so the resolver can
//! run its shortest-path search without calling into the backend.
//!
//! | Concept | Type |
//! |---|---|
//! | State kinds | [`StateKind`] |
//! | State values | [`State`] |
//! | Operation kinds | [`OperationKind`] |
//! | Operation requests | [`Operation`] → [`OperationOutput`] |
//! | Converter edges | [`ConverterEdge`] |
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend).

use super::buffer::{RgbBuffer, RgbaBuffer};
use super::decode::FileFormat;
use super::decoded::DecodedImage;
use super::params::{Quality, Rect, Size};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Encode failed: {0}")]
    Encode(String),
    #[error("Unsupported operation: {0}")]
    Unsupported(String),
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),
}

/// The kinds of state a backend can consume or produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StateKind {
    JpegFile,
    PngFile,
    GifFile,
    /// The backend's own in-memory representation. Not interchangeable
    /// between backends.
    Decoded,
    RgbBuffer,
    RgbaBuffer,
}

impl StateKind {
    pub fn file(format: FileFormat) -> Self {
        match format {
            FileFormat::Jpeg => Self::JpegFile,
            FileFormat::Png => Self::PngFile,
            FileFormat::Gif => Self::GifFile,
        }
    }
}

/// The kinds of operation a backend may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperationKind {
    GetSize,
    HasAlpha,
    HasAnimation,
    Resize,
    Crop,
    SaveAsJpeg,
    SaveAsPng,
    SaveAsGif,
}

/// A directed converter edge in the state graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub struct ConverterEdge {
    pub from: StateKind,
    pub to: StateKind,
}

/// Encoded file bytes tagged with their format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub format: FileFormat,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn new(format: FileFormat, bytes: Vec<u8>) -> Self {
        Self { format, bytes }
    }
}

/// A value in one of the states a backend understands.
#[derive(Debug, Clone)]
pub enum State {
    File(ImageFile),
    Decoded(DecodedImage),
    RgbBuffer(RgbBuffer),
    RgbaBuffer(RgbaBuffer),
}

impl State {
    pub fn kind(&self) -> StateKind {
        match self {
            State::File(file) => StateKind::file(file.format),
            State::Decoded(_) => StateKind::Decoded,
            State::RgbBuffer(_) => StateKind::RgbBuffer,
            State::RgbaBuffer(_) => StateKind::RgbaBuffer,
        }
    }
}

/// An operation request with its arguments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operation {
    GetSize,
    HasAlpha,
    HasAnimation,
    Resize(Size),
    Crop(Rect),
    /// `None` uses the backend's configured default quality.
    SaveAsJpeg(Option<Quality>),
    SaveAsPng,
    SaveAsGif,
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::GetSize => OperationKind::GetSize,
            Operation::HasAlpha => OperationKind::HasAlpha,
            Operation::HasAnimation => OperationKind::HasAnimation,
            Operation::Resize(_) => OperationKind::Resize,
            Operation::Crop(_) => OperationKind::Crop,
            Operation::SaveAsJpeg(_) => OperationKind::SaveAsJpeg,
            Operation::SaveAsPng => OperationKind::SaveAsPng,
            Operation::SaveAsGif => OperationKind::SaveAsGif,
        }
    }
}

/// Result of [`ImageBackend::apply`].
#[derive(Debug, Clone)]
pub enum OperationOutput {
    Size { width: u32, height: u32 },
    Flag(bool),
    Image(DecodedImage),
    File(ImageFile),
}

/// Everything a backend tells the registry about itself.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Capabilities {
    pub backend: &'static str,
    /// Codec library the backend is built on.
    pub library: &'static str,
    pub operations: Vec<(StateKind, OperationKind)>,
    pub converters: Vec<ConverterEdge>,
}

impl Capabilities {
    pub fn supports(&self, state: StateKind, op: OperationKind) -> bool {
        self.operations.contains(&(state, op))
    }

    pub fn converts(&self, from: StateKind, to: StateKind) -> bool {
        self.converters.contains(&ConverterEdge { from, to })
    }
}

/// Trait for image backends.
///
/// `probe` is called once at registration time; every other method assumes
/// it succeeded. `apply` and `convert` must reject anything the backend did
/// not declare in [`capabilities`](ImageBackend::capabilities) with
/// [`BackendError::Unsupported`].
pub trait ImageBackend: Sync {
    fn name(&self) -> &'static str;

    /// Check that the underlying codec library is usable.
    fn probe(&self) -> Result<(), BackendError>;

    fn capabilities(&self) -> Capabilities;

    /// Run one declared operation against a state.
    fn apply(&self, state: &State, op: Operation) -> Result<OperationOutput, BackendError>;

    /// Follow one declared converter edge.
    fn convert(&self, state: &State, target: StateKind) -> Result<State, BackendError>;

    /// Registration-time availability check. Never panics, never propagates.
    fn is_available(&self) -> bool {
        match self.probe() {
            Ok(()) => true,
            Err(e) => {
                log::info!("backend {} unavailable: {}", self.name(), e);
                false
            }
        }
    }
}

/// Keep only the backends whose probe succeeds, in the given order.
pub fn available_backends<'a>(candidates: &[&'a dyn ImageBackend]) -> Vec<&'a dyn ImageBackend> {
    candidates
        .iter()
        .copied()
        .filter(|backend| backend.is_available())
        .collect()
}
