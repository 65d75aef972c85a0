//! Pure Rust codec backend.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Edge | Crate / function |
//! |---|---|
//! | JPEG file → decoded | `image` (zune-jpeg) + [`exif`](super::exif) orientation |
//! | PNG file → decoded | `png::Decoder` (palette and 1-bit kept native) |
//! | GIF file → decoded | `gif::DecodeOptions` (first frame, indexed) |
//! | Resize | `image::imageops::resize`, filter from config (Lanczos3 default) |
//! | Crop | `image::imageops::replace` onto a zeroed canvas |
//! | Save as JPEG | `image::codecs::jpeg::JpegEncoder` |
//! | Save as PNG | `png::Encoder` |
//! | Save as GIF | `gif::Encoder` |
//! | Decoded → RGB / RGBA buffer | `image::buffer::ConvertBuffer` |

use super::backend::{
    BackendError, Capabilities, ConverterEdge, ImageBackend, ImageFile, Operation, OperationKind,
    OperationOutput, State, StateKind,
};
use super::decode::FileFormat;
use super::decoded::DecodedImage;
use crate::config::BackendConfig;

const BACKEND_NAME: &str = "rust";
const LIBRARY: &str = "image 0.25 / png 0.17 / gif 0.13";

/// Operations declared on the decoded state. Nothing else accepts operations.
const DECODED_OPERATIONS: &[OperationKind] = &[
    OperationKind::GetSize,
    OperationKind::HasAlpha,
    OperationKind::HasAnimation,
    OperationKind::Resize,
    OperationKind::Crop,
    OperationKind::SaveAsJpeg,
    OperationKind::SaveAsPng,
    OperationKind::SaveAsGif,
];

const CONVERTERS: &[ConverterEdge] = &[
    ConverterEdge {
        from: StateKind::JpegFile,
        to: StateKind::Decoded,
    },
    ConverterEdge {
        from: StateKind::PngFile,
        to: StateKind::Decoded,
    },
    ConverterEdge {
        from: StateKind::GifFile,
        to: StateKind::Decoded,
    },
    ConverterEdge {
        from: StateKind::Decoded,
        to: StateKind::RgbBuffer,
    },
    ConverterEdge {
        from: StateKind::Decoded,
        to: StateKind::RgbaBuffer,
    },
];

/// Pure Rust backend using the `image`, `png` and `gif` crates.
///
/// See the [module docs](self) for the crate-to-edge mapping.
#[derive(Debug, Clone, Default)]
pub struct RustBackend {
    config: BackendConfig,
}

impl RustBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: BackendConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }
}

/// Run an encoder into an in-memory sink and tag the result.
fn encode_file(
    format: FileFormat,
    write: impl FnOnce(&mut Vec<u8>) -> Result<(), BackendError>,
) -> Result<ImageFile, BackendError> {
    let mut bytes = Vec::new();
    write(&mut bytes)?;
    Ok(ImageFile::new(format, bytes))
}

impl ImageBackend for RustBackend {
    fn name(&self) -> &'static str {
        BACKEND_NAME
    }

    /// Every source format needs both a reader and a writer compiled in.
    fn probe(&self) -> Result<(), BackendError> {
        let missing: Vec<String> = FileFormat::ALL
            .iter()
            .filter(|format| {
                let codec = format.image_format();
                !(codec.reading_enabled() && codec.writing_enabled())
            })
            .map(|format| format.to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(BackendError::Unavailable(format!(
                "{LIBRARY} built without {} support",
                missing.join(", ")
            )))
        }
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities {
            backend: BACKEND_NAME,
            library: LIBRARY,
            operations: DECODED_OPERATIONS
                .iter()
                .map(|op| (StateKind::Decoded, *op))
                .collect(),
            converters: CONVERTERS.to_vec(),
        }
    }

    fn apply(&self, state: &State, op: Operation) -> Result<OperationOutput, BackendError> {
        let State::Decoded(image) = state else {
            return Err(BackendError::Unsupported(format!(
                "{:?} on {:?}",
                op.kind(),
                state.kind()
            )));
        };
        log::trace!("{BACKEND_NAME}: {op:?} on {}x{}", image.width(), image.height());

        let output = match op {
            Operation::GetSize => {
                let (width, height) = image.get_size();
                OperationOutput::Size { width, height }
            }
            Operation::HasAlpha => OperationOutput::Flag(image.has_alpha()),
            Operation::HasAnimation => OperationOutput::Flag(image.has_animation()),
            Operation::Resize(size) => {
                OperationOutput::Image(image.resize_with_filter(size, self.config.resize_filter())?)
            }
            Operation::Crop(rect) => OperationOutput::Image(image.crop(rect)?),
            Operation::SaveAsJpeg(quality) => {
                let quality = quality.unwrap_or_else(|| self.config.jpeg_quality());
                OperationOutput::File(encode_file(FileFormat::Jpeg, |sink| {
                    image.save_as_jpeg(sink, quality)
                })?)
            }
            Operation::SaveAsPng => {
                OperationOutput::File(encode_file(FileFormat::Png, |sink| image.save_as_png(sink))?)
            }
            Operation::SaveAsGif => {
                OperationOutput::File(encode_file(FileFormat::Gif, |sink| image.save_as_gif(sink))?)
            }
        };
        Ok(output)
    }

    fn convert(&self, state: &State, target: StateKind) -> Result<State, BackendError> {
        log::trace!("{BACKEND_NAME}: convert {:?} -> {target:?}", state.kind());
        match (state, target) {
            (State::File(file), StateKind::Decoded) => Ok(State::Decoded(DecodedImage::decode(
                &file.bytes,
                file.format,
            )?)),
            (State::Decoded(image), StateKind::RgbBuffer) => {
                Ok(State::RgbBuffer(image.to_buffer_rgb()))
            }
            (State::Decoded(image), StateKind::RgbaBuffer) => {
                Ok(State::RgbaBuffer(image.to_buffer_rgba()))
            }
            _ => Err(BackendError::Unsupported(format!(
                "no converter from {:?} to {target:?}",
                state.kind()
            ))),
        }
    }
}
