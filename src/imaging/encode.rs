//! Serialising a [`DecodedImage`] to JPEG, PNG or GIF.
//!
//! Each encoder writes to a caller-supplied sink and returns nothing but
//! success or failure. Mode handling differs per target:
//!
//! - **JPEG** promotes `1` and `P` to RGB (transparency is lost). Other modes
//!   go to the encoder as-is; if it rejects alpha that is an encode error.
//! - **PNG** writes every mode natively, including 1-bit and palette + tRNS.
//! - **GIF** writes `P` (keeping the transparency index) and gray modes via a
//!   256-entry gray ramp. Direct-color modes are an encode error: quantising
//!   is not this encoder's job.

use super::backend::BackendError;
use super::calculations::pack_bilevel_row;
use super::decoded::{ColorMode, DecodedImage, Pixels};
use super::params::Quality;
use image::codecs::jpeg::JpegEncoder;
use std::borrow::Cow;
use std::io::Write;

impl DecodedImage {
    pub fn save_as_jpeg<W: Write>(&self, sink: &mut W, quality: Quality) -> Result<(), BackendError> {
        let encoder = JpegEncoder::new_with_quality(sink, quality.encoder_value());
        log::debug!(
            "encoding {}x{} {} as JPEG q{}",
            self.width(),
            self.height(),
            self.mode(),
            quality.encoder_value()
        );

        let result = match &self.pixels {
            Pixels::Gray1(_) | Pixels::Palette { .. } => {
                log::debug!("promoting {} to RGB for JPEG", self.mode());
                self.rgb_pixels().write_with_encoder(encoder)
            }
            Pixels::Gray8(buf) => buf.write_with_encoder(encoder),
            Pixels::GrayAlpha(buf) => buf.write_with_encoder(encoder),
            Pixels::Rgb(buf) => buf.write_with_encoder(encoder),
            Pixels::Rgba(buf) => buf.write_with_encoder(encoder),
        };
        result.map_err(|e| BackendError::Encode(format!("JPEG: {e}")))
    }

    pub fn save_as_png<W: Write>(&self, sink: &mut W) -> Result<(), BackendError> {
        let png_error = |e: png::EncodingError| BackendError::Encode(format!("PNG: {e}"));

        let (width, height) = self.get_size();
        if width == 0 || height == 0 {
            return Err(BackendError::Encode(format!(
                "PNG cannot store a {width}x{height} image"
            )));
        }

        let mut encoder = png::Encoder::new(sink, width, height);
        encoder.set_depth(png::BitDepth::Eight);
        let data: Cow<'_, [u8]> = match &self.pixels {
            Pixels::Gray1(buf) => {
                encoder.set_color(png::ColorType::Grayscale);
                encoder.set_depth(png::BitDepth::One);
                Cow::Owned(
                    buf.as_raw()
                        .chunks(width as usize)
                        .flat_map(pack_bilevel_row)
                        .collect(),
                )
            }
            Pixels::Gray8(buf) => {
                encoder.set_color(png::ColorType::Grayscale);
                Cow::Borrowed(buf.as_raw())
            }
            Pixels::GrayAlpha(buf) => {
                encoder.set_color(png::ColorType::GrayscaleAlpha);
                Cow::Borrowed(buf.as_raw())
            }
            Pixels::Palette { indices, palette } => {
                let transparency = self.metadata.transparency;
                encoder.set_color(png::ColorType::Indexed);
                encoder.set_palette(covering_palette(palette, indices.as_raw(), transparency));
                if let Some(index) = transparency {
                    let mut trns = vec![255u8; index as usize];
                    trns.push(0);
                    encoder.set_trns(trns);
                }
                Cow::Borrowed(indices.as_raw())
            }
            Pixels::Rgb(buf) => {
                encoder.set_color(png::ColorType::Rgb);
                Cow::Borrowed(buf.as_raw())
            }
            Pixels::Rgba(buf) => {
                encoder.set_color(png::ColorType::Rgba);
                Cow::Borrowed(buf.as_raw())
            }
        };

        let mut writer = encoder.write_header().map_err(png_error)?;
        writer.write_image_data(&data).map_err(png_error)?;
        writer.finish().map_err(png_error)
    }

    /// Write a single-frame GIF. The transparency index, if any, is passed
    /// straight to the encoder.
    pub fn save_as_gif<W: Write>(&self, sink: &mut W) -> Result<(), BackendError> {
        let gif_error = |e: gif::EncodingError| BackendError::Encode(format!("GIF: {e}"));

        let (width, height) = self.get_size();
        let (Ok(w), Ok(h)) = (u16::try_from(width), u16::try_from(height)) else {
            return Err(BackendError::Encode(format!(
                "GIF cannot store {width}x{height}; edges are limited to {}",
                u16::MAX
            )));
        };

        let (indices, palette, transparency) = match &self.pixels {
            Pixels::Palette { indices, palette } => (
                indices.as_raw(),
                Cow::Borrowed(palette.as_slice()),
                self.metadata.transparency,
            ),
            // Samples double as indices into a gray ramp
            Pixels::Gray1(buf) | Pixels::Gray8(buf) => {
                (buf.as_raw(), Cow::Owned(gray_ramp()), None)
            }
            _ => {
                return Err(BackendError::Encode(format!(
                    "GIF needs palette or gray pixels, got {}",
                    self.mode()
                )));
            }
        };
        log::debug!(
            "encoding {w}x{h} {} as GIF, transparency {:?}",
            self.mode(),
            transparency
        );

        let flat = covering_palette(&palette, indices, transparency);
        let mut encoder = gif::Encoder::new(sink, w, h, &flat).map_err(gif_error)?;
        let frame = gif::Frame {
            width: w,
            height: h,
            buffer: Cow::Borrowed(indices),
            transparent: transparency,
            ..gif::Frame::default()
        };
        encoder.write_frame(&frame).map_err(gif_error)?;
        encoder
            .into_inner()
            .map(|_| ())
            .map_err(|e| BackendError::Encode(format!("GIF: {e}")))
    }

    /// Whether [`save_as_gif`](Self::save_as_gif) accepts this image's mode.
    pub fn gif_compatible(&self) -> bool {
        matches!(
            self.mode(),
            ColorMode::Palette | ColorMode::Gray8 | ColorMode::Gray1
        )
    }
}

fn gray_ramp() -> Vec<[u8; 3]> {
    (0..=255u8).map(|v| [v, v, v]).collect()
}

/// Flatten `palette`, padding with black so every index used by the pixels
/// (and the transparency index) has an entry.
fn covering_palette(palette: &[[u8; 3]], indices: &[u8], transparency: Option<u8>) -> Vec<u8> {
    let highest = indices
        .iter()
        .copied()
        .chain(transparency)
        .max()
        .map_or(0, |i| i as usize + 1);
    let len = palette.len().max(highest).max(1);

    let mut flat: Vec<u8> = palette.iter().flatten().copied().collect();
    flat.resize(len * 3, 0);
    flat
}
