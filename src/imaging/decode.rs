//! Decoding JPEG, PNG and GIF byte streams into a [`DecodedImage`].
//!
//! | Format | Decoder | Native modes kept |
//! |---|---|---|
//! | JPEG | `image` crate | L, RGB (CMYK arrives as RGB) |
//! | PNG | `png` crate | 1, L, LA, P (+ single transparent index), RGB, RGBA |
//! | GIF | `gif` crate | P (+ transparency index), first frame only |
//!
//! PNG and GIF bypass `image::load_from_memory` because it expands palettes
//! and loses the transparency index. Only JPEG consults EXIF orientation.

use super::backend::BackendError;
use super::calculations::{scale_sample, unpack_row};
use super::decoded::{DecodedImage, Palette};
use super::exif;
use super::orientation::Orientation;
use image::{GrayImage, ImageBuffer, ImageFormat, Luma, Pixel, RgbaImage};
use std::fmt;
use std::io::{Cursor, Read, Seek, SeekFrom};
use std::path::Path;

/// Source formats this backend can decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Jpeg,
    Png,
    Gif,
}

impl FileFormat {
    pub const ALL: [FileFormat; 3] = [FileFormat::Jpeg, FileFormat::Png, FileFormat::Gif];

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "gif" => Some(Self::Gif),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Identify the format from magic bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        match image::guess_format(bytes).ok()? {
            ImageFormat::Jpeg => Some(Self::Jpeg),
            ImageFormat::Png => Some(Self::Png),
            ImageFormat::Gif => Some(Self::Gif),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Gif => "gif",
        }
    }

    /// The matching `image` crate format, used for codec probing.
    pub fn image_format(self) -> ImageFormat {
        match self {
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Png => ImageFormat::Png,
            Self::Gif => ImageFormat::Gif,
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Jpeg => "JPEG",
            Self::Png => "PNG",
            Self::Gif => "GIF",
        })
    }
}

impl DecodedImage {
    /// Decode a stream declared to hold `format`.
    ///
    /// The stream is rewound first and read to the end, so a partially
    /// consumed handle is fine. The pixels are fully materialised before
    /// this returns; the stream is not needed afterwards.
    pub fn open<R: Read + Seek>(reader: &mut R, format: FileFormat) -> Result<Self, BackendError> {
        reader.seek(SeekFrom::Start(0))?;
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Self::decode(&bytes, format)
    }

    /// Decode in-memory file bytes declared to hold `format`.
    pub fn decode(bytes: &[u8], format: FileFormat) -> Result<Self, BackendError> {
        log::trace!("decoding {} bytes as {}", bytes.len(), format);
        match format {
            FileFormat::Jpeg => decode_jpeg(bytes),
            FileFormat::Png => decode_png(bytes),
            FileFormat::Gif => decode_gif(bytes),
        }
    }
}

fn decode_jpeg(bytes: &[u8]) -> Result<DecodedImage, BackendError> {
    let image = image::load_from_memory_with_format(bytes, ImageFormat::Jpeg)
        .map_err(|e| BackendError::Decode(format!("JPEG: {e}")))?;
    let decoded = DecodedImage::from_dynamic(image);

    let orientation = match exif::read_jpeg_orientation(bytes) {
        Some(value) => Orientation::from_exif(value)?,
        None => Orientation::TopLeft,
    };
    Ok(decoded.apply_orientation(orientation))
}

fn decode_png(bytes: &[u8]) -> Result<DecodedImage, BackendError> {
    let png_error = |e: png::DecodingError| BackendError::Decode(format!("PNG: {e}"));

    let mut decoder = png::Decoder::new(Cursor::new(bytes));
    decoder.set_transformations(png::Transformations::STRIP_16);
    let mut reader = decoder.read_info().map_err(png_error)?;
    let mut buf = vec![0; reader.output_buffer_size()];
    let frame = reader.next_frame(&mut buf).map_err(png_error)?;

    let (width, height) = (frame.width, frame.height);
    let bits = frame.bit_depth as u8;
    let samples = |channels: u32| -> Vec<u8> {
        buf.chunks(frame.line_size)
            .take(height as usize)
            .flat_map(|row| unpack_row(row, width * channels, bits))
            .collect()
    };

    let image = match frame.color_type {
        png::ColorType::Grayscale if bits == 1 => {
            DecodedImage::from_gray1(image_buffer(width, height, samples(1))?)
        }
        png::ColorType::Grayscale => {
            let gray = samples(1).into_iter().map(|v| scale_sample(v, bits)).collect();
            DecodedImage::from_gray(image_buffer(width, height, gray)?)
        }
        png::ColorType::GrayscaleAlpha => {
            DecodedImage::from_gray_alpha(image_buffer(width, height, samples(2))?)
        }
        png::ColorType::Rgb => DecodedImage::from_rgb(image_buffer(width, height, samples(3))?),
        png::ColorType::Rgba => DecodedImage::from_rgba(image_buffer(width, height, samples(4))?),
        png::ColorType::Indexed => {
            let info = reader.info();
            let palette = info
                .palette
                .as_deref()
                .ok_or_else(|| BackendError::Decode("PNG: indexed image without PLTE".into()))?;
            indexed_png(
                image_buffer(width, height, samples(1))?,
                palette_entries(palette),
                info.trns.as_deref(),
            )
        }
    };
    Ok(image)
}

/// Keep a palette PNG indexed when its tRNS chunk reduces to a single fully
/// transparent entry; otherwise expand to RGBA so partial alpha survives.
fn indexed_png(indices: GrayImage, palette: Palette, trns: Option<&[u8]>) -> DecodedImage {
    let Some(alphas) = trns else {
        return DecodedImage::from_palette(indices, palette, None);
    };

    let mut translucent = alphas.iter().copied().enumerate().filter(|(_, a)| *a != 255);
    match (translucent.next(), translucent.next()) {
        (None, _) => DecodedImage::from_palette(indices, palette, None),
        (Some((index, 0)), None) => {
            let index = index as u8;
            DecodedImage::from_palette(indices, palette, Some(index))
        }
        _ => {
            log::debug!("palette PNG has partial alpha; expanding to RGBA");
            let rgba = RgbaImage::from_fn(indices.width(), indices.height(), |x, y| {
                let index = indices.get_pixel(x, y).0[0] as usize;
                let [r, g, b] = palette.get(index).copied().unwrap_or([0, 0, 0]);
                let a = alphas.get(index).copied().unwrap_or(255);
                image::Rgba([r, g, b, a])
            });
            DecodedImage::from_rgba(rgba)
        }
    }
}

fn decode_gif(bytes: &[u8]) -> Result<DecodedImage, BackendError> {
    let gif_error = |e: gif::DecodingError| BackendError::Decode(format!("GIF: {e}"));

    let mut options = gif::DecodeOptions::new();
    options.set_color_output(gif::ColorOutput::Indexed);
    let mut decoder = options.read_info(Cursor::new(bytes)).map_err(gif_error)?;

    let (screen_w, screen_h) = (u32::from(decoder.width()), u32::from(decoder.height()));
    let global_palette = decoder.global_palette().map(<[u8]>::to_vec);
    let background = decoder.bg_color();

    let frame = decoder
        .read_next_frame()
        .map_err(gif_error)?
        .ok_or_else(|| BackendError::Decode("GIF: no image frames".into()))?;

    let palette = frame
        .palette
        .as_deref()
        .or(global_palette.as_deref())
        .map(palette_entries)
        .ok_or_else(|| BackendError::Decode("GIF: frame has no color table".into()))?;

    let (frame_w, frame_h) = (u32::from(frame.width), u32::from(frame.height));
    let frame_pixels: GrayImage = image_buffer(frame_w, frame_h, frame.buffer.to_vec())?;

    let (width, height) = if screen_w == 0 || screen_h == 0 {
        (frame_w, frame_h)
    } else {
        (screen_w, screen_h)
    };
    let fill = frame
        .transparent
        .or_else(|| background.and_then(|b| u8::try_from(b).ok()))
        .unwrap_or(0);

    let mut canvas = GrayImage::from_pixel(width, height, Luma([fill]));
    image::imageops::replace(
        &mut canvas,
        &frame_pixels,
        i64::from(frame.left),
        i64::from(frame.top),
    );

    Ok(DecodedImage::from_palette(canvas, palette, frame.transparent))
}

fn palette_entries(flat: &[u8]) -> Palette {
    flat.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect()
}

fn image_buffer<P: Pixel<Subpixel = u8>>(
    width: u32,
    height: u32,
    data: Vec<u8>,
) -> Result<ImageBuffer<P, Vec<u8>>, BackendError> {
    ImageBuffer::from_raw(width, height, data).ok_or_else(|| {
        BackendError::Decode(format!("pixel data too short for {width}x{height}"))
    })
}
