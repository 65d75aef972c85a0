//! Shared test utilities for the imagestate test suite.
//!
//! Every fixture is synthesised in memory: small pixel patterns in each color
//! mode, JPEG/PNG/GIF encodings of them, and hand-built EXIF blocks for the
//! orientation tests. No binary fixture files.
//!
//! # Usage
//!
//! ```ignore
//! use crate::test_helpers::*;
//!
//! let jpeg = jpeg_with_orientation(10, 7, 6);
//! let image = DecodedImage::decode(&jpeg, FileFormat::Jpeg).unwrap();
//! assert_eq!(image.get_size(), (7, 10));
//! ```

use crate::imaging::DecodedImage;
use image::codecs::jpeg::JpegEncoder;
use image::{GrayAlphaImage, GrayImage, Luma, LumaA, Rgb, RgbImage, Rgba, RgbaImage};
use std::borrow::Cow;

// =========================================================================
// Pixel patterns
// =========================================================================

/// Gray image from literal rows. All rows must have the same length.
pub fn gray_from_rows(rows: &[&[u8]]) -> GrayImage {
    let width = rows.first().map_or(0, |r| r.len()) as u32;
    let data: Vec<u8> = rows.iter().flat_map(|r| r.iter().copied()).collect();
    GrayImage::from_raw(width, rows.len() as u32, data).unwrap()
}

/// Smooth RGB ramp: red across, green down, constant blue.
pub fn gradient_rgb(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(2).saturating_sub(1)) as u8,
            (y * 255 / height.max(2).saturating_sub(1)) as u8,
            128,
        ])
    })
}

/// [`gradient_rgb`] with alpha ramping along the diagonal.
pub fn gradient_rgba(width: u32, height: u32) -> RgbaImage {
    let rgb = gradient_rgb(width, height);
    RgbaImage::from_fn(width, height, |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        Rgba([r, g, b, ((x + y) * 40 % 256) as u8])
    })
}

/// Two-color checkerboard: index 0 is red, index 1 is blue, `(0, 0)` is 0.
pub fn checkerboard_palette(width: u32, height: u32, transparency: Option<u8>) -> DecodedImage {
    let indices = GrayImage::from_fn(width, height, |x, y| Luma([((x + y) % 2) as u8]));
    DecodedImage::from_palette(indices, vec![[255, 0, 0], [0, 0, 255]], transparency)
}

/// One image per color mode, plus a palette image without transparency.
pub fn sample_in_every_mode(width: u32, height: u32) -> Vec<DecodedImage> {
    let gray = GrayImage::from_fn(width, height, |x, y| {
        Luma([((x * 31 + y * 17) % 256) as u8])
    });
    let bilevel = GrayImage::from_fn(width, height, |x, y| {
        Luma([if (x + y) % 3 == 0 { 255 } else { 0 }])
    });
    let gray_alpha = GrayAlphaImage::from_fn(width, height, |x, y| {
        LumaA([(x * 20 % 256) as u8, (y * 50 % 256) as u8])
    });

    vec![
        DecodedImage::from_gray1(bilevel),
        DecodedImage::from_gray(gray),
        DecodedImage::from_gray_alpha(gray_alpha),
        checkerboard_palette(width, height, Some(1)),
        checkerboard_palette(width, height, None),
        DecodedImage::from_rgb(gradient_rgb(width, height)),
        DecodedImage::from_rgba(gradient_rgba(width, height)),
    ]
}

// =========================================================================
// Encoded files
// =========================================================================

/// Baseline JPEG of [`gradient_rgb`], without any EXIF.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut out = Vec::new();
    gradient_rgb(width, height)
        .write_with_encoder(JpegEncoder::new_with_quality(&mut out, 90))
        .unwrap();
    out
}

/// [`jpeg_bytes`] with an EXIF APP1 segment carrying `orientation` spliced in
/// right after SOI.
pub fn jpeg_with_orientation(width: u32, height: u32, orientation: u16) -> Vec<u8> {
    splice_after_soi(&jpeg_bytes(width, height), &exif_app1_segment(orientation, false))
}

pub fn splice_after_soi(jpeg: &[u8], segment: &[u8]) -> Vec<u8> {
    assert_eq!(&jpeg[..2], &[0xFF, 0xD8], "not a JPEG");
    let mut out = jpeg[..2].to_vec();
    out.extend_from_slice(segment);
    out.extend_from_slice(&jpeg[2..]);
    out
}

pub fn encode_png(image: &DecodedImage) -> Vec<u8> {
    let mut out = Vec::new();
    image.save_as_png(&mut out).unwrap();
    out
}

/// GIF with a 4-entry palette. The first frame holds `indices`; any further
/// frames are all index 0.
pub fn gif_bytes(
    width: u16,
    height: u16,
    indices: &[u8],
    transparent: Option<u8>,
    frames: usize,
) -> Vec<u8> {
    let palette = [0, 0, 0, 255, 255, 255, 255, 0, 0, 0, 255, 0];
    let mut out = Vec::new();
    {
        let mut encoder = gif::Encoder::new(&mut out, width, height, &palette).unwrap();
        for n in 0..frames {
            let buffer = if n == 0 {
                Cow::Borrowed(indices)
            } else {
                Cow::Owned(vec![0; indices.len()])
            };
            let frame = gif::Frame {
                width,
                height,
                buffer,
                transparent,
                ..gif::Frame::default()
            };
            encoder.write_frame(&frame).unwrap();
        }
    }
    out
}

// =========================================================================
// EXIF
// =========================================================================

/// Minimal TIFF block: header, IFD0 with a single Orientation (SHORT) entry.
pub fn tiff_with_orientation(value: u16, big_endian: bool) -> Vec<u8> {
    let u16_bytes = |v: u16| if big_endian { v.to_be_bytes() } else { v.to_le_bytes() };
    let u32_bytes = |v: u32| if big_endian { v.to_be_bytes() } else { v.to_le_bytes() };

    let mut tiff = Vec::new();
    tiff.extend_from_slice(if big_endian { b"MM" } else { b"II" });
    tiff.extend_from_slice(&u16_bytes(42));
    tiff.extend_from_slice(&u32_bytes(8)); // IFD0 offset
    tiff.extend_from_slice(&u16_bytes(1)); // entry count
    tiff.extend_from_slice(&u16_bytes(0x0112));
    tiff.extend_from_slice(&u16_bytes(3)); // SHORT
    tiff.extend_from_slice(&u32_bytes(1));
    tiff.extend_from_slice(&u16_bytes(value));
    tiff.extend_from_slice(&[0, 0]); // value field padding
    tiff.extend_from_slice(&u32_bytes(0)); // no next IFD
    tiff
}

/// Complete `APP1` segment (marker included) wrapping [`tiff_with_orientation`].
pub fn exif_app1_segment(value: u16, big_endian: bool) -> Vec<u8> {
    let tiff = tiff_with_orientation(value, big_endian);
    let len = (2 + 6 + tiff.len()) as u16;

    let mut segment = vec![0xFF, 0xE1];
    segment.extend_from_slice(&len.to_be_bytes());
    segment.extend_from_slice(b"Exif\0\0");
    segment.extend_from_slice(&tiff);
    segment
}
