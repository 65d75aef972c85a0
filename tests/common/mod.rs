//! Fixture builders shared by the integration tests.
//!
//! Everything goes through the public API; JPEG EXIF blocks are assembled by
//! hand because no encoder writes orientation tags.

#![allow(dead_code)]

use image::{GrayImage, Luma, Rgb, RgbImage};
use imagestate::imaging::{DecodedImage, Quality};

/// An asymmetric pattern: distinguishable under every flip and rotation,
/// and coarse enough that JPEG blocks keep it stable.
pub fn pattern_rgb(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let r = if x < width / 3 { 230 } else { 20 };
        let g = if y < height / 4 { 220 } else { 40 };
        Rgb([r, g, ((x * 7 + y * 3) % 200) as u8])
    })
}

pub fn jpeg_of(image: &DecodedImage) -> Vec<u8> {
    let mut out = Vec::new();
    image.save_as_jpeg(&mut out, Quality::new(90)).unwrap();
    out
}

/// Big-endian TIFF block holding only an orientation tag: header, one IFD0
/// entry (0x0112, SHORT, 1), no next IFD.
pub fn exif_tiff(orientation: u16) -> Vec<u8> {
    let mut tiff = b"MM\x00\x2a\x00\x00\x00\x08\x00\x01\x01\x12\x00\x03\x00\x00\x00\x01".to_vec();
    tiff.extend_from_slice(&orientation.to_be_bytes());
    tiff.extend_from_slice(&[0, 0, 0, 0, 0, 0]);
    tiff
}

/// Insert an `APP1 Exif` segment with the given orientation right after SOI.
pub fn with_orientation(jpeg: &[u8], orientation: u16) -> Vec<u8> {
    let tiff = exif_tiff(orientation);

    let mut out = jpeg[..2].to_vec();
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&((2 + 6 + tiff.len()) as u16).to_be_bytes());
    out.extend_from_slice(b"Exif\0\0");
    out.extend_from_slice(&tiff);
    out.extend_from_slice(&jpeg[2..]);
    out
}

/// An RGB PNG carrying an `eXIf` chunk with the given orientation.
pub fn png_with_orientation(image: &RgbImage, orientation: u16) -> Vec<u8> {
    let mut out = Vec::new();
    let mut encoder = png::Encoder::new(&mut out, image.width(), image.height());
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header().unwrap();
    writer
        .write_chunk(png::chunk::eXIf, &exif_tiff(orientation))
        .unwrap();
    writer.write_image_data(image.as_raw()).unwrap();
    writer.finish().unwrap();
    out
}

pub fn palette_image(width: u32, height: u32, transparency: Option<u8>) -> DecodedImage {
    let indices = GrayImage::from_fn(width, height, |x, y| Luma([((x + 2 * y) % 3) as u8]));
    DecodedImage::from_palette(
        indices,
        vec![[200, 10, 10], [10, 200, 10], [10, 10, 200]],
        transparency,
    )
}
