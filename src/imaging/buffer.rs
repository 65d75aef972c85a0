//! Raw packed pixel buffers.
//!
//! The terminal "buffer" states of the graph: row-major, no padding, no
//! header, fixed channel order. A buffer's byte length is always exactly
//! `width * height * CHANNELS`; the only way to obtain one is through
//! [`DecodedImage::to_buffer_rgb`] or [`DecodedImage::to_buffer_rgba`].

use super::decoded::DecodedImage;

/// Packed 8-bit pixels with `CHANNELS` interleaved channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedBuffer<const CHANNELS: usize> {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

/// `R, G, B` per pixel.
pub type RgbBuffer = PackedBuffer<3>;
/// `R, G, B, A` per pixel.
pub type RgbaBuffer = PackedBuffer<4>;

impl<const CHANNELS: usize> PackedBuffer<CHANNELS> {
    fn packed(width: u32, height: u32, data: Vec<u8>) -> Self {
        debug_assert_eq!(data.len(), width as usize * height as usize * CHANNELS);
        Self {
            width,
            height,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn channels(&self) -> usize {
        CHANNELS
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.data
    }

    /// Channel values of the pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<&[u8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let start = (y as usize * self.width as usize + x as usize) * CHANNELS;
        self.data.get(start..start + CHANNELS)
    }
}

impl DecodedImage {
    /// Convert to a packed RGB buffer, dropping alpha and palette.
    pub fn to_buffer_rgb(&self) -> RgbBuffer {
        let rgb = self.rgb_pixels();
        let (width, height) = rgb.dimensions();
        PackedBuffer::packed(width, height, rgb.into_raw())
    }

    /// Convert to a packed RGBA buffer; alpha is 255 where the source has none.
    pub fn to_buffer_rgba(&self) -> RgbaBuffer {
        let rgba = self.rgba_pixels();
        let (width, height) = rgba.dimensions();
        PackedBuffer::packed(width, height, rgba.into_raw())
    }
}
