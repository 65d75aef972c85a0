//! Pure calculation functions for image geometry and sample packing.
//!
//! All functions here are pure and testable without any I/O or images.

use super::backend::BackendError;
use super::params::{Rect, Size};

/// Largest image, in pixels, a crop or resize may produce (1 GiB as RGBA).
pub const MAX_PIXELS: u64 = 1 << 28;

/// Reject output dimensions above [`MAX_PIXELS`].
///
/// # Examples
/// ```
/// # use imagestate::imaging::calculations::check_pixel_count;
/// assert!(check_pixel_count(16_384, 16_384).is_ok());
/// assert!(check_pixel_count(u32::MAX, u32::MAX).is_err());
/// ```
pub fn check_pixel_count(width: u32, height: u32) -> Result<(), BackendError> {
    let pixels = u64::from(width) * u64::from(height);
    if pixels > MAX_PIXELS {
        return Err(BackendError::InvalidGeometry(format!(
            "{width}x{height} is {pixels} pixels, over the limit of {MAX_PIXELS}"
        )));
    }
    Ok(())
}

/// Output dimensions of a crop.
///
/// The output is always exactly `(right - left) x (bottom - top)`, regardless
/// of how much of the box overlaps the source. Inverted boxes and boxes
/// larger than [`MAX_PIXELS`] are rejected.
///
/// # Examples
/// ```
/// # use imagestate::imaging::{Rect, calculations::crop_dimensions};
/// assert_eq!(crop_dimensions(Rect::new(10, 20, 110, 70)).unwrap(), (100, 50));
/// assert_eq!(crop_dimensions(Rect::new(-5, -5, 5, 5)).unwrap(), (10, 10));
/// assert!(crop_dimensions(Rect::new(10, 0, 5, 5)).is_err());
/// ```
pub fn crop_dimensions(rect: Rect) -> Result<(u32, u32), BackendError> {
    let width = rect.right.checked_sub(rect.left).filter(|w| *w >= 0);
    let height = rect.bottom.checked_sub(rect.top).filter(|h| *h >= 0);

    match (width, height) {
        (Some(w), Some(h)) => {
            let w = u32::try_from(w).map_err(|_| {
                BackendError::InvalidGeometry(format!("crop box {rect} is too wide"))
            })?;
            let h = u32::try_from(h).map_err(|_| {
                BackendError::InvalidGeometry(format!("crop box {rect} is too tall"))
            })?;
            check_pixel_count(w, h)?;
            Ok((w, h))
        }
        _ => Err(BackendError::InvalidGeometry(format!(
            "crop box {rect} has right < left or bottom < top"
        ))),
    }
}

/// Where the source's top-left corner lands inside the crop output.
pub fn crop_offset(rect: Rect) -> Result<(i64, i64), BackendError> {
    match (rect.left.checked_neg(), rect.top.checked_neg()) {
        (Some(x), Some(y)) => Ok((x, y)),
        _ => Err(BackendError::InvalidGeometry(format!(
            "crop box {rect} starts too far from the origin"
        ))),
    }
}

/// Whether the crop box covers any source pixel at all.
pub fn crop_overlaps(rect: Rect, width: u32, height: u32) -> bool {
    rect.left < i64::from(width) && rect.top < i64::from(height) && rect.right > 0 && rect.bottom > 0
}

/// Reject resize targets with a zero edge or more than [`MAX_PIXELS`].
pub fn validate_resize(size: Size) -> Result<(), BackendError> {
    if size.is_empty() {
        return Err(BackendError::InvalidGeometry(format!(
            "resize target {size} must be at least 1x1"
        )));
    }
    check_pixel_count(size.width, size.height)
}

/// Bytes per row of a packed sample row at `bits` per sample.
pub fn packed_row_len(width: u32, bits: u8) -> usize {
    (width as usize * bits as usize).div_ceil(8)
}

/// Unpack one row of sub-byte samples (MSB first), as stored in PNG.
///
/// Returns `width` samples in `0..2^bits`. `bits == 8` copies the row.
pub fn unpack_row(row: &[u8], width: u32, bits: u8) -> Vec<u8> {
    if bits == 8 {
        return row[..width as usize].to_vec();
    }
    let per_byte = 8 / bits as usize;
    let mask = (1u16 << bits) as u8 - 1;
    (0..width as usize)
        .map(|x| {
            let byte = row[x / per_byte];
            let shift = 8 - bits as usize * (x % per_byte + 1);
            (byte >> shift) & mask
        })
        .collect()
}

/// Scale a `bits`-wide gray sample to the full 0..=255 range.
///
/// # Examples
/// ```
/// # use imagestate::imaging::calculations::scale_sample;
/// assert_eq!(scale_sample(1, 1), 255);
/// assert_eq!(scale_sample(2, 2), 170);
/// assert_eq!(scale_sample(15, 4), 255);
/// ```
pub fn scale_sample(value: u8, bits: u8) -> u8 {
    let max = (1u16 << bits) - 1;
    (u16::from(value) * 255 / max) as u8
}

/// Pack one row of bilevel samples (0 = black, anything else = white) into
/// 1-bit MSB-first bytes, padding the last byte with zeros.
pub fn pack_bilevel_row(row: &[u8]) -> Vec<u8> {
    row.chunks(8)
        .map(|chunk| {
            chunk
                .iter()
                .enumerate()
                .fold(0u8, |acc, (i, &v)| if v > 0 { acc | (0x80 >> i) } else { acc })
        })
        .collect()
}
