//! The decoded in-memory image and its operation set.
//!
//! [`DecodedImage`] is the hub state of this backend. It is a value type:
//! every operation takes `&self` and returns a new image, so a caller holding
//! the original never observes a change. The color mode is not stored
//! separately from the pixels. It is derived from which [`Pixels`] variant
//! holds them, so the two can never disagree.
//!
//! | Mode | Storage | Alpha |
//! |---|---|---|
//! | `Gray1` | one byte per pixel, 0 or 255 | no |
//! | `Gray8` | one byte per pixel | no |
//! | `GrayAlpha` | luma + alpha | yes |
//! | `Palette` | one index per pixel + RGB palette | if a transparency index is set |
//! | `Rgb` | three bytes per pixel | no |
//! | `Rgba` | four bytes per pixel | yes |

use super::backend::BackendError;
use super::calculations::{crop_dimensions, crop_offset, crop_overlaps, validate_resize};
use super::orientation::{Orientation, Transpose};
use super::params::{Rect, Size};
use image::buffer::ConvertBuffer;
use image::imageops::{self, FilterType};
use image::{
    DynamicImage, GrayAlphaImage, GrayImage, ImageBuffer, LumaA, Pixel, Rgb, RgbImage, Rgba,
    RgbaImage,
};
use std::fmt;

/// Pixel layout of a [`DecodedImage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum ColorMode {
    Gray1,
    Gray8,
    GrayAlpha,
    Palette,
    Rgb,
    Rgba,
}

impl ColorMode {
    /// Short conventional name (`1`, `L`, `LA`, `P`, `RGB`, `RGBA`).
    pub fn name(self) -> &'static str {
        match self {
            ColorMode::Gray1 => "1",
            ColorMode::Gray8 => "L",
            ColorMode::GrayAlpha => "LA",
            ColorMode::Palette => "P",
            ColorMode::Rgb => "RGB",
            ColorMode::Rgba => "RGBA",
        }
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-format metadata carried alongside the pixels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    /// Palette index rendered as fully transparent. Only meaningful in
    /// [`ColorMode::Palette`].
    pub transparency: Option<u8>,
}

/// RGB palette entries, at most 256.
pub type Palette = Vec<[u8; 3]>;

type Buffer<P> = ImageBuffer<P, Vec<u8>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Pixels {
    Gray1(GrayImage),
    Gray8(GrayImage),
    GrayAlpha(GrayAlphaImage),
    Palette { indices: GrayImage, palette: Palette },
    Rgb(RgbImage),
    Rgba(RgbaImage),
}

/// Apply a layout-preserving buffer transform to whichever variant is held.
macro_rules! map_pixels {
    ($pixels:expr, $buf:ident => $body:expr) => {
        match $pixels {
            Pixels::Gray1($buf) => Pixels::Gray1($body),
            Pixels::Gray8($buf) => Pixels::Gray8($body),
            Pixels::GrayAlpha($buf) => Pixels::GrayAlpha($body),
            Pixels::Palette {
                indices: $buf,
                palette,
            } => Pixels::Palette {
                indices: $body,
                palette: palette.clone(),
            },
            Pixels::Rgb($buf) => Pixels::Rgb($body),
            Pixels::Rgba($buf) => Pixels::Rgba($body),
        }
    };
}

/// An owned, fully materialised decoded image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub(crate) pixels: Pixels,
    pub(crate) metadata: Metadata,
}

impl DecodedImage {
    pub(crate) fn new(pixels: Pixels, metadata: Metadata) -> Self {
        Self { pixels, metadata }
    }

    /// Bilevel image. Any non-zero sample becomes white (255).
    pub fn from_gray1(mut buf: GrayImage) -> Self {
        buf.pixels_mut()
            .for_each(|p| p.0[0] = if p.0[0] > 0 { 255 } else { 0 });
        Self::new(Pixels::Gray1(buf), Metadata::default())
    }

    pub fn from_gray(buf: GrayImage) -> Self {
        Self::new(Pixels::Gray8(buf), Metadata::default())
    }

    pub fn from_gray_alpha(buf: GrayAlphaImage) -> Self {
        Self::new(Pixels::GrayAlpha(buf), Metadata::default())
    }

    pub fn from_rgb(buf: RgbImage) -> Self {
        Self::new(Pixels::Rgb(buf), Metadata::default())
    }

    pub fn from_rgba(buf: RgbaImage) -> Self {
        Self::new(Pixels::Rgba(buf), Metadata::default())
    }

    /// Indexed image. Palettes longer than 256 entries are truncated; indices
    /// past the end of the palette render as black.
    pub fn from_palette(indices: GrayImage, mut palette: Palette, transparency: Option<u8>) -> Self {
        palette.truncate(256);
        Self::new(
            Pixels::Palette { indices, palette },
            Metadata { transparency },
        )
    }

    /// Adopt an `image` crate buffer, reducing anything wider than 8 bits.
    pub(crate) fn from_dynamic(image: DynamicImage) -> Self {
        let pixels = match image {
            DynamicImage::ImageLuma8(buf) => Pixels::Gray8(buf),
            DynamicImage::ImageLumaA8(buf) => Pixels::GrayAlpha(buf),
            DynamicImage::ImageRgb8(buf) => Pixels::Rgb(buf),
            DynamicImage::ImageRgba8(buf) => Pixels::Rgba(buf),
            other => {
                let color = other.color();
                match (color.has_color(), color.has_alpha()) {
                    (false, false) => Pixels::Gray8(other.to_luma8()),
                    (false, true) => Pixels::GrayAlpha(other.to_luma_alpha8()),
                    (true, false) => Pixels::Rgb(other.to_rgb8()),
                    (true, true) => Pixels::Rgba(other.to_rgba8()),
                }
            }
        };
        Self::new(pixels, Metadata::default())
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn get_size(&self) -> (u32, u32) {
        match &self.pixels {
            Pixels::Gray1(buf) | Pixels::Gray8(buf) => buf.dimensions(),
            Pixels::GrayAlpha(buf) => buf.dimensions(),
            Pixels::Palette { indices, .. } => indices.dimensions(),
            Pixels::Rgb(buf) => buf.dimensions(),
            Pixels::Rgba(buf) => buf.dimensions(),
        }
    }

    pub fn width(&self) -> u32 {
        self.get_size().0
    }

    pub fn height(&self) -> u32 {
        self.get_size().1
    }

    pub fn mode(&self) -> ColorMode {
        match &self.pixels {
            Pixels::Gray1(_) => ColorMode::Gray1,
            Pixels::Gray8(_) => ColorMode::Gray8,
            Pixels::GrayAlpha(_) => ColorMode::GrayAlpha,
            Pixels::Palette { .. } => ColorMode::Palette,
            Pixels::Rgb(_) => ColorMode::Rgb,
            Pixels::Rgba(_) => ColorMode::Rgba,
        }
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn palette(&self) -> Option<&[[u8; 3]]> {
        match &self.pixels {
            Pixels::Palette { palette, .. } => Some(palette),
            _ => None,
        }
    }

    pub fn palette_indices(&self) -> Option<&GrayImage> {
        match &self.pixels {
            Pixels::Palette { indices, .. } => Some(indices),
            _ => None,
        }
    }

    /// True for `Rgba`/`GrayAlpha`, and for `Palette` with a transparency index.
    pub fn has_alpha(&self) -> bool {
        match self.mode() {
            ColorMode::Rgba | ColorMode::GrayAlpha => true,
            ColorMode::Palette => self.metadata.transparency.is_some(),
            _ => false,
        }
    }

    /// Only the first frame of an animation is ever decoded.
    pub fn has_animation(&self) -> bool {
        false
    }

    // =========================================================================
    // Geometry
    // =========================================================================

    pub fn transpose(&self, op: Transpose) -> Self {
        Self::new(
            map_pixels!(&self.pixels, buf => transposed(buf, op)),
            self.metadata.clone(),
        )
    }

    /// Apply the transforms that bring an image stored in `orientation` upright.
    pub fn apply_orientation(&self, orientation: Orientation) -> Self {
        let transforms = orientation.transforms();
        if !transforms.is_empty() {
            log::debug!(
                "applying EXIF orientation {}: {:?}",
                orientation.exif_value(),
                transforms
            );
        }
        transforms
            .iter()
            .fold(self.clone(), |image, op| image.transpose(*op))
    }

    /// Resize with the default Lanczos3 filter.
    pub fn resize(&self, size: Size) -> Result<Self, BackendError> {
        self.resize_with_filter(size, FilterType::Lanczos3)
    }

    /// Resize to exactly `size`.
    ///
    /// Bilevel and palette images are resampled as RGB, and the result stays
    /// RGB. Every other mode is preserved. RGBA and LA are resampled with
    /// premultiplied alpha, so fully transparent pixels contribute no color.
    pub fn resize_with_filter(&self, size: Size, filter: FilterType) -> Result<Self, BackendError> {
        validate_resize(size)?;

        let promoted;
        let source = match self.mode() {
            ColorMode::Gray1 | ColorMode::Palette => {
                log::debug!("promoting {} to RGB before resampling", self.mode());
                promoted = self.to_rgb();
                &promoted
            }
            _ => self,
        };

        let pixels = match &source.pixels {
            Pixels::GrayAlpha(buf) => {
                Pixels::GrayAlpha(resized_premultiplied::<_, LumaA<f32>>(buf, size, filter))
            }
            Pixels::Rgba(buf) => {
                Pixels::Rgba(resized_premultiplied::<_, Rgba<f32>>(buf, size, filter))
            }
            other => map_pixels!(other, buf => resized(buf, size, filter)),
        };
        Ok(Self::new(pixels, source.metadata.clone()))
    }

    /// Cut out `rect`, keeping the color mode.
    ///
    /// The result is always `(right - left) x (bottom - top)`. Parts of the
    /// box outside the source are zero-filled: black, fully transparent, or
    /// palette index 0 depending on mode.
    pub fn crop(&self, rect: Rect) -> Result<Self, BackendError> {
        let (width, height) = crop_dimensions(rect)?;
        let offset = crop_offset(rect)?;
        let (source_w, source_h) = self.get_size();
        if !crop_overlaps(rect, source_w, source_h) {
            log::debug!("crop box {rect} lies outside {source_w}x{source_h}; output is all padding");
        }

        Ok(Self::new(
            map_pixels!(&self.pixels, buf => cropped(buf, offset, width, height)),
            self.metadata.clone(),
        ))
    }

    // =========================================================================
    // Mode conversion
    // =========================================================================

    /// Convert to RGB, dropping alpha, palette, and transparency.
    pub fn to_rgb(&self) -> Self {
        Self::from_rgb(self.rgb_pixels())
    }

    /// Convert to RGBA. Sources without alpha become fully opaque; a palette
    /// transparency index becomes alpha 0.
    pub fn to_rgba(&self) -> Self {
        Self::from_rgba(self.rgba_pixels())
    }

    pub(crate) fn rgb_pixels(&self) -> RgbImage {
        match &self.pixels {
            Pixels::Gray1(buf) | Pixels::Gray8(buf) => buf.convert(),
            Pixels::GrayAlpha(buf) => buf.convert(),
            Pixels::Palette { indices, palette } => {
                RgbImage::from_fn(indices.width(), indices.height(), |x, y| {
                    Rgb(palette_color(palette, indices.get_pixel(x, y).0[0]))
                })
            }
            Pixels::Rgb(buf) => buf.clone(),
            Pixels::Rgba(buf) => buf.convert(),
        }
    }

    pub(crate) fn rgba_pixels(&self) -> RgbaImage {
        match &self.pixels {
            Pixels::Gray1(buf) | Pixels::Gray8(buf) => buf.convert(),
            Pixels::GrayAlpha(buf) => buf.convert(),
            Pixels::Palette { indices, palette } => {
                let transparency = self.metadata.transparency;
                RgbaImage::from_fn(indices.width(), indices.height(), |x, y| {
                    let index = indices.get_pixel(x, y).0[0];
                    let [r, g, b] = palette_color(palette, index);
                    let alpha = if transparency == Some(index) { 0 } else { 255 };
                    Rgba([r, g, b, alpha])
                })
            }
            Pixels::Rgb(buf) => buf.convert(),
            Pixels::Rgba(buf) => buf.clone(),
        }
    }
}

fn palette_color(palette: &[[u8; 3]], index: u8) -> [u8; 3] {
    palette.get(index as usize).copied().unwrap_or([0, 0, 0])
}

fn transposed<P: Pixel<Subpixel = u8> + 'static>(buf: &Buffer<P>, op: Transpose) -> Buffer<P> {
    // imageops rotates clockwise; Transpose rotates counter-clockwise
    match op {
        Transpose::FlipHorizontal => imageops::flip_horizontal(buf),
        Transpose::Rotate90 => imageops::rotate270(buf),
        Transpose::Rotate180 => imageops::rotate180(buf),
        Transpose::Rotate270 => imageops::rotate90(buf),
    }
}

fn resized<P: Pixel<Subpixel = u8> + 'static>(
    buf: &Buffer<P>,
    size: Size,
    filter: FilterType,
) -> Buffer<P> {
    imageops::resize(buf, size.width, size.height, filter)
}

/// Resample an image whose last channel is alpha.
///
/// Samples are premultiplied into `Q` (the same layout over `f32` in
/// `0.0..=1.0`), resampled, then divided back out. Where the result rounds to
/// alpha 0 the color channels are zero.
fn resized_premultiplied<P, Q>(buf: &Buffer<P>, size: Size, filter: FilterType) -> Buffer<P>
where
    P: Pixel<Subpixel = u8> + 'static,
    Q: Pixel<Subpixel = f32> + 'static,
{
    let channels = usize::from(P::CHANNEL_COUNT);
    let alpha = channels - 1;

    let premultiplied = ImageBuffer::<Q, Vec<f32>>::from_fn(buf.width(), buf.height(), |x, y| {
        let samples = buf.get_pixel(x, y).channels();
        let a = f32::from(samples[alpha]) / 255.0;
        let mut out = [0.0f32; 4];
        for (i, &sample) in samples.iter().enumerate() {
            out[i] = if i == alpha { a } else { f32::from(sample) / 255.0 * a };
        }
        *Q::from_slice(&out[..channels])
    });

    let resampled = imageops::resize(&premultiplied, size.width, size.height, filter);

    let to_u8 = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    Buffer::<P>::from_fn(size.width, size.height, |x, y| {
        let samples = resampled.get_pixel(x, y).channels();
        let a = samples[alpha].clamp(0.0, 1.0);
        let a8 = to_u8(a);
        let mut out = [0u8; 4];
        for (i, &sample) in samples.iter().enumerate() {
            out[i] = if i == alpha {
                a8
            } else if a8 > 0 {
                to_u8(sample / a)
            } else {
                0
            };
        }
        *P::from_slice(&out[..channels])
    })
}

fn cropped<P: Pixel<Subpixel = u8>>(
    buf: &Buffer<P>,
    (x, y): (i64, i64),
    width: u32,
    height: u32,
) -> Buffer<P> {
    let mut out = Buffer::<P>::new(width, height);
    imageops::replace(&mut out, buf, x, y);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{
        checkerboard_palette, gradient_rgb, gradient_rgba, gray_from_rows, sample_in_every_mode,
    };
    use image::{GrayAlphaImage, Luma, LumaA};

    fn gray_rows(image: &DecodedImage) -> Vec<Vec<u8>> {
        let buffer = image.to_buffer_rgb();
        (0..buffer.height())
            .map(|y| {
                (0..buffer.width())
                    .map(|x| buffer.pixel(x, y).unwrap()[0])
                    .collect()
            })
            .collect()
    }

    /// 2x3 gray image:
    /// ```text
    /// 1 2
    /// 3 4
    /// 5 6
    /// ```
    fn two_by_three() -> DecodedImage {
        DecodedImage::from_gray(gray_from_rows(&[&[1, 2], &[3, 4], &[5, 6]]))
    }

    // =========================================================================
    // Alpha / animation queries
    // =========================================================================

    #[test]
    fn has_alpha_per_mode() {
        let gray = GrayImage::new(2, 2);
        assert!(!DecodedImage::from_gray1(gray.clone()).has_alpha());
        assert!(!DecodedImage::from_gray(gray.clone()).has_alpha());
        assert!(DecodedImage::from_gray_alpha(GrayAlphaImage::new(2, 2)).has_alpha());
        assert!(!DecodedImage::from_rgb(RgbImage::new(2, 2)).has_alpha());
        assert!(DecodedImage::from_rgba(RgbaImage::new(2, 2)).has_alpha());
    }

    #[test]
    fn has_alpha_palette_depends_on_transparency() {
        assert!(checkerboard_palette(2, 2, Some(1)).has_alpha());
        assert!(!checkerboard_palette(2, 2, None).has_alpha());
    }

    #[test]
    fn has_animation_is_always_false() {
        for image in sample_in_every_mode(3, 3) {
            assert!(!image.has_animation());
        }
    }

    #[test]
    fn gray1_normalises_samples() {
        let image = DecodedImage::from_gray1(gray_from_rows(&[&[0, 1, 200]]));
        assert_eq!(gray_rows(&image), vec![vec![0, 255, 255]]);
    }

    #[test]
    fn from_dynamic_reduces_sixteen_bit() {
        let wide = DynamicImage::new_rgba16(3, 2);
        let image = DecodedImage::from_dynamic(wide);
        assert_eq!(image.mode(), ColorMode::Rgba);
        assert_eq!(image.get_size(), (3, 2));

        let gray = DynamicImage::new_luma16(1, 1);
        assert_eq!(DecodedImage::from_dynamic(gray).mode(), ColorMode::Gray8);
    }

    // =========================================================================
    // Transposes
    // =========================================================================

    #[test]
    fn rotate90_is_counter_clockwise() {
        let rotated = two_by_three().transpose(Transpose::Rotate90);
        assert_eq!(rotated.get_size(), (3, 2));
        assert_eq!(gray_rows(&rotated), vec![vec![2, 4, 6], vec![1, 3, 5]]);
    }

    #[test]
    fn rotate270_is_clockwise_quarter() {
        let rotated = two_by_three().transpose(Transpose::Rotate270);
        assert_eq!(gray_rows(&rotated), vec![vec![5, 3, 1], vec![6, 4, 2]]);
    }

    #[test]
    fn rotate180_and_flip() {
        assert_eq!(
            gray_rows(&two_by_three().transpose(Transpose::Rotate180)),
            vec![vec![6, 5], vec![4, 3], vec![2, 1]]
        );
        assert_eq!(
            gray_rows(&two_by_three().transpose(Transpose::FlipHorizontal)),
            vec![vec![2, 1], vec![4, 3], vec![6, 5]]
        );
    }

    #[test]
    fn orientation_five_is_transpose() {
        // rotate-270 then flip-horizontal mirrors across the main diagonal
        let image = two_by_three().apply_orientation(Orientation::LeftTop);
        assert_eq!(gray_rows(&image), vec![vec![1, 3, 5], vec![2, 4, 6]]);
    }

    #[test]
    fn orientation_one_is_identity() {
        let image = two_by_three();
        assert_eq!(image.apply_orientation(Orientation::TopLeft), image);
    }

    #[test]
    fn transpose_keeps_palette_and_transparency() {
        let image = checkerboard_palette(4, 2, Some(1));
        let rotated = image.transpose(Transpose::Rotate90);
        assert_eq!(rotated.mode(), ColorMode::Palette);
        assert_eq!(rotated.palette(), image.palette());
        assert_eq!(rotated.metadata().transparency, Some(1));
        assert_eq!(rotated.get_size(), (2, 4));
    }

    // =========================================================================
    // Resize
    // =========================================================================

    #[test]
    fn resize_promotes_palette_and_bilevel_to_rgb() {
        let palette = checkerboard_palette(8, 8, Some(1)).resize(Size::new(4, 4)).unwrap();
        assert_eq!(palette.mode(), ColorMode::Rgb);
        assert_eq!(palette.metadata().transparency, None);

        let bilevel = DecodedImage::from_gray1(GrayImage::new(8, 8))
            .resize(Size::new(3, 5))
            .unwrap();
        assert_eq!(bilevel.mode(), ColorMode::Rgb);
        assert_eq!(bilevel.get_size(), (3, 5));
    }

    #[test]
    fn resize_preserves_direct_modes() {
        let rgb = DecodedImage::from_rgb(gradient_rgb(10, 10));
        let rgba = DecodedImage::from_rgba(gradient_rgba(10, 10));
        let gray = DecodedImage::from_gray(GrayImage::new(10, 10));
        let la = DecodedImage::from_gray_alpha(GrayAlphaImage::new(10, 10));

        assert_eq!(rgb.resize(Size::new(5, 7)).unwrap().mode(), ColorMode::Rgb);
        assert_eq!(rgba.resize(Size::new(5, 7)).unwrap().mode(), ColorMode::Rgba);
        assert_eq!(gray.resize(Size::new(5, 7)).unwrap().mode(), ColorMode::Gray8);
        assert_eq!(la.resize(Size::new(5, 7)).unwrap().mode(), ColorMode::GrayAlpha);
    }

    #[test]
    fn resize_upscales_solid_color_exactly() {
        let solid = RgbImage::from_pixel(4, 4, Rgb([10, 200, 30]));
        let resized = DecodedImage::from_rgb(solid).resize(Size::new(9, 9)).unwrap();
        let buffer = resized.to_buffer_rgb();
        assert!(buffer.data().chunks(3).all(|p| p == [10, 200, 30]));
    }

    #[test]
    fn resize_rejects_zero_target() {
        let image = DecodedImage::from_rgb(gradient_rgb(4, 4));
        assert!(matches!(
            image.resize(Size::new(0, 4)),
            Err(BackendError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn resize_leaves_original_untouched() {
        let image = checkerboard_palette(6, 6, Some(0));
        let before = image.clone();
        let _ = image.resize(Size::new(3, 3)).unwrap();
        assert_eq!(image, before);
        assert_eq!(image.get_size(), (6, 6));
    }

    #[test]
    fn resize_rgba_does_not_bleed_transparent_color() {
        let buf = RgbaImage::from_raw(2, 1, vec![255, 0, 0, 255, 0, 255, 0, 0]).unwrap();
        let resized = DecodedImage::from_rgba(buf).resize(Size::new(8, 1)).unwrap();

        let Pixels::Rgba(out) = &resized.pixels else {
            panic!("expected RGBA, got {}", resized.mode());
        };
        let mut visible = 0;
        for pixel in out.pixels() {
            let [r, g, b, a] = pixel.0;
            assert_eq!((g, b), (0, 0), "green leaked into {:?}", pixel.0);
            if a > 0 {
                visible += 1;
                assert!(r >= 254, "red diluted in {:?}", pixel.0);
            } else {
                assert_eq!(r, 0);
            }
        }
        assert!(visible >= 4);
    }

    #[test]
    fn resize_gray_alpha_does_not_bleed_transparent_luma() {
        let buf = GrayAlphaImage::from_raw(2, 1, vec![200, 255, 10, 0]).unwrap();
        let resized = DecodedImage::from_gray_alpha(buf)
            .resize_with_filter(Size::new(6, 1), FilterType::Triangle)
            .unwrap();

        let Pixels::GrayAlpha(out) = &resized.pixels else {
            panic!("expected LA, got {}", resized.mode());
        };
        for pixel in out.pixels() {
            let [luma, alpha] = pixel.0;
            if alpha > 0 {
                assert!(luma.abs_diff(200) <= 1, "luma {luma} at alpha {alpha}");
            }
        }
        assert_eq!(out.get_pixel(0, 0).0, [200, 255]);
    }

    #[test]
    fn resize_opaque_rgba_matches_straight_resample() {
        let rgb = gradient_rgb(6, 4);
        let opaque = DecodedImage::from_rgba(RgbaImage::from_fn(6, 4, |x, y| {
            let [r, g, b] = rgb.get_pixel(x, y).0;
            Rgba([r, g, b, 255])
        }));
        let premultiplied = opaque.resize(Size::new(3, 2)).unwrap();
        let straight = opaque.to_rgb().resize(Size::new(3, 2)).unwrap();

        let a = premultiplied.to_buffer_rgb();
        let b = straight.to_buffer_rgb();
        for (p, q) in a.data().iter().zip(b.data()) {
            assert!(p.abs_diff(*q) <= 1, "{p} vs {q}");
        }
    }

    #[test]
    fn resize_over_pixel_limit_is_error() {
        let image = DecodedImage::from_rgba(RgbaImage::new(2, 2));
        assert!(matches!(
            image.resize(Size::new(u32::MAX, u32::MAX)),
            Err(BackendError::InvalidGeometry(_))
        ));
    }

    // =========================================================================
    // Crop
    // =========================================================================

    #[test]
    fn crop_inside_bounds() {
        let cropped = two_by_three().crop(Rect::new(1, 1, 2, 3)).unwrap();
        assert_eq!(gray_rows(&cropped), vec![vec![4], vec![6]]);
    }

    #[test]
    fn crop_pads_outside_bounds_with_zero() {
        let cropped = two_by_three().crop(Rect::new(-1, -1, 2, 1)).unwrap();
        assert_eq!(cropped.get_size(), (3, 2));
        assert_eq!(gray_rows(&cropped), vec![vec![0, 0, 0], vec![0, 1, 2]]);
    }

    #[test]
    fn crop_fully_outside_is_all_padding() {
        let image = DecodedImage::from_gray_alpha(GrayAlphaImage::from_pixel(
            2,
            2,
            LumaA([90, 255]),
        ));
        let cropped = image.crop(Rect::new(5, 5, 7, 6)).unwrap();
        assert_eq!(cropped.get_size(), (2, 1));
        assert!(cropped.to_buffer_rgba().data().iter().all(|&b| b == 0));
    }

    #[test]
    fn crop_keeps_mode_and_metadata() {
        let image = checkerboard_palette(4, 4, Some(1));
        let cropped = image.crop(Rect::new(1, 0, 3, 2)).unwrap();
        assert_eq!(cropped.mode(), ColorMode::Palette);
        assert_eq!(cropped.metadata().transparency, Some(1));
        assert_eq!(
            cropped.palette_indices().unwrap().as_raw(),
            &vec![1, 0, 0, 1]
        );
    }

    #[test]
    fn crop_inverted_box_is_error() {
        assert!(two_by_three().crop(Rect::new(2, 0, 1, 1)).is_err());
    }

    #[test]
    fn crop_huge_box_is_error_not_panic() {
        let image = DecodedImage::from_rgba(RgbaImage::new(2, 2));
        let huge = Rect::new(0, 0, i64::from(u32::MAX), i64::from(u32::MAX));
        assert!(matches!(
            image.crop(huge),
            Err(BackendError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn crop_far_negative_origin_is_error_not_panic() {
        let image = DecodedImage::from_rgba(RgbaImage::new(2, 2));
        assert!(matches!(
            image.crop(Rect::new(i64::MIN, 0, i64::MIN + 1, 1)),
            Err(BackendError::InvalidGeometry(_))
        ));

        let padded = image.crop(Rect::new(i64::MIN + 1, 0, i64::MIN + 2, 1)).unwrap();
        assert_eq!(padded.get_size(), (1, 1));
        assert_eq!(padded.to_buffer_rgba().data(), &[0, 0, 0, 0]);
    }

    #[test]
    fn crop_leaves_original_untouched() {
        let image = two_by_three();
        let before = image.clone();
        let _ = image.crop(Rect::new(0, 0, 1, 1)).unwrap();
        assert_eq!(image, before);
    }

    // =========================================================================
    // Mode conversion
    // =========================================================================

    #[test]
    fn palette_to_rgb_looks_up_colors() {
        let image = checkerboard_palette(2, 1, None).to_rgb();
        assert_eq!(image.mode(), ColorMode::Rgb);
        assert_eq!(image.to_buffer_rgb().data(), &[255, 0, 0, 0, 0, 255]);
    }

    #[test]
    fn out_of_range_palette_index_is_black() {
        let indices = GrayImage::from_pixel(1, 1, Luma([9]));
        let image = DecodedImage::from_palette(indices, vec![[255, 255, 255]], None);
        assert_eq!(image.to_buffer_rgb().data(), &[0, 0, 0]);
    }

    #[test]
    fn oversized_palette_is_truncated() {
        let image = DecodedImage::from_palette(GrayImage::new(1, 1), vec![[1, 2, 3]; 300], None);
        assert_eq!(image.palette().unwrap().len(), 256);
    }

    #[test]
    fn gray_alpha_to_rgba_keeps_alpha() {
        let image = DecodedImage::from_gray_alpha(GrayAlphaImage::from_pixel(1, 1, LumaA([40, 128])));
        assert_eq!(image.to_rgba().to_buffer_rgba().data(), &[40, 40, 40, 128]);
        assert_eq!(image.to_rgb().to_buffer_rgb().data(), &[40, 40, 40]);
    }
}
