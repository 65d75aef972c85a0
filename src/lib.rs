//! # imagestate
//!
//! A decoded-image backend for a state-graph image pipeline.
//!
//! An external resolver models an image as a sequence of **states** (JPEG,
//! PNG or GIF file bytes; a decoded in-memory image; raw RGB / RGBA pixel
//! buffers) and plans a shortest path of **operations** and **converters**
//! through them. This crate is one backend in that graph: it declares what it
//! can do, proves at registration time that its codecs are present, and then
//! executes whichever edges the resolver picks.
//!
//! ```text
//!   jpeg-file ─┐                       ┌─> rgb-buffer
//!   png-file  ─┼─> decoded ─(ops)─> decoded ─┤
//!   gif-file  ─┘      │                └─> rgba-buffer
//!                     └─> save-as-jpeg / save-as-png / save-as-gif
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Decode, orientation, operation set, encoders, buffers, backend trait + [`imaging::RustBackend`] |
//! | [`config`] | Backend `config.toml` loading, validation, and the stock template |
//! | [`output`] | CLI output formatting for `info`, `convert` and `capabilities` |
//!
//! # Design Decisions
//!
//! ## Decoded Images Are Values
//!
//! [`imaging::DecodedImage`] is never mutated in place. Resize, crop and the
//! mode conversions take `&self` and return a new image, so a resolver can
//! keep an intermediate state around and branch from it freely. The color
//! mode is the enum variant holding the pixels, so the two cannot disagree.
//!
//! ## Orientation Is Fixed At Decode
//!
//! JPEG EXIF orientation is read and applied once, while decoding. Every
//! later operation sees upright pixels, and the tag is not carried forward.
//!
//! ## Palettes Survive Round Trips
//!
//! PNG and GIF are decoded and encoded with the `png` and `gif` crates
//! directly rather than through `image`'s generic path, which expands
//! palettes. A palette image with a transparency index reads back with the
//! same index after a GIF or PNG round trip.
//!
//! ## Crops Pad, They Do Not Clip
//!
//! A crop always returns exactly `(right - left) x (bottom - top)` pixels.
//! Area outside the source is zero: black, fully transparent, or palette
//! index 0. Inverted boxes and zero-sized resize targets are rejected.

pub mod config;
pub mod imaging;
pub mod output;

#[cfg(test)]
pub(crate) mod test_helpers;
