//! CLI output formatting.
//!
//! Each command has a `format_*` function returning display lines and a thin
//! `print_*` wrapper, so the formatting is testable without capturing stdout.
//! Structured output (`--json`) serialises the same [`ImageInfo`] and
//! [`Capabilities`] values with `serde_json`.
//!
//! # Output Format
//!
//! ## Info
//!
//! ```text
//! photo.jpg
//!     Format: JPEG
//!     Size: 640x480
//!     Mode: RGB
//!     Alpha: no
//!     Animation: no
//! ```
//!
//! ## Capabilities
//!
//! ```text
//! rust (image 0.25 / png 0.17 / gif 0.13): available
//!     Operations
//!         decoded: get-size, has-alpha, has-animation, resize, crop, ...
//!     Converters
//!         jpeg-file → decoded
//!         decoded → rgb-buffer
//! ```

use crate::imaging::{Capabilities, ColorMode, DecodedImage, FileFormat, StateKind};
use serde::Serialize;
use std::fmt::Debug;
use std::path::Path;

/// Everything the `info` command reports about a decoded image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageInfo {
    pub format: FileFormat,
    pub width: u32,
    pub height: u32,
    pub mode: ColorMode,
    pub has_alpha: bool,
    pub has_animation: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transparency: Option<u8>,
}

impl ImageInfo {
    pub fn of(image: &DecodedImage, format: FileFormat) -> Self {
        let (width, height) = image.get_size();
        Self {
            format,
            width,
            height,
            mode: image.mode(),
            has_alpha: image.has_alpha(),
            has_animation: image.has_animation(),
            transparency: image.metadata().transparency,
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

/// Wire name of a kind (`jpeg-file`, `get-size`), falling back to `Debug`.
fn kind_name<T: Serialize + Debug>(kind: &T) -> String {
    match serde_json::to_value(kind) {
        Ok(serde_json::Value::String(name)) => name,
        _ => format!("{kind:?}"),
    }
}

// ============================================================================
// info
// ============================================================================

pub fn format_info(path: &Path, info: &ImageInfo) -> Vec<String> {
    let mut lines = vec![path.display().to_string()];
    lines.push(format!("{}Format: {}", indent(1), info.format));
    lines.push(format!("{}Size: {}x{}", indent(1), info.width, info.height));
    lines.push(format!("{}Mode: {}", indent(1), info.mode));
    lines.push(format!("{}Alpha: {}", indent(1), yes_no(info.has_alpha)));
    if let Some(index) = info.transparency {
        lines.push(format!("{}Transparent index: {}", indent(1), index));
    }
    lines.push(format!(
        "{}Animation: {}",
        indent(1),
        yes_no(info.has_animation)
    ));
    lines
}

pub fn print_info(path: &Path, info: &ImageInfo) {
    for line in format_info(path, info) {
        println!("{}", line);
    }
}

// ============================================================================
// convert / raw
// ============================================================================

/// One-line summary of a written file.
///
/// ```text
/// photo.jpg → thumb.png (200x100 RGB, 5123 bytes)
/// ```
pub fn format_written(input: &Path, output: &Path, image: &DecodedImage, bytes: usize) -> String {
    let (width, height) = image.get_size();
    format!(
        "{} → {} ({}x{} {}, {} bytes)",
        input.display(),
        output.display(),
        width,
        height,
        image.mode(),
        bytes
    )
}

// ============================================================================
// capabilities
// ============================================================================

pub fn format_capabilities(caps: &Capabilities, available: bool) -> Vec<String> {
    let status = if available { "available" } else { "unavailable" };
    let mut lines = vec![format!("{} ({}): {}", caps.backend, caps.library, status)];

    lines.push(format!("{}Operations", indent(1)));
    let mut states: Vec<StateKind> = Vec::new();
    for (state, _) in &caps.operations {
        if !states.contains(state) {
            states.push(*state);
        }
    }
    for state in states {
        let ops: Vec<String> = caps
            .operations
            .iter()
            .filter(|(s, _)| *s == state)
            .map(|(_, op)| kind_name(op))
            .collect();
        lines.push(format!(
            "{}{}: {}",
            indent(2),
            kind_name(&state),
            ops.join(", ")
        ));
    }

    lines.push(format!("{}Converters", indent(1)));
    for edge in &caps.converters {
        lines.push(format!(
            "{}{} → {}",
            indent(2),
            kind_name(&edge.from),
            kind_name(&edge.to)
        ));
    }
    lines
}

pub fn print_capabilities(caps: &Capabilities, available: bool) {
    for line in format_capabilities(caps, available) {
        println!("{}", line);
    }
}
