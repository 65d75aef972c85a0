//! Minimal EXIF reader for the JPEG orientation tag.
//!
//! Only one field matters to decoding: Orientation (`0x0112`) in IFD0. It is
//! found by walking the JPEG marker segments up to the first APP1 carrying an
//! `Exif\0\0` header, then reading the TIFF structure inside it.
//!
//! Anything malformed reads as "no orientation"; the decoder treats that as
//! tag 1, the same as a file without EXIF.

const EXIF_HEADER: &[u8] = b"Exif\0\0";
const ORIENTATION_TAG: u16 = 0x0112;
const TYPE_SHORT: u16 = 3;

/// Read the raw EXIF orientation value from JPEG file bytes.
///
/// Returns `None` when the file has no EXIF block or no orientation entry.
/// The value is returned unvalidated; range checking belongs to the caller.
pub fn read_jpeg_orientation(data: &[u8]) -> Option<u16> {
    let tiff = find_jpeg_app1_exif(data)?;
    read_tiff_orientation(tiff)
}

/// Find the TIFF block inside a JPEG's `APP1 Exif` segment.
fn find_jpeg_app1_exif(data: &[u8]) -> Option<&[u8]> {
    // Must start with SOI
    if data.get(..2)? != [0xFF, 0xD8] {
        return None;
    }

    let mut pos = 2;
    while pos + 4 <= data.len() {
        if data[pos] != 0xFF {
            return None;
        }
        let marker = data[pos + 1];

        // Fill bytes before a marker
        if marker == 0xFF {
            pos += 1;
            continue;
        }
        // SOS (0xDA) means entropy-coded data starts; EOI ends the stream
        if marker == 0xDA || marker == 0xD9 {
            return None;
        }
        // Markers without length field
        if (0xD0..=0xD7).contains(&marker) || marker == 0x01 {
            pos += 2;
            continue;
        }

        let seg_len = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
        if seg_len < 2 {
            return None;
        }
        let seg_start = pos + 4;
        let seg_end = (pos + 2 + seg_len).min(data.len());

        if marker == 0xE1 {
            let segment = &data[seg_start..seg_end];
            if let Some(tiff) = segment.strip_prefix(EXIF_HEADER) {
                return Some(tiff);
            }
        }

        pos += 2 + seg_len;
    }
    None
}

/// Read the Orientation entry from IFD0 of a TIFF block.
fn read_tiff_orientation(data: &[u8]) -> Option<u16> {
    let big_endian = match data.get(0..2)? {
        b"MM" => true,
        b"II" => false,
        _ => return None,
    };

    let read_u16 = |offset: usize| -> Option<u16> {
        let bytes: [u8; 2] = data.get(offset..offset + 2)?.try_into().ok()?;
        Some(if big_endian {
            u16::from_be_bytes(bytes)
        } else {
            u16::from_le_bytes(bytes)
        })
    };

    let read_u32 = |offset: usize| -> Option<u32> {
        let bytes: [u8; 4] = data.get(offset..offset + 4)?.try_into().ok()?;
        Some(if big_endian {
            u32::from_be_bytes(bytes)
        } else {
            u32::from_le_bytes(bytes)
        })
    };

    // Verify TIFF magic (42)
    if read_u16(2)? != 42 {
        return None;
    }

    let ifd_offset = read_u32(4)? as usize;
    let entry_count = read_u16(ifd_offset)? as usize;
    let entries_start = ifd_offset + 2;

    (0..entry_count)
        .map(|i| entries_start + i * 12)
        .find_map(|entry| {
            if read_u16(entry)? != ORIENTATION_TAG {
                return None;
            }
            if read_u16(entry + 2)? != TYPE_SHORT {
                log::debug!("EXIF orientation entry has non-SHORT type, ignoring");
                return None;
            }
            // A single SHORT is stored left-justified in the value field
            read_u16(entry + 8)
        })
}
