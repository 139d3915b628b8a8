//! # Encoding Module
//!
//! Byte-to-text conversion for data crossing the serial link.
//!
//! The sensor speaks plain ASCII, but a live link also carries line noise, so
//! decoding is always lossy and never fails. Raw chunks are rendered as hex for
//! trace logging.

/// Number of bytes shown by [`hex_preview`] before the output is elided.
pub const HEX_PREVIEW_LIMIT: usize = 32;

/// Decodes one framed line into trimmed text.
///
/// Invalid UTF-8 sequences become `U+FFFD`, so a corrupted line still reaches
/// the classifier and is dropped there as unknown.
///
/// # Examples
///
/// ```
/// use radar_turret::serial::encoding::decode_line;
///
/// assert_eq!(decode_line(b"  90,50\r"), "90,50");
/// assert_eq!(decode_line(b""), "");
/// ```
#[must_use]
pub fn decode_line(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).trim().to_string()
}

/// Renders bytes as lowercase hex, eliding anything past [`HEX_PREVIEW_LIMIT`].
///
/// # Examples
///
/// ```
/// use radar_turret::serial::encoding::hex_preview;
///
/// assert_eq!(hex_preview(b"90,5"), "39302c35");
/// ```
#[must_use]
pub fn hex_preview(raw: &[u8]) -> String {
    if raw.len() <= HEX_PREVIEW_LIMIT {
        hex::encode(raw)
    } else {
        format!(
            "{}.. (+{} bytes)",
            hex::encode(&raw[..HEX_PREVIEW_LIMIT]),
            raw.len() - HEX_PREVIEW_LIMIT
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_line_trims_whitespace() {
        assert_eq!(decode_line(b"\t LASER_ACTIVATED \r"), "LASER_ACTIVATED");
    }

    #[test]
    fn test_decode_line_invalid_utf8() {
        let text = decode_line(&[0xFF, b'9', b'0']);
        assert!(text.contains('\u{FFFD}'));
        assert!(text.ends_with("90"));
    }

    #[test]
    fn test_hex_preview_short() {
        assert_eq!(hex_preview(&[0x0a, 0xff]), "0aff");
    }

    #[test]
    fn test_hex_preview_elides_long_chunks() {
        let chunk = vec![0u8; HEX_PREVIEW_LIMIT + 8];
        let preview = hex_preview(&chunk);
        assert!(preview.ends_with("(+8 bytes)"));
        assert!(preview.starts_with(&"00".repeat(HEX_PREVIEW_LIMIT)));
    }
}
