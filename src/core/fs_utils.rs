//! File system utility helpers (BOM-aware readers, etc.)
use anyhow::{Context, Result};
use std::path::Path;

/// Reads an LSL script, detecting UTF-16 by BOM and falling back to Windows-1252
/// when the bytes are not valid UTF-8. The returned text never starts with a BOM.
pub fn read_lsl_file(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    Ok(decode_source(&bytes))
}

/// Декодирование байтов исходника в UTF-8.
pub fn decode_source(bytes: &[u8]) -> String {
    let content = match bytes {
        [0xFF, 0xFE, ..] => {
            let (decoded, _, had_errors) = encoding_rs::UTF_16LE.decode(bytes);
            if had_errors {
                tracing::warn!("Errors detected while decoding UTF-16LE file");
            }
            decoded.into_owned()
        }
        [0xFE, 0xFF, ..] => {
            let (decoded, _, had_errors) = encoding_rs::UTF_16BE.decode(bytes);
            if had_errors {
                tracing::warn!("Errors detected while decoding UTF-16BE file");
            }
            decoded.into_owned()
        }
        _ => match std::str::from_utf8(bytes) {
            Ok(s) => s.to_string(),
            Err(_) => {
                tracing::debug!("UTF-8 decoding failed, trying Windows-1252");
                let (decoded, _, had_errors) = encoding_rs::WINDOWS_1252.decode(bytes);
                if had_errors {
                    tracing::warn!("Errors detected while decoding Windows-1252 file");
                }
                decoded.into_owned()
            }
        },
    };
    strip_bom(&content).to_string()
}

/// Removes a leading U+FEFF if present.
pub fn strip_bom(input: &str) -> &str {
    input.strip_prefix('\u{FEFF}').unwrap_or(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_bom() {
        assert_eq!(strip_bom("\u{FEFF}default {}"), "default {}");
        assert_eq!(strip_bom("default {}"), "default {}");
        assert_eq!(strip_bom(""), "");
    }

    #[test]
    fn test_decode_utf16le() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "x;".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        assert_eq!(decode_source(&bytes), "x;");
    }

    #[test]
    fn test_decode_latin_fallback() {
        // 0xE9 alone is not valid UTF-8
        assert_eq!(decode_source(&[b'"', 0xE9, b'"']), "\"é\"");
    }
}
