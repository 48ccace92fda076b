//! Binary-file guard: classify a file as text or binary before extraction.
//!
//! A NUL byte anywhere in the first slice is a strong binary signal; failing
//! that, a fast-path UTF-8 validity check covers the overwhelming majority of
//! source files, with a BOM sniff as the final fallback for UTF-16 text.

const SNIFF_WINDOW: usize = 8192;

/// True if `bytes` looks like a binary file and should be skipped rather
/// than handed to an extractor.
pub fn looks_binary(bytes: &[u8]) -> bool {
    let window = &bytes[..bytes.len().min(SNIFF_WINDOW)];

    if window.contains(&0u8) {
        return true;
    }

    if std::str::from_utf8(window).is_ok() {
        return false;
    }

    let (_, _, had_errors) = encoding_rs::UTF_16LE.decode(window);
    if !had_errors && has_utf16_bom(window) {
        return false;
    }

    true
}

fn has_utf16_bom(bytes: &[u8]) -> bool {
    bytes.starts_with(&[0xFF, 0xFE]) || bytes.starts_with(&[0xFE, 0xFF])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_utf8_is_not_binary() {
        assert!(!looks_binary(b"fn main() {}"));
    }

    #[test]
    fn nul_byte_marks_binary() {
        assert!(looks_binary(b"\x00\x01\x02PNG"));
    }

    #[test]
    fn invalid_utf8_without_bom_is_binary() {
        assert!(looks_binary(&[0x89, 0x50, 0x4E, 0x47, 0xFF, 0xD8]));
    }

    #[test]
    fn empty_file_is_not_binary() {
        assert!(!looks_binary(b""));
    }
}
