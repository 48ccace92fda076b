//! Content-addressing primitives shared by the extractor and the queue.

use sha2::{Digest, Sha256};

/// `chunk_hash = SHA256_hex(content)`. Identical content always yields the
/// same hash, which is what lets the backend dedup repeated chunks (e.g. the
/// duplicate-paragraph case in Markdown) via document id.
pub fn chunk_hash(content: &str) -> String {
    hex_sha256(content.as_bytes())
}

/// `git_file_hash` is computed in-process as the SHA-256 hex of the file's
/// raw bytes. This differs from `git hash-object`'s blob-header scheme but
/// only a stable content-address is required (see DESIGN.md).
pub fn git_file_hash(raw_bytes: &[u8]) -> String {
    hex_sha256(raw_bytes)
}

fn hex_sha256(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(digest.len() * 2);
    for byte in digest {
        hex.push_str(&format!("{byte:02x}"));
    }
    hex
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_content_yields_same_hash() {
        assert_eq!(chunk_hash("Repeat me"), chunk_hash("Repeat me"));
    }

    #[test]
    fn different_content_yields_different_hash() {
        assert_ne!(chunk_hash("a"), chunk_hash("b"));
    }

    #[test]
    fn git_file_hash_is_deterministic() {
        let bytes = b"fn main() {}";
        assert_eq!(git_file_hash(bytes), git_file_hash(bytes));
    }

    #[test]
    fn hashes_are_lowercase_hex() {
        let hash = chunk_hash("x");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
