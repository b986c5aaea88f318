//! Content addressing for assets - SHA-256 names.
//!
//! A hashed name is the hex digest of the full file content followed by the
//! original extension, so identical bytes always share a name and any change
//! produces a new one.

use std::fs::File;
use std::io;
use std::path::Path;

use sha2::{Digest, Sha256};

/// Compute SHA-256 of bytes, return hex string.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Hashed file name for in-memory content: `<digest>.<ext of original>`.
pub fn hashed_name(data: &[u8], original: &Path) -> String {
    with_extension(sha256_hex(data), original)
}

/// Hashed file name for a file on disk, streaming its content.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(with_extension(hex::encode(hasher.finalize()), path))
}

fn with_extension(digest: String, original: &Path) -> String {
    match original.extension().and_then(|e| e.to_str()) {
        Some(ext) if !ext.is_empty() => format!("{}.{}", digest, ext),
        _ => digest,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_sha256_known_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_hashed_name_keeps_extension() {
        let name = hashed_name(b"abc", Path::new("sprites/hero.png"));
        assert!(name.ends_with(".png"));
        assert_eq!(name.len(), 64 + 4);

        let bare = hashed_name(b"abc", Path::new("LICENSE"));
        assert_eq!(bare.len(), 64);
    }

    #[test]
    fn test_hash_file_matches_in_memory_hash() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tile.png");
        fs::write(&path, b"\x89PNG tile").unwrap();

        assert_eq!(
            hash_file(&path).unwrap(),
            hashed_name(b"\x89PNG tile", &path)
        );
    }

    #[test]
    fn test_identical_bytes_share_name() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.png");
        let b = dir.path().join("b.png");
        fs::write(&a, [1u8, 2, 3]).unwrap();
        fs::write(&b, [1u8, 2, 3]).unwrap();
        assert_eq!(hash_file(&a).unwrap(), hash_file(&b).unwrap());

        fs::write(&b, [1u8, 2, 2]).unwrap();
        assert_ne!(hash_file(&a).unwrap(), hash_file(&b).unwrap());
    }
}
