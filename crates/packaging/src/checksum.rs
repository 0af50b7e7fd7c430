use std::io::Read;
use std::path::Path;

use md5::{Digest, Md5};

use crate::{MEGABYTE, PackagingError};

/// Block size for streaming checksum passes.
const CHECKSUM_BLOCK_SIZE: usize = MEGABYTE as usize;

/// Computes MD5 of `data` and returns the hex-encoded digest.
pub fn checksum_bytes(data: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Computes MD5 of an entire file and returns the hex-encoded digest.
pub fn calculate_file_checksum(path: &Path) -> Result<String, PackagingError> {
    let mut file = std::fs::File::open(path)?;
    let (digest, _) = checksum_open_file(&mut file)?;
    Ok(digest)
}

/// Streams `file` from its current position to EOF, returning the digest
/// and the number of bytes read. The byte count is what the transfer
/// reports as total size, so it always matches the checksummed content.
pub(crate) fn checksum_open_file(file: &mut std::fs::File) -> std::io::Result<(String, u64)> {
    let mut hasher = Md5::new();
    let mut buf = vec![0u8; CHECKSUM_BLOCK_SIZE];
    let mut total = 0u64;
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        total += n as u64;
    }
    Ok((hex::encode(hasher.finalize()), total))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn checksum_bytes_deterministic() {
        let c1 = checksum_bytes(b"hello world");
        let c2 = checksum_bytes(b"hello world");
        assert_eq!(c1, c2);
        assert_eq!(c1.len(), 32); // MD5 = 32 hex chars.
    }

    #[test]
    fn checksum_bytes_known_digest() {
        assert_eq!(
            checksum_bytes(b"hello world"),
            "5eb63bbbe01eeed093cb22bb8f5acdc3"
        );
    }

    #[test]
    fn checksum_bytes_different_data() {
        assert_ne!(checksum_bytes(b"hello"), checksum_bytes(b"world"));
    }

    #[test]
    fn calculate_file_checksum_matches_bytes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.bin");
        let data = b"test content for checksum";
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(data).unwrap();

        let file_cs = calculate_file_checksum(&path).unwrap();
        assert_eq!(file_cs, checksum_bytes(data));
    }

    #[test]
    fn open_file_pass_counts_bytes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.bin");
        std::fs::write(&path, vec![7u8; 3000]).unwrap();

        let mut file = std::fs::File::open(&path).unwrap();
        let (digest, total) = checksum_open_file(&mut file).unwrap();
        assert_eq!(total, 3000);
        assert_eq!(digest, checksum_bytes(&vec![7u8; 3000]));
    }
}
