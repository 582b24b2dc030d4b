// src/hash.rs

//! SHA-256 helpers behind the `sha256:<hex>` checksum string format
//!
//! Every locator in a recipe manifest carries a checksum in the form
//! `sha256:<hex digest>`. Fetched artifacts are verified against it before
//! they are handed to any later step; a mismatch surfaces as
//! [`Error::RetrievalFailed`] because a bad digest means the fetched object
//! is not the declared one.

use crate::error::{Error, Result};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Hash a byte slice, returning the lowercase hex digest
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Hash a file's contents in streaming fashion
pub fn sha256_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; READ_BUFFER_SIZE];

    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Split a `sha256:<hex>` checksum string into its hex digest
pub fn parse_checksum(checksum: &str) -> Option<&str> {
    checksum.strip_prefix("sha256:").filter(|digest| {
        !digest.is_empty() && digest.chars().all(|c| c.is_ascii_hexdigit())
    })
}

/// Verify a file against a `sha256:<hex>` checksum string
pub fn verify_file(path: &Path, checksum: &str) -> Result<()> {
    let expected = parse_checksum(checksum).ok_or_else(|| {
        Error::ParseError(format!(
            "invalid checksum format: {checksum} (expected sha256:<hex>)"
        ))
    })?;

    let actual = sha256_file(path)?;
    if !actual.eq_ignore_ascii_case(expected) {
        return Err(Error::RetrievalFailed(format!(
            "checksum mismatch for {}: expected sha256:{expected}, got sha256:{actual}",
            path.display()
        )));
    }

    Ok(())
}
