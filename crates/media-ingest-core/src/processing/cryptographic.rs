/// Exact content hashing for byte-identical duplicate detection
use crate::error::Result;
use serde::{Deserialize, Serialize};

use std::{fmt, fs::File, io::Read, path::Path};

/// Blake3 digest of a file's bytes, kept as lowercase hex
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    /// Wrap a hex digest read back from the catalog
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<blake3::Hash> for ContentHash {
    fn from(hash: blake3::Hash) -> Self {
        Self(hash.to_hex().to_string())
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute the cryptographic hash of a file using the Blake3 algorithm.
///
/// The whole file is read; any read failure is returned and no partial
/// digest is ever produced.
pub fn compute_cryptographic<P: AsRef<Path>>(path: P) -> Result<ContentHash> {
    // Open the file with explicit scope to ensure it's closed promptly
    let hash = {
        let mut file = File::open(&path)?;
        let mut hasher = blake3::Hasher::new();

        let mut buffer = [0; 8192]; // 8KB buffer
        loop {
            let bytes_read = file.read(&mut buffer)?;
            if bytes_read == 0 {
                break;
            }
            hasher.update(&buffer[..bytes_read]);
        }

        hasher.finalize()
    };

    Ok(ContentHash::from(hash))
}
