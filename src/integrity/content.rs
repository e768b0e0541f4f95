//! Retained content for integrity entries.
//!
//! Snapshots embed the original bytes of every tracked file and string so a
//! check can show what changed. They are stored gzip-compressed and
//! base64-encoded; reading a snapshot leaves them compressed until somebody
//! actually asks for them, because most reads only need the hashes.

use crate::error::{IntegrityError, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::borrow::Cow;
use std::io::{Read as _, Write as _};
use std::sync::OnceLock;

/// Immutable bytes attached to a file or content integrity entry.
///
/// Content read from a snapshot is decompressed at most once and never
/// replaced afterwards; there is no setter.
#[derive(Debug, Clone, Default)]
pub struct IntegrityContent {
    compressed: Option<String>,
    bytes: OnceLock<Vec<u8>>,
}

impl IntegrityContent {
    /// Content that was just read from disk or supplied by the caller.
    pub fn plain(bytes: impl Into<Vec<u8>>) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(bytes.into());
        Self {
            compressed: None,
            bytes: cell,
        }
    }

    /// Content as found in a snapshot file, decoded on first access.
    pub fn compressed(payload: impl Into<String>) -> Self {
        Self {
            compressed: Some(payload.into()),
            bytes: OnceLock::new(),
        }
    }

    /// Returns the exact original bytes, decompressing and caching them on
    /// first call.
    ///
    /// # Errors
    ///
    /// Returns [`IntegrityError::Compression`] if the stored payload is not
    /// valid base64 or not a valid gzip stream.
    pub fn get(&self) -> Result<&[u8]> {
        if let Some(bytes) = self.bytes.get() {
            return Ok(bytes);
        }
        let bytes = match &self.compressed {
            Some(payload) => decompress(payload)?,
            None => Vec::new(),
        };
        Ok(self.bytes.get_or_init(|| bytes))
    }

    /// The content as text. Invalid UTF-8 sequences are replaced with
    /// U+FFFD; use [`get`](Self::get) for the exact bytes.
    ///
    /// # Errors
    ///
    /// Same as [`get`](Self::get).
    pub fn text(&self) -> Result<Cow<'_, str>> {
        Ok(String::from_utf8_lossy(self.get()?))
    }

    /// Whether the bytes have been materialized yet.
    pub fn is_decoded(&self) -> bool {
        self.bytes.get().is_some()
    }

    /// Payload suitable for writing into a snapshot.
    ///
    /// Content that came from a snapshot and was never touched is written back
    /// as-is without a decompress/recompress cycle.
    pub(crate) fn to_stored(&self) -> Result<String> {
        match (&self.compressed, self.bytes.get()) {
            (Some(payload), None) => Ok(payload.clone()),
            (_, Some(bytes)) => compress(bytes),
            (None, None) => compress(&[]),
        }
    }
}

/// Gzip-compress `bytes` and encode the result as standard base64.
///
/// # Errors
///
/// Returns [`IntegrityError::Compression`] if the encoder fails.
pub fn compress(bytes: &[u8]) -> Result<String> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(bytes)
        .map_err(|e| IntegrityError::Compression(e.to_string()))?;
    let compressed = encoder
        .finish()
        .map_err(|e| IntegrityError::Compression(e.to_string()))?;
    Ok(BASE64.encode(compressed))
}

/// Inverse of [`compress`].
///
/// # Errors
///
/// Returns [`IntegrityError::Compression`] for invalid base64 or gzip data.
pub fn decompress(payload: &str) -> Result<Vec<u8>> {
    let raw = BASE64.decode(payload.trim())?;
    let mut decoder = GzDecoder::new(raw.as_slice());
    let mut bytes = Vec::new();
    decoder
        .read_to_end(&mut bytes)
        .map_err(|e| IntegrityError::Compression(e.to_string()))?;
    Ok(bytes)
}
