//! Versioned armoring for binary data
//!
//! Provides base64url encoding with a version prefix for encrypted data.
//! The armored format is:
//! - Free of whitespace (including newlines)
//! - Safe to embed in URLs
//! - Safe to pass unescaped in a POSIX shell

use crate::error::{Error, ErrorCategory, ErrorKind, Result};
use base64::write::EncoderWriter;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use std::io::Write;

/// Magic prefix for all saltybox versions
const MAGIC_PREFIX: &[u8] = b"saltybox";

/// Version 1 magic marker
const V1_MAGIC: &[u8] = b"saltybox1:";

/// Append the armored form of `body` to `out`.
///
/// Format: saltybox1:{base64url-no-padding}
pub(crate) fn wrap_into(body: &[u8], out: &mut Vec<u8>) -> Result<()> {
    out.extend_from_slice(V1_MAGIC);
    let mut encoder = EncoderWriter::new(out, &URL_SAFE_NO_PAD);
    encoder
        .write_all(body)
        .and_then(|()| encoder.finish().map(drop))
        .map_err(|e| {
            Error::with_source(
                ErrorCategory::Internal,
                ErrorKind::Encryption,
                format!("failed to armor ciphertext: {}", e),
                e,
            )
        })
}

/// Decode an armored message, appending the binary body to `body`.
pub(crate) fn unwrap_into(armored: &[u8], body: &mut Vec<u8>) -> Result<()> {
    if armored.len() < V1_MAGIC.len() {
        return Err(Error::malformed(
            "input size smaller than magic marker; likely truncated",
        ));
    }

    if let Some(encoded) = armored.strip_prefix(V1_MAGIC) {
        URL_SAFE_NO_PAD.decode_vec(encoded, body).map_err(|e| {
            Error::with_source(
                ErrorCategory::User,
                ErrorKind::Decryption,
                format!("base64 decoding failed: {}", e),
                e,
            )
        })
    } else if armored.starts_with(MAGIC_PREFIX) {
        Err(Error::malformed(
            "input claims to be saltybox, but not a version we support",
        ))
    } else {
        Err(Error::malformed("input unrecognized as saltybox data"))
    }
}
