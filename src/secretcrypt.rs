//! Encryption/decryption using scrypt + XSalsa20Poly1305
//!
//! This module implements the saltybox message body:
//! - scrypt for key derivation from passphrase
//! - NaCl secretbox (XSalsa20Poly1305) for authenticated encryption
//!
//! The binary format is:
//! - salt: 8 bytes
//! - nonce: 24 bytes
//! - length: 8 bytes (big-endian signed int64)
//! - sealed box: variable length (includes 16-byte Poly1305 MAC)
//!
//! Sealing and opening work in place on caller-owned buffers so the
//! plaintext only ever lives in pooled, zeroized-on-return memory.

use crate::config::RandomSource;
use crate::error::{Error, ErrorCategory, ErrorKind, Result};
use crate::passphrase::PassphrasePrompt;
use crypto_secretbox::aead::{AeadInPlace, KeyInit};
use crypto_secretbox::{Nonce, XSalsa20Poly1305};
use scrypt::{Params, scrypt};
use std::mem::size_of;
use tracing::debug;
use zeroize::Zeroizing;

/// Length of salt in bytes
const SALT_LEN: usize = 8;

/// Length of nonce in bytes
const NONCE_LEN: usize = 24;

/// Length of derived key in bytes
const KEY_LEN: usize = 32;

/// log2 of the scrypt N parameter (N = 32768)
const SCRYPT_LOG_N: u8 = 15;

/// scrypt r parameter (block size)
const SCRYPT_R: u32 = 8;

/// scrypt p parameter (parallelization)
const SCRYPT_P: u32 = 1;

/// Size of the fixed part of the body preceding the sealed box.
const HEADER_LEN: usize = SALT_LEN + NONCE_LEN + size_of::<i64>();

fn derive_key(
    passphrase: &[u8],
    salt: &[u8; SALT_LEN],
    kind: ErrorKind,
) -> Result<XSalsa20Poly1305> {
    let params = Params::new(SCRYPT_LOG_N, SCRYPT_R, SCRYPT_P, KEY_LEN).map_err(|e| {
        Error::new(
            ErrorCategory::Internal,
            kind,
            format!("failed to create scrypt params: {}", e),
        )
    })?;

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    scrypt(passphrase, salt, &params, key.as_mut_slice()).map_err(|e| {
        Error::new(
            ErrorCategory::Internal,
            kind,
            format!("scrypt key derivation failed: {}", e),
        )
    })?;

    XSalsa20Poly1305::new_from_slice(key.as_slice()).map_err(|e| {
        Error::new(
            ErrorCategory::Internal,
            kind,
            format!("derived key rejected by secretbox: {}", e),
        )
    })
}

/// Seal `plaintext` in place and append the binary body to `out`, drawing
/// salt and nonce from `random`.
///
/// On return `plaintext` holds the sealed box, not the plaintext.
pub(crate) fn seal_into(
    passphrase: &[u8],
    plaintext: &mut Vec<u8>,
    random: &dyn RandomSource,
    out: &mut Vec<u8>,
) -> Result<()> {
    let mut salt = [0u8; SALT_LEN];
    random.fill(&mut salt)?;

    let mut nonce = [0u8; NONCE_LEN];
    random.fill(&mut nonce)?;

    seal_with(passphrase, plaintext, &salt, &nonce, out)
}

/// Seal with an explicit salt and nonce.
///
/// Callers other than [`seal_into`] exist only in tests; reusing a salt and
/// nonce pair under one passphrase breaks secretbox.
fn seal_with(
    passphrase: &[u8],
    plaintext: &mut Vec<u8>,
    salt: &[u8; SALT_LEN],
    nonce: &[u8; NONCE_LEN],
    out: &mut Vec<u8>,
) -> Result<()> {
    let cipher = derive_key(passphrase, salt, ErrorKind::Encryption)?;

    cipher
        .encrypt_in_place(&Nonce::from(*nonce), b"", plaintext)
        .map_err(|e| {
            Error::new(
                ErrorCategory::Internal,
                ErrorKind::Encryption,
                format!("secretbox seal failed: {}", e),
            )
        })?;

    let sealed_box_len = plaintext.len() as i64;
    out.reserve(HEADER_LEN + plaintext.len());
    out.extend_from_slice(salt);
    out.extend_from_slice(nonce);
    out.extend_from_slice(&sealed_box_len.to_be_bytes()); // big-endian i64
    out.extend_from_slice(plaintext);

    Ok(())
}

/// Parse a binary body and open it, replacing the contents of `plaintext`.
///
/// `prompt` is asked for a passphrase before the first attempt and again
/// after every passphrase that fails to authenticate the sealed box; the
/// first error it returns ends the attempt loop and is returned as is.
pub(crate) fn open_into(
    body: &[u8],
    prompt: &mut dyn PassphrasePrompt,
    plaintext: &mut Vec<u8>,
) -> Result<()> {
    let mut pos = 0;

    if body.len() < pos + SALT_LEN {
        return Err(Error::malformed("input likely truncated while reading salt"));
    }
    let mut salt = [0u8; SALT_LEN];
    salt.copy_from_slice(&body[pos..pos + SALT_LEN]);
    pos += SALT_LEN;

    if body.len() < pos + NONCE_LEN {
        return Err(Error::malformed("input likely truncated while reading nonce"));
    }
    let mut nonce = [0u8; NONCE_LEN];
    nonce.copy_from_slice(&body[pos..pos + NONCE_LEN]);
    pos += NONCE_LEN;

    if body.len() < pos + size_of::<i64>() {
        return Err(Error::malformed(
            "input likely truncated while reading sealed box",
        ));
    }
    let mut length_bytes = [0u8; size_of::<i64>()];
    length_bytes.copy_from_slice(&body[pos..pos + size_of::<i64>()]);
    let sealed_box_len = i64::from_be_bytes(length_bytes);
    pos += size_of::<i64>();

    if sealed_box_len < 0 {
        return Err(Error::malformed(
            "negative sealed box length (when interpreted as a big-endian i64)",
        ));
    }

    // Valid input can fail this check if the platform's isize is small.
    if sealed_box_len > isize::MAX as i64 {
        return Err(Error::malformed(
            "sealed box length exceeds this system's max isize",
        ));
    }
    let sealed_box_len = sealed_box_len as usize;

    if body.len() - pos < sealed_box_len {
        return Err(Error::malformed(
            "truncated or corrupt input; claimed length greater than available input",
        ));
    }
    let sealed_box = &body[pos..pos + sealed_box_len];
    pos += sealed_box_len;

    if pos < body.len() {
        return Err(Error::malformed(
            "invalid input: unexpected data after sealed box",
        ));
    }

    let nonce = Nonce::from(nonce);
    let mut attempt = 0u32;
    loop {
        plaintext.clear();
        let passphrase = prompt.prompt()?;
        attempt += 1;

        let cipher = derive_key(&passphrase, &salt, ErrorKind::Decryption)?;
        plaintext.extend_from_slice(sealed_box);
        if cipher.decrypt_in_place(&nonce, b"", plaintext).is_ok() {
            return Ok(());
        }
        debug!(attempt, "passphrase did not authenticate sealed box");
    }
}
