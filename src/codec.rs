//! Value-level encryption shared by the one-shot functions and the streams
//!
//! Encrypting is serialize, seal, armor; decrypting is unarmor, open,
//! deserialize. Every intermediate buffer belongs to a pooled state that
//! is zeroized when it goes back to its pool.

use crate::config::Config;
use crate::error::{Error, ErrorCategory, ErrorKind, Result};
use crate::passphrase::OneTimePrompt;
use crate::pool::{Pool, Pooled, Reset};
use crate::{secretcrypt, varmor};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::Read;
use tracing::debug;
use zeroize::Zeroize;

/// States whose buffers grew beyond this are not kept for reuse.
const MAX_RETAINED_BYTES: usize = 1 << 20;

static ENCRYPT_STATES: Pool<EncryptState> = Pool::new(MAX_RETAINED_BYTES);
static DECRYPT_STATES: Pool<DecryptState> = Pool::new(MAX_RETAINED_BYTES);

#[derive(Default)]
pub(crate) struct EncryptState {
    /// JSON, then the sealed box once sealed in place.
    staged: Vec<u8>,
    body: Vec<u8>,
    armored: Vec<u8>,
}

impl Reset for EncryptState {
    fn reset(&mut self) {
        self.staged.zeroize();
        self.body.zeroize();
        self.armored.zeroize();
    }

    fn retained_capacity(&self) -> usize {
        self.staged.capacity() + self.body.capacity() + self.armored.capacity()
    }
}

impl EncryptState {
    pub(crate) fn checkout() -> Pooled<'static, EncryptState> {
        ENCRYPT_STATES.checkout()
    }

    /// Encrypt `value`; the result is available from [`Self::ciphertext`].
    pub(crate) fn encrypt<T: Serialize + ?Sized>(
        &mut self,
        value: &T,
        passphrase: &[u8],
        config: &Config,
    ) -> Result<()> {
        serde_json::to_writer(&mut self.staged, value).map_err(|e| {
            Error::with_source(
                ErrorCategory::User,
                ErrorKind::Serialization,
                format!("failed to serialize value: {}", e),
                e,
            )
        })?;
        let plaintext_len = self.staged.len();

        secretcrypt::seal_into(passphrase, &mut self.staged, config.random(), &mut self.body)
            .map_err(|e| e.with_context("encryption failed"))?;
        varmor::wrap_into(&self.body, &mut self.armored)?;

        debug!(
            plaintext_len,
            ciphertext_len = self.armored.len(),
            "encrypted value"
        );
        Ok(())
    }

    pub(crate) fn ciphertext(&self) -> &[u8] {
        &self.armored
    }
}

#[derive(Default)]
pub(crate) struct DecryptState {
    /// Ciphertext drained from a stream.
    input: Vec<u8>,
    body: Vec<u8>,
    plaintext: Vec<u8>,
}

impl Reset for DecryptState {
    fn reset(&mut self) {
        self.input.zeroize();
        self.body.zeroize();
        self.plaintext.zeroize();
    }

    fn retained_capacity(&self) -> usize {
        self.input.capacity() + self.body.capacity() + self.plaintext.capacity()
    }
}

impl DecryptState {
    pub(crate) fn checkout() -> Pooled<'static, DecryptState> {
        DECRYPT_STATES.checkout()
    }

    /// Drain `reader` to its end as the ciphertext for [`Self::decrypt_input`].
    pub(crate) fn read_input<R: Read + ?Sized>(&mut self, reader: &mut R) -> Result<()> {
        self.input.clear();
        reader
            .read_to_end(&mut self.input)
            .map(drop)
            .map_err(|e| Error::io(format!("failed to read ciphertext: {}", e), e))
    }

    pub(crate) fn decrypt_input<T: DeserializeOwned>(
        &mut self,
        dest: &mut T,
        passphrase: &[u8],
    ) -> Result<()> {
        let Self {
            input,
            body,
            plaintext,
        } = self;
        decrypt_value(input, body, plaintext, dest, passphrase)
    }

    pub(crate) fn decrypt_slice<T: DeserializeOwned>(
        &mut self,
        ciphertext: &[u8],
        dest: &mut T,
        passphrase: &[u8],
    ) -> Result<()> {
        decrypt_value(ciphertext, &mut self.body, &mut self.plaintext, dest, passphrase)
    }
}

fn decrypt_value<T: DeserializeOwned>(
    ciphertext: &[u8],
    body: &mut Vec<u8>,
    plaintext: &mut Vec<u8>,
    dest: &mut T,
    passphrase: &[u8],
) -> Result<()> {
    varmor::unwrap_into(ciphertext, body).map_err(|e| e.with_context("failed to unarmor"))?;

    let mut prompt = OneTimePrompt::new(passphrase);
    secretcrypt::open_into(body, &mut prompt, plaintext)?;

    let value = serde_json::from_slice(plaintext).map_err(|e| {
        Error::with_source(
            ErrorCategory::User,
            ErrorKind::Deserialization,
            format!("failed to deserialize decrypted value: {}", e),
            e,
        )
    })?;
    *dest = value;

    debug!(
        ciphertext_len = ciphertext.len(),
        plaintext_len = plaintext.len(),
        "decrypted value"
    );
    Ok(())
}
