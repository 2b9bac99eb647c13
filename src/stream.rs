//! Stream adapters in the style of `serde_json`'s serializer/deserializer
//! pairs: an [`Encrypter`] writes one armored message per call, a
//! [`Decrypter`] drains its reader and decrypts what it read.
//!
//! Both latch the first I/O failure of their stream. Once latched, every
//! call returns a clone of that error and the stream is not touched again.

use crate::codec::{DecryptState, EncryptState};
use crate::config::Config;
use crate::error::{Error, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::{Read, Write};
use tracing::warn;

/// Writes encrypted values to an output stream.
pub struct Encrypter<W> {
    writer: W,
    config: Config,
    err: Option<Error>,
}

impl<W: Write> Encrypter<W> {
    /// Create an encrypter writing to `writer` with the default [`Config`].
    pub fn new(writer: W) -> Self {
        Self::with_config(writer, Config::default())
    }

    /// Create an encrypter writing to `writer` that draws salts and nonces from `config`.
    pub fn with_config(writer: W, config: Config) -> Self {
        Self {
            writer,
            config,
            err: None,
        }
    }

    /// Serialize `value` as JSON, encrypt it under `passphrase` and write the
    /// ciphertext to the stream.
    ///
    /// Serialization and encryption failures leave the stream untouched and
    /// are not latched; a failed write is.
    pub fn encrypt<T>(&mut self, value: &T, passphrase: impl AsRef<[u8]>) -> Result<()>
    where
        T: Serialize + ?Sized,
    {
        if let Some(err) = &self.err {
            return Err(err.clone());
        }

        let mut state = EncryptState::checkout();
        state.encrypt(value, passphrase.as_ref(), &self.config)?;

        if let Err(e) = self.writer.write_all(state.ciphertext()) {
            let err = Error::io(format!("failed to write ciphertext: {}", e), e);
            warn!(error = %err, "encrypter stream faulted");
            self.err = Some(err.clone());
            return Err(err);
        }
        Ok(())
    }
}

impl<W> Encrypter<W> {
    /// Whether a write failure has been latched.
    pub fn is_faulted(&self) -> bool {
        self.err.is_some()
    }

    /// Borrow the underlying writer.
    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Mutably borrow the underlying writer.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    /// Unwrap the encrypter, returning the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Reads and decrypts values from an input stream.
pub struct Decrypter<R> {
    reader: R,
    err: Option<Error>,
}

impl<R: Read> Decrypter<R> {
    /// Create a decrypter reading from `reader`.
    pub fn new(reader: R) -> Self {
        Self { reader, err: None }
    }

    /// Read the stream to its end, decrypt the message with `passphrase` and
    /// store the deserialized value in `dest`.
    ///
    /// The whole remaining stream is treated as a single message. `dest` is
    /// only assigned on success.
    pub fn decrypt<T>(&mut self, dest: &mut T, passphrase: impl AsRef<[u8]>) -> Result<()>
    where
        T: DeserializeOwned,
    {
        if let Some(err) = &self.err {
            return Err(err.clone());
        }

        let mut state = DecryptState::checkout();
        if let Err(err) = state.read_input(&mut self.reader) {
            warn!(error = %err, "decrypter stream faulted");
            self.err = Some(err.clone());
            return Err(err);
        }
        state.decrypt_input(dest, passphrase.as_ref())
    }
}

impl<R> Decrypter<R> {
    /// Whether a read failure has been latched.
    pub fn is_faulted(&self) -> bool {
        self.err.is_some()
    }

    /// Borrow the underlying reader.
    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    /// Mutably borrow the underlying reader.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.reader
    }

    /// Unwrap the decrypter, returning the underlying reader.
    pub fn into_inner(self) -> R {
        self.reader
    }
}
