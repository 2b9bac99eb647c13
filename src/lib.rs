//! Saltysecret - passphrase-based encryption of serde values
//!
//! Values are serialized as JSON and encrypted into a saltybox v1 message
//! (scrypt key derivation, NaCl secretbox, `saltybox1:` base64url armor).
//! The message is self-contained; only the passphrase is needed to read it.
//!
//! ```no_run
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize, Default)]
//! struct Credentials {
//!     id: String,
//!     password: String,
//! }
//!
//! # fn main() -> saltysecret::Result<()> {
//! let creds = Credentials {
//!     id: "somethingID".into(),
//!     password: "somethingPassword".into(),
//! };
//! let ciphertext = saltysecret::encrypt(&creds, "qwerty")?;
//!
//! let mut restored = Credentials::default();
//! saltysecret::decrypt(&ciphertext, &mut restored, "qwerty")?;
//! # Ok(())
//! # }
//! ```
//!
//! Decryption writes into a caller-owned destination, which must be passed
//! as a mutable reference:
//!
//! ```compile_fail
//! let ciphertext = saltysecret::encrypt(&1u32, "pw").unwrap();
//! let restored = 0u32;
//! saltysecret::decrypt(&ciphertext, restored, "pw").unwrap();
//! ```
//!
//! Each decryption gets exactly one passphrase attempt. A wrong passphrase
//! fails with [`ErrorKind::IncorrectPassphrase`] and is never retried.

#![forbid(unsafe_code)]

mod codec;
pub mod config;
pub mod error;
mod passphrase;
mod pool;
mod secretcrypt;
pub mod stream;
mod varmor;

pub use config::{Config, LockedRng, RandomSource, SystemRandom};
pub use error::{Error, ErrorCategory, ErrorKind, Result};
pub use stream::{Decrypter, Encrypter};

use codec::{DecryptState, EncryptState};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Serialize `value` as JSON and encrypt it under `passphrase`.
pub fn encrypt<T>(value: &T, passphrase: impl AsRef<[u8]>) -> Result<Vec<u8>>
where
    T: Serialize + ?Sized,
{
    encrypt_with_config(value, passphrase, &Config::default())
}

/// Like [`encrypt`], drawing salt and nonce from `config`.
pub fn encrypt_with_config<T>(
    value: &T,
    passphrase: impl AsRef<[u8]>,
    config: &Config,
) -> Result<Vec<u8>>
where
    T: Serialize + ?Sized,
{
    let mut state = EncryptState::checkout();
    state.encrypt(value, passphrase.as_ref(), config)?;
    Ok(state.ciphertext().to_vec())
}

/// Decrypt `data` with `passphrase` and store the deserialized value in
/// `dest`. `dest` is left untouched on error.
pub fn decrypt<T>(data: &[u8], dest: &mut T, passphrase: impl AsRef<[u8]>) -> Result<()>
where
    T: DeserializeOwned,
{
    DecryptState::checkout().decrypt_slice(data, dest, passphrase.as_ref())
}
