//! Passphrase prompting for the decryption path

use crate::error::{Error, ErrorCategory, ErrorKind, Result};
use zeroize::Zeroizing;

/// Supplies passphrases to the message parser.
///
/// The parser calls `prompt` again every time a candidate passphrase fails
/// to authenticate the message, so an implementation decides how many
/// attempts a single decryption gets by when it starts returning errors.
pub trait PassphrasePrompt {
    fn prompt(&mut self) -> Result<Zeroizing<Vec<u8>>>;
}

/// Yields one passphrase exactly once.
///
/// Any further call fails with [`ErrorKind::IncorrectPassphrase`], so a
/// decryption driven by this prompt makes a single attempt: if the first
/// passphrase is rejected, the parser's request for another one is what
/// reports the failure.
pub struct OneTimePrompt {
    passphrase: Option<Zeroizing<Vec<u8>>>,
}

impl OneTimePrompt {
    pub fn new(passphrase: &[u8]) -> Self {
        Self {
            passphrase: Some(Zeroizing::new(passphrase.to_vec())),
        }
    }
}

impl PassphrasePrompt for OneTimePrompt {
    fn prompt(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        self.passphrase.take().ok_or_else(|| {
            Error::new(
                ErrorCategory::User,
                ErrorKind::IncorrectPassphrase,
                "the passphrase is incorrect",
            )
        })
    }
}

#[cfg(test)]
impl<F> PassphrasePrompt for F
where
    F: FnMut() -> Result<Zeroizing<Vec<u8>>>,
{
    fn prompt(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        self()
    }
}
