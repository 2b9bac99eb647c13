//! Encryption configuration
//!
//! The only tunable input to encryption is where salt and nonce bytes come
//! from. Production code should always use [`Config::default`], which draws
//! from the operating system CSPRNG. Substituting the source is meant for
//! tests that need byte-identical ciphertext.

use crate::error::{Error, ErrorCategory, ErrorKind, Result};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

/// A source of the random bytes used for salts and nonces.
pub trait RandomSource: Send + Sync {
    /// Fill `dest` entirely with random bytes.
    fn fill(&self, dest: &mut [u8]) -> Result<()>;
}

/// Operating system randomness via `OsRng`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRandom;

impl RandomSource for SystemRandom {
    fn fill(&self, dest: &mut [u8]) -> Result<()> {
        OsRng.try_fill_bytes(dest).map_err(|e| {
            Error::with_source(
                ErrorCategory::Internal,
                ErrorKind::Encryption,
                format!("failed to read system randomness: {}", e),
                e,
            )
        })
    }
}

/// Adapts any `rand` CSPRNG (for example a seeded `StdRng`) into a
/// [`RandomSource`] shareable across threads.
pub struct LockedRng<R> {
    rng: Mutex<R>,
}

impl<R> LockedRng<R> {
    /// Wrap `rng` behind a mutex.
    pub fn new(rng: R) -> Self {
        Self {
            rng: Mutex::new(rng),
        }
    }
}

impl<R: RngCore + CryptoRng + Send> RandomSource for LockedRng<R> {
    fn fill(&self, dest: &mut [u8]) -> Result<()> {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        rng.try_fill_bytes(dest).map_err(|e| {
            Error::with_source(
                ErrorCategory::Internal,
                ErrorKind::Encryption,
                format!("random source failed: {}", e),
                e,
            )
        })
    }
}

/// Parameters threaded into every encryption.
#[derive(Clone)]
pub struct Config {
    random: Arc<dyn RandomSource>,
}

impl Config {
    /// Same as [`Config::default`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the random source.
    ///
    /// This exists ONLY to make encryption deterministic under test.
    /// A predictable source destroys the confidentiality of everything
    /// encrypted with it; never use this in production.
    pub fn with_random_source(source: impl RandomSource + 'static) -> Self {
        Self {
            random: Arc::new(source),
        }
    }

    pub(crate) fn random(&self) -> &dyn RandomSource {
        self.random.as_ref()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            random: Arc::new(SystemRandom),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_system_random_fills_buffer() {
        let mut a = [0u8; 32];
        let mut b = [0u8; 32];
        SystemRandom.fill(&mut a).unwrap();
        SystemRandom.fill(&mut b).unwrap();

        // 2^-256 chance of a false failure.
        assert_ne!(a, b);
    }

    #[test]
    fn test_locked_rng_is_reproducible() {
        let first = LockedRng::new(StdRng::seed_from_u64(7));
        let second = LockedRng::new(StdRng::seed_from_u64(7));

        let mut a = [0u8; 24];
        let mut b = [0u8; 24];
        first.fill(&mut a).unwrap();
        second.fill(&mut b).unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn test_config_uses_installed_source() {
        struct Sevens;
        impl RandomSource for Sevens {
            fn fill(&self, dest: &mut [u8]) -> Result<()> {
                dest.fill(7);
                Ok(())
            }
        }

        let config = Config::with_random_source(Sevens);
        let mut buf = [0u8; 8];
        config.random().fill(&mut buf).unwrap();
        assert_eq!(buf, [7u8; 8]);
    }
}
