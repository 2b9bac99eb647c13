//! Encrypter/Decrypter stream behavior

use saltysecret::{Config, Decrypter, Encrypter, ErrorKind, RandomSource, Result};
use serde::{Deserialize, Serialize};
use std::io::{self, Read, Write};

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Secret {
    string_data: String,
    int_data: i64,
}

const CORRECT_PASS: &str = "correct_passphrase";

fn sample() -> Secret {
    Secret {
        string_data: "something foo bar baz".to_string(),
        int_data: 1472085098,
    }
}

struct ConstantRandom(u8);

impl RandomSource for ConstantRandom {
    fn fill(&self, dest: &mut [u8]) -> Result<()> {
        dest.fill(self.0);
        Ok(())
    }
}

/// Fails every write and counts how often it was asked to write.
#[derive(Default)]
struct FailingWriter {
    writes: usize,
}

impl Write for FailingWriter {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        self.writes += 1;
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Fails every read and counts how often it was asked to read.
#[derive(Default)]
struct FailingReader {
    reads: usize,
}

impl Read for FailingReader {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        self.reads += 1;
        Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset"))
    }
}

#[test]
fn test_stream_roundtrip() {
    let mut buf = Vec::new();
    Encrypter::new(&mut buf).encrypt(&sample(), CORRECT_PASS).unwrap();

    let mut decrypted = Secret::default();
    Decrypter::new(buf.as_slice())
        .decrypt(&mut decrypted, CORRECT_PASS)
        .unwrap();
    assert_eq!(decrypted, sample());
}

#[test]
fn test_stream_matches_one_shot() {
    let config = Config::with_random_source(ConstantRandom(b'a'));

    let mut streamed = Vec::new();
    Encrypter::with_config(&mut streamed, config.clone())
        .encrypt(&sample(), CORRECT_PASS)
        .unwrap();
    let one_shot = saltysecret::encrypt_with_config(&sample(), CORRECT_PASS, &config).unwrap();
    assert_eq!(streamed, one_shot);

    let mut from_stream = Secret::default();
    Decrypter::new(one_shot.as_slice())
        .decrypt(&mut from_stream, CORRECT_PASS)
        .unwrap();
    let mut from_slice = Secret::default();
    saltysecret::decrypt(&streamed, &mut from_slice, CORRECT_PASS).unwrap();
    assert_eq!(from_stream, from_slice);
}

#[test]
fn test_stream_incorrect_passphrase() {
    let encrypted = saltysecret::encrypt(&sample(), CORRECT_PASS).unwrap();

    let mut decrypted = Secret::default();
    let err = Decrypter::new(encrypted.as_slice())
        .decrypt(&mut decrypted, "incorrect_passphrase")
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::IncorrectPassphrase);
}

#[test]
fn test_decrypter_consumes_whole_stream() {
    let encrypted = saltysecret::encrypt(&sample(), CORRECT_PASS).unwrap();
    let mut decrypter = Decrypter::new(io::Cursor::new(encrypted.clone()));

    let mut decrypted = Secret::default();
    decrypter.decrypt(&mut decrypted, CORRECT_PASS).unwrap();
    assert_eq!(decrypter.get_ref().position(), encrypted.len() as u64);

    // Nothing left for a second message.
    let err = decrypter.decrypt(&mut decrypted, CORRECT_PASS).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Decryption);
    assert!(!decrypter.is_faulted());
}

#[test]
fn test_encrypter_writes_each_message() {
    let mut encrypter = Encrypter::new(Vec::new());
    encrypter.encrypt(&sample(), CORRECT_PASS).unwrap();
    let first_len = encrypter.get_ref().len();
    encrypter.encrypt(&1u8, CORRECT_PASS).unwrap();

    let written = encrypter.into_inner();
    assert!(written.len() > first_len);

    let mut decrypted = Secret::default();
    saltysecret::decrypt(&written[..first_len], &mut decrypted, CORRECT_PASS).unwrap();
    assert_eq!(decrypted, sample());

    let mut second = 0u8;
    saltysecret::decrypt(&written[first_len..], &mut second, CORRECT_PASS).unwrap();
    assert_eq!(second, 1);
}

#[test]
fn test_encrypter_latches_write_failure() {
    let mut encrypter = Encrypter::new(FailingWriter::default());

    let first = encrypter.encrypt(&sample(), CORRECT_PASS).unwrap_err();
    assert_eq!(first.kind, ErrorKind::Io);
    assert!(encrypter.is_faulted());
    assert_eq!(encrypter.get_ref().writes, 1);

    let second = encrypter.encrypt(&sample(), CORRECT_PASS).unwrap_err();
    assert_eq!(second.kind, first.kind);
    assert_eq!(second.to_string(), first.to_string());
    assert_eq!(encrypter.get_ref().writes, 1);
}

#[test]
fn test_encrypter_does_not_latch_serialization_failure() {
    use std::collections::HashMap;

    let mut bad = HashMap::new();
    bad.insert(vec![1u8], 1u8);

    let mut encrypter = Encrypter::new(Vec::new());
    let err = encrypter.encrypt(&bad, CORRECT_PASS).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Serialization);
    assert!(!encrypter.is_faulted());
    assert!(encrypter.get_ref().is_empty());

    encrypter.encrypt(&sample(), CORRECT_PASS).unwrap();
    assert!(!encrypter.get_ref().is_empty());
}

#[test]
fn test_decrypter_latches_read_failure() {
    let mut decrypter = Decrypter::new(FailingReader::default());
    let mut decrypted = Secret::default();

    let first = decrypter.decrypt(&mut decrypted, CORRECT_PASS).unwrap_err();
    assert_eq!(first.kind, ErrorKind::Io);
    assert!(decrypter.is_faulted());
    let reads = decrypter.get_ref().reads;
    assert!(reads >= 1);

    let second = decrypter.decrypt(&mut decrypted, CORRECT_PASS).unwrap_err();
    assert_eq!(second.kind, ErrorKind::Io);
    assert_eq!(second.to_string(), first.to_string());
    assert_eq!(decrypter.get_ref().reads, reads);
    assert_eq!(decrypted, Secret::default());
}
