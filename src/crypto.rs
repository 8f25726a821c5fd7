// ABOUTME: AES-128-ECB envelope codec matching the Renpho cloud API wire format
// ABOUTME: Handles PKCS#7 padding and Base64 framing of request and response bodies
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.

//! Crypto envelope codec for the Renpho cloud API.
//!
//! The upstream API wraps every request and response body in AES-128-ECB with
//! PKCS#7 padding, transported as Base64 text. The envelope format is a hard
//! compatibility constraint inherited from the mobile app; nothing here is
//! tunable. Failures are never retried at this layer and propagate to the
//! caller as fatal for the request.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyInit};
use aes::Aes128;
use base64::{engine::general_purpose, Engine};
use thiserror::Error;

type Aes128EcbEnc = ecb::Encryptor<Aes128>;
type Aes128EcbDec = ecb::Decryptor<Aes128>;

/// AES block size in bytes; also the required key length for AES-128
pub const BLOCK_SIZE: usize = 16;

/// Errors produced by envelope encryption and decryption
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Key material has the wrong length for AES-128
    #[error("key material must be {BLOCK_SIZE} bytes, got {0}")]
    InvalidKey(usize),
    /// Envelope text is not valid Base64
    #[error("envelope is not valid Base64: {0}")]
    Base64(#[from] base64::DecodeError),
    /// Decoded ciphertext is empty or not block-aligned
    #[error("ciphertext length {0} is not a positive multiple of the cipher block size")]
    BlockLength(usize),
    /// PKCS#7 padding validation failed on decrypt
    #[error("padding validation failed on decrypt")]
    Padding,
    /// Decrypted payload is not UTF-8 text
    #[error("decrypted payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Stateless envelope codec holding only the shared secret key
#[derive(Clone)]
pub struct EnvelopeCodec {
    key: [u8; BLOCK_SIZE],
}

impl std::fmt::Debug for EnvelopeCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvelopeCodec").finish_non_exhaustive()
    }
}

impl EnvelopeCodec {
    /// Create a codec from raw key material.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::InvalidKey`] when the key is not exactly 16 bytes.
    pub fn new(key_material: &[u8]) -> Result<Self, CryptoError> {
        let key: [u8; BLOCK_SIZE] = key_material
            .try_into()
            .map_err(|_| CryptoError::InvalidKey(key_material.len()))?;
        Ok(Self { key })
    }

    /// Encrypt a plaintext body into a Base64 envelope string
    #[must_use]
    pub fn encrypt(&self, plaintext: &[u8]) -> String {
        let ciphertext =
            Aes128EcbEnc::new(&self.key.into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext);
        general_purpose::STANDARD.encode(ciphertext)
    }

    /// Decrypt a Base64 envelope back into plaintext bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CryptoError::Base64`] on malformed envelope text,
    /// [`CryptoError::BlockLength`] when the ciphertext is not block-aligned,
    /// and [`CryptoError::Padding`] when padding validation fails.
    pub fn decrypt(&self, envelope: &str) -> Result<Vec<u8>, CryptoError> {
        let ciphertext = general_purpose::STANDARD.decode(envelope)?;
        if ciphertext.is_empty() || ciphertext.len() % BLOCK_SIZE != 0 {
            return Err(CryptoError::BlockLength(ciphertext.len()));
        }
        Aes128EcbDec::new(&self.key.into())
            .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
            .map_err(|_| CryptoError::Padding)
    }

    /// Decrypt an envelope and interpret the plaintext as UTF-8 text.
    ///
    /// # Errors
    ///
    /// Returns any [`CryptoError`] from [`Self::decrypt`] plus
    /// [`CryptoError::Utf8`] when the plaintext is not valid UTF-8.
    pub fn decrypt_string(&self, envelope: &str) -> Result<String, CryptoError> {
        Ok(String::from_utf8(self.decrypt(envelope)?)?)
    }
}
