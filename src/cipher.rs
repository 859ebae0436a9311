//! AES-CFB sealing of block payloads.
//!
//! Wire format: hex(iv (16 bytes) || ciphertext). The key picks the AES
//! variant: 16, 24 or 32 bytes for AES-128, AES-192 or AES-256.
//!
//! There is no authentication tag. A flipped ciphertext byte opens to
//! garbage without an error.

use aes::{Aes128, Aes192, Aes256};
use cfb_mode::cipher::{AsyncStreamCipher, KeyIvInit};
use cfb_mode::{Decryptor, Encryptor};
use log::debug;
use rand::rngs::OsRng;
use rand::RngCore;
use thiserror::Error;

/// AES block size, which is also the IV length.
pub const IV_LEN: usize = 16;

/// Key lengths accepted by `seal` and `open`.
pub const KEY_LENGTHS: [usize; 3] = [16, 24, 32];

#[derive(Debug, Error)]
pub enum CipherError {
    #[error("unsupported key length: {0} bytes (expected 16, 24 or 32)")]
    KeyLength(usize),
    #[error("malformed sealed payload: {0}")]
    Decode(String),
    #[error("secure random source failed: {0}")]
    RandomSource(#[from] rand::Error),
}

/// Fails with `CipherError::KeyLength` unless `key` selects an AES variant.
pub fn check_key(key: &[u8]) -> Result<(), CipherError> {
    if KEY_LENGTHS.contains(&key.len()) {
        Ok(())
    } else {
        Err(CipherError::KeyLength(key.len()))
    }
}

/// Encrypt `plaintext` under `key` with a fresh random IV and return
/// `hex(iv || ciphertext)`.
pub fn seal(plaintext: &str, key: &[u8]) -> Result<String, CipherError> {
    seal_with_rng(plaintext, key, &mut OsRng)
}

/// `seal` drawing the IV from `rng`. A short read from `rng` fails with
/// `CipherError::RandomSource` and nothing is encrypted.
pub fn seal_with_rng<R: RngCore>(
    plaintext: &str,
    key: &[u8],
    rng: &mut R,
) -> Result<String, CipherError> {
    check_key(key)?;
    let mut iv = [0u8; IV_LEN];
    rng.try_fill_bytes(&mut iv)?;
    seal_with_iv(plaintext, key, &iv)
}

pub(crate) fn seal_with_iv(
    plaintext: &str,
    key: &[u8],
    iv: &[u8; IV_LEN],
) -> Result<String, CipherError> {
    let mut sealed = Vec::with_capacity(IV_LEN + plaintext.len());
    sealed.extend_from_slice(iv);
    sealed.extend_from_slice(plaintext.as_bytes());
    cfb_encrypt(key, iv, &mut sealed[IV_LEN..])?;
    debug!("sealed {} byte payload", plaintext.len());
    Ok(hex::encode(sealed))
}

/// Reverse of `seal`: split the IV off the decoded bytes and decrypt the rest.
pub fn open(sealed: &str, key: &[u8]) -> Result<String, CipherError> {
    check_key(key)?;
    let mut raw = hex::decode(sealed).map_err(|e| CipherError::Decode(e.to_string()))?;
    if raw.len() < IV_LEN {
        return Err(CipherError::Decode(format!(
            "{} bytes is shorter than the {IV_LEN} byte IV",
            raw.len()
        )));
    }
    let (iv, body) = raw.split_at_mut(IV_LEN);
    cfb_decrypt(key, iv, body)?;
    Ok(String::from_utf8_lossy(body).into_owned())
}

fn cfb_encrypt(key: &[u8], iv: &[u8], buf: &mut [u8]) -> Result<(), CipherError> {
    let bad_key = |_| CipherError::KeyLength(key.len());
    match key.len() {
        16 => Encryptor::<Aes128>::new_from_slices(key, iv).map_err(bad_key)?.encrypt(buf),
        24 => Encryptor::<Aes192>::new_from_slices(key, iv).map_err(bad_key)?.encrypt(buf),
        32 => Encryptor::<Aes256>::new_from_slices(key, iv).map_err(bad_key)?.encrypt(buf),
        n => return Err(CipherError::KeyLength(n)),
    }
    Ok(())
}

fn cfb_decrypt(key: &[u8], iv: &[u8], buf: &mut [u8]) -> Result<(), CipherError> {
    let bad_key = |_| CipherError::KeyLength(key.len());
    match key.len() {
        16 => Decryptor::<Aes128>::new_from_slices(key, iv).map_err(bad_key)?.decrypt(buf),
        24 => Decryptor::<Aes192>::new_from_slices(key, iv).map_err(bad_key)?.decrypt(buf),
        32 => Decryptor::<Aes256>::new_from_slices(key, iv).map_err(bad_key)?.decrypt(buf),
        n => return Err(CipherError::KeyLength(n)),
    }
    Ok(())
}
