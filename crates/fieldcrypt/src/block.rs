//! AES-256-CBC with PKCS7 padding.
//!
//! CBC provides no authentication on its own; the tag layer in
//! [`crate::mac`] supplies it (encrypt-then-MAC over the encoded body).
//! The mode is a wire contract inherited from previously stored data —
//! **do not** swap in a different cipher without bumping the envelope
//! version.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};

use common::error::CryptoError;

use crate::kdf::DerivedKey;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Byte length of the CBC initialisation vector (one AES block).
pub const IV_LEN: usize = 16;

/// Encrypt `plaintext` under `key` and `iv`.
///
/// # Errors
///
/// Returns [`CryptoError::Encryption`] if `iv` is not [`IV_LEN`] bytes.
pub fn encrypt(key: &DerivedKey, iv: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let cipher =
        Aes256CbcEnc::new_from_slices(key.as_bytes(), iv).map_err(|_| CryptoError::Encryption)?;
    Ok(cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}

/// Decrypt `ciphertext` under `key` and `iv`, removing PKCS7 padding.
///
/// # Errors
///
/// Returns [`CryptoError::Decryption`] on a bad IV length or invalid
/// padding. Callers must have verified the MAC first; padding failures here
/// indicate an internal inconsistency, not an attacker probe surface.
pub fn decrypt(key: &DerivedKey, iv: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let cipher =
        Aes256CbcDec::new_from_slices(key.as_bytes(), iv).map_err(|_| CryptoError::Decryption)?;
    cipher
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| CryptoError::Decryption)
}
