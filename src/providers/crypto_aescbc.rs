//! # Legacy AES-CBC cryptor
//!
//! This module contains [`LegacyCryptor`] which decrypts messages published by
//! clients configured with a cipher key.
//!
//! It requires the [`crypto` feature] to be enabled.
//!
//! [`crypto` feature]: ../index.html#features

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use sha2::{Digest, Sha256};

use crate::core::{Cryptor, PubNubError};

type Encryptor = cbc::Encryptor<aes::Aes256>;
type Decryptor = cbc::Decryptor<aes::Aes256>;

/// AES cipher block size.
const AES_BLOCK_SIZE: usize = 16;

/// Initialization vector used when random vector is disabled.
const CONSTANT_IV: &[u8; AES_BLOCK_SIZE] = b"0123456789012345";

/// Legacy AES-CBC cryptor.
///
/// Cipher key is derived from the SHA-256 hex digest of the user-provided key.
/// With random initialization vector enabled, the vector is prepended to the
/// encrypted payload.
///
/// # Example
/// ```
/// use pubnub_subscriber::{providers::crypto_aescbc::LegacyCryptor, PubNubConfigBuilder};
///
/// # fn main() -> Result<(), pubnub_subscriber::core::PubNubError> {
/// let config = PubNubConfigBuilder::default()
///     .subscribe_key("demo")
///     .cryptor(LegacyCryptor::new("enigma", true)?)
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct LegacyCryptor {
    /// Whether payload starts with random initialization vector.
    use_random_iv: bool,

    /// Derived cipher key.
    cipher_key: Vec<u8>,
}

impl LegacyCryptor {
    /// Create legacy AES-CBC cryptor.
    ///
    /// # Errors
    /// Returns [`PubNubError::CryptoInitialization`] when `cipher_key` is
    /// empty.
    pub fn new<K>(cipher_key: K, use_random_iv: bool) -> Result<Self, PubNubError>
    where
        K: Into<Vec<u8>>,
    {
        let cipher_key = cipher_key.into();
        if cipher_key.is_empty() {
            return Err(PubNubError::CryptoInitialization {
                details: "Cipher key is empty".into(),
            });
        }

        Ok(Self {
            use_random_iv,
            cipher_key: derive_key(&cipher_key),
        })
    }

    fn iv_len(&self) -> usize {
        if self.use_random_iv {
            AES_BLOCK_SIZE
        } else {
            0
        }
    }

    fn initialization_vector(&self) -> Result<[u8; AES_BLOCK_SIZE], PubNubError> {
        if !self.use_random_iv {
            return Ok(*CONSTANT_IV);
        }

        let mut iv = [0u8; AES_BLOCK_SIZE];
        getrandom::getrandom(&mut iv).map_err(|err| PubNubError::Encryption {
            details: err.to_string(),
        })?;
        Ok(iv)
    }
}

impl Cryptor for LegacyCryptor {
    fn encrypt(&self, source: Vec<u8>) -> Result<Vec<u8>, PubNubError> {
        let iv = self.initialization_vector()?;
        let encrypted = Encryptor::new(self.cipher_key.as_slice().into(), iv.as_slice().into())
            .encrypt_padded_vec_mut::<Pkcs7>(&source);

        let mut result = Vec::with_capacity(self.iv_len() + encrypted.len());
        if self.use_random_iv {
            result.extend_from_slice(&iv);
        }
        result.extend(encrypted);

        Ok(result)
    }

    fn decrypt(&self, source: Vec<u8>) -> Result<Vec<u8>, PubNubError> {
        let iv_len = self.iv_len();
        if source.len() < iv_len + AES_BLOCK_SIZE {
            return Err(PubNubError::Decryption {
                details: format!("Encrypted data too short: {} bytes", source.len()),
            });
        }

        let (iv, data) = source.split_at(iv_len);
        let iv = if self.use_random_iv {
            iv
        } else {
            CONSTANT_IV.as_slice()
        };

        Decryptor::new(self.cipher_key.as_slice().into(), iv.into())
            .decrypt_padded_vec_mut::<Pkcs7>(data)
            .map_err(|err| PubNubError::Decryption {
                details: err.to_string(),
            })
    }
}

/// First half of SHA-256 hex digest used as 32 bytes key.
fn derive_key(cipher_key: &[u8]) -> Vec<u8> {
    Sha256::digest(cipher_key)
        .iter()
        .take(AES_BLOCK_SIZE)
        .map(|byte| format!("{byte:02x}"))
        .collect::<String>()
        .into_bytes()
}

#[cfg(test)]
mod should {
    use super::*;

    const PAYLOAD: &[u8] = br#"{"text":"Hello there"}"#;

    #[test]
    fn not_create_with_empty_key() {
        assert!(matches!(
            LegacyCryptor::new("", false),
            Err(PubNubError::CryptoInitialization { .. })
        ));
    }

    #[test]
    fn derive_hex_key() {
        let key = derive_key(b"enigma");

        assert_eq!(key.len(), 32);
        assert!(key.iter().all(u8::is_ascii_hexdigit));
    }

    #[test]
    fn encrypt_deterministically_with_constant_iv() {
        let cryptor = LegacyCryptor::new("enigma", false).expect("cryptor expected");

        let first = cryptor.encrypt(PAYLOAD.to_vec()).expect("encrypted data");
        let second = cryptor.encrypt(PAYLOAD.to_vec()).expect("encrypted data");

        assert_eq!(first, second);
        assert_eq!(first.len() % AES_BLOCK_SIZE, 0);
        assert_eq!(cryptor.decrypt(first).expect("decrypted data"), PAYLOAD);
    }

    #[test]
    fn prepend_random_iv() {
        let cryptor = LegacyCryptor::new("enigma", true).expect("cryptor expected");

        let first = cryptor.encrypt(PAYLOAD.to_vec()).expect("encrypted data");
        let second = cryptor.encrypt(PAYLOAD.to_vec()).expect("encrypted data");

        assert_ne!(first[..AES_BLOCK_SIZE], second[..AES_BLOCK_SIZE]);
        assert_eq!(cryptor.decrypt(second).expect("decrypted data"), PAYLOAD);
    }

    #[test]
    fn not_decrypt_with_other_key() {
        let encrypted = LegacyCryptor::new("enigma", false)
            .and_then(|cryptor| cryptor.encrypt(PAYLOAD.to_vec()))
            .expect("encrypted data");
        let cryptor = LegacyCryptor::new("other", false).expect("cryptor expected");

        assert_ne!(cryptor.decrypt(encrypted).ok().as_deref(), Some(PAYLOAD));
    }

    #[test]
    fn not_decrypt_short_data() {
        let cryptor = LegacyCryptor::new("enigma", true).expect("cryptor expected");

        assert!(matches!(
            cryptor.decrypt(vec![0u8; AES_BLOCK_SIZE]),
            Err(PubNubError::Decryption { .. })
        ));
    }
}
