//! Client-side message ciphers.
//!
//! The core never encrypts or decrypts anything itself; members do, with
//! the secret disclosed to them by the engine. The cipher is therefore a
//! pluggable seam: anything with matching encrypt/decrypt semantics fits.
//!
//! [`XorCipher`] is the reference keystream cipher: not authenticated,
//! not semantically secure against known plaintext. [`AeadCipher`] is the
//! authenticated option for callers who want more than a placeholder.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Nonce,
};
use rand::RngCore;

use crate::error::CipherError;

/// A symmetric cipher keyed by a line's shared secret.
pub trait MessageCipher: Send + Sync {
    /// Encrypt plaintext under `secret`.
    fn encrypt(&self, secret: u32, plaintext: &[u8]) -> Result<Vec<u8>, CipherError>;

    /// Decrypt ciphertext under `secret`.
    fn decrypt(&self, secret: u32, ciphertext: &[u8]) -> Result<Vec<u8>, CipherError>;
}

/// Reference keystream cipher: byte-wise XOR against the four
/// little-endian bytes of the secret, cycled over the input.
///
/// Symmetric by construction: encrypt and decrypt are the same
/// transformation.
#[derive(Debug, Clone, Copy, Default)]
pub struct XorCipher;

impl XorCipher {
    fn keystream_xor(secret: u32, data: &[u8]) -> Vec<u8> {
        let key = secret.to_le_bytes();
        data.iter()
            .enumerate()
            .map(|(i, byte)| byte ^ key[i % key.len()])
            .collect()
    }
}

impl MessageCipher for XorCipher {
    fn encrypt(&self, secret: u32, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
        Ok(Self::keystream_xor(secret, plaintext))
    }

    fn decrypt(&self, secret: u32, ciphertext: &[u8]) -> Result<Vec<u8>, CipherError> {
        Ok(Self::keystream_xor(secret, ciphertext))
    }
}

/// Authenticated cipher: ChaCha20-Poly1305 under a key derived from the
/// secret, with a random nonce prepended to the ciphertext.
#[derive(Debug, Clone, Copy, Default)]
pub struct AeadCipher;

/// Nonce length prepended to [`AeadCipher`] output.
const NONCE_LEN: usize = 12;

impl AeadCipher {
    /// Derive a 256-bit key from the 32-bit secret.
    fn derive_key(secret: u32) -> [u8; 32] {
        blake3::derive_key("confide-cipher-v0 message key", &secret.to_le_bytes())
    }
}

impl MessageCipher for AeadCipher {
    fn encrypt(&self, secret: u32, plaintext: &[u8]) -> Result<Vec<u8>, CipherError> {
        let key = Self::derive_key(secret);
        let cipher = ChaCha20Poly1305::new_from_slice(&key)
            .map_err(|e| CipherError::Encryption(e.to_string()))?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let sealed = cipher
            .encrypt(nonce, plaintext)
            .map_err(|e| CipherError::Encryption(e.to_string()))?;

        let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&sealed);
        Ok(out)
    }

    fn decrypt(&self, secret: u32, ciphertext: &[u8]) -> Result<Vec<u8>, CipherError> {
        if ciphertext.len() < NONCE_LEN {
            return Err(CipherError::TruncatedCiphertext);
        }
        let (nonce_bytes, sealed) = ciphertext.split_at(NONCE_LEN);

        let key = Self::derive_key(secret);
        let cipher = ChaCha20Poly1305::new_from_slice(&key)
            .map_err(|e| CipherError::Decryption(e.to_string()))?;

        cipher
            .decrypt(Nonce::from_slice(nonce_bytes), sealed)
            .map_err(|e| CipherError::Decryption(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_xor_roundtrip_empty() {
        let cipher = XorCipher;
        let sealed = cipher.encrypt(10_000_000, b"").unwrap();
        assert!(sealed.is_empty());
        assert_eq!(cipher.decrypt(10_000_000, &sealed).unwrap(), b"");
    }

    #[test]
    fn test_xor_roundtrip_utf8() {
        let cipher = XorCipher;
        let plaintext = "ночная смена".as_bytes();

        let sealed = cipher.encrypt(99_999_999, plaintext).unwrap();
        assert_ne!(sealed, plaintext);
        assert_eq!(cipher.decrypt(99_999_999, &sealed).unwrap(), plaintext);
    }

    #[test]
    fn test_xor_known_keystream() {
        // secret 10_000_000 = 0x0098_9680, little-endian bytes 80 96 98 00
        let cipher = XorCipher;
        let sealed = cipher.encrypt(10_000_000, b"hi").unwrap();
        assert_eq!(sealed, vec![0xe8, 0xff]);
    }

    #[test]
    fn test_xor_keystream_cycles_past_four_bytes() {
        let cipher = XorCipher;
        let plaintext = [0u8; 8];
        let sealed = cipher.encrypt(12_345_678, &plaintext).unwrap();
        // XOR of zeros is the keystream itself, so bytes 0..4 repeat at 4..8.
        assert_eq!(&sealed[..4], &sealed[4..]);
    }

    #[test]
    fn test_aead_roundtrip() {
        let cipher = AeadCipher;
        let plaintext = b"meet at the usual place";

        let sealed = cipher.encrypt(42_424_242, plaintext).unwrap();
        assert_eq!(cipher.decrypt(42_424_242, &sealed).unwrap(), plaintext);
    }

    #[test]
    fn test_aead_wrong_secret_fails() {
        let cipher = AeadCipher;
        let sealed = cipher.encrypt(42_424_242, b"payload").unwrap();

        let err = cipher.decrypt(42_424_243, &sealed).unwrap_err();
        assert!(matches!(err, CipherError::Decryption(_)));
    }

    #[test]
    fn test_aead_truncated_rejected() {
        let cipher = AeadCipher;
        assert_eq!(
            cipher.decrypt(42_424_242, b"short").unwrap_err(),
            CipherError::TruncatedCiphertext
        );
    }

    proptest! {
        #[test]
        fn prop_xor_roundtrip(
            secret in 10_000_000u32..=99_999_999,
            plaintext in proptest::collection::vec(any::<u8>(), 0..512),
        ) {
            let cipher = XorCipher;
            let sealed = cipher.encrypt(secret, &plaintext).unwrap();
            prop_assert_eq!(cipher.decrypt(secret, &sealed).unwrap(), plaintext);
        }

        #[test]
        fn prop_aead_roundtrip(
            secret in 10_000_000u32..=99_999_999,
            plaintext in proptest::collection::vec(any::<u8>(), 0..256),
        ) {
            let cipher = AeadCipher;
            let sealed = cipher.encrypt(secret, &plaintext).unwrap();
            prop_assert_eq!(cipher.decrypt(secret, &sealed).unwrap(), plaintext);
        }
    }
}
