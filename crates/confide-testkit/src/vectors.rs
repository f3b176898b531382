//! Golden vectors for the reference keystream cipher.
//!
//! Every implementation of the cipher must produce identical ciphertext
//! for these inputs: byte-wise XOR against the four little-endian bytes
//! of the secret, cycled over the plaintext.

use serde::{Deserialize, Serialize};

use confide_vault::{MessageCipher, XorCipher};

/// A single golden test vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CipherVector {
    pub name: String,
    pub description: String,

    /// The shared secret (8-digit domain).
    pub secret: u32,
    /// Plaintext, hex-encoded.
    pub plaintext: String,
    /// Expected ciphertext, hex-encoded.
    pub ciphertext: String,
}

fn vector(name: &str, description: &str, secret: u32, plaintext: &str, ciphertext: &str) -> CipherVector {
    CipherVector {
        name: name.to_string(),
        description: description.to_string(),
        secret,
        plaintext: plaintext.to_string(),
        ciphertext: ciphertext.to_string(),
    }
}

/// All golden vectors.
pub fn all_vectors() -> Vec<CipherVector> {
    vec![
        vector(
            "empty_plaintext",
            "Empty input stays empty",
            10_000_000,
            "",
            "",
        ),
        vector(
            "two_bytes",
            "'hi' under the domain minimum (keystream 80 96 98 00)",
            10_000_000,
            "6869",
            "e8ff",
        ),
        vector(
            "five_bytes",
            "'hello' under the domain maximum (keystream ff e0 f5 05)",
            99_999_999,
            "68656c6c6f",
            "9785996990",
        ),
        vector(
            "multibyte_utf8",
            "U+00E9 as UTF-8 (keystream 4e 61 bc 00)",
            12_345_678,
            "c3a9",
            "8dc8",
        ),
        vector(
            "crosses_keystream_boundary",
            "Eight bytes, cycling the 4-byte keystream twice",
            10_000_000,
            "6465616462656566",
            "e4f3f964e2f3fd66",
        ),
    ]
}

/// Verify that the reference cipher reproduces every vector.
pub fn verify_all_vectors() -> Result<(), String> {
    let cipher = XorCipher;

    for vector in all_vectors() {
        let plaintext = hex::decode(&vector.plaintext)
            .map_err(|e| format!("{}: bad plaintext hex: {e}", vector.name))?;
        let expected = hex::decode(&vector.ciphertext)
            .map_err(|e| format!("{}: bad ciphertext hex: {e}", vector.name))?;

        let sealed = cipher
            .encrypt(vector.secret, &plaintext)
            .map_err(|e| format!("{}: encrypt failed: {e}", vector.name))?;
        if sealed != expected {
            return Err(format!(
                "{}: expected {}, got {}",
                vector.name,
                vector.ciphertext,
                hex::encode(&sealed)
            ));
        }

        let opened = cipher
            .decrypt(vector.secret, &sealed)
            .map_err(|e| format!("{}: decrypt failed: {e}", vector.name))?;
        if opened != plaintext {
            return Err(format!("{}: roundtrip mismatch", vector.name));
        }
    }

    Ok(())
}
