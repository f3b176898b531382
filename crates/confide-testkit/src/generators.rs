//! Proptest strategies for Confide types.

use proptest::prelude::*;

use confide::Identity;

/// Non-empty printable line names.
pub fn line_name() -> impl Strategy<Value = String> {
    proptest::string::string_regex("[a-zA-Z0-9][a-zA-Z0-9 _-]{0,31}")
        .expect("valid name regex")
}

/// Arbitrary 32-byte identities.
pub fn identity_strategy() -> impl Strategy<Value = Identity> {
    any::<[u8; 32]>().prop_map(Identity::from_bytes)
}

/// Non-empty ciphertext bodies.
pub fn ciphertext() -> impl Strategy<Value = Vec<u8>> {
    proptest::collection::vec(any::<u8>(), 1..256)
}

/// Secret values across the full 8-digit domain.
pub fn secret_value() -> impl Strategy<Value = u32> {
    10_000_000u32..=99_999_999
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn generated_names_are_valid(name in line_name()) {
            prop_assert!(!name.is_empty());
            prop_assert!(name.len() <= 32);
        }

        #[test]
        fn generated_ciphertexts_are_non_empty(body in ciphertext()) {
            prop_assert!(!body.is_empty());
        }

        #[test]
        fn generated_secrets_have_eight_digits(secret in secret_value()) {
            let text = secret.to_string();
            prop_assert_eq!(text.len(), 8);
        }
    }
}
