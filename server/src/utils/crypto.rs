//! Cryptographic utility functions

use rand::RngCore;

/// Generate cryptographically secure random bytes
pub fn generate_key(len: usize) -> Vec<u8> {
    let mut key = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut key);
    key
}

/// Generate a cryptographically secure random hex token (lowercase)
pub fn generate_token(byte_len: usize) -> String {
    hex::encode(generate_key(byte_len))
}

/// Check that a string is exactly `byte_len` bytes encoded as hex
pub fn is_hex_id(value: &str, byte_len: usize) -> bool {
    value.len() == byte_len * 2 && hex::decode(value).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_key_length() {
        assert_eq!(generate_key(16).len(), 16);
        assert!(generate_key(0).is_empty());
    }

    #[test]
    fn test_generate_token_is_lowercase_hex() {
        let token = generate_token(16);
        assert_eq!(token.len(), 32);
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        );
    }

    #[test]
    fn test_generate_token_unique() {
        let a = generate_token(16);
        let b = generate_token(16);
        assert_ne!(a, b);
    }

    #[test]
    fn test_is_hex_id() {
        assert!(is_hex_id("0123456789abcdef", 8));
        assert!(is_hex_id("0123456789ABCDEF0123456789abcdef", 16));
        assert!(!is_hex_id("0123456789abcdef", 16));
        assert!(!is_hex_id("0123456789abcdeg", 8));
        assert!(!is_hex_id("", 8));
    }
}
