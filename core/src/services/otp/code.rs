//! Code generation and hashing

use rand::{rngs::OsRng, Rng, RngCore};
use sha2::{Digest, Sha256};

/// Source of numeric one-time codes
pub trait CodeGenerator: Send + Sync {
    fn generate(&self, length: usize) -> String;
}

/// Uniform digits from the operating system CSPRNG
#[derive(Debug, Default, Clone, Copy)]
pub struct SecureCodeGenerator;

impl CodeGenerator for SecureCodeGenerator {
    fn generate(&self, length: usize) -> String {
        let mut rng = OsRng;
        (0..length)
            .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
            .collect()
    }
}

/// Always returns the same code. For test harnesses only.
#[derive(Debug, Clone)]
pub struct FixedCodeGenerator {
    code: String,
}

impl FixedCodeGenerator {
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }
}

impl CodeGenerator for FixedCodeGenerator {
    fn generate(&self, _length: usize) -> String {
        self.code.clone()
    }
}

/// 16 random bytes, hex encoded
pub fn generate_salt() -> String {
    let mut bytes = [0u8; 16];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// SHA-256 of `salt:code`, hex encoded
pub fn hash_code(salt: &str, code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(code.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secure_codes_are_numeric() {
        let generator = SecureCodeGenerator;
        for length in [4, 6, 8] {
            let code = generator.generate(length);
            assert_eq!(code.len(), length);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_hash_depends_on_salt() {
        let a = hash_code("salt-a", "123456");
        let b = hash_code("salt-b", "123456");
        assert_ne!(a, b);
        assert_eq!(a, hash_code("salt-a", "123456"));
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_salts_are_unique() {
        assert_ne!(generate_salt(), generate_salt());
        assert_eq!(generate_salt().len(), 32);
    }
}
