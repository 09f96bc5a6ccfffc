//! Record key generation
//!
//! Keys are short lowercase alphanumeric strings that always start with a
//! letter, so they can be written as bare SurrealDB record ids.

use rand::Rng;

/// Default length of generated keys
pub const DEFAULT_ID_LENGTH: usize = 8;

const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const ALPHANUMERIC: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Generator for random record keys
#[derive(Debug, Clone)]
pub struct IdGenerator {
    length: usize,
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_ID_LENGTH)
    }
}

impl IdGenerator {
    /// Create a generator producing keys of `length` characters (minimum 1)
    pub fn new(length: usize) -> Self {
        Self {
            length: length.max(1),
        }
    }

    /// Generate a new random key
    pub fn generate(&self) -> String {
        let mut rng = rand::rng();
        let mut id = String::with_capacity(self.length);
        id.push(LETTERS[rng.random_range(0..LETTERS.len())] as char);
        for _ in 1..self.length {
            id.push(ALPHANUMERIC[rng.random_range(0..ALPHANUMERIC.len())] as char);
        }
        id
    }
}
