//! Random identifier generation.
//!
//! Anonymous players, matches and sockets all use short alphanumeric ids.
//! The generator is passed into the transport layer as an explicit
//! collaborator rather than called as an ambient global.

use rand::Rng;
use rand::distributions::Alphanumeric;

/// Number of characters in a generated id.
pub const ID_LEN: usize = 12;

/// Alphanumeric identifier generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdGenerator;

impl IdGenerator {
    /// Creates a generator.
    pub fn new() -> Self {
        Self
    }

    /// Produces a fresh 12-character alphanumeric id.
    pub fn generate(&self) -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(ID_LEN)
            .map(char::from)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_alphanumeric_and_fixed_length() {
        let ids = IdGenerator::new();
        let id = ids.generate();
        assert_eq!(id.len(), ID_LEN);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn ids_are_distinct() {
        let ids = IdGenerator::new();
        assert_ne!(ids.generate(), ids.generate());
    }
}
