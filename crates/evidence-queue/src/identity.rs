//! Content fingerprints and human-readable task identifiers.

use std::collections::HashSet;

use sha2::{Digest, Sha256};

const ID_PREFIX: &str = "DOC-";
const ID_SPACE: u32 = 1_000_000;

/// SHA-256 of `content` as 64 lowercase hex characters.
pub fn fingerprint(content: &str) -> String {
    format!("{:x}", Sha256::digest(content.as_bytes()))
}

/// Mints `DOC-NNNNNN` identifiers.
///
/// Each call advances the numeric suffix by one, so identifiers minted from
/// the same minter (one ingestion batch) never repeat until the six-digit
/// space wraps.
#[derive(Debug, Clone)]
pub struct IdMinter {
    next: u32,
}

impl IdMinter {
    /// Starts at a random point of the identifier space.
    pub fn new() -> Self {
        let seed = (uuid::Uuid::new_v4().as_u128() % u128::from(ID_SPACE)) as u32;
        Self::with_seed(seed)
    }

    pub fn with_seed(seed: u32) -> Self {
        Self {
            next: seed % ID_SPACE,
        }
    }

    pub fn mint(&mut self) -> String {
        let id = format_id(self.next);
        self.next = (self.next + 1) % ID_SPACE;
        id
    }
}

impl IdMinter {
    /// Mints the next identifier not present in `taken`. Gives up after one
    /// full pass of the identifier space and returns the colliding id.
    pub fn mint_unused(&mut self, taken: &HashSet<String>) -> String {
        let mut id = self.mint();
        for _ in 1..ID_SPACE {
            if !taken.contains(&id) {
                break;
            }
            id = self.mint();
        }
        id
    }
}

impl Default for IdMinter {
    fn default() -> Self {
        Self::new()
    }
}

fn format_id(n: u32) -> String {
    format!("{}{:06}", ID_PREFIX, n)
}

/// True for strings shaped like a minted identifier.
pub fn is_task_id(s: &str) -> bool {
    s.strip_prefix(ID_PREFIX)
        .is_some_and(|digits| digits.len() == 6 && digits.bytes().all(|b| b.is_ascii_digit()))
}
