use chrono::{SecondsFormat, Utc};
use serde_derive::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::blockchain::ChainError;
use crate::cipher::{self, CipherError};

/// Plaintext sealed into every genesis block.
pub const GENESIS_DATA: &str = "Genesis Block";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub index: u64,
    pub timestamp: String,
    /// hex(iv || ciphertext) as produced by `cipher::seal`.
    pub encrypted_payload: String,
    /// Empty for genesis.
    pub previous_hash: String,
    pub hash: String,
}

impl Block {
    /// Assemble a block from its hashed fields and fill in `hash` last.
    pub fn new(index: u64, timestamp: String, encrypted_payload: String, previous_hash: String) -> Self {
        let mut block = Block {
            index,
            timestamp,
            encrypted_payload,
            previous_hash,
            hash: String::new(),
        };
        block.hash = hash_of(&block);
        block
    }

    pub fn create_genesis(key: &[u8]) -> Result<Self, CipherError> {
        let encrypted_payload = cipher::seal(GENESIS_DATA, key)?;
        Ok(Block::new(0, current_timestamp(), encrypted_payload, String::new()))
    }

    /// Seal `data` into the block that follows `self`. Nothing is built if
    /// the index would overflow or sealing fails.
    pub fn generate_next(&self, data: &str, key: &[u8]) -> Result<Self, ChainError> {
        let index = self
            .index
            .checked_add(1)
            .ok_or(ChainError::IndexOverflow(self.index))?;
        let encrypted_payload = cipher::seal(data, key)?;
        Ok(Block::new(
            index,
            current_timestamp(),
            encrypted_payload,
            self.hash.clone(),
        ))
    }

    pub fn is_genesis(&self) -> bool {
        self.index == 0 && self.previous_hash.is_empty()
    }

    pub fn has_valid_hash(&self) -> bool {
        self.hash == hash_of(self)
    }

    pub fn decrypt(&self, key: &[u8]) -> Result<String, CipherError> {
        cipher::open(&self.encrypted_payload, key)
    }
}

/// SHA-256 over `index || timestamp || encrypted_payload || previous_hash`,
/// index in decimal, as lowercase hex. The block's own `hash` is not an input.
pub fn hash_of(block: &Block) -> String {
    let mut hasher = Sha256::new();
    hasher.update(block.index.to_string());
    hasher.update(&block.timestamp);
    hasher.update(&block.encrypted_payload);
    hasher.update(&block.previous_hash);
    format!("{:x}", hasher.finalize())
}

fn current_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &[u8] = b"examplekey123456";

    fn fixed(index: u64, timestamp: &str, payload: &str, prev: &str) -> Block {
        Block::new(index, timestamp.to_string(), payload.to_string(), prev.to_string())
    }

    #[test]
    fn test_hash_known_vector() {
        let block = fixed(0, "T0", "", "");
        assert_eq!(
            block.hash,
            "d6ae53322080504aafcaa477e65fff1489bb55cfec7ae8892e09aee026463843"
        );
    }

    #[test]
    fn test_hash_is_plain_concatenation() {
        // Field boundaries are not encoded, so shifting text between
        // adjacent fields keeps the digest.
        let a = fixed(1, "T1", "ab", "cd");
        let b = fixed(1, "T1a", "b", "cd");
        assert_eq!(a.hash, b.hash);
    }

    #[test]
    fn test_hash_changes_with_each_field() {
        let base = fixed(3, "T3", "00ff", "abcd");
        assert_eq!(hash_of(&base), base.hash);
        assert_ne!(fixed(4, "T3", "00ff", "abcd").hash, base.hash);
        assert_ne!(fixed(3, "T4", "00ff", "abcd").hash, base.hash);
        assert_ne!(fixed(3, "T3", "00fe", "abcd").hash, base.hash);
        assert_ne!(fixed(3, "T3", "00ff", "abce").hash, base.hash);
    }

    #[test]
    fn test_hash_ignores_stored_hash() {
        let mut block = fixed(2, "T2", "aa", "bb");
        let expected = block.hash.clone();
        block.hash = "tampered".to_string();
        assert_eq!(hash_of(&block), expected);
        assert!(!block.has_valid_hash());
    }

    #[test]
    fn test_genesis() {
        let genesis = Block::create_genesis(KEY).unwrap();
        assert_eq!(genesis.index, 0);
        assert!(genesis.previous_hash.is_empty());
        assert!(genesis.is_genesis());
        assert!(genesis.has_valid_hash());
        assert_eq!(genesis.decrypt(KEY).unwrap(), GENESIS_DATA);
    }

    #[test]
    fn test_generate_next_links_to_previous() {
        let genesis = Block::create_genesis(KEY).unwrap();
        let next = genesis.generate_next("Second Block", KEY).unwrap();
        assert_eq!(next.index, 1);
        assert_eq!(next.previous_hash, genesis.hash);
        assert!(next.has_valid_hash());
        assert!(!next.is_genesis());
        assert_eq!(next.decrypt(KEY).unwrap(), "Second Block");
    }

    #[test]
    fn test_bad_key_builds_nothing() {
        assert!(matches!(
            Block::create_genesis(b"short"),
            Err(CipherError::KeyLength(5))
        ));
        let genesis = Block::create_genesis(KEY).unwrap();
        assert!(matches!(
            genesis.generate_next("data", &[0u8; 15]),
            Err(ChainError::Cipher(CipherError::KeyLength(15)))
        ));
    }

    #[test]
    fn test_generate_next_at_max_index() {
        let last = fixed(u64::MAX, "T", "", "prev");
        assert!(matches!(
            last.generate_next("one too many", KEY),
            Err(ChainError::IndexOverflow(u64::MAX))
        ));
    }
}
