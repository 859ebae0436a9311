//! An in-memory, append-only ledger of AES-CFB sealed payloads linked by
//! SHA-256 hashes.

pub mod block;
pub mod blockchain;
pub mod cipher;
pub mod config;

pub use block::{hash_of, Block, GENESIS_DATA};
pub use blockchain::{Blockchain, ChainError, OpenedBlock};
pub use cipher::{open, seal, seal_with_rng, CipherError};
pub use config::{Config, ConfigError};
