use std::fmt;

use log::{debug, info, warn};
use thiserror::Error;

use crate::block::Block;
use crate::cipher::CipherError;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("cipher error: {0}")]
    Cipher(#[from] CipherError),
    #[error("chain has no blocks")]
    Empty,
    #[error("block #{0} is not a valid genesis block")]
    InvalidGenesis(u64),
    #[error("hash for block #{0} is invalid")]
    InvalidHash(u64),
    #[error("chain link broken at block #{0}")]
    BrokenLink(u64),
    #[error("block #{0} has no successor index")]
    IndexOverflow(u64),
    #[error("expected block #{expected}, found #{found}")]
    IndexGap { expected: u64, found: u64 },
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Append-only sequence of sealed blocks, always starting at genesis.
#[derive(Debug, Clone)]
pub struct Blockchain {
    chain: Vec<Block>,
}

impl Blockchain {
    pub fn new(key: &[u8]) -> Result<Self, ChainError> {
        let genesis = Block::create_genesis(key)?;
        info!("Genesis block created: {}", genesis.hash);
        Ok(Blockchain { chain: vec![genesis] })
    }

    /// Adopt blocks built elsewhere, only if they form a valid chain.
    pub fn from_blocks(blocks: Vec<Block>) -> Result<Self, ChainError> {
        let blockchain = Blockchain { chain: blocks };
        blockchain.validate()?;
        Ok(blockchain)
    }

    pub fn get_latest_block(&self) -> &Block {
        // Both constructors guarantee at least the genesis block.
        &self.chain[self.chain.len() - 1]
    }

    /// Seal `data` into a new block after the latest one. On error the chain
    /// is left as it was.
    pub fn add_block(&mut self, data: &str, key: &[u8]) -> Result<&Block, ChainError> {
        let new_block = self.get_latest_block().generate_next(data, key)?;
        info!("Block added: #{} {}", new_block.index, new_block.hash);
        self.chain.push(new_block);
        Ok(self.get_latest_block())
    }

    pub fn blocks(&self) -> &[Block] {
        &self.chain
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Check genesis, then every block's hash, index and link to its
    /// predecessor. Reports the first failure.
    pub fn validate(&self) -> Result<(), ChainError> {
        let genesis = self.chain.first().ok_or(ChainError::Empty)?;
        if !genesis.is_genesis() {
            return Err(ChainError::InvalidGenesis(genesis.index));
        }
        if !genesis.has_valid_hash() {
            return Err(ChainError::InvalidHash(genesis.index));
        }

        for pair in self.chain.windows(2) {
            let (previous, current) = (&pair[0], &pair[1]);
            let expected = previous
                .index
                .checked_add(1)
                .ok_or(ChainError::IndexOverflow(previous.index))?;
            if current.index != expected {
                return Err(ChainError::IndexGap {
                    expected,
                    found: current.index,
                });
            }
            if !current.has_valid_hash() {
                return Err(ChainError::InvalidHash(current.index));
            }
            if current.previous_hash != previous.hash {
                return Err(ChainError::BrokenLink(current.index));
            }
        }
        debug!("Validated {} block(s)", self.chain.len());
        Ok(())
    }

    pub fn is_chain_valid(&self) -> bool {
        match self.validate() {
            Ok(()) => true,
            Err(e) => {
                warn!("Chain rejected: {}", e);
                false
            }
        }
    }

    /// Decrypt every payload in chain order.
    pub fn open_all(&self, key: &[u8]) -> Result<Vec<OpenedBlock<'_>>, ChainError> {
        self.chain
            .iter()
            .map(|block| {
                let data = block.decrypt(key)?;
                Ok::<_, ChainError>(OpenedBlock { block, data })
            })
            .collect()
    }

    pub fn to_json(&self) -> Result<String, ChainError> {
        Ok(serde_json::to_string_pretty(&self.chain)?)
    }
}

/// A block next to its decrypted payload.
#[derive(Debug)]
pub struct OpenedBlock<'a> {
    pub block: &'a Block,
    pub data: String,
}

impl fmt::Display for OpenedBlock<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Index: {}", self.block.index)?;
        writeln!(f, "Timestamp: {}", self.block.timestamp)?;
        writeln!(f, "Decrypted Data: {}", self.data)?;
        writeln!(f, "Previous Hash: {}", self.block.previous_hash)?;
        writeln!(f, "Hash: {}", self.block.hash)?;
        writeln!(f)
    }
}
