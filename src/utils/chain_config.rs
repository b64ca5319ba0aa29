//! Chain Configuration
//!
//! The chain context a transaction is validated against:
//! - Chain ID the transaction must carry
//! - Active hardfork, which selects the gas-accounting constants
//! - Presets for Celo mainnet and the Alfajores testnet

use crate::error::{Cip64Error, Cip64Result};
use ethers_core::types::U256;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Capability exposing the configured chain to transaction construction
pub trait ChainContext {
    fn chain_id(&self) -> U256;
    fn hardfork(&self) -> Hardfork;
}

/// Protocol upgrades relevant to envelope gas accounting, in activation order
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Hardfork {
    Chainstart,
    Homestead,
    Byzantium,
    Istanbul,
    Berlin,
    London,
    #[default]
    #[serde(alias = "merge")]
    Paris,
    Shanghai,
    Cancun,
}

impl std::str::FromStr for Hardfork {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        serde_json::from_value(serde_json::Value::String(s.to_lowercase()))
            .map_err(|_| format!("unknown hardfork: {}", s))
    }
}

impl Hardfork {
    /// Intrinsic cost of any transaction
    pub fn tx_gas(&self) -> u64 {
        21_000
    }

    /// Cost of a zero calldata byte
    pub fn tx_data_zero_gas(&self) -> u64 {
        4
    }

    /// Cost of a non-zero calldata byte (EIP-2028 from Istanbul)
    pub fn tx_data_non_zero_gas(&self) -> u64 {
        if *self >= Hardfork::Istanbul {
            16
        } else {
            68
        }
    }

    /// Extra cost of a contract-creation transaction
    pub fn tx_creation_gas(&self) -> u64 {
        if *self >= Hardfork::Homestead {
            32_000
        } else {
            0
        }
    }

    /// EIP-2930 per-address cost
    pub fn access_list_address_gas(&self) -> u64 {
        if *self >= Hardfork::Berlin {
            2_400
        } else {
            0
        }
    }

    /// EIP-2930 per-storage-key cost
    pub fn access_list_storage_key_gas(&self) -> u64 {
        if *self >= Hardfork::Berlin {
            1_900
        } else {
            0
        }
    }

    /// EIP-3860 per-word init code cost, `None` before Shanghai
    pub fn init_code_word_gas(&self) -> Option<u64> {
        (*self >= Hardfork::Shanghai).then_some(2)
    }

    /// Whether high-S signatures are rejected (EIP-2)
    pub fn rejects_high_s(&self) -> bool {
        *self >= Hardfork::Homestead
    }
}

/// Static chain configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainConfig {
    pub name: String,
    pub chain_id: u64,
    #[serde(default)]
    pub hardfork: Hardfork,
}

impl ChainConfig {
    /// Celo mainnet
    pub fn celo_mainnet() -> Self {
        Self {
            name: "celo".to_string(),
            chain_id: 42_220,
            hardfork: Hardfork::default(),
        }
    }

    /// Alfajores testnet
    pub fn alfajores() -> Self {
        Self {
            name: "alfajores".to_string(),
            chain_id: 44_787,
            hardfork: Hardfork::default(),
        }
    }

    /// Any other chain id
    pub fn custom(chain_id: u64) -> Self {
        Self {
            name: format!("custom-{}", chain_id),
            chain_id,
            hardfork: Hardfork::default(),
        }
    }

    /// Look up a preset by name
    pub fn preset(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "celo" | "mainnet" => Some(Self::celo_mainnet()),
            "alfajores" | "testnet" => Some(Self::alfajores()),
            _ => None,
        }
    }

    pub fn with_hardfork(mut self, hardfork: Hardfork) -> Self {
        self.hardfork = hardfork;
        self
    }

    /// Snapshot any chain context into a config value
    pub fn from_context(ctx: &impl ChainContext) -> Cip64Result<Self> {
        let chain_id = ctx.chain_id();
        if chain_id > U256::from(u64::MAX) {
            return Err(Cip64Error::invalid_field(
                "chainId",
                format!("chain id {} does not fit in 64 bits", chain_id),
            ));
        }
        Ok(Self {
            name: format!("custom-{}", chain_id),
            chain_id: chain_id.as_u64(),
            hardfork: ctx.hardfork(),
        })
    }

    /// Load from a JSON file: `{"name": "...", "chainId": 42220, "hardfork": "shanghai"}`
    pub fn from_json_file(path: impl AsRef<Path>) -> Cip64Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Cip64Error::invalid_field("chainConfig", format!("{}: {}", path.display(), e))
        })?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Cip64Result<Self> {
        serde_json::from_str(contents)
            .map_err(|e| Cip64Error::invalid_field("chainConfig", e.to_string()))
    }
}

impl ChainContext for ChainConfig {
    fn chain_id(&self) -> U256 {
        U256::from(self.chain_id)
    }

    fn hardfork(&self) -> Hardfork {
        self.hardfork
    }
}
