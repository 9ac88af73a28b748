//! Chain policy and per-network parameter definitions.

use std::collections::BTreeMap;
use std::fmt;

use crate::constants::{COEFF_NANOS_PER_UNIT, DEFAULT_MAX_TX_SIZE, DEFAULT_MEMPOOL_LIMIT};
use crate::money::{Amount, MAX_MONEY};
use crate::{EpochIndex, StakeholderId};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Network {
    Mainnet,
    Testnet,
    Regtest,
}

impl Network {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "mainnet" | "main" => Some(Self::Mainnet),
            "testnet" | "test" => Some(Self::Testnet),
            "regtest" => Some(Self::Regtest),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Testnet => "testnet",
            Self::Regtest => "regtest",
        }
    }
}

/// Signed fixed-point coefficient with nine decimal places.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Coeff(i64);

impl Coeff {
    pub const fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    pub const fn from_units(units: i64) -> Self {
        Self(units * COEFF_NANOS_PER_UNIT)
    }

    pub const fn nanos(self) -> i64 {
        self.0
    }
}

impl fmt::Display for Coeff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nanos = i128::from(self.0);
        let per_unit = i128::from(COEFF_NANOS_PER_UNIT);
        let sign = if nanos < 0 { "-" } else { "" };
        let abs = nanos.abs();
        write!(f, "{sign}{}.{:09}", abs / per_unit, abs % per_unit)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum MinFeeError {
    Negative(i128),
    TooLarge(i128),
}

impl fmt::Display for MinFeeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MinFeeError::Negative(value) => write!(f, "minimal fee {value} is negative"),
            MinFeeError::TooLarge(value) => {
                write!(f, "minimal fee {value} exceeds maximum amount {MAX_MONEY}")
            }
        }
    }
}

impl std::error::Error for MinFeeError {}

/// Fee rule `a + b * size`, size measured in bytes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TxSizeLinear {
    pub a: Coeff,
    pub b: Coeff,
}

impl TxSizeLinear {
    pub fn new(a: Coeff, b: Coeff) -> Self {
        Self { a, b }
    }

    /// Exact value of the linear function, in nano units.
    pub fn calculate_nanos(&self, size: u64) -> i128 {
        i128::from(self.a.nanos()) + i128::from(self.b.nanos()) * i128::from(size)
    }

    /// Rounds the linear function up to a whole amount.
    pub fn min_fee(&self, size: u64) -> Result<Amount, MinFeeError> {
        let nanos = self.calculate_nanos(size);
        let per_unit = i128::from(COEFF_NANOS_PER_UNIT);
        let mut fee = nanos.div_euclid(per_unit);
        if nanos.rem_euclid(per_unit) != 0 {
            fee += 1;
        }
        if fee < 0 {
            return Err(MinFeeError::Negative(fee));
        }
        if fee > i128::from(MAX_MONEY) {
            return Err(MinFeeError::TooLarge(fee));
        }
        Amount::try_from(fee).map_err(|_| MinFeeError::TooLarge(fee))
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TxFeePolicy {
    SizeLinear(TxSizeLinear),
    /// A policy introduced by a later protocol version. Nodes that do not know it
    /// enforce no minimum fee.
    Unknown { tag: u8, payload: Vec<u8> },
}

impl fmt::Display for TxFeePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TxFeePolicy::SizeLinear(linear) => {
                write!(f, "size-linear(a={}, b={})", linear.a, linear.b)
            }
            TxFeePolicy::Unknown { tag, payload } => {
                write!(f, "unknown policy {tag} ({} bytes)", payload.len())
            }
        }
    }
}

/// Chain-wide parameters in force at the current protocol version.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ChainPolicy {
    pub max_tx_size: u64,
    pub fee_policy: TxFeePolicy,
    /// First epoch after the bootstrap era.
    pub unlock_stake_epoch: EpochIndex,
}

impl ChainPolicy {
    pub fn is_bootstrap_era(&self, epoch: EpochIndex) -> bool {
        epoch < self.unlock_stake_epoch
    }
}

/// Genesis stakeholders that share the stake of bootstrap-era outputs.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct BootStakeholders {
    weights: BTreeMap<StakeholderId, u16>,
}

impl BootStakeholders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_weights<I>(weights: I) -> Self
    where
        I: IntoIterator<Item = (StakeholderId, u16)>,
    {
        let mut out = Self::new();
        for (id, weight) in weights {
            out.insert(id, weight);
        }
        out
    }

    /// Zero weights are ignored.
    pub fn insert(&mut self, id: StakeholderId, weight: u16) {
        if weight == 0 {
            self.weights.remove(&id);
        } else {
            self.weights.insert(id, weight);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn total_weight(&self) -> u64 {
        self.weights.values().map(|weight| u64::from(*weight)).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&StakeholderId, u16)> {
        self.weights.iter().map(|(id, weight)| (id, *weight))
    }
}

#[derive(Clone, Debug)]
pub struct ChainParams {
    pub network: Network,
    pub policy: ChainPolicy,
    pub boot_stakeholders: BootStakeholders,
    pub mempool_limit: usize,
}

pub fn chain_params(network: Network) -> ChainParams {
    match network {
        Network::Mainnet => mainnet_chain_params(),
        Network::Testnet => testnet_chain_params(),
        Network::Regtest => regtest_chain_params(),
    }
}

fn mainnet_chain_params() -> ChainParams {
    ChainParams {
        network: Network::Mainnet,
        policy: ChainPolicy {
            max_tx_size: DEFAULT_MAX_TX_SIZE,
            fee_policy: TxFeePolicy::SizeLinear(TxSizeLinear::new(
                Coeff::from_nanos(155_381_000_000_000),
                Coeff::from_nanos(43_946_000_000),
            )),
            unlock_stake_epoch: EpochIndex::MAX,
        },
        boot_stakeholders: BootStakeholders::new(),
        mempool_limit: DEFAULT_MEMPOOL_LIMIT,
    }
}

fn testnet_chain_params() -> ChainParams {
    ChainParams {
        network: Network::Testnet,
        policy: ChainPolicy {
            max_tx_size: DEFAULT_MAX_TX_SIZE,
            fee_policy: TxFeePolicy::SizeLinear(TxSizeLinear::new(
                Coeff::from_nanos(155_381_000_000_000),
                Coeff::from_nanos(43_946_000_000),
            )),
            unlock_stake_epoch: 1,
        },
        boot_stakeholders: BootStakeholders::new(),
        mempool_limit: DEFAULT_MEMPOOL_LIMIT,
    }
}

fn regtest_chain_params() -> ChainParams {
    ChainParams {
        network: Network::Regtest,
        policy: ChainPolicy {
            max_tx_size: DEFAULT_MAX_TX_SIZE,
            fee_policy: TxFeePolicy::SizeLinear(TxSizeLinear::new(
                Coeff::from_units(0),
                Coeff::from_units(0),
            )),
            unlock_stake_epoch: 0,
        },
        boot_stakeholders: BootStakeholders::new(),
        mempool_limit: DEFAULT_MEMPOOL_LIMIT,
    }
}
