//! Chain policy, monetary units and network parameters.

pub mod constants;
pub mod money;
pub mod params;

pub use money::{Amount, MAX_MONEY};
pub use params::{
    chain_params, BootStakeholders, ChainParams, ChainPolicy, Coeff, MinFeeError, Network,
    TxFeePolicy, TxSizeLinear,
};

pub type Hash256 = [u8; 32];

/// Index of a slotting epoch.
pub type EpochIndex = u64;

pub const STAKEHOLDER_ID_LEN: usize = 20;

/// Hash of a stakeholder's public key.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct StakeholderId(pub [u8; STAKEHOLDER_ID_LEN]);

impl StakeholderId {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let bytes: [u8; STAKEHOLDER_ID_LEN] = bytes.try_into().ok()?;
        Some(Self(bytes))
    }

    pub fn from_hex(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.len() != STAKEHOLDER_ID_LEN * 2 || !raw.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let mut out = [0u8; STAKEHOLDER_ID_LEN];
        for (i, byte) in out.iter_mut().enumerate() {
            *byte = u8::from_str_radix(raw.get(i * 2..i * 2 + 2)?, 16).ok()?;
        }
        Some(Self(out))
    }
}

impl std::fmt::Display for StakeholderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}
