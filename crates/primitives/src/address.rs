//! Addresses: spending root, address kind and stake distribution attributes.

use std::fmt;

use txp_consensus::constants::ADDRESS_ROOT_LEN;
use txp_consensus::StakeholderId;

use crate::encoding::{Decodable, DecodeError, Decoder, Encodable, Encoder};
use crate::hash::{hash160, stakeholder_id, to_hex};

const KIND_PUBKEY: u8 = 0;
const KIND_REDEEM: u8 = 2;

const DISTR_BOOTSTRAP: u8 = 0;
const DISTR_SINGLE_KEY: u8 = 1;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum AddressKind {
    PubKey,
    /// Claims against pre-allocated funds.
    Redeem,
    /// Only produced by [`AddressKind::from_tag`] for unassigned tags.
    Unknown(u8),
}

impl AddressKind {
    pub fn tag(self) -> u8 {
        match self {
            AddressKind::PubKey => KIND_PUBKEY,
            AddressKind::Redeem => KIND_REDEEM,
            AddressKind::Unknown(tag) => tag,
        }
    }

    pub fn from_tag(tag: u8) -> Self {
        match tag {
            KIND_PUBKEY => AddressKind::PubKey,
            KIND_REDEEM => AddressKind::Redeem,
            other => AddressKind::Unknown(other),
        }
    }

    pub fn is_known(self) -> bool {
        !matches!(self, AddressKind::Unknown(_))
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum StakeDistribution {
    /// Stake is shared among the genesis boot stakeholders.
    Bootstrap,
    SingleKey(StakeholderId),
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct AddrAttributes {
    pub stake_distribution: StakeDistribution,
    /// Attribute bytes this node does not understand.
    pub unknown: Vec<u8>,
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Address {
    pub kind: AddressKind,
    pub root: [u8; ADDRESS_ROOT_LEN],
    pub attributes: AddrAttributes,
}

impl Address {
    /// Address spendable by `public_key`, staking to the key's own stakeholder id.
    pub fn pubkey(public_key: &[u8]) -> Self {
        Self::pubkey_with_distribution(
            public_key,
            StakeDistribution::SingleKey(stakeholder_id(public_key)),
        )
    }

    pub fn pubkey_with_distribution(public_key: &[u8], distribution: StakeDistribution) -> Self {
        Self::with_root(
            AddressKind::PubKey,
            spending_root(AddressKind::PubKey, public_key),
            distribution,
        )
    }

    pub fn redeem(public_key: &[u8]) -> Self {
        Self::with_root(
            AddressKind::Redeem,
            spending_root(AddressKind::Redeem, public_key),
            StakeDistribution::Bootstrap,
        )
    }

    pub fn with_root(
        kind: AddressKind,
        root: [u8; ADDRESS_ROOT_LEN],
        stake_distribution: StakeDistribution,
    ) -> Self {
        Self {
            kind,
            root,
            attributes: AddrAttributes {
                stake_distribution,
                unknown: Vec::new(),
            },
        }
    }

    pub fn is_redeem(&self) -> bool {
        self.kind == AddressKind::Redeem
    }

    pub fn is_bootstrap_distribution(&self) -> bool {
        self.attributes.stake_distribution == StakeDistribution::Bootstrap
    }

    /// Kind and attributes are fully understood by this node.
    pub fn is_known(&self) -> bool {
        self.kind.is_known() && self.attributes.unknown.is_empty()
    }

    /// Whether `public_key` hashes to this address's spending root.
    pub fn matches_key(&self, public_key: &[u8]) -> bool {
        self.kind.is_known() && spending_root(self.kind, public_key) == self.root
    }
}

pub fn spending_root(kind: AddressKind, public_key: &[u8]) -> [u8; ADDRESS_ROOT_LEN] {
    let mut preimage = Vec::with_capacity(1 + public_key.len());
    preimage.push(kind.tag());
    preimage.extend_from_slice(public_key);
    hash160(&preimage)
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = match self.kind {
            AddressKind::PubKey => "pk",
            AddressKind::Redeem => "rd",
            AddressKind::Unknown(_) => "unk",
        };
        write!(f, "{prefix}:{}", to_hex(&self.root))?;
        match self.attributes.stake_distribution {
            StakeDistribution::Bootstrap => write!(f, "/boot"),
            StakeDistribution::SingleKey(id) => write!(f, "/{id}"),
        }
    }
}

impl Encodable for Address {
    fn consensus_encode(&self, encoder: &mut Encoder) {
        encoder.write_u8(self.kind.tag());
        encoder.write_bytes(&self.root);
        match self.attributes.stake_distribution {
            StakeDistribution::Bootstrap => encoder.write_u8(DISTR_BOOTSTRAP),
            StakeDistribution::SingleKey(id) => {
                encoder.write_u8(DISTR_SINGLE_KEY);
                encoder.write_bytes(id.as_bytes());
            }
        }
        encoder.write_var_bytes(&self.attributes.unknown);
    }
}

impl Decodable for Address {
    fn consensus_decode(decoder: &mut Decoder) -> Result<Self, DecodeError> {
        let kind = AddressKind::from_tag(decoder.read_u8()?);
        let root = decoder.read_array()?;
        let stake_distribution = match decoder.read_u8()? {
            DISTR_BOOTSTRAP => StakeDistribution::Bootstrap,
            DISTR_SINGLE_KEY => StakeDistribution::SingleKey(StakeholderId(decoder.read_array()?)),
            _ => return Err(DecodeError::InvalidData("unknown stake distribution")),
        };
        let unknown = decoder.read_var_bytes()?;
        Ok(Self {
            kind,
            root,
            attributes: AddrAttributes {
                stake_distribution,
                unknown,
            },
        })
    }
}
