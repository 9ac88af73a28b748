#![allow(dead_code)]

use txp_consensus::{Amount, ChainPolicy, Coeff, TxFeePolicy, TxSizeLinear};
use txp_primitives::address::{Address, AddressKind, StakeDistribution};
use txp_primitives::{OutPoint, Tx, TxAux, TxId, TxIn, TxOut};
use txp_script::{sign_witness, SigningKey};
use txp_toil::Utxo;

pub struct Wallet {
    pub key: SigningKey,
    pub address: Address,
}

impl Wallet {
    pub fn pubkey(seed: u8) -> Self {
        let key = SigningKey::from_bytes(&[seed; 32]).expect("valid seed");
        let address = Address::pubkey(&key.public_key());
        Self { key, address }
    }

    /// Pubkey address whose stake goes to the boot stakeholders.
    pub fn bootstrap(seed: u8) -> Self {
        let key = SigningKey::from_bytes(&[seed; 32]).expect("valid seed");
        let address =
            Address::pubkey_with_distribution(&key.public_key(), StakeDistribution::Bootstrap);
        Self { key, address }
    }

    pub fn redeem(seed: u8) -> Self {
        let key = SigningKey::from_bytes(&[seed; 32]).expect("valid seed");
        let address = Address::redeem(&key.public_key());
        Self { key, address }
    }

    pub fn out(&self, value: Amount) -> TxOut {
        TxOut::new(self.address.clone(), value)
    }
}

pub fn linear_policy(a_nanos: i64, b_nanos: i64, max_tx_size: u64) -> ChainPolicy {
    ChainPolicy {
        max_tx_size,
        fee_policy: TxFeePolicy::SizeLinear(TxSizeLinear::new(
            Coeff::from_nanos(a_nanos),
            Coeff::from_nanos(b_nanos),
        )),
        unlock_stake_epoch: 0,
    }
}

/// Max size 1000 bytes, zero minimal fee, no bootstrap era.
pub fn zero_fee_policy() -> ChainPolicy {
    linear_policy(0, 0, 1000)
}

pub fn funding_outpoint(index: u32) -> OutPoint {
    OutPoint::new([0xf0; 32], index)
}

/// Builds a transaction spending `inputs` and signs every input with the
/// wallet that owns it.
pub fn spend(inputs: &[(OutPoint, &Wallet)], outputs: Vec<TxOut>) -> TxAux {
    let tx = Tx::new(
        inputs
            .iter()
            .map(|(outpoint, _)| TxIn::Utxo(outpoint.clone()))
            .collect(),
        outputs,
    );
    let txid = tx.txid();
    let witnesses = inputs
        .iter()
        .map(|(_, wallet)| {
            sign_witness(wallet.address.kind, &wallet.key, &txid).expect("known address kind")
        })
        .collect();
    TxAux::new(tx, witnesses)
}

pub fn with_id(tx_aux: TxAux) -> (TxId, TxAux) {
    (tx_aux.txid(), tx_aux)
}

pub fn utxo_of(entries: &[(OutPoint, TxOut)]) -> Utxo {
    entries.iter().cloned().collect()
}

pub fn unknown_kind_address() -> Address {
    Address::with_root(AddressKind::Unknown(9), [7u8; 20], StakeDistribution::Bootstrap)
}

/// Deterministic pseudo-random numbers for property tests.
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    pub fn next_u64(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        self.0 >> 33
    }

    pub fn below(&mut self, bound: u64) -> u64 {
        self.next_u64() % bound.max(1)
    }
}
