//! Producing witnesses from secret keys.

use secp256k1::{Message, PublicKey, SecretKey};
use txp_primitives::address::AddressKind;
use txp_primitives::{TxId, TxInWitness};

use crate::secp::secp256k1_all;
use crate::sighash::witness_sighash;

#[derive(Clone, Copy, Debug)]
pub struct SigningKey {
    secret: SecretKey,
}

impl SigningKey {
    /// Returns `None` for a zero or out-of-range scalar.
    pub fn from_bytes(bytes: &[u8; 32]) -> Option<Self> {
        SecretKey::from_slice(bytes)
            .ok()
            .map(|secret| Self { secret })
    }

    /// Compressed SEC1 encoding of the public key.
    pub fn public_key(&self) -> Vec<u8> {
        PublicKey::from_secret_key(secp256k1_all(), &self.secret)
            .serialize()
            .to_vec()
    }
}

/// Builds the witness spending an output of `kind` in transaction `txid`.
///
/// Unknown kinds have no witness form and yield `None`.
pub fn sign_witness(kind: AddressKind, key: &SigningKey, txid: &TxId) -> Option<TxInWitness> {
    let msg = Message::from_digest(witness_sighash(kind, txid));
    let signature = secp256k1_all()
        .sign_ecdsa(&msg, &key.secret)
        .serialize_compact()
        .to_vec();
    let public_key = key.public_key();
    match kind {
        AddressKind::PubKey => Some(TxInWitness::PubKey {
            public_key,
            signature,
        }),
        AddressKind::Redeem => Some(TxInWitness::Redeem {
            public_key,
            signature,
        }),
        AddressKind::Unknown(_) => None,
    }
}
