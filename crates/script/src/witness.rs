//! Checks that an input witness authorizes spending an output address.

use secp256k1::ecdsa::Signature;
use secp256k1::{Message, PublicKey};
use txp_primitives::address::{Address, AddressKind};
use txp_primitives::{TxId, TxInWitness};

use crate::secp::secp256k1_verify;
use crate::sighash::witness_sighash;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum WitnessError {
    /// Witness form does not fit the address kind it spends.
    KindMismatch {
        address: AddressKind,
        witness: &'static str,
    },
    UnknownWitness(u8),
    UnknownAddressKind(u8),
    KeyMismatch,
    InvalidPublicKey,
    InvalidSignatureEncoding,
    BadSignature,
}

impl std::fmt::Display for WitnessError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WitnessError::KindMismatch { address, witness } => write!(
                f,
                "{witness} witness cannot spend address of kind {}",
                address.tag()
            ),
            WitnessError::UnknownWitness(tag) => write!(f, "unknown witness type {tag}"),
            WitnessError::UnknownAddressKind(tag) => write!(f, "unknown address kind {tag}"),
            WitnessError::KeyMismatch => write!(f, "witness key does not match address"),
            WitnessError::InvalidPublicKey => write!(f, "invalid public key encoding"),
            WitnessError::InvalidSignatureEncoding => write!(f, "invalid signature encoding"),
            WitnessError::BadSignature => write!(f, "signature verification failed"),
        }
    }
}

impl std::error::Error for WitnessError {}

/// Verifies `witness` against the output `address` it spends.
///
/// With `verify_all_known` unset, unknown witness forms and unknown address
/// kinds pass unchecked.
pub fn verify_witness(
    address: &Address,
    witness: &TxInWitness,
    txid: &TxId,
    verify_all_known: bool,
) -> Result<(), WitnessError> {
    let (expected, name, public_key, signature) = match witness {
        TxInWitness::PubKey {
            public_key,
            signature,
        } => (AddressKind::PubKey, "pubkey", public_key, signature),
        TxInWitness::Redeem {
            public_key,
            signature,
        } => (AddressKind::Redeem, "redeem", public_key, signature),
        TxInWitness::Unknown { tag, .. } => {
            return if verify_all_known {
                Err(WitnessError::UnknownWitness(*tag))
            } else {
                Ok(())
            };
        }
    };

    if let AddressKind::Unknown(tag) = address.kind {
        return if verify_all_known {
            Err(WitnessError::UnknownAddressKind(tag))
        } else {
            Ok(())
        };
    }
    if address.kind != expected {
        return Err(WitnessError::KindMismatch {
            address: address.kind,
            witness: name,
        });
    }
    if !address.matches_key(public_key) {
        return Err(WitnessError::KeyMismatch);
    }

    let pubkey = PublicKey::from_slice(public_key).map_err(|_| WitnessError::InvalidPublicKey)?;
    let sig =
        Signature::from_compact(signature).map_err(|_| WitnessError::InvalidSignatureEncoding)?;
    let msg = Message::from_digest(witness_sighash(expected, txid));
    secp256k1_verify()
        .verify_ecdsa(&msg, &sig, &pubkey)
        .map_err(|_| WitnessError::BadSignature)
}
