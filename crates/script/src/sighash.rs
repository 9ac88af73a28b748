//! Message digests signed by input witnesses.

use txp_consensus::Hash256;
use txp_primitives::address::AddressKind;
use txp_primitives::hash::sha256d;
use txp_primitives::TxId;

/// Domain prefix keeping witness digests apart from transaction ids.
const SIGHASH_PREFIX: &[u8] = b"txp-witness";

/// Digest a witness of `kind` signs for the transaction `txid`.
///
/// The address kind tag is committed so a pubkey witness can never be replayed
/// as a redeem witness over the same transaction.
pub fn witness_sighash(kind: AddressKind, txid: &TxId) -> Hash256 {
    let mut preimage = Vec::with_capacity(SIGHASH_PREFIX.len() + 1 + txid.len());
    preimage.extend_from_slice(SIGHASH_PREFIX);
    preimage.push(kind.tag());
    preimage.extend_from_slice(txid);
    sha256d(&preimage)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_is_committed() {
        let txid = [7u8; 32];
        assert_ne!(
            witness_sighash(AddressKind::PubKey, &txid),
            witness_sighash(AddressKind::Redeem, &txid)
        );
        assert_eq!(
            witness_sighash(AddressKind::PubKey, &txid),
            witness_sighash(AddressKind::PubKey, &txid)
        );
    }
}
