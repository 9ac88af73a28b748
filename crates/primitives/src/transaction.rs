//! Transaction types and serialization.

use txp_consensus::{Amount, Hash256};

use crate::address::Address;
use crate::encoding::{encode, Decodable, DecodeError, Decoder, Encodable, Encoder};
use crate::hash::sha256d;
use crate::outpoint::OutPoint;

pub type TxId = Hash256;

/// Outputs consumed by one transaction, one slot per input in input order.
/// A slot is `None` only for an input form this node could not resolve.
pub type TxUndo = Vec<Option<TxOut>>;

const INPUT_UTXO: u8 = 0;

const WITNESS_PUBKEY: u8 = 0;
const WITNESS_REDEEM: u8 = 2;

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum TxIn {
    Utxo(OutPoint),
    /// An input form introduced by a later protocol version. Never carries
    /// the tag of a known form; build it with [`TxIn::unknown`].
    Unknown { tag: u8, payload: Vec<u8> },
}

impl TxIn {
    /// `None` when `tag` belongs to a known input form.
    pub fn unknown(tag: u8, payload: Vec<u8>) -> Option<Self> {
        (tag != INPUT_UTXO).then_some(TxIn::Unknown { tag, payload })
    }

    pub fn outpoint(&self) -> Option<&OutPoint> {
        match self {
            TxIn::Utxo(outpoint) => Some(outpoint),
            TxIn::Unknown { .. } => None,
        }
    }
}

impl Encodable for TxIn {
    fn consensus_encode(&self, encoder: &mut Encoder) {
        match self {
            TxIn::Utxo(outpoint) => {
                encoder.write_u8(INPUT_UTXO);
                outpoint.consensus_encode(encoder);
            }
            TxIn::Unknown { tag, payload } => {
                encoder.write_u8(*tag);
                encoder.write_var_bytes(payload);
            }
        }
    }
}

impl Decodable for TxIn {
    fn consensus_decode(decoder: &mut Decoder) -> Result<Self, DecodeError> {
        match decoder.read_u8()? {
            INPUT_UTXO => Ok(TxIn::Utxo(OutPoint::consensus_decode(decoder)?)),
            tag => Ok(TxIn::Unknown {
                tag,
                payload: decoder.read_var_bytes()?,
            }),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct TxOut {
    pub address: Address,
    pub value: Amount,
}

impl TxOut {
    pub fn new(address: Address, value: Amount) -> Self {
        Self { address, value }
    }
}

impl Encodable for TxOut {
    fn consensus_encode(&self, encoder: &mut Encoder) {
        self.address.consensus_encode(encoder);
        encoder.write_i64_le(self.value);
    }
}

impl Decodable for TxOut {
    fn consensus_decode(decoder: &mut Decoder) -> Result<Self, DecodeError> {
        let address = Address::consensus_decode(decoder)?;
        let value = decoder.read_i64_le()?;
        Ok(Self { address, value })
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Tx {
    pub inputs: Vec<TxIn>,
    pub outputs: Vec<TxOut>,
    /// Attribute bytes this node does not understand.
    pub attributes: Vec<u8>,
}

impl Tx {
    pub fn new(inputs: Vec<TxIn>, outputs: Vec<TxOut>) -> Self {
        Self {
            inputs,
            outputs,
            attributes: Vec::new(),
        }
    }

    /// Content hash identifying the transaction.
    pub fn txid(&self) -> TxId {
        sha256d(&encode(self))
    }

    /// References of the outputs this transaction creates.
    pub fn output_refs(&self, txid: &TxId) -> impl Iterator<Item = OutPoint> + '_ {
        let txid = *txid;
        (0..self.outputs.len()).map(move |index| OutPoint::new(txid, index as u32))
    }
}

impl Encodable for Tx {
    fn consensus_encode(&self, encoder: &mut Encoder) {
        encoder.write_list(&self.inputs);
        encoder.write_list(&self.outputs);
        encoder.write_var_bytes(&self.attributes);
    }
}

impl Decodable for Tx {
    fn consensus_decode(decoder: &mut Decoder) -> Result<Self, DecodeError> {
        let inputs = decoder.read_list()?;
        let outputs = decoder.read_list()?;
        let attributes = decoder.read_var_bytes()?;
        Ok(Self {
            inputs,
            outputs,
            attributes,
        })
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TxInWitness {
    PubKey {
        public_key: Vec<u8>,
        signature: Vec<u8>,
    },
    Redeem {
        public_key: Vec<u8>,
        signature: Vec<u8>,
    },
    /// A witness form introduced by a later protocol version. Never carries
    /// the tag of a known form; build it with [`TxInWitness::unknown`].
    Unknown { tag: u8, payload: Vec<u8> },
}

impl TxInWitness {
    /// `None` when `tag` belongs to a known witness form.
    pub fn unknown(tag: u8, payload: Vec<u8>) -> Option<Self> {
        match tag {
            WITNESS_PUBKEY | WITNESS_REDEEM => None,
            tag => Some(TxInWitness::Unknown { tag, payload }),
        }
    }
}

impl Encodable for TxInWitness {
    fn consensus_encode(&self, encoder: &mut Encoder) {
        match self {
            TxInWitness::PubKey {
                public_key,
                signature,
            } => {
                encoder.write_u8(WITNESS_PUBKEY);
                encoder.write_var_bytes(public_key);
                encoder.write_var_bytes(signature);
            }
            TxInWitness::Redeem {
                public_key,
                signature,
            } => {
                encoder.write_u8(WITNESS_REDEEM);
                encoder.write_var_bytes(public_key);
                encoder.write_var_bytes(signature);
            }
            TxInWitness::Unknown { tag, payload } => {
                encoder.write_u8(*tag);
                encoder.write_var_bytes(payload);
            }
        }
    }
}

impl Decodable for TxInWitness {
    fn consensus_decode(decoder: &mut Decoder) -> Result<Self, DecodeError> {
        match decoder.read_u8()? {
            WITNESS_PUBKEY => Ok(TxInWitness::PubKey {
                public_key: decoder.read_var_bytes()?,
                signature: decoder.read_var_bytes()?,
            }),
            WITNESS_REDEEM => Ok(TxInWitness::Redeem {
                public_key: decoder.read_var_bytes()?,
                signature: decoder.read_var_bytes()?,
            }),
            tag => Ok(TxInWitness::Unknown {
                tag,
                payload: decoder.read_var_bytes()?,
            }),
        }
    }
}

/// A transaction together with one witness per input.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TxAux {
    pub tx: Tx,
    pub witnesses: Vec<TxInWitness>,
}

impl TxAux {
    pub fn new(tx: Tx, witnesses: Vec<TxInWitness>) -> Self {
        Self { tx, witnesses }
    }

    pub fn txid(&self) -> TxId {
        self.tx.txid()
    }

    /// Serialized size in bytes, the quantity fee and size limits apply to.
    pub fn size(&self) -> u64 {
        crate::encoding::encoded_len(self) as u64
    }
}

impl Encodable for TxAux {
    fn consensus_encode(&self, encoder: &mut Encoder) {
        self.tx.consensus_encode(encoder);
        encoder.write_list(&self.witnesses);
    }
}

impl Decodable for TxAux {
    fn consensus_decode(decoder: &mut Decoder) -> Result<Self, DecodeError> {
        let tx = Tx::consensus_decode(decoder)?;
        let witnesses = decoder.read_list()?;
        Ok(Self { tx, witnesses })
    }
}

/// Encodes an undo record; absent slots are written as a zero flag.
pub fn encode_tx_undo(undo: &TxUndo, encoder: &mut Encoder) {
    encoder.write_varint(undo.len() as u64);
    for slot in undo {
        match slot {
            Some(out) => {
                encoder.write_u8(1);
                out.consensus_encode(encoder);
            }
            None => encoder.write_u8(0),
        }
    }
}

pub fn decode_tx_undo(decoder: &mut Decoder) -> Result<TxUndo, DecodeError> {
    let len = usize::try_from(decoder.read_varint()?).map_err(|_| DecodeError::SizeTooLarge)?;
    if len > decoder.remaining() {
        return Err(DecodeError::UnexpectedEof);
    }
    let mut undo = Vec::with_capacity(len);
    for _ in 0..len {
        let slot = match decoder.read_u8()? {
            0 => None,
            1 => Some(TxOut::consensus_decode(decoder)?),
            _ => return Err(DecodeError::InvalidData("invalid undo slot flag")),
        };
        undo.push(slot);
    }
    Ok(undo)
}
