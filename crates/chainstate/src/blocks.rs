//! Stored block bodies, linked to the previous tip.

use txp_consensus::Hash256;
use txp_primitives::encoding::{Decodable, DecodeError, Decoder, Encodable, Encoder};
use txp_primitives::TxAux;

pub type BlockId = Hash256;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BlockRecord {
    /// Tip the block was connected on, `None` for the first block.
    pub prev: Option<BlockId>,
    pub txs: Vec<TxAux>,
}

impl Encodable for BlockRecord {
    fn consensus_encode(&self, encoder: &mut Encoder) {
        match &self.prev {
            Some(prev) => {
                encoder.write_u8(1);
                encoder.write_hash(prev);
            }
            None => encoder.write_u8(0),
        }
        encoder.write_list(&self.txs);
    }
}

impl Decodable for BlockRecord {
    fn consensus_decode(decoder: &mut Decoder) -> Result<Self, DecodeError> {
        let prev = match decoder.read_u8()? {
            0 => None,
            1 => Some(decoder.read_hash()?),
            _ => return Err(DecodeError::InvalidData("invalid block link flag")),
        };
        let txs = decoder.read_list()?;
        Ok(Self { prev, txs })
    }
}
