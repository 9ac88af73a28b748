use txp_primitives::encoding::{DecodeError, Decoder, Encoder};
use txp_primitives::transaction::{decode_tx_undo, encode_tx_undo};
use txp_primitives::TxUndo;

const BLOCK_UNDO_VERSION: u8 = 1;

/// Undo records of one block, one per transaction in block order.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct BlockUndo {
    pub txs: Vec<TxUndo>,
}

impl BlockUndo {
    pub fn encode(&self) -> Vec<u8> {
        let mut encoder = Encoder::new();
        encoder.write_u8(BLOCK_UNDO_VERSION);
        encoder.write_varint(self.txs.len() as u64);
        for undo in &self.txs {
            encode_tx_undo(undo, &mut encoder);
        }
        encoder.into_inner()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, DecodeError> {
        let mut decoder = Decoder::new(bytes);
        if decoder.read_u8()? != BLOCK_UNDO_VERSION {
            return Err(DecodeError::InvalidData("unsupported block undo version"));
        }
        let len = usize::try_from(decoder.read_varint()?).map_err(|_| DecodeError::SizeTooLarge)?;
        if len > decoder.remaining() {
            return Err(DecodeError::UnexpectedEof);
        }
        let mut txs = Vec::with_capacity(len);
        for _ in 0..len {
            txs.push(decode_tx_undo(&mut decoder)?);
        }
        if !decoder.is_empty() {
            return Err(DecodeError::TrailingBytes);
        }
        Ok(Self { txs })
    }
}
