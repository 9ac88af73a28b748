//! Store-backed chain state: UTXO set, stake table and per-block undo.

pub mod blocks;
pub mod stakes;
pub mod state;
pub mod undo;
pub mod utxo;
