//! Dependency ordering of transactions by spent outputs.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use txp_primitives::{TxAux, TxId, TxIn};

/// Orders `txs` so every transaction follows the ones whose outputs it
/// spends. Independent transactions keep their relative order.
///
/// Returns positions into `txs`, or `None` if the dependencies form a cycle.
pub fn topsort_txs(txs: &[(TxId, TxAux)]) -> Option<Vec<usize>> {
    let mut position: HashMap<&TxId, usize> = HashMap::with_capacity(txs.len());
    for (index, (txid, _)) in txs.iter().enumerate() {
        position.entry(txid).or_insert(index);
    }

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); txs.len()];
    let mut pending_parents = vec![0usize; txs.len()];
    for (index, (_, tx_aux)) in txs.iter().enumerate() {
        let mut parents: Vec<usize> = tx_aux
            .tx
            .inputs
            .iter()
            .filter_map(TxIn::outpoint)
            .filter_map(|outpoint| position.get(&outpoint.hash).copied())
            .collect();
        parents.sort_unstable();
        parents.dedup();
        pending_parents[index] = parents.len();
        for parent in parents {
            children[parent].push(index);
        }
    }

    let mut ready: BinaryHeap<Reverse<usize>> = pending_parents
        .iter()
        .enumerate()
        .filter(|(_, count)| **count == 0)
        .map(|(index, _)| Reverse(index))
        .collect();
    let mut order = Vec::with_capacity(txs.len());
    while let Some(Reverse(index)) = ready.pop() {
        order.push(index);
        for &child in &children[index] {
            pending_parents[child] -= 1;
            if pending_parents[child] == 0 {
                ready.push(Reverse(child));
            }
        }
    }

    (order.len() == txs.len()).then_some(order)
}
