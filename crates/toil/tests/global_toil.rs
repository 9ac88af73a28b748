mod common;

use common::{funding_outpoint, spend, utxo_of, zero_fee_policy, Lcg, Wallet};
use txp_consensus::{BootStakeholders, StakeholderId};
use txp_primitives::{OutPoint, TxAux, TxOut};
use txp_toil::{
    apply_block, rollback_block, tx_out_stake, verify_block, verify_tx, StakeLedger, StakeTable,
    ToilVerFailure, TxVerifyError, Utxo, UtxoLookup, VerifyFlags,
};

fn boot() -> BootStakeholders {
    BootStakeholders::from_weights([(StakeholderId([0xb1; 20]), 1), (StakeholderId([0xb2; 20]), 2)])
}

fn stakes_of(boot: &BootStakeholders, utxo: &Utxo) -> StakeTable {
    let mut table = StakeTable::new();
    for out in utxo.values() {
        for (id, value) in tx_out_stake(boot, out) {
            table.adjust_stake(&id, value);
        }
    }
    table
}

fn wallets() -> Vec<Wallet> {
    vec![
        Wallet::pubkey(1),
        Wallet::pubkey(2),
        Wallet::bootstrap(3),
        Wallet::redeem(4),
    ]
}

/// A chain of random zero-fee transactions over `utxo`; later transactions
/// may spend outputs of earlier ones.
fn random_batch(rng: &mut Lcg, wallets: &[Wallet], utxo: &Utxo, len: usize) -> Vec<TxAux> {
    let owner_of = |out: &TxOut| {
        wallets
            .iter()
            .position(|wallet| wallet.address == out.address)
            .expect("owned output")
    };
    let mut spendable: Vec<(OutPoint, TxOut)> = utxo.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    spendable.sort_by(|a, b| a.0.cmp(&b.0));
    let mut txs = Vec::with_capacity(len);
    for _ in 0..len {
        if spendable.is_empty() {
            break;
        }
        let input_count = 1 + rng.below(2.min(spendable.len() as u64)) as usize;
        let mut inputs = Vec::with_capacity(input_count);
        for _ in 0..input_count {
            let pick = rng.below(spendable.len() as u64) as usize;
            inputs.push(spendable.swap_remove(pick));
        }
        let total: i64 = inputs.iter().map(|(_, out)| out.value).sum();
        let output_count = (1 + rng.below(3) as i64).min(total) as usize;
        let mut outputs = Vec::with_capacity(output_count);
        let mut left = total;
        for index in 0..output_count {
            let remaining_slots = (output_count - index - 1) as i64;
            let value = if remaining_slots == 0 {
                left
            } else {
                1 + rng.below((left - remaining_slots) as u64) as i64
            };
            left -= value;
            let to = &wallets[rng.below(wallets.len() as u64) as usize];
            outputs.push(to.out(value));
        }
        let signers: Vec<(OutPoint, &Wallet)> = inputs
            .iter()
            .map(|(outpoint, out)| (outpoint.clone(), &wallets[owner_of(out)]))
            .collect();
        let tx_aux = spend(&signers, outputs);
        let txid = tx_aux.txid();
        for (index, out) in tx_aux.tx.outputs.iter().enumerate() {
            spendable.push((OutPoint::new(txid, index as u32), out.clone()));
        }
        txs.push(tx_aux);
    }
    txs
}

fn funded_utxo(rng: &mut Lcg, wallets: &[Wallet], count: u32) -> Utxo {
    (0..count)
        .map(|index| {
            let owner = &wallets[rng.below(wallets.len() as u64) as usize];
            let value = 1 + rng.below(1_000_000) as i64;
            (funding_outpoint(index), owner.out(value))
        })
        .collect()
}

#[test]
fn rollback_inverts_apply() {
    let wallets = wallets();
    let boot = boot();
    let policy = zero_fee_policy();
    for seed in 0..24u64 {
        let mut rng = Lcg::new(seed);
        let initial = funded_utxo(&mut rng, &wallets, 6);
        let initial_stakes = stakes_of(&boot, &initial);
        let len = 1 + rng.below(6) as usize;
        let txs = random_batch(&mut rng, &wallets, &initial, len);

        let mut verified = initial.clone();
        let undos = verify_block(&policy, 0, false, &txs, &mut verified).expect("valid batch");
        let pairs: Vec<_> = txs.into_iter().zip(undos).collect();

        let mut utxo = initial.clone();
        let mut stakes = initial_stakes.clone();
        apply_block(&boot, &pairs, &mut utxo, &mut stakes);
        assert_eq!(utxo, verified, "seed {seed}");
        assert_eq!(stakes, stakes_of(&boot, &utxo), "seed {seed}");

        rollback_block(&boot, &pairs, &mut utxo, &mut stakes);
        assert_eq!(utxo, initial, "seed {seed}");
        assert_eq!(stakes, initial_stakes, "seed {seed}");
    }
}

#[test]
fn applied_inputs_cannot_be_spent_again() {
    let wallets = wallets();
    let boot = boot();
    let policy = zero_fee_policy();
    for seed in 100..116u64 {
        let mut rng = Lcg::new(seed);
        let initial = funded_utxo(&mut rng, &wallets, 5);
        let txs = random_batch(&mut rng, &wallets, &initial, 4);
        let mut utxo = initial.clone();
        let undos = verify_block(&policy, 0, false, &txs, &mut utxo).expect("valid batch");
        let pairs: Vec<_> = txs.into_iter().zip(undos).collect();

        let mut applied = initial.clone();
        apply_block(&boot, &pairs, &mut applied, &mut StakeTable::new());
        for (tx_aux, _) in &pairs {
            for outpoint in tx_aux.tx.inputs.iter().filter_map(|input| input.outpoint()) {
                assert!(!applied.utxo_contains(outpoint), "seed {seed}");
            }
            let again = verify_tx(tx_aux, &tx_aux.txid(), VerifyFlags::lenient(), &applied);
            assert!(
                matches!(again, Err(TxVerifyError::NotUnspent { .. })),
                "seed {seed}"
            );
        }
    }
}

#[test]
fn rollback_restores_chained_spends() {
    let alice = Wallet::pubkey(1);
    let bob = Wallet::pubkey(2);
    let o1 = funding_outpoint(0);
    let initial = utxo_of(&[(o1.clone(), alice.out(100))]);
    let first = spend(&[(o1.clone(), &alice)], vec![bob.out(100)]);
    let second = spend(&[(OutPoint::new(first.txid(), 0), &bob)], vec![alice.out(100)]);
    let txs = vec![first, second];

    let mut scratch = initial.clone();
    let undos = verify_block(&zero_fee_policy(), 0, false, &txs, &mut scratch).expect("valid");
    assert_eq!(undos, vec![vec![Some(alice.out(100))], vec![Some(bob.out(100))]]);
    let pairs: Vec<_> = txs.into_iter().zip(undos).collect();

    let boot = BootStakeholders::new();
    let mut utxo = initial.clone();
    let mut stakes = stakes_of(&boot, &initial);
    apply_block(&boot, &pairs, &mut utxo, &mut stakes);
    assert_eq!(utxo.len(), 1);
    let alice_id = match alice.address.attributes.stake_distribution {
        txp_primitives::StakeDistribution::SingleKey(id) => id,
        txp_primitives::StakeDistribution::Bootstrap => unreachable!(),
    };
    assert_eq!(stakes.stake_of(&alice_id), 100);

    rollback_block(&boot, &pairs, &mut utxo, &mut stakes);
    assert_eq!(utxo, initial);
    assert_eq!(stakes.stake_of(&alice_id), 100);
    assert_eq!(stakes.total_stake(), 100);
}

#[test]
fn empty_block_is_noop() {
    let alice = Wallet::pubkey(1);
    let initial = utxo_of(&[(funding_outpoint(0), alice.out(7))]);
    let mut utxo = initial.clone();
    let mut stakes = StakeTable::new();
    apply_block(&BootStakeholders::new(), &[], &mut utxo, &mut stakes);
    rollback_block(&BootStakeholders::new(), &[], &mut utxo, &mut stakes);
    assert_eq!(utxo, initial);
    assert!(stakes.is_empty());
}

#[test]
fn verify_block_reports_first_failure() {
    let alice = Wallet::pubkey(1);
    let o1 = funding_outpoint(0);
    let initial = utxo_of(&[(o1.clone(), alice.out(100))]);
    let first = spend(&[(o1.clone(), &alice)], vec![alice.out(100)]);
    let conflict = spend(&[(o1.clone(), &alice)], vec![alice.out(99)]);
    let conflict_id = conflict.txid();

    let mut utxo = initial.clone();
    let failure = verify_block(&zero_fee_policy(), 0, false, &[first, conflict], &mut utxo)
        .unwrap_err();
    assert_eq!(failure.index, 1);
    assert_eq!(failure.txid, conflict_id);
    assert_eq!(
        failure.failure,
        ToilVerFailure::Verify(TxVerifyError::NotUnspent {
            index: 0,
            outpoint: o1
        })
    );
}

#[test]
#[should_panic(expected = "undo record does not match")]
fn mismatched_undo_is_fatal() {
    let alice = Wallet::pubkey(1);
    let tx_aux = spend(&[(funding_outpoint(0), &alice)], vec![alice.out(1)]);
    let pairs = vec![(tx_aux, Vec::new())];
    apply_block(
        &BootStakeholders::new(),
        &pairs,
        &mut Utxo::new(),
        &mut StakeTable::new(),
    );
}
