mod common;

use common::{funding_outpoint, linear_policy, spend, utxo_of, zero_fee_policy, Wallet};
use txp_consensus::{ChainPolicy, TxFeePolicy};
use txp_primitives::{OutPoint, TxAux};
use txp_toil::{verify_and_apply_tx, ToilVerFailure, Utxo, UtxoLookup, VerifyFlags};

fn apply(policy: &ChainPolicy, epoch: u64, tx_aux: &TxAux, utxo: &mut Utxo) -> Result<(), ToilVerFailure> {
    verify_and_apply_tx(policy, epoch, VerifyFlags::strict(), &tx_aux.txid(), tx_aux, utxo).map(|_| ())
}

/// Minimal fee of `a + b * size` in whole units, rounded up.
fn min_fee(policy: &ChainPolicy, size: u64) -> i64 {
    match &policy.fee_policy {
        TxFeePolicy::SizeLinear(linear) => linear.min_fee(size).expect("valid policy"),
        TxFeePolicy::Unknown { .. } => 0,
    }
}

#[test]
fn fee_below_minimum_flips_to_insufficient() {
    let alice = Wallet::pubkey(1);
    let o1 = funding_outpoint(0);
    // 1 unit plus 0.5 units per byte.
    let policy = linear_policy(1_000_000_000, 500_000_000, 10_000);
    let utxo = utxo_of(&[(o1.clone(), alice.out(10_000))]);

    // Values of the same encoded width keep the size fixed.
    let probe = spend(&[(o1.clone(), &alice)], vec![alice.out(9_000)]);
    let size = probe.size();
    let required = min_fee(&policy, size);
    assert!(required > 0);

    let exact = spend(&[(o1.clone(), &alice)], vec![alice.out(10_000 - required)]);
    assert_eq!(exact.size(), size);
    let mut accepted = utxo.clone();
    assert_eq!(apply(&policy, 0, &exact, &mut accepted), Ok(()));

    let short = spend(&[(o1.clone(), &alice)], vec![alice.out(10_000 - required + 1)]);
    let mut rejected = utxo.clone();
    assert_eq!(
        apply(&policy, 0, &short, &mut rejected),
        Err(ToilVerFailure::InsufficientFee {
            size,
            fee: required - 1,
            min_fee: required,
            policy: policy.fee_policy.clone(),
        })
    );
    assert_eq!(rejected, utxo);
}

#[test]
fn redeem_inputs_are_fee_exempt() {
    let claimant = Wallet::redeem(4);
    let alice = Wallet::pubkey(1);
    let o1 = funding_outpoint(0);
    let policy = linear_policy(1_000_000_000_000, 1_000_000_000, 10_000);
    let mut utxo = utxo_of(&[(o1.clone(), claimant.out(500))]);

    let tx_aux = spend(&[(o1.clone(), &claimant)], vec![alice.out(500)]);
    assert_eq!(apply(&policy, 0, &tx_aux, &mut utxo), Ok(()));
    assert!(utxo.utxo_contains(&OutPoint::new(tx_aux.txid(), 0)));
}

#[test]
fn mixed_inputs_pay_fee() {
    let claimant = Wallet::redeem(4);
    let alice = Wallet::pubkey(1);
    let o1 = funding_outpoint(0);
    let o2 = funding_outpoint(1);
    let policy = linear_policy(1_000_000_000_000, 0, 10_000);
    let mut utxo = utxo_of(&[(o1.clone(), claimant.out(500)), (o2.clone(), alice.out(5))]);

    let tx_aux = spend(&[(o1, &claimant), (o2, &alice)], vec![alice.out(505)]);
    assert!(matches!(
        apply(&policy, 0, &tx_aux, &mut utxo),
        Err(ToilVerFailure::InsufficientFee { min_fee: 1000, fee: 0, .. })
    ));
}

#[test]
fn size_limit_applies_to_redeem() {
    let claimant = Wallet::redeem(4);
    let alice = Wallet::pubkey(1);
    let o1 = funding_outpoint(0);
    let mut policy = zero_fee_policy();
    policy.max_tx_size = 50;
    let mut utxo = utxo_of(&[(o1.clone(), claimant.out(500))]);

    let tx_aux = spend(&[(o1, &claimant)], vec![alice.out(500)]);
    assert_eq!(
        apply(&policy, 0, &tx_aux, &mut utxo),
        Err(ToilVerFailure::TooLarge {
            size: tx_aux.size(),
            limit: 50
        })
    );
}

#[test]
fn bootstrap_era_reports_every_offending_output() {
    let alice = Wallet::pubkey(1);
    let bob = Wallet::pubkey(2);
    let boot = Wallet::bootstrap(3);
    let o1 = funding_outpoint(0);
    let mut policy = zero_fee_policy();
    policy.unlock_stake_epoch = 10;
    let utxo = utxo_of(&[(o1.clone(), alice.out(100))]);

    let tx_aux = spend(
        &[(o1.clone(), &alice)],
        vec![alice.out(30), boot.out(30), bob.out(40)],
    );

    let mut inside = utxo.clone();
    assert_eq!(
        apply(&policy, 9, &tx_aux, &mut inside),
        Err(ToilVerFailure::NonBootstrapDistr(vec![
            alice.address.clone(),
            bob.address.clone()
        ]))
    );
    assert_eq!(inside, utxo);

    let mut outside = utxo.clone();
    assert_eq!(apply(&policy, 10, &tx_aux, &mut outside), Ok(()));

    let only_boot = spend(&[(o1, &alice)], vec![boot.out(100)]);
    let mut bootstrap = utxo.clone();
    assert_eq!(apply(&policy, 0, &only_boot, &mut bootstrap), Ok(()));
}

#[test]
fn bootstrap_check_precedes_fee_check() {
    let alice = Wallet::pubkey(1);
    let o1 = funding_outpoint(0);
    let mut policy = linear_policy(1_000_000_000_000, 0, 10_000);
    policy.unlock_stake_epoch = 1;
    let mut utxo = utxo_of(&[(o1.clone(), alice.out(100))]);
    let tx_aux = spend(&[(o1, &alice)], vec![alice.out(100)]);
    assert!(matches!(
        apply(&policy, 0, &tx_aux, &mut utxo),
        Err(ToilVerFailure::NonBootstrapDistr(_))
    ));
}

#[test]
fn broken_policy_surfaces_as_error() {
    let alice = Wallet::pubkey(1);
    let o1 = funding_outpoint(0);
    let policy = linear_policy(-1_000_000_000_000, 0, 10_000);
    let mut utxo = utxo_of(&[(o1.clone(), alice.out(100))]);
    let tx_aux = spend(&[(o1, &alice)], vec![alice.out(100)]);
    assert!(matches!(
        apply(&policy, 0, &tx_aux, &mut utxo),
        Err(ToilVerFailure::InvalidMinFee { size, .. }) if size == tx_aux.size()
    ));
}

#[test]
fn unknown_fee_policy_never_rejects() {
    let alice = Wallet::pubkey(1);
    let o1 = funding_outpoint(0);
    let mut policy = zero_fee_policy();
    policy.fee_policy = TxFeePolicy::Unknown {
        tag: 3,
        payload: vec![0xff; 4],
    };
    let mut utxo = utxo_of(&[(o1.clone(), alice.out(100))]);
    let tx_aux = spend(&[(o1, &alice)], vec![alice.out(100)]);
    assert_eq!(apply(&policy, 0, &tx_aux, &mut utxo), Ok(()));
}
