use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use txp_chainstate::state::ChainStateError;
use txp_consensus::Network;
use txp_primitives::address::Address;
use txp_primitives::{OutPoint, Tx, TxAux, TxIn, TxOut};
use txp_script::{sign_witness, SigningKey};
use txp_storage::memory::MemoryStore;
use txp_storage::{Column, KeyValueStore, ScanResult, StoreError, WriteBatch};
use txp_toil::{ToilVerFailure, TxVerifyError};
use txpd::{NodeConfig, Txp, TxpError};

struct Wallet {
    key: SigningKey,
    address: Address,
}

impl Wallet {
    fn new(seed: u8) -> Self {
        let key = SigningKey::from_bytes(&[seed; 32]).expect("secret");
        let address = Address::pubkey(&key.public_key());
        Self { key, address }
    }

    fn out(&self, value: i64) -> TxOut {
        TxOut::new(self.address.clone(), value)
    }
}

fn spend(input: OutPoint, owner: &Wallet, outputs: Vec<TxOut>) -> TxAux {
    let tx = Tx::new(vec![TxIn::Utxo(input)], outputs);
    let txid = tx.txid();
    let witness = sign_witness(owner.address.kind, &owner.key, &txid).expect("witness");
    TxAux::new(tx, vec![witness])
}

fn genesis_outpoint(index: u32) -> OutPoint {
    OutPoint::new([0u8; 32], index)
}

fn node(config: NodeConfig, genesis: &[(OutPoint, TxOut)]) -> Txp<MemoryStore> {
    let txp = Txp::new(Arc::new(MemoryStore::new()), config);
    txp.init_genesis(genesis).expect("genesis");
    txp
}

fn regtest() -> NodeConfig {
    NodeConfig::for_network(Network::Regtest)
}

#[test]
fn adopting_a_block_keeps_dependent_pool_transactions() {
    let alice = Wallet::new(1);
    let bob = Wallet::new(2);
    let carol = Wallet::new(3);
    let txp = node(regtest(), &[(genesis_outpoint(0), alice.out(100))]);

    let parent = spend(genesis_outpoint(0), &alice, vec![bob.out(100)]);
    let parent_id = txp.submit_tx(parent.clone()).expect("parent");
    let child = spend(OutPoint::new(parent_id, 0), &bob, vec![carol.out(100)]);
    let child_id = txp.submit_tx(child).expect("child");
    assert_eq!(txp.mempool_txids().expect("ids"), vec![parent_id, child_id]);

    txp.adopt_block(&[0x01; 32], &[parent]).expect("adopt");
    assert_eq!(txp.mempool_txids().expect("ids"), vec![child_id]);
    let stored = txp
        .with_chain(|chain| chain.utxo_entry(&OutPoint::new(parent_id, 0)))
        .expect("lock")
        .expect("entry");
    assert_eq!(stored, Some(bob.out(100)));
}

#[test]
fn rollback_puts_block_transactions_ahead_of_the_pool() {
    let alice = Wallet::new(1);
    let bob = Wallet::new(2);
    let carol = Wallet::new(3);
    let txp = node(regtest(), &[(genesis_outpoint(0), alice.out(100))]);

    let parent = spend(genesis_outpoint(0), &alice, vec![bob.out(100)]);
    let parent_id = parent.txid();
    txp.adopt_block(&[0x01; 32], &[parent]).expect("adopt");
    let child = spend(OutPoint::new(parent_id, 0), &bob, vec![carol.out(100)]);
    let child_id = txp.submit_tx(child).expect("child");

    txp.rollback_block(&[0x01; 32]).expect("rollback");
    assert_eq!(txp.mempool_txids().expect("ids"), vec![parent_id, child_id]);
    let tip = txp.with_chain(|chain| chain.tip()).expect("lock").expect("tip");
    assert_eq!(tip, None);
    let total = txp
        .with_chain(|chain| chain.total_stake())
        .expect("lock")
        .expect("total");
    assert_eq!(total, 100);
}

#[test]
fn duplicate_and_overflowing_submissions_are_rejected() {
    let alice = Wallet::new(1);
    let bob = Wallet::new(2);
    let mut config = regtest();
    config.params.mempool_limit = 1;
    let txp = node(
        config,
        &[
            (genesis_outpoint(0), alice.out(10)),
            (genesis_outpoint(1), alice.out(20)),
        ],
    );

    let first = spend(genesis_outpoint(0), &alice, vec![bob.out(10)]);
    txp.submit_tx(first.clone()).expect("first");
    assert!(matches!(
        txp.submit_tx(first),
        Err(TxpError::Rejected(ToilVerFailure::AlreadyKnown))
    ));

    let second = spend(genesis_outpoint(1), &alice, vec![bob.out(20)]);
    assert!(matches!(
        txp.submit_tx(second),
        Err(TxpError::Rejected(ToilVerFailure::Overwhelmed { limit: 1 }))
    ));
    assert_eq!(txp.mempool_len().expect("len"), 1);
}

#[test]
fn pool_double_spend_is_rejected() {
    let alice = Wallet::new(1);
    let bob = Wallet::new(2);
    let carol = Wallet::new(3);
    let txp = node(regtest(), &[(genesis_outpoint(0), alice.out(50))]);

    txp.submit_tx(spend(genesis_outpoint(0), &alice, vec![bob.out(50)]))
        .expect("first spend");
    let conflict = spend(genesis_outpoint(0), &alice, vec![carol.out(50)]);
    assert!(matches!(
        txp.submit_tx(conflict),
        Err(TxpError::Rejected(ToilVerFailure::Verify(
            TxVerifyError::NotUnspent { index: 0, .. }
        )))
    ));
}

#[test]
fn rollback_requires_the_tip() {
    let alice = Wallet::new(1);
    let bob = Wallet::new(2);
    let txp = node(regtest(), &[(genesis_outpoint(0), alice.out(100))]);

    let first = spend(genesis_outpoint(0), &alice, vec![bob.out(100)]);
    let second = spend(OutPoint::new(first.txid(), 0), &bob, vec![alice.out(100)]);
    txp.adopt_block(&[0x01; 32], &[first]).expect("first block");
    txp.adopt_block(&[0x02; 32], &[second]).expect("second block");

    assert!(matches!(
        txp.rollback_block(&[0x01; 32]),
        Err(TxpError::Chain(ChainStateError::NotTip(_)))
    ));
    assert!(matches!(
        txp.rollback_block(&[0x09; 32]),
        Err(TxpError::Chain(ChainStateError::UnknownBlock(_)))
    ));
    txp.rollback_block(&[0x02; 32]).expect("rollback tip");
    txp.rollback_block(&[0x01; 32]).expect("rollback next");
}

#[test]
fn genesis_initializes_once_and_epoch_is_settable() {
    let alice = Wallet::new(1);
    let txp = node(regtest(), &[(genesis_outpoint(0), alice.out(1))]);
    assert!(matches!(
        txp.init_genesis(&[]),
        Err(TxpError::Chain(ChainStateError::GenesisExists))
    ));

    assert_eq!(txp.epoch().expect("epoch"), 0);
    txp.set_epoch(7).expect("set epoch");
    assert_eq!(txp.epoch().expect("epoch"), 7);
}

/// Memory store whose UTXO reads fail once armed and a batch is written.
#[derive(Default)]
struct FlakyStore {
    inner: MemoryStore,
    armed: AtomicBool,
    failing: AtomicBool,
}

impl FlakyStore {
    fn fail_utxo_reads_after_next_write(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }
}

impl KeyValueStore for FlakyStore {
    fn get(&self, column: Column, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        if column == Column::Utxo && self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("utxo read failed".to_string()));
        }
        self.inner.get(column, key)
    }

    fn scan_prefix(&self, column: Column, prefix: &[u8]) -> Result<ScanResult, StoreError> {
        self.inner.scan_prefix(column, prefix)
    }

    fn write_batch(&self, batch: &WriteBatch) -> Result<(), StoreError> {
        self.inner.write_batch(batch)?;
        if self.armed.load(Ordering::SeqCst) {
            self.failing.store(true, Ordering::SeqCst);
        }
        Ok(())
    }
}

#[test]
fn pool_survives_chain_view_failure_after_commit() {
    let alice = Wallet::new(1);
    let bob = Wallet::new(2);
    let store = Arc::new(FlakyStore::default());
    let txp = Txp::new(Arc::clone(&store), regtest());
    txp.init_genesis(&[(genesis_outpoint(0), alice.out(100))])
        .expect("genesis");
    let pending = txp
        .submit_tx(spend(genesis_outpoint(0), &alice, vec![bob.out(100)]))
        .expect("pending");

    store.fail_utxo_reads_after_next_write();
    txp.adopt_block(&[0x05; 32], &[]).expect("block committed");

    let tip = txp.with_chain(|chain| chain.tip()).expect("lock").expect("tip");
    assert_eq!(tip, Some([0x05; 32]));
    assert_eq!(txp.mempool_txids().expect("ids"), vec![pending]);

    txp.rollback_block(&[0x05; 32]).expect("rollback committed");
    assert_eq!(txp.mempool_txids().expect("ids"), vec![pending]);
    let tip = txp.with_chain(|chain| chain.tip()).expect("lock").expect("tip");
    assert_eq!(tip, None);
}
