//! Test nodes and accounts

use fc_04_chain::ManualTimeSource;
use fc_06_txbuilder::{sign_template, Destination, Source, Template};
use node_runtime::{Ledger, NodeConfig};
use shared_crypto::Secp256k1KeyPair;
use shared_types::script::{MultisigProgram, OP_TRUE};
use shared_types::{AssetId, Block, Outpoint, Tx};
use std::sync::Arc;

pub const START_MS: u64 = 1_000_000;

pub struct Node {
    pub ledger: Ledger,
    pub time: Arc<ManualTimeSource>,
}

pub struct Account {
    pub name: String,
    pub key: Secp256k1KeyPair,
    pub program: Vec<u8>,
}

pub fn federation(n: usize) -> Vec<Secp256k1KeyPair> {
    (0..n).map(|_| Secp256k1KeyPair::generate()).collect()
}

/// A node whose genesis is signed by `keys`. Nodes opened with the same
/// keys share a genesis block.
pub async fn node(keys: &[Secp256k1KeyPair]) -> Node {
    let mut config = NodeConfig::default();
    config.genesis.signer_keys = keys.iter().map(hex_key).collect();
    config.genesis.signatures_required = keys.len().div_ceil(2);

    let time = Arc::new(ManualTimeSource::new(START_MS));
    let ledger = Ledger::open(&config, time.clone()).await.unwrap();
    Node { ledger, time }
}

fn hex_key(key: &Secp256k1KeyPair) -> String {
    key.to_bytes().iter().map(|b| format!("{b:02x}")).collect()
}

pub fn account(name: &str) -> Account {
    let key = Secp256k1KeyPair::generate();
    let program = MultisigProgram::new(1, vec![key.public_key()])
        .to_program()
        .unwrap();
    Account {
        name: name.to_string(),
        key,
        program,
    }
}

impl Node {
    pub fn track(&self, account: &Account) {
        self.ledger
            .accounts
            .register_program(account.program.clone(), account.name.clone(), 0);
    }

    /// The asset issued by the always-true program on this chain.
    pub fn asset(&self) -> AssetId {
        AssetId::new(&[OP_TRUE], &self.ledger.builder.chain_id())
    }

    /// Issue `amount` to `to` and submit it to the pool.
    pub async fn issue(&self, to: &Account, amount: u64) -> Tx {
        let template = self
            .ledger
            .builder
            .build(
                &[Source::Issuance {
                    program: vec![OP_TRUE],
                    definition: br#"{"name":"test"}"#.to_vec(),
                    amount,
                }],
                &[Destination::new(self.asset(), amount, to.program.clone())],
                Vec::new(),
                None,
            )
            .await
            .unwrap();
        self.ledger
            .builder
            .submit(&self.ledger.chain, &template)
            .await
            .unwrap()
    }

    /// A signed template moving all of `outpoint` (worth `amount`) to `to`.
    pub async fn pay_from_utxo(
        &self,
        owner: &Account,
        outpoint: Outpoint,
        amount: u64,
        to: &Account,
    ) -> Template {
        let mut template = self
            .ledger
            .builder
            .build(
                &[Source::Utxo {
                    outpoint,
                    client_token: None,
                }],
                &[Destination::new(self.asset(), amount, to.program.clone())],
                Vec::new(),
                None,
            )
            .await
            .unwrap();
        sign_template(&mut template, std::slice::from_ref(&owner.key)).unwrap();
        template
    }

    pub async fn mine(&self) -> Block {
        self.time.advance(1_000);
        self.ledger
            .produce_block()
            .await
            .unwrap()
            .expect("pool should not be empty")
    }
}
