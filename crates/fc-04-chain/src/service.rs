//! Chain controller service

use crate::config::ChainConfig;
use crate::domain::pool::hash_set;
use crate::domain::{genesis_block, topological_order, GENESIS_HEIGHT};
use crate::error::{ChainError, Result};
use crate::ports::{ChainListener, Store, TimeSource, TxStatus};
use fc_02_state::{compose, MemView};
use fc_03_validation::{
    commit_state, tx_root, validate_and_apply_tx, validate_block, validate_tx, BlockParams,
    PredicateEngine, TxParams,
};
use parking_lot::RwLock;
use shared_crypto::Secp256k1PublicKey;
use shared_types::{Block, BlockHeader, Hash, Timestamp, Tx};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

/// The chain controller.
pub struct FedChain {
    store: Arc<dyn Store>,
    config: ChainConfig,
    trusted_signers: Vec<Secp256k1PublicKey>,
    engine: Arc<dyn PredicateEngine>,
    time: Arc<dyn TimeSource>,
    listeners: RwLock<Vec<Arc<dyn ChainListener>>>,
    genesis_hash: RwLock<Option<Hash>>,
    height: watch::Sender<u64>,
    /// Serializes every state-changing operation.
    write_lock: Mutex<()>,
}

impl FedChain {
    /// Open a controller over `store`, resuming from its latest block.
    pub async fn new(
        store: Arc<dyn Store>,
        config: ChainConfig,
        engine: Arc<dyn PredicateEngine>,
        time: Arc<dyn TimeSource>,
    ) -> Result<Self> {
        config.validate()?;
        let trusted_signers = config.trusted_keys()?;
        let height = store.latest_block().await?.map_or(0, |b| b.height());
        let genesis_hash = store
            .block_by_height(GENESIS_HEIGHT)
            .await?
            .map(|b| b.hash());

        info!(
            "[fc-04] Chain controller opened at height {} ({} trusted signers)",
            height,
            trusted_signers.len()
        );

        Ok(Self {
            store,
            config,
            trusted_signers,
            engine,
            time,
            listeners: RwLock::new(Vec::new()),
            genesis_hash: RwLock::new(genesis_hash),
            height: watch::channel(height).0,
            write_lock: Mutex::new(()),
        })
    }

    pub fn add_listener(&self, listener: Arc<dyn ChainListener>) {
        info!("[fc-04] Registered chain listener {}", listener.name());
        self.listeners.write().push(listener);
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// Height of the latest applied block (0 before genesis).
    pub fn height(&self) -> u64 {
        *self.height.borrow()
    }

    /// Receiver that observes every height change.
    pub fn subscribe_height(&self) -> watch::Receiver<u64> {
        self.height.subscribe()
    }

    /// Resolve once the chain reaches `height`.
    pub async fn wait_for_height(&self, height: u64) -> Result<()> {
        let mut rx = self.height.subscribe();
        rx.wait_for(|current| *current >= height)
            .await
            .map(|_| ())
            .map_err(|_| ChainError::Shutdown)
    }

    /// Hash of the genesis block, which is also the chain id.
    pub fn genesis_hash(&self) -> Result<Hash> {
        (*self.genesis_hash.read()).ok_or(ChainError::NoGenesis)
    }

    pub async fn latest_block(&self) -> Result<Block> {
        self.store.latest_block().await?.ok_or(ChainError::NoGenesis)
    }

    /// Create and apply the genesis block unless one already exists.
    ///
    /// Returns the stored genesis block either way.
    pub async fn upsert_genesis_block(
        &self,
        signers: &[Secp256k1PublicKey],
        signatures_required: usize,
        timestamp: Timestamp,
    ) -> Result<Block> {
        let _guard = self.write_lock.lock().await;

        if let Some(existing) = self.store.block_by_height(GENESIS_HEIGHT).await? {
            debug!("[fc-04] Genesis block already present: {}", existing.hash());
            return Ok(existing);
        }

        let block = genesis_block(signers, signatures_required, timestamp)?;
        let state = self.store.state_tree().await?;
        self.store
            .apply_block(&block, &Default::default(), &[], state)
            .await?;

        let hash = block.hash();
        *self.genesis_hash.write() = Some(hash);
        self.height.send_replace(GENESIS_HEIGHT);
        info!(
            "[fc-04] Created genesis block {} ({} of {} signers)",
            hash,
            signatures_required,
            signers.len()
        );
        Ok(block)
    }

    /// Build an unsigned candidate block from the pending pool.
    ///
    /// Returns the candidate and the block it extends. Pool transactions
    /// that do not validate at the candidate's timestamp are left out.
    pub async fn generate_block(&self, now: Timestamp) -> Result<(Block, Block)> {
        let prev = self.latest_block().await?;
        let genesis_hash = self.genesis_hash()?;

        let mut pool = topological_order(self.store.pool_txs().await?);
        pool.truncate(self.config.max_block_txs);

        let chain_view = self.store.new_view_for_prevouts(&pool).await?;
        let state = self.store.state_tree().await?;
        let timestamp = now.max(prev.header.timestamp);

        let params = TxParams::new(genesis_hash, timestamp, self.engine.as_ref());
        let mut view = compose(MemView::new(), vec![&*chain_view]);
        let mut included = Vec::with_capacity(pool.len());
        for tx in pool {
            match validate_and_apply_tx(&mut view, &tx, &params) {
                Ok(()) => included.push(tx),
                Err(reason) => debug!("[fc-04] Leaving {} out of block: {}", tx.hash(), reason),
            }
        }

        let delta = commit_state(state, view.into_overlay(), &included)?;
        let hashes: Vec<Hash> = included.iter().map(Tx::hash).collect();
        let header = BlockHeader {
            version: self.config.block_version,
            height: prev.header.height + 1,
            previous_block_hash: prev.hash(),
            tx_root: tx_root(&hashes),
            state_root: delta.state.root_hash(),
            timestamp,
            signature_script: Vec::new(),
            output_script: prev.header.output_script.clone(),
        };

        debug!(
            "[fc-04] Generated block candidate at height {} with {} txs",
            header.height,
            included.len()
        );
        Ok((
            Block {
                header,
                transactions: included,
            },
            prev,
        ))
    }

    /// Validate and apply `block`, then rebuild the pending pool.
    ///
    /// Returns the pool transactions the block made invalid.
    pub async fn add_block(&self, block: Block) -> Result<Vec<Tx>> {
        let _guard = self.write_lock.lock().await;

        let prev = self.latest_block().await?;
        let genesis_hash = self.genesis_hash()?;
        if block.height() <= prev.height() {
            return Err(ChainError::StaleTip {
                height: block.height(),
                tip: prev.height(),
            });
        }

        for tx in &block.transactions {
            if self.store.tx_status(&tx.hash()).await? == Some(TxStatus::Confirmed) {
                return Err(ChainError::TxAlreadyConfirmed { hash: tx.hash() });
            }
        }

        let chain_view = self.store.new_view_for_prevouts(&block.transactions).await?;
        let state = self.store.state_tree().await?;
        let params = BlockParams {
            genesis_hash,
            engine: self.engine.as_ref(),
            trusted_signers: &self.trusted_signers,
        };
        let delta = validate_block(&chain_view, state, &prev.header, &block, &params)?;
        drop(chain_view);

        let unseen = self
            .store
            .apply_block(&block, &delta.pointers, &delta.outputs, delta.state)
            .await?;
        self.height.send_replace(block.height());
        info!(
            "[fc-04] Applied block {} at height {} ({} txs{})",
            block.hash(),
            block.height(),
            block.transactions.len(),
            if delta.trusted { ", trusted" } else { "" }
        );

        // The block is stored; a failed cleanup leaves stale pool entries
        // for the next block to evict.
        let conflicting = match self.settle_pool(&block).await {
            Ok(conflicting) => conflicting,
            Err(e) => {
                warn!(
                    "[fc-04] Pool cleanup after block {} failed: {}",
                    block.height(),
                    e
                );
                Vec::new()
            }
        };
        if !conflicting.is_empty() {
            warn!(
                "[fc-04] Block {} evicted {} conflicting pool txs",
                block.height(),
                conflicting.len()
            );
        }

        for listener in self.listeners() {
            for tx in &unseen {
                if let Err(e) = listener.on_tx(tx).await {
                    warn!("[fc-04] Listener {} failed on tx {}: {}", listener.name(), tx.hash(), e);
                }
            }
            if let Err(e) = listener.on_block(&block, &conflicting).await {
                warn!(
                    "[fc-04] Listener {} failed on block {}: {}",
                    listener.name(),
                    block.height(),
                    e
                );
            }
        }

        Ok(conflicting)
    }

    /// Validate `tx` against the pool and confirmed state and admit it.
    ///
    /// Submitting a transaction that is already pending or confirmed
    /// succeeds without doing anything.
    pub async fn add_tx(&self, tx: Tx) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let hash = tx.hash();
        if let Some(status) = self.store.tx_status(&hash).await? {
            debug!("[fc-04] Transaction {} already known ({:?})", hash, status);
            return Ok(());
        }

        let genesis_hash = self.genesis_hash()?;
        let batch = std::slice::from_ref(&tx);
        let pool_view = self.store.new_pool_view_for_prevouts(batch).await?;
        let chain_view = self.store.new_view_for_prevouts(batch).await?;
        {
            let view = compose(MemView::new(), vec![&*pool_view, &*chain_view]);
            let params = TxParams::new(genesis_hash, self.time.now(), self.engine.as_ref());
            validate_tx(&view, &tx, &params)?;
        }

        self.store.apply_tx(&tx).await?;
        debug!("[fc-04] Admitted transaction {} to pool", hash);

        for listener in self.listeners() {
            if let Err(e) = listener.on_tx(&tx).await {
                warn!("[fc-04] Listener {} failed on tx {}: {}", listener.name(), hash, e);
            }
        }
        Ok(())
    }

    /// Drop what `block` confirmed or invalidated from the pool.
    async fn settle_pool(&self, block: &Block) -> Result<Vec<Tx>> {
        let (confirmed, conflicting) = self.rebuild_pool(block).await?;
        self.store.remove_txs(&confirmed, &conflicting).await?;
        Ok(conflicting)
    }

    /// Split the pool into transactions `block` confirmed, ones it made
    /// invalid, and (implicitly) the rest.
    async fn rebuild_pool(&self, block: &Block) -> Result<(Vec<Tx>, Vec<Tx>)> {
        let in_block = hash_set(&block.transactions);
        let (confirmed, pending): (Vec<Tx>, Vec<Tx>) = self
            .store
            .pool_txs()
            .await?
            .into_iter()
            .partition(|tx| in_block.contains(&tx.hash()));

        let chain_view = self.store.new_view_for_prevouts(&pending).await?;
        let params = TxParams::new(self.genesis_hash()?, self.time.now(), self.engine.as_ref());
        let mut view = compose(MemView::new(), vec![&*chain_view]);

        let mut conflicting = Vec::new();
        for tx in pending {
            if let Err(reason) = validate_and_apply_tx(&mut view, &tx, &params) {
                debug!("[fc-04] Pool tx {} no longer valid: {}", tx.hash(), reason);
                conflicting.push(tx);
            }
        }
        Ok((confirmed, conflicting))
    }

    fn listeners(&self) -> Vec<Arc<dyn ChainListener>> {
        self.listeners.read().clone()
    }
}
