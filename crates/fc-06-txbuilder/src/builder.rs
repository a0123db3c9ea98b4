//! Template construction and submission

use crate::domain::{assemble_signatures, Destination, Source, Template};
use crate::error::{BuildError, Result};
use fc_04_chain::{FedChain, TimeSource};
use fc_05_utxodb::{ReservationId, ReserverConfig, UtxoReserver};
use shared_types::{Hash, Tx};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Builds templates against one chain, reserving inputs as it goes.
pub struct TxBuilder {
    reserver: Arc<dyn UtxoReserver>,
    chain_id: Hash,
    time: Arc<dyn TimeSource>,
    config: ReserverConfig,
}

impl TxBuilder {
    pub fn new(
        reserver: Arc<dyn UtxoReserver>,
        chain_id: Hash,
        time: Arc<dyn TimeSource>,
        config: ReserverConfig,
    ) -> Self {
        Self {
            reserver,
            chain_id,
            time,
            config,
        }
    }

    pub fn chain_id(&self) -> Hash {
        self.chain_id
    }

    /// Build an unsigned template spending `sources` into `destinations`.
    ///
    /// Account sources add a change output when their reservation
    /// overshoots. If any step fails, reservations taken so far are
    /// released before the error is returned.
    pub async fn build(
        &self,
        sources: &[Source],
        destinations: &[Destination],
        metadata: Vec<u8>,
        ttl_ms: Option<u64>,
    ) -> Result<Template> {
        let mut template = Template::new(self.chain_id);
        template.unsigned_tx.metadata = metadata;

        match self
            .fill(&mut template, sources, destinations, ttl_ms)
            .await
        {
            Ok(()) => {
                debug!(
                    "[fc-06] Built template with {} inputs, {} outputs",
                    template.unsigned_tx.inputs.len(),
                    template.unsigned_tx.outputs.len()
                );
                Ok(template)
            }
            Err(e) => {
                self.release(&template.reservations).await;
                Err(e)
            }
        }
    }

    async fn fill(
        &self,
        template: &mut Template,
        sources: &[Source],
        destinations: &[Destination],
        ttl_ms: Option<u64>,
    ) -> Result<()> {
        if sources.is_empty() {
            return Err(BuildError::BadTemplate("no sources".into()));
        }
        let expiry = self.config.expiry(self.time.now(), ttl_ms);

        let mut change = Vec::new();
        for source in sources {
            let reserved = source
                .reserve(self.reserver.as_ref(), self.chain_id, expiry)
                .await?;
            template.reservations.extend(reserved.reservation);
            for (input, instruction) in reserved.inputs {
                template.unsigned_tx.inputs.push(input);
                template.signing_instructions.push(instruction);
            }
            change.extend(reserved.change);
        }

        template
            .unsigned_tx
            .outputs
            .extend(destinations.iter().chain(&change).map(Destination::to_output));
        template.compute_sig_hashes()
    }

    /// Release the reservations behind an abandoned template.
    pub async fn cancel(&self, template: &Template) {
        self.release(&template.reservations).await;
    }

    /// Assemble a signed template and hand it to the chain.
    ///
    /// A rejected transaction releases its reservations; other failures
    /// leave them in place so the caller can retry.
    pub async fn submit(&self, chain: &FedChain, template: &Template) -> Result<Tx> {
        let expected = chain.genesis_hash()?;
        if template.chain_id != expected {
            return Err(BuildError::ChainMismatch {
                expected,
                actual: template.chain_id,
            });
        }

        let tx = assemble_signatures(template)?;
        match chain.add_tx(tx.clone()).await {
            Ok(()) => {
                info!("[fc-06] Submitted tx {}", tx.hash());
                Ok(tx)
            }
            Err(e) => {
                if e.is_rejection() {
                    warn!("[fc-06] Tx {} rejected: {}", tx.hash(), e);
                    self.release(&template.reservations).await;
                }
                Err(e.into())
            }
        }
    }

    async fn release(&self, ids: &[ReservationId]) {
        for id in ids {
            if let Err(e) = self.reserver.cancel(*id).await {
                warn!("[fc-06] Failed to release reservation {}: {}", id, e);
            }
        }
    }
}
