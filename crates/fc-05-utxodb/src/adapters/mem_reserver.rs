//! In-process reserver

use crate::domain::{select_utxos, IdempotencyGroup, Reservation, ReservationId, Source, Utxo};
use crate::error::{ReserveError, Result};
use crate::ports::{UtxoReserver, UtxoStore};
use async_trait::async_trait;
use fc_04_chain::TimeSource;
use parking_lot::Mutex;
use shared_types::{Outpoint, Timestamp};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Default)]
struct SourceState {
    /// Last fetched candidates, ascending by outpoint.
    cached: BTreeMap<Outpoint, Utxo>,
    /// Bumped on every completed fetch.
    generation: u64,
    reserved: HashMap<Outpoint, ReservationId>,
}

/// Reservation state of one (asset, account) source.
struct SourceReserver {
    state: Mutex<SourceState>,
    /// Held while fetching candidates so concurrent callers share one fetch.
    refill: tokio::sync::Mutex<()>,
}

impl SourceReserver {
    fn new() -> Self {
        Self {
            state: Mutex::new(SourceState::default()),
            refill: tokio::sync::Mutex::new(()),
        }
    }

    /// Refresh the candidate cache, joining a fetch already in flight.
    async fn refresh(&self, source: &Source, store: &dyn UtxoStore) -> Result<()> {
        let seen = self.state.lock().generation;
        let _flight = self.refill.lock().await;
        if self.state.lock().generation != seen {
            return Ok(());
        }

        let utxos = store.unspent_utxos(source).await?;
        let mut state = self.state.lock();
        state.cached = utxos.into_iter().map(|u| (u.outpoint, u)).collect();
        state.generation += 1;
        Ok(())
    }

    fn release(&self, id: ReservationId, utxos: &[Utxo]) {
        let mut state = self.state.lock();
        for utxo in utxos {
            if state.reserved.get(&utxo.outpoint) == Some(&id) {
                state.reserved.remove(&utxo.outpoint);
            }
        }
    }
}

#[derive(Default)]
struct ReservationBook {
    by_id: HashMap<ReservationId, Arc<Reservation>>,
    by_expiry: BTreeSet<(Timestamp, ReservationId)>,
}

impl ReservationBook {
    fn insert(&mut self, reservation: Arc<Reservation>) {
        self.by_expiry.insert((reservation.expiry, reservation.id));
        self.by_id.insert(reservation.id, reservation);
    }

    fn remove(&mut self, id: ReservationId) -> Option<Arc<Reservation>> {
        let reservation = self.by_id.remove(&id)?;
        self.by_expiry.remove(&(reservation.expiry, id));
        Some(reservation)
    }

    fn take_expired(&mut self, now: Timestamp) -> Vec<Arc<Reservation>> {
        let due: Vec<ReservationId> = self
            .by_expiry
            .iter()
            .take_while(|(expiry, _)| *expiry <= now)
            .map(|(_, id)| *id)
            .collect();
        due.into_iter().filter_map(|id| self.remove(id)).collect()
    }
}

/// Reserver keeping all reservation state in memory.
pub struct MemReserver {
    store: Arc<dyn UtxoStore>,
    time: Arc<dyn TimeSource>,
    next_id: AtomicU64,
    book: Mutex<ReservationBook>,
    sources: Mutex<HashMap<Source, Arc<SourceReserver>>>,
    idempotency: IdempotencyGroup<Arc<Reservation>>,
}

impl MemReserver {
    pub fn new(store: Arc<dyn UtxoStore>, time: Arc<dyn TimeSource>) -> Self {
        Self {
            store,
            time,
            next_id: AtomicU64::new(1),
            book: Mutex::new(ReservationBook::default()),
            sources: Mutex::new(HashMap::new()),
            idempotency: IdempotencyGroup::new(),
        }
    }

    /// Live reservation by id.
    pub fn reservation(&self, id: ReservationId) -> Option<Arc<Reservation>> {
        self.book.lock().by_id.get(&id).cloned()
    }

    /// Number of live reservations.
    pub fn len(&self) -> usize {
        self.book.lock().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn source(&self, source: &Source) -> Arc<SourceReserver> {
        self.sources
            .lock()
            .entry(source.clone())
            .or_insert_with(|| Arc::new(SourceReserver::new()))
            .clone()
    }

    fn record(&self, reservation: Reservation) -> Arc<Reservation> {
        let reservation = Arc::new(reservation);
        self.book.lock().insert(reservation.clone());
        debug!(
            "[fc-05] Reservation {} holds {} UTXOs of {}/{} until {}",
            reservation.id,
            reservation.utxos.len(),
            reservation.source.account_id,
            reservation.source.asset_id,
            reservation.expiry
        );
        reservation
    }

    /// Release a reservation already removed from the book.
    fn release(&self, reservation: &Reservation) {
        self.source(&reservation.source)
            .release(reservation.id, &reservation.utxos);
        if let Some(token) = &reservation.client_token {
            self.idempotency
                .forget_if(token, |remembered| remembered.id == reservation.id);
        }
    }

    async fn select(
        &self,
        source: &Source,
        amount: u64,
        client_token: Option<&str>,
        expiry: Timestamp,
    ) -> Result<Arc<Reservation>> {
        let reserver = self.source(source);
        reserver.refresh(source, self.store.as_ref()).await?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let reservation = {
            let mut state = reserver.state.lock();
            let selection = select_utxos(state.cached.values(), amount, |op| {
                state.reserved.contains_key(op)
            })?;
            for utxo in &selection.utxos {
                state.reserved.insert(utxo.outpoint, id);
            }
            Reservation {
                id,
                source: source.clone(),
                utxos: selection.utxos,
                change: selection.change,
                expiry,
                client_token: client_token.map(str::to_owned),
            }
        };
        Ok(self.record(reservation))
    }

    async fn select_one(
        &self,
        outpoint: &Outpoint,
        client_token: Option<&str>,
        expiry: Timestamp,
    ) -> Result<Arc<Reservation>> {
        let utxo = self
            .store
            .utxo(outpoint)
            .await?
            .ok_or(ReserveError::UtxoNotFound(*outpoint))?;
        let source = utxo.source();
        let reserver = self.source(&source);

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        {
            let mut state = reserver.state.lock();
            if state.reserved.contains_key(outpoint) {
                return Err(ReserveError::Reserved {
                    requested: utxo.amount,
                    unreserved: 0,
                });
            }
            state.reserved.insert(*outpoint, id);
        }
        Ok(self.record(Reservation {
            id,
            source,
            change: 0,
            utxos: vec![utxo],
            expiry,
            client_token: client_token.map(str::to_owned),
        }))
    }

    /// Run `attempt` under the idempotency group when a token is given.
    ///
    /// A remembered reservation that has already expired is released on the
    /// spot, before the sweep reaches it, and the request runs again.
    async fn dedupe<F, Fut>(
        &self,
        client_token: Option<&str>,
        attempt: F,
    ) -> Result<Arc<Reservation>>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<Arc<Reservation>>>,
    {
        let Some(token) = client_token else {
            return attempt().await;
        };
        let reservation = self.idempotency.run(token, &attempt).await?;
        if !reservation.is_expired(self.time.now()) {
            return Ok(reservation);
        }
        let stale = self.book.lock().remove(reservation.id);
        if let Some(stale) = stale {
            self.release(&stale);
        }
        self.idempotency
            .forget_if(token, |remembered| remembered.id == reservation.id);
        self.idempotency.run(token, &attempt).await
    }
}

#[async_trait]
impl UtxoReserver for MemReserver {
    async fn reserve(
        &self,
        source: &Source,
        amount: u64,
        client_token: Option<&str>,
        expiry: Timestamp,
    ) -> Result<Arc<Reservation>> {
        self.dedupe(client_token, || self.select(source, amount, client_token, expiry))
            .await
    }

    async fn reserve_utxo(
        &self,
        outpoint: &Outpoint,
        client_token: Option<&str>,
        expiry: Timestamp,
    ) -> Result<Arc<Reservation>> {
        self.dedupe(client_token, || self.select_one(outpoint, client_token, expiry))
            .await
    }

    async fn cancel(&self, id: ReservationId) -> Result<()> {
        let removed = self.book.lock().remove(id);
        if let Some(reservation) = removed {
            self.release(&reservation);
            debug!("[fc-05] Canceled reservation {}", id);
        }
        Ok(())
    }

    async fn expire_reservations(&self) -> Result<usize> {
        let expired = self.book.lock().take_expired(self.time.now());
        for reservation in &expired {
            self.release(reservation);
        }
        if !expired.is_empty() {
            info!("[fc-05] Expired {} reservations", expired.len());
        }
        Ok(expired.len())
    }
}
