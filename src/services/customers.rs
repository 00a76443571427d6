use std::collections::HashSet;
use std::sync::{Mutex, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::models::CustomerRecord;
use crate::services::backend::BookingBackend;

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("an operation is already in flight for booking {0}")]
    AlreadyInFlight(i64),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// One fully loaded view of the owner's customers. Replaced wholesale on
/// every reload; nothing ever patches it in place.
#[derive(Debug, Clone, Serialize)]
pub struct DirectorySnapshot {
    pub active: Vec<CustomerRecord>,
    pub history: Vec<CustomerRecord>,
    pub loaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DirectoryEvent {
    Reloaded { active: usize, history: usize },
    CheckedOut { booking_id: i64 },
    Hidden { booking_id: i64 },
}

/// The customer lifecycle view-model behind the owner's management screen.
///
/// Owns the active/history projections and the per-booking in-flight
/// bookkeeping. All authoritative state lives in the backend; every load is
/// a fresh pair of queries and every transition is followed by a full
/// reload rather than a local patch.
pub struct CustomerDirectory {
    backend: Box<dyn BookingBackend>,
    settle_delay: Duration,
    snapshot: RwLock<Option<DirectorySnapshot>>,
    in_flight: Mutex<HashSet<i64>>,
    events_tx: broadcast::Sender<DirectoryEvent>,
}

/// Releases the in-flight slot for a booking on every exit path.
#[derive(Debug)]
struct TransitionGuard<'a> {
    in_flight: &'a Mutex<HashSet<i64>>,
    booking_id: i64,
}

impl Drop for TransitionGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.lock().unwrap().remove(&self.booking_id);
    }
}

impl CustomerDirectory {
    pub fn new(
        backend: Box<dyn BookingBackend>,
        settle_delay: Duration,
        events_tx: broadcast::Sender<DirectoryEvent>,
    ) -> Self {
        Self {
            backend,
            settle_delay,
            snapshot: RwLock::new(None),
            in_flight: Mutex::new(HashSet::new()),
            events_tx,
        }
    }

    /// Fetch both lists concurrently, map them through the customer
    /// projection, and publish the result as the new snapshot. Either fetch
    /// failing fails the whole load and leaves the previous snapshot
    /// untouched.
    pub async fn reload(&self) -> Result<DirectorySnapshot, DirectoryError> {
        let (active_raw, history_raw) =
            tokio::try_join!(self.backend.fetch_active(), self.backend.fetch_history())?;

        let snapshot = DirectorySnapshot {
            active: active_raw.iter().map(CustomerRecord::from).collect(),
            history: history_raw.iter().map(CustomerRecord::from).collect(),
            loaded_at: Utc::now(),
        };

        *self.snapshot.write().unwrap() = Some(snapshot.clone());

        // Broadcast to SSE subscribers; ignore if no receivers
        let _ = self.events_tx.send(DirectoryEvent::Reloaded {
            active: snapshot.active.len(),
            history: snapshot.history.len(),
        });

        Ok(snapshot)
    }

    /// Last published snapshot, if any load has completed yet.
    pub fn last_snapshot(&self) -> Option<DirectorySnapshot> {
        self.snapshot.read().unwrap().clone()
    }

    /// End an active rental. The backend stamps the check-out server-side;
    /// a bounded settling delay runs before re-querying so a racing read
    /// does not show the record still active.
    pub async fn check_out(&self, booking_id: i64) -> Result<(), DirectoryError> {
        let _guard = self.begin_transition(booking_id)?;

        self.backend.check_out(booking_id).await?;
        tokio::time::sleep(self.settle_delay).await;
        self.reload().await?;

        let _ = self.events_tx.send(DirectoryEvent::CheckedOut { booking_id });
        tracing::info!(booking_id, "customer checked out");
        Ok(())
    }

    /// Drop a closed booking from this owner's history view. Soft delete on
    /// the backend side; the underlying booking survives.
    pub async fn hide_from_owner(&self, booking_id: i64) -> Result<(), DirectoryError> {
        let _guard = self.begin_transition(booking_id)?;

        self.backend.hide_from_owner(booking_id).await?;
        self.reload().await?;

        let _ = self.events_tx.send(DirectoryEvent::Hidden { booking_id });
        tracing::info!(booking_id, "customer hidden from history");
        Ok(())
    }

    /// Claim the in-flight slot for a booking. Transitions on distinct
    /// bookings may overlap; a second transition on the same booking is
    /// rejected until the first finishes.
    fn begin_transition(&self, booking_id: i64) -> Result<TransitionGuard<'_>, DirectoryError> {
        let mut in_flight = self.in_flight.lock().unwrap();
        if !in_flight.insert(booking_id) {
            return Err(DirectoryError::AlreadyInFlight(booking_id));
        }
        Ok(TransitionGuard {
            in_flight: &self.in_flight,
            booking_id,
        })
    }
}

/// Client-side narrowing of the mapped projections. Operates on copies;
/// the snapshot itself is never filtered in place.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerFilter {
    pub search: Option<String>,
    pub status: Option<String>,
}

impl CustomerFilter {
    pub fn matches(&self, customer: &CustomerRecord) -> bool {
        if let Some(search) = normalized(self.search.as_deref()) {
            let needle = search.to_lowercase();
            let hit = [
                &customer.renter_name,
                &customer.email,
                &customer.property_name,
            ]
            .iter()
            .any(|field| field.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }

        if let Some(status) = normalized(self.status.as_deref()) {
            if !customer.status.eq_ignore_ascii_case(status) {
                return false;
            }
        }

        true
    }
}

fn normalized(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

pub fn apply_filter(customers: &[CustomerRecord], filter: &CustomerFilter) -> Vec<CustomerRecord> {
    customers
        .iter()
        .filter(|c| filter.matches(c))
        .cloned()
        .collect()
}
