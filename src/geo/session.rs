//! Single-slot geocoding session
//!
//! The geocoding backend accepts one outstanding query per session. Starting
//! a lookup cancels whatever lookup currently holds the slot.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::GeocodeFailure;

struct InFlight {
    id: u64,
    token: CancellationToken,
}

/// Cancel-and-replace slot shared by all lookups of one resolver
#[derive(Default)]
pub struct GeocodingSession {
    next_id: AtomicU64,
    in_flight: Mutex<Option<InFlight>>,
}

impl GeocodingSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a lookup currently holds the slot
    #[must_use]
    pub fn is_geocoding(&self) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Run `lookup` in the slot, cancelling any previous occupant
    pub async fn run<F, T>(&self, lookup: F) -> Result<T, GeocodeFailure>
    where
        F: Future<Output = Result<T, GeocodeFailure>>,
    {
        let (id, token) = self.begin();

        let result = tokio::select! {
            biased;
            () = token.cancelled() => Err(GeocodeFailure::Cancelled),
            result = lookup => result,
        };

        self.finish(id);
        result
    }

    fn begin(&self) -> (u64, CancellationToken) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();

        let mut slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = slot.replace(InFlight {
            id,
            token: token.clone(),
        }) {
            debug!(previous = previous.id, current = id, "Cancelling in-flight geocode");
            previous.token.cancel();
        }

        (id, token)
    }

    fn finish(&self, id: u64) {
        let mut slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|current| current.id == id) {
            *slot = None;
        }
    }
}
