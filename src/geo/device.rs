//! Device location
//!
//! Location sources report fixes through a delegate, the way platform
//! location services do. `DeviceLocator` turns that callback stream into a
//! single-slot request/response channel: a new request replaces the pending
//! one, and the replaced caller is always resolved (with the last known fix
//! or the sentinel), never left waiting.

use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::config::{LocationConfig, LocationProvider};
use crate::error::LocationError;
use crate::http;
use crate::models::Coordinate;

/// Permission state of a location source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationStatus {
    Authorized,
    Denied,
}

/// A platform-style location capability with callback delivery
pub trait LocationSource: Send + Sync {
    fn authorization_status(&self) -> AuthorizationStatus;

    /// Begin delivering fixes to `delegate`
    fn start_updating(&self, delegate: LocationDelegate);

    /// Tear down the live location session
    fn stop_updating(&self);
}

type FixResult = Result<Coordinate, LocationError>;

struct PendingFix {
    id: u64,
    reply: oneshot::Sender<FixResult>,
}

#[derive(Default)]
struct FixSlot {
    pending: Mutex<Option<PendingFix>>,
    last_fix: Mutex<Option<Coordinate>>,
}

impl FixSlot {
    fn take_pending(&self) -> Option<PendingFix> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner).take()
    }

    fn is_idle(&self) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    fn last_fix(&self) -> Option<Coordinate> {
        *self.last_fix.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn remember(&self, coord: Coordinate) {
        *self.last_fix.lock().unwrap_or_else(PoisonError::into_inner) = Some(coord);
    }
}

/// Callback handle given to a [`LocationSource`]
#[derive(Clone)]
pub struct LocationDelegate {
    slot: Arc<FixSlot>,
}

impl LocationDelegate {
    /// Deliver one or more fixes; the first one answers the pending request
    pub fn did_update_locations(&self, locations: &[Coordinate]) {
        let Some(coord) = locations.first().copied() else {
            return;
        };
        self.slot.remember(coord);
        if let Some(pending) = self.slot.take_pending() {
            let _ = pending.reply.send(Ok(coord));
        }
    }

    /// Report that no fix can be produced
    pub fn did_fail(&self, error: LocationError) {
        if let Some(pending) = self.slot.take_pending() {
            let _ = pending.reply.send(Err(error));
        }
    }
}

/// Waits for a device fix with a timeout, degrading to the sentinel
pub struct DeviceLocator {
    source: Arc<dyn LocationSource>,
    slot: Arc<FixSlot>,
    next_id: AtomicU64,
    timeout: Duration,
}

impl DeviceLocator {
    pub fn new(source: Arc<dyn LocationSource>, timeout: Duration) -> Self {
        Self {
            source,
            slot: Arc::new(FixSlot::default()),
            next_id: AtomicU64::new(0),
            timeout,
        }
    }

    /// Build the configured location source
    pub fn from_config(config: &LocationConfig) -> anyhow::Result<Self> {
        let source: Arc<dyn LocationSource> = match config.provider {
            LocationProvider::Ip => Arc::new(IpLocationSource::new(
                http::build_client(config.timeout(), 0)?,
                config.ip_lookup_url.clone(),
            )),
            LocationProvider::Static => Arc::new(StaticLocationSource::new(
                match (config.latitude, config.longitude) {
                    (Some(lat), Some(lon)) => Some(Coordinate::new(lat, lon)),
                    _ => None,
                },
            )),
            LocationProvider::Disabled => Arc::new(StaticLocationSource::new(None)),
        };
        Ok(Self::new(source, config.timeout()))
    }

    /// Current device coordinate, or the sentinel when unavailable
    #[instrument(skip(self))]
    pub async fn current_location(&self) -> Coordinate {
        match self.request_fix().await {
            Ok(coord) => {
                debug!("Device location fix: {}", coord);
                coord
            }
            Err(e) => {
                warn!(error = %e, "Device location unavailable, using sentinel");
                Coordinate::SENTINEL
            }
        }
    }

    async fn request_fix(&self) -> FixResult {
        if self.source.authorization_status() == AuthorizationStatus::Denied {
            return Err(LocationError::PermissionDenied);
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (reply, receiver) = oneshot::channel();

        let displaced = self
            .slot
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(PendingFix { id, reply });

        if let Some(previous) = displaced {
            debug!(previous = previous.id, current = id, "Replacing pending location request");
            let answer = self.slot.last_fix().ok_or(LocationError::Superseded);
            let _ = previous.reply.send(answer);
        }

        self.source.start_updating(LocationDelegate {
            slot: Arc::clone(&self.slot),
        });

        let result = match tokio::time::timeout(self.timeout, receiver).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(LocationError::Unavailable("location session closed".into())),
            Err(_) => {
                self.abandon(id);
                Err(LocationError::Timeout(self.timeout.as_secs()))
            }
        };

        if self.slot.is_idle() {
            self.source.stop_updating();
        }

        result
    }

    fn abandon(&self, id: u64) {
        let mut pending = self.slot.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if pending.as_ref().is_some_and(|p| p.id == id) {
            *pending = None;
        }
    }
}

/// Fixed coordinate from configuration; denied when none is configured
pub struct StaticLocationSource {
    coordinate: Option<Coordinate>,
}

impl StaticLocationSource {
    #[must_use]
    pub fn new(coordinate: Option<Coordinate>) -> Self {
        Self { coordinate }
    }
}

impl LocationSource for StaticLocationSource {
    fn authorization_status(&self) -> AuthorizationStatus {
        if self.coordinate.is_some() {
            AuthorizationStatus::Authorized
        } else {
            AuthorizationStatus::Denied
        }
    }

    fn start_updating(&self, delegate: LocationDelegate) {
        match self.coordinate {
            Some(coord) => delegate.did_update_locations(&[coord]),
            None => delegate.did_fail(LocationError::PermissionDenied),
        }
    }

    fn stop_updating(&self) {}
}

/// Approximate location from an IP geolocation service
pub struct IpLocationSource {
    client: ClientWithMiddleware,
    url: String,
    task: Mutex<Option<JoinHandle<()>>>,
}

#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    status: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
    city: Option<String>,
    message: Option<String>,
}

impl IpLookupResponse {
    fn into_fix(self) -> FixResult {
        if self.status.as_deref().is_some_and(|s| s != "success") {
            return Err(LocationError::Unavailable(
                self.message.unwrap_or_else(|| "IP lookup failed".into()),
            ));
        }
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => Coordinate::new(lat, lon)
                .resolved()
                .ok_or_else(|| LocationError::Unavailable("IP lookup returned (0, 0)".into())),
            _ => Err(LocationError::Unavailable("IP lookup returned no coordinate".into())),
        }
    }
}

impl IpLocationSource {
    pub fn new(client: ClientWithMiddleware, url: String) -> Self {
        Self {
            client,
            url,
            task: Mutex::new(None),
        }
    }

    async fn lookup(client: ClientWithMiddleware, url: String) -> FixResult {
        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| LocationError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(LocationError::Unavailable(format!(
                "IP lookup returned status {}",
                response.status()
            )));
        }

        let body: IpLookupResponse = response
            .json()
            .await
            .map_err(|e| LocationError::Unavailable(e.to_string()))?;

        if let Some(city) = &body.city {
            info!("IP geolocation resolved near {}", city);
        }
        body.into_fix()
    }
}

impl LocationSource for IpLocationSource {
    fn authorization_status(&self) -> AuthorizationStatus {
        AuthorizationStatus::Authorized
    }

    fn start_updating(&self, delegate: LocationDelegate) {
        let mut task = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        if task.as_ref().is_some_and(|t| !t.is_finished()) {
            return;
        }

        let client = self.client.clone();
        let url = self.url.clone();
        *task = Some(tokio::spawn(async move {
            match Self::lookup(client, url).await {
                Ok(coord) => delegate.did_update_locations(&[coord]),
                Err(e) => delegate.did_fail(e),
            }
        }));
    }

    fn stop_updating(&self) {
        if let Some(task) = self.task.lock().unwrap_or_else(PoisonError::into_inner).take() {
            task.abort();
        }
    }
}
