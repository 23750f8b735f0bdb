//! Device location abstraction for carpath.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::EnvError;
use crate::types::LocationUpdate;

/// Push stream of fixes (or errors) from the location service.
pub type LocationStream = mpsc::Receiver<Result<LocationUpdate, EnvError>>;

/// Authorization state for device location access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationStatus {
    /// The user has not been asked yet
    NotDetermined,
    /// Access blocked by policy (parental controls, MDM)
    Restricted,
    /// The user refused access
    Denied,
    /// Access granted while the app is in use
    AuthorizedWhenInUse,
    /// Access granted at all times
    AuthorizedAlways,
}

impl AuthorizationStatus {
    pub fn is_authorized(&self) -> bool {
        matches!(self, Self::AuthorizedWhenInUse | Self::AuthorizedAlways)
    }
}

/// Abstraction over the platform location service.
///
/// # Implementations
///
/// - **Production**: platform bridge (outside this workspace)
/// - **Simulation**: `SimLocationService` with scripted authorization and fixes
///
/// # Update Flow
///
/// ```text
/// LocationService            LocationBridge            JourneyController
///   |                            |                            |
///   |-- subscribe() ------------>|                            |
///   |-- Ok(update) ------------->|-- JourneyEvent::Location ->|
///   |-- Err(PermissionDenied) -->|-- JourneyEvent::Location ->|  (logged)
/// ```
#[async_trait]
pub trait LocationService: Send + Sync + 'static {
    /// Returns the current authorization status without prompting.
    fn authorization_status(&self) -> AuthorizationStatus;

    /// Prompts for "when in use" authorization and returns the outcome.
    async fn request_authorization(&self) -> AuthorizationStatus;

    /// Starts location updates.
    ///
    /// # Returns
    /// * `Ok(stream)` - Updates will be pushed until the service stops
    /// * `Err(EnvError::PermissionDenied)` - Not authorized
    fn subscribe(&self) -> Result<LocationStream, EnvError>;
}
