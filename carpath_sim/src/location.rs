//! Simulated location service with scripted authorization and fixes.

use async_trait::async_trait;
use carpath_env::{AuthorizationStatus, EnvError, LocationService, LocationStream, LocationUpdate};
use std::sync::Mutex;
use tokio::sync::mpsc;

/// Capacity of the update stream handed to subscribers.
const STREAM_CAPACITY: usize = 1024;

/// Location service whose answers are decided by the scenario.
pub struct SimLocationService {
    /// Current authorization state
    status: Mutex<AuthorizationStatus>,

    /// What the "user" answers when prompted
    prompt_answer: AuthorizationStatus,

    /// Number of authorization prompts shown
    prompts: Mutex<u32>,

    /// Sender side of the active subscription
    feed: Mutex<Option<mpsc::Sender<Result<LocationUpdate, EnvError>>>>,
}

impl SimLocationService {
    /// Creates a service in `status` that answers prompts with `prompt_answer`.
    pub fn new(status: AuthorizationStatus, prompt_answer: AuthorizationStatus) -> Self {
        Self {
            status: Mutex::new(status),
            prompt_answer,
            prompts: Mutex::new(0),
            feed: Mutex::new(None),
        }
    }

    /// Undecided user who grants "when in use" access.
    pub fn granting() -> Self {
        Self::new(AuthorizationStatus::NotDetermined, AuthorizationStatus::AuthorizedWhenInUse)
    }

    /// Undecided user who refuses access.
    pub fn denying() -> Self {
        Self::new(AuthorizationStatus::NotDetermined, AuthorizationStatus::Denied)
    }

    /// Number of times authorization was requested.
    pub fn prompt_count(&self) -> u32 {
        *self.prompts.lock().unwrap()
    }

    /// Pushes a fix to the subscriber. Returns false if nobody listens.
    pub fn push_fix(&self, update: LocationUpdate) -> bool {
        self.push(Ok(update))
    }

    /// Pushes an error to the subscriber. Returns false if nobody listens.
    pub fn push_error(&self, error: EnvError) -> bool {
        self.push(Err(error))
    }

    fn push(&self, item: Result<LocationUpdate, EnvError>) -> bool {
        let feed = self.feed.lock().unwrap();
        match feed.as_ref() {
            Some(tx) => tx.try_send(item).is_ok(),
            None => false,
        }
    }

    /// Ends the active subscription.
    #[cfg(test)]
    pub fn stop(&self) {
        self.feed.lock().unwrap().take();
    }
}

#[async_trait]
impl LocationService for SimLocationService {
    fn authorization_status(&self) -> AuthorizationStatus {
        *self.status.lock().unwrap()
    }

    async fn request_authorization(&self) -> AuthorizationStatus {
        *self.prompts.lock().unwrap() += 1;
        let mut status = self.status.lock().unwrap();
        *status = self.prompt_answer;
        *status
    }

    fn subscribe(&self) -> Result<LocationStream, EnvError> {
        if !self.authorization_status().is_authorized() {
            return Err(EnvError::PermissionDenied);
        }
        let (tx, rx) = mpsc::channel(STREAM_CAPACITY);
        *self.feed.lock().unwrap() = Some(tx);
        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carpath_env::Coordinate;
    use std::time::SystemTime;

    #[tokio::test]
    async fn test_granting_user() {
        let service = SimLocationService::granting();
        assert_eq!(service.authorization_status(), AuthorizationStatus::NotDetermined);
        assert!(service.subscribe().is_err());

        let status = service.request_authorization().await;
        assert!(status.is_authorized());
        assert_eq!(service.prompt_count(), 1);

        let mut rx = service.subscribe().unwrap();
        let fix = LocationUpdate::new(Coordinate::new(1.0, 1.0), SystemTime::UNIX_EPOCH);
        assert!(service.push_fix(fix));
        assert!(service.push_error(EnvError::location("tunnel")));

        assert_eq!(rx.recv().await.unwrap().unwrap(), fix);
        assert!(rx.recv().await.unwrap().is_err());

        service.stop();
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_denying_user() {
        let service = SimLocationService::denying();
        let status = service.request_authorization().await;

        assert_eq!(status, AuthorizationStatus::Denied);
        assert_eq!(service.subscribe().unwrap_err(), EnvError::PermissionDenied);
        let fix = LocationUpdate::new(Coordinate::new(0.0, 0.0), SystemTime::UNIX_EPOCH);
        assert!(!service.push_fix(fix));
    }
}
