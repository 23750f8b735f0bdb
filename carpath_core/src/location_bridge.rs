//! Location bridge - authorization handshake and update forwarding.

use std::sync::Arc;

use carpath_env::{AuthorizationStatus, DriveContext, EnvError, LocationService};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::journey_runtime::JourneyEvent;

/// Forwards device location into the journey owner's event channel.
pub struct LocationBridge<L: LocationService> {
    service: Arc<L>,
}

impl<L: LocationService> LocationBridge<L> {
    pub fn new(service: Arc<L>) -> Self {
        Self { service }
    }

    /// Makes sure location access is granted, prompting once if undecided.
    pub async fn ensure_authorized(&self) -> Result<AuthorizationStatus, EnvError> {
        let mut status = self.service.authorization_status();
        if status == AuthorizationStatus::NotDetermined {
            debug!("Requesting location authorization");
            status = self.service.request_authorization().await;
        }

        if status.is_authorized() {
            Ok(status)
        } else {
            warn!("Location access not granted: {:?}", status);
            Err(EnvError::PermissionDenied)
        }
    }

    /// Authorizes, subscribes, and spawns a task relaying every update.
    ///
    /// The relay ends when either the location stream or the event channel
    /// closes.
    pub async fn start<Ctx: DriveContext>(
        &self,
        ctx: &Ctx,
        events: mpsc::Sender<JourneyEvent>,
    ) -> Result<(), EnvError> {
        self.ensure_authorized().await?;
        let mut stream = self.service.subscribe()?;
        info!("Location updates started");

        ctx.spawn("location-bridge", async move {
            // Errors are reported by the journey owner, not here
            while let Some(update) = stream.recv().await {
                if events.send(JourneyEvent::Location(update)).await.is_err() {
                    break;
                }
            }
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use carpath_env::{Coordinate, LocationStream, LocationUpdate, TokioContext};
    use std::sync::Mutex;
    use std::time::SystemTime;

    struct ScriptedLocation {
        status: Mutex<AuthorizationStatus>,
        answer: AuthorizationStatus,
        prompts: Mutex<u32>,
        stream: Mutex<Option<LocationStream>>,
    }

    impl ScriptedLocation {
        fn new(status: AuthorizationStatus, answer: AuthorizationStatus) -> (Arc<Self>, mpsc::Sender<Result<LocationUpdate, EnvError>>) {
            let (tx, rx) = mpsc::channel(8);
            let service = Arc::new(Self {
                status: Mutex::new(status),
                answer,
                prompts: Mutex::new(0),
                stream: Mutex::new(Some(rx)),
            });
            (service, tx)
        }
    }

    #[async_trait]
    impl LocationService for ScriptedLocation {
        fn authorization_status(&self) -> AuthorizationStatus {
            *self.status.lock().unwrap()
        }

        async fn request_authorization(&self) -> AuthorizationStatus {
            *self.prompts.lock().unwrap() += 1;
            *self.status.lock().unwrap() = self.answer;
            self.answer
        }

        fn subscribe(&self) -> Result<LocationStream, EnvError> {
            self.stream
                .lock()
                .unwrap()
                .take()
                .ok_or_else(|| EnvError::location("already subscribed"))
        }
    }

    #[tokio::test]
    async fn test_prompts_when_undetermined() {
        let (service, _tx) = ScriptedLocation::new(
            AuthorizationStatus::NotDetermined,
            AuthorizationStatus::AuthorizedWhenInUse,
        );
        let bridge = LocationBridge::new(service.clone());

        let status = bridge.ensure_authorized().await.unwrap();
        assert_eq!(status, AuthorizationStatus::AuthorizedWhenInUse);
        assert_eq!(*service.prompts.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_denied_is_reported_without_prompt() {
        let (service, _tx) =
            ScriptedLocation::new(AuthorizationStatus::Denied, AuthorizationStatus::Denied);
        let bridge = LocationBridge::new(service.clone());

        let err = bridge.ensure_authorized().await.unwrap_err();
        assert!(err.is_permission_denied());
        assert_eq!(*service.prompts.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_updates_and_errors_are_forwarded() {
        let (service, feed) = ScriptedLocation::new(
            AuthorizationStatus::AuthorizedAlways,
            AuthorizationStatus::AuthorizedAlways,
        );
        let bridge = LocationBridge::new(service);
        let ctx = TokioContext::new();
        let (events_tx, mut events_rx) = mpsc::channel(8);

        bridge.start(&ctx, events_tx).await.unwrap();

        let fix = LocationUpdate::new(Coordinate::new(1.0, 2.0), SystemTime::UNIX_EPOCH);
        feed.send(Ok(fix)).await.unwrap();
        feed.send(Err(EnvError::location("no fix"))).await.unwrap();
        drop(feed);

        match events_rx.recv().await {
            Some(JourneyEvent::Location(Ok(update))) => assert_eq!(update, fix),
            other => panic!("unexpected event: {:?}", other),
        }
        match events_rx.recv().await {
            Some(JourneyEvent::Location(Err(e))) => assert_eq!(e, EnvError::location("no fix")),
            other => panic!("unexpected event: {:?}", other),
        }
        assert!(events_rx.recv().await.is_none());
    }
}
