//! carpath Environment Abstraction Layer
//!
//! This crate provides the "Sans-IO" abstraction allowing the carpath journey
//! logic to run against both **Production** (tokio + platform services) and
//! **Simulation** (virtual clock + scripted services) environments.
//!
//! # Collaborators
//!
//! Everything the journey logic does not own is expressed as a trait:
//! - Time (`now()`, `sleep()`, `spawn()`) via [`DriveContext`]
//! - Device location (authorization + update stream) via [`LocationService`]
//! - Route lookup via [`DirectionsService`]
//! - Drawing via [`MapSurface`]
//!
//! # Example
//!
//! ```ignore
//! use carpath_env::{DriveContext, LocationService};
//!
//! async fn ticker<Ctx: DriveContext>(ctx: &Ctx, tx: Sender<Event>) {
//!     loop {
//!         ctx.sleep(Duration::from_secs(1)).await;
//!         if tx.send(Event::Tick).await.is_err() {
//!             break;
//!         }
//!     }
//! }
//! ```

mod context;
mod directions;
mod error;
mod location;
mod map;
mod tokio_impl;
mod types;

pub use context::DriveContext;
pub use directions::{DirectionsRequest, DirectionsService};
pub use error::EnvError;
pub use location::{AuthorizationStatus, LocationService, LocationStream};
pub use map::{MapScene, MapSurface, Overlay, VehicleMarker};
pub use tokio_impl::TokioContext;
pub use types::{Coordinate, JourneyId, LocationUpdate, Region, Route, TransportType};
