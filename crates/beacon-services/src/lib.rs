//! beacon-services: shared registry state used by the daemon loops and the API.

pub mod registry;

pub use registry::{Api, ApiRegistration, Ownership, OwnedApi, RegistrationStore, Upsert};
