mod clock;
mod registry;
mod searches;
mod sessions;
mod ttl;

pub use clock::{Clock, SystemClock, unix_ms};
pub use registry::{RegistrySweep, TripRegistry};
pub use searches::SearchStore;
pub use sessions::SessionStore;
pub use ttl::{Expiry, Record, TtlStore};
