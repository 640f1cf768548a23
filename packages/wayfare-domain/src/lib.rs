pub mod search;
pub mod session;
pub mod signature;
pub mod trip;

pub use search::{PlanSet, SearchEntry, SearchProgress, SearchStatus};
pub use session::{ChatMessage, ChatRole, ChatTranscript, FillResponse, FillStatus, SessionState};
pub use signature::{is_same_search, search_signature};
pub use trip::{FinalTripLayout, PlanEdit, StayOption, Trip, TripPlan, TripSection};

/// Blank trip-intake document every new chat session starts from.
pub const DEFAULT_TRIP_YAML: &str = include_str!("default_trip.yaml");
