use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One candidate trip concept ("vibe") produced by the planner.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TripPlan {
	#[serde(rename = "vibe")]
	pub label: String,
	/// Opaque action tuples; only the planner interprets them.
	#[serde(default)]
	pub actions: Vec<Vec<Value>>,
}
impl TripPlan {
	pub fn new(label: impl Into<String>, actions: Vec<Vec<Value>>) -> Self {
		Self { label: label.into(), actions }
	}
}

/// Planner answer to an edit instruction. `modified_indices` point into `plans`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlanEdit {
	pub plans: Vec<TripPlan>,
	#[serde(default)]
	pub modified_indices: Vec<usize>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Trip {
	pub vibe: String,
	pub layout: FinalTripLayout,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FinalTripLayout {
	#[serde(default)]
	pub sections: Vec<TripSection>,
}

/// A typed leg of a built trip. Option payloads are passed through as the builder produced them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum TripSection {
	Flight(Value),
	Stay(StayOption),
	Transfer(Value),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StayOption {
	pub hotel: Value,
	#[serde(default)]
	pub activities: Vec<Value>,
}
