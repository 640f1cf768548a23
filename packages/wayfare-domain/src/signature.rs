//! Search signatures: the subset of a trip-intake document that changes what a search returns.
//!
//! Conversation history, metadata and classifier output are left out so that two documents
//! describing the same trip compare equal even when the chat around them differs.

use serde_json::{Map, Value};

static NULL: Value = Value::Null;

pub fn search_signature(document: &str) -> Option<Value> {
	let parsed: serde_yaml::Value = serde_yaml::from_str(document).ok()?;
	let root = serde_json::to_value(parsed).ok()?;

	if !root.is_object() {
		return None;
	}

	let trip = field(&root, "trip");
	let essentials = field(trip, "essentials");
	let travelers = field(essentials, "travelers");
	let origin = field(essentials, "origin");
	let dates = field(essentials, "dates");
	let return_date = pick(dates, "returnDate");
	// Nights is derivable once a return date exists and the filler tends to recompute it.
	let nights = if is_set(&return_date) { Value::Null } else { pick(dates, "nights") };
	let destinations = field(essentials, "destinations")
		.as_array()
		.map(|items| {
			items
				.iter()
				.map(|destination| {
					subset(destination, &["iata", "city", "countryCode", "region"])
				})
				.collect::<Vec<_>>()
		})
		.unwrap_or_default();

	Some(serde_json::json!({
		"trip": {
			"essentials": {
				"travelers": subset(
					travelers,
					&["adults", "children", "infants", "childrenAges", "rooms"],
				),
				"origin": subset(origin, &["iata", "city", "countryCode"]),
				"destinations": destinations,
				"dates": {
					"mode": pick(dates, "mode"),
					"departureDate": pick(dates, "departureDate"),
					"returnDate": return_date,
					"nights": nights,
				},
				"packageScope": pick(essentials, "packageScope"),
				"currency": pick(essentials, "currency"),
			},
			"preferences": match field(trip, "preferences") {
				Value::Object(map) => Value::Object(map.clone()),
				_ => Value::Object(Map::new()),
			},
		},
	}))
}

/// Documents without a signature never match, not even each other.
pub fn is_same_search(left: &str, right: &str) -> bool {
	match (search_signature(left), search_signature(right)) {
		(Some(left), Some(right)) => left == right,
		_ => false,
	}
}

fn field<'a>(value: &'a Value, key: &str) -> &'a Value {
	value.get(key).unwrap_or(&NULL)
}

fn pick(value: &Value, key: &str) -> Value {
	field(value, key).clone()
}

fn subset(value: &Value, keys: &[&str]) -> Value {
	Value::Object(keys.iter().map(|key| (key.to_string(), pick(value, key))).collect())
}

fn is_set(value: &Value) -> bool {
	match value {
		Value::Null | Value::Bool(false) => false,
		Value::String(text) => !text.is_empty(),
		_ => true,
	}
}
