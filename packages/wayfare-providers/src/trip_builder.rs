use serde_json::Value;

use crate::{Error, Result};
use wayfare_domain::FinalTripLayout;

pub async fn create_trip(
	cfg: &wayfare_config::TripBuilderProviderConfig,
	trip_request: &Value,
) -> Result<FinalTripLayout> {
	let url = format!("{}{}", cfg.api_base, cfg.create_trip_path);
	let json = crate::post_json(cfg.timeout_ms, url, &cfg.default_headers, trip_request).await?;

	parse_layout(json)
}

fn parse_layout(json: Value) -> Result<FinalTripLayout> {
	if !json.get("sections").is_some_and(Value::is_array) {
		return Err(Error::invalid_response("Trip layout is missing sections array."));
	}

	Ok(serde_json::from_value(json)?)
}

#[cfg(test)]
mod tests {
	use super::*;
	use wayfare_domain::TripSection;

	#[test]
	fn parses_typed_sections() {
		let json = serde_json::json!({
			"sections": [
				{ "type": "flight", "data": { "price": 420 } },
				{ "type": "stay", "data": { "hotel": { "name": "Casa" }, "activities": [] } },
				{ "type": "transfer", "data": {} }
			]
		});
		let layout = parse_layout(json).expect("parse failed");

		assert_eq!(layout.sections.len(), 3);
		assert!(matches!(layout.sections[0], TripSection::Flight(_)));
		assert!(matches!(layout.sections[1], TripSection::Stay(_)));
		assert!(matches!(layout.sections[2], TripSection::Transfer(_)));
	}

	#[test]
	fn rejects_unknown_section_types() {
		let json = serde_json::json!({ "sections": [{ "type": "cruise", "data": {} }] });

		assert!(matches!(parse_layout(json), Err(Error::SerdeJson(_))));
		assert!(matches!(
			parse_layout(serde_json::json!({ "error": "no flights" })),
			Err(Error::InvalidResponse { .. })
		));
	}
}
