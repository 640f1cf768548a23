use serde_json::Value;

use crate::{Error, Result};
use wayfare_domain::FillResponse;

/// Merges a raw chat message into the current trip-intake document.
pub async fn update_trip_yaml(
	cfg: &wayfare_config::EssentialsProviderConfig,
	raw_user_message: &str,
	current_yaml: &str,
) -> Result<FillResponse> {
	let url = format!("{}{}", cfg.api_base, cfg.update_path);

	fill(cfg, url, raw_user_message, current_yaml).await
}

/// Asks for the single most important question still open in the document.
pub async fn next_missing_question(
	cfg: &wayfare_config::EssentialsProviderConfig,
	current_yaml: &str,
) -> Result<FillResponse> {
	let url = format!("{}{}", cfg.api_base, cfg.question_path);

	fill(cfg, url, "", current_yaml).await
}

async fn fill(
	cfg: &wayfare_config::EssentialsProviderConfig,
	url: String,
	raw_user_message: &str,
	current_yaml: &str,
) -> Result<FillResponse> {
	let body = serde_json::json!({
		"raw_user_message": raw_user_message,
		"current_yaml_state": current_yaml,
	});
	let json = crate::post_json(cfg.timeout_ms, url, &cfg.default_headers, &body).await?;

	parse_fill_response(json)
}

fn parse_fill_response(json: Value) -> Result<FillResponse> {
	if !json.get("yaml").is_some_and(Value::is_string) {
		return Err(Error::invalid_response("Essentials response is missing yaml string."));
	}

	Ok(serde_json::from_value(json)?)
}

#[cfg(test)]
mod tests {
	use super::*;
	use wayfare_domain::FillStatus;

	#[test]
	fn parses_fill_response_without_message() {
		let response =
			parse_fill_response(serde_json::json!({ "yaml": "trip: {}", "status": "ready" }))
				.expect("parse failed");

		assert_eq!(response.status, FillStatus::Ready);
		assert!(response.message.is_none());
	}

	#[test]
	fn rejects_fill_response_without_yaml() {
		let err = parse_fill_response(serde_json::json!({ "status": "error" }))
			.expect_err("Expected an invalid response.");

		assert!(matches!(err, Error::InvalidResponse { .. }));
	}
}
