use serde_json::Value;

use crate::{Error, Result};
use wayfare_domain::{PlanEdit, TripPlan};

pub async fn generate_plans(
	cfg: &wayfare_config::PlannerProviderConfig,
	trip_yaml: &str,
) -> Result<Vec<TripPlan>> {
	let url = format!("{}{}", cfg.api_base, cfg.generate_plans_path);
	let body = serde_json::json!({ "trip_yml": trip_yaml });
	let json = crate::post_json(cfg.timeout_ms, url, &cfg.default_headers, &body).await?;

	parse_plans(json)
}

/// Expands one plan into the concrete request the trip builder consumes.
pub async fn build_trip_request(
	cfg: &wayfare_config::PlannerProviderConfig,
	plan: &TripPlan,
) -> Result<Value> {
	let url = format!("{}{}", cfg.api_base, cfg.build_trip_request_path);
	let json = crate::post_json(cfg.timeout_ms, url, &cfg.default_headers, plan).await?;

	parse_trip_request(json)
}

pub async fn edit_plans(
	cfg: &wayfare_config::PlannerProviderConfig,
	plans: &[TripPlan],
	user_text: &str,
) -> Result<PlanEdit> {
	let url = format!("{}{}", cfg.api_base, cfg.edit_plans_path);
	let body = serde_json::json!({ "plans": plans, "user_text": user_text });
	let json = crate::post_json(cfg.timeout_ms, url, &cfg.default_headers, &body).await?;

	parse_plan_edit(json)
}

fn parse_plans(mut json: Value) -> Result<Vec<TripPlan>> {
	let plans = json
		.get_mut("plans")
		.filter(|plans| plans.is_array())
		.map(Value::take)
		.ok_or_else(|| Error::invalid_response("Planner response is missing plans array."))?;

	Ok(serde_json::from_value(plans)?)
}

fn parse_trip_request(mut json: Value) -> Result<Value> {
	json.get_mut("trip_request")
		.filter(|request| request.is_object())
		.map(Value::take)
		.ok_or_else(|| Error::invalid_response("Planner response is missing trip_request object."))
}

fn parse_plan_edit(json: Value) -> Result<PlanEdit> {
	if !json.get("plans").is_some_and(Value::is_array) {
		return Err(Error::invalid_response("Plan edit response is missing plans array."));
	}

	Ok(serde_json::from_value(json)?)
}
