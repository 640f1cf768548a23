mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Chat, Config, EssentialsProviderConfig, Lifecycle, PlannerProviderConfig, Providers, Service,
	TripBuilderProviderConfig,
};

use std::{fs, path::Path};

use serde_json::{Map, Value};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::invalid("service.http_bind", "must be non-empty."));
	}

	for (key, value) in [
		("lifecycle.search_ttl_seconds", cfg.lifecycle.search_ttl_seconds),
		("lifecycle.registry_ttl_seconds", cfg.lifecycle.registry_ttl_seconds),
		("lifecycle.session_ttl_seconds", cfg.lifecycle.session_ttl_seconds),
		("lifecycle.sweep_interval_seconds", cfg.lifecycle.sweep_interval_seconds),
	] {
		if value <= 0 {
			return Err(Error::invalid(key, "must be greater than zero."));
		}
	}

	if cfg.chat.max_messages == 0 {
		return Err(Error::invalid("chat.max_messages", "must be greater than zero."));
	}

	let planner = &cfg.providers.planner;
	let builder = &cfg.providers.trip_builder;
	let essentials = &cfg.providers.essentials;

	validate_endpoint(
		"providers.planner",
		&planner.api_base,
		&[
			("generate_plans_path", &planner.generate_plans_path),
			("build_trip_request_path", &planner.build_trip_request_path),
			("edit_plans_path", &planner.edit_plans_path),
		],
		planner.timeout_ms,
		&planner.default_headers,
	)?;
	validate_endpoint(
		"providers.trip_builder",
		&builder.api_base,
		&[("create_trip_path", &builder.create_trip_path)],
		builder.timeout_ms,
		&builder.default_headers,
	)?;
	validate_endpoint(
		"providers.essentials",
		&essentials.api_base,
		&[("update_path", &essentials.update_path), ("question_path", &essentials.question_path)],
		essentials.timeout_ms,
		&essentials.default_headers,
	)?;

	Ok(())
}

fn validate_endpoint(
	prefix: &str,
	api_base: &str,
	paths: &[(&str, &String)],
	timeout_ms: Option<u64>,
	default_headers: &Map<String, Value>,
) -> Result<()> {
	if api_base.trim().is_empty() {
		return Err(Error::invalid(format!("{prefix}.api_base"), "must be non-empty."));
	}
	if !(api_base.starts_with("http://") || api_base.starts_with("https://")) {
		return Err(Error::invalid(
			format!("{prefix}.api_base"),
			"must start with http:// or https://.",
		));
	}

	for (name, path) in paths {
		if !path.starts_with('/') {
			return Err(Error::invalid(format!("{prefix}.{name}"), "must start with '/'."));
		}
	}

	if let Some(timeout) = timeout_ms
		&& timeout == 0
	{
		return Err(Error::invalid(format!("{prefix}.timeout_ms"), "must be greater than zero."));
	}

	for (header, value) in default_headers {
		if !value.is_string() {
			return Err(Error::invalid(
				format!("{prefix}.default_headers.{header}"),
				"must be a string.",
			));
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	for api_base in [
		&mut cfg.providers.planner.api_base,
		&mut cfg.providers.trip_builder.api_base,
		&mut cfg.providers.essentials.api_base,
	] {
		let trimmed = api_base.trim().trim_end_matches('/').to_string();

		*api_base = trimmed;
	}
}
