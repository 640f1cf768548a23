pub mod essentials;
pub mod planner;
pub mod trip_builder;

mod error;

pub use error::{Error, Result};

use std::time::Duration;

use reqwest::{
	Client,
	header::{HeaderMap, HeaderName},
};
use serde::Serialize;
use serde_json::{Map, Value};

/// Builds the per-provider header set from configured `default_headers`.
pub fn request_headers(default_headers: &Map<String, Value>) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	for (key, value) in default_headers {
		let Some(raw) = value.as_str() else {
			return Err(Error::InvalidConfig {
				message: format!("Default header {key} must be a string."),
			});
		};

		headers.insert(HeaderName::from_bytes(key.as_bytes())?, raw.parse()?);
	}

	Ok(headers)
}

fn client(timeout_ms: Option<u64>) -> Result<Client> {
	let mut builder = Client::builder();

	if let Some(timeout_ms) = timeout_ms {
		builder = builder.timeout(Duration::from_millis(timeout_ms));
	}

	Ok(builder.build()?)
}

async fn post_json(
	timeout_ms: Option<u64>,
	url: String,
	default_headers: &Map<String, Value>,
	body: &impl Serialize,
) -> Result<Value> {
	let res = client(timeout_ms)?
		.post(url)
		.headers(request_headers(default_headers)?)
		.json(body)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	Ok(json)
}
