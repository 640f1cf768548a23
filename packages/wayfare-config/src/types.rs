use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub providers: Providers,
	pub lifecycle: Lifecycle,
	#[serde(default)]
	pub chat: Chat,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Providers {
	pub planner: PlannerProviderConfig,
	pub trip_builder: TripBuilderProviderConfig,
	pub essentials: EssentialsProviderConfig,
}

/// The plan-generation collaborator. It also turns a single plan into a concrete trip request
/// and rewrites plans from free-form edit instructions.
#[derive(Clone, Debug, Deserialize)]
pub struct PlannerProviderConfig {
	pub api_base: String,
	#[serde(default = "default_generate_plans_path")]
	pub generate_plans_path: String,
	#[serde(default = "default_build_trip_request_path")]
	pub build_trip_request_path: String,
	#[serde(default = "default_edit_plans_path")]
	pub edit_plans_path: String,
	/// Transport timeout for a single request. Absent means the client waits indefinitely.
	pub timeout_ms: Option<u64>,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TripBuilderProviderConfig {
	pub api_base: String,
	#[serde(default = "default_create_trip_path")]
	pub create_trip_path: String,
	pub timeout_ms: Option<u64>,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

/// The trip-description-filling collaborator used by the chat flow.
#[derive(Clone, Debug, Deserialize)]
pub struct EssentialsProviderConfig {
	pub api_base: String,
	#[serde(default = "default_update_path")]
	pub update_path: String,
	#[serde(default = "default_question_path")]
	pub question_path: String,
	pub timeout_ms: Option<u64>,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Lifecycle {
	/// Measured from a search's creation, not its last update.
	pub search_ttl_seconds: i64,
	pub registry_ttl_seconds: i64,
	/// Sliding: measured from the session's last update.
	pub session_ttl_seconds: i64,
	pub sweep_interval_seconds: i64,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Chat {
	pub max_messages: usize,
}
impl Default for Chat {
	fn default() -> Self {
		Self { max_messages: 50 }
	}
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_generate_plans_path() -> String {
	"/api/generate-plans".to_string()
}

fn default_build_trip_request_path() -> String {
	"/api/build-trip-request".to_string()
}

fn default_edit_plans_path() -> String {
	"/api/edit-plans".to_string()
}

fn default_create_trip_path() -> String {
	"/api/create_trip".to_string()
}

fn default_update_path() -> String {
	"/api/update_trip_yaml".to_string()
}

fn default_question_path() -> String {
	"/api/get_single_missing_question".to_string()
}
