use schemars::schema_for;

use crate::{config::EngineConfig, marker::MarkerRecord};

pub fn generate_records_schema() -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&schema_for!(Vec<MarkerRecord>))
}

pub fn generate_config_schema() -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&schema_for!(EngineConfig))
}
