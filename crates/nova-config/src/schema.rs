use schemars::schema::RootSchema;
use schemars::schema_for;

use crate::NovaConfig;

/// JSON schema for `nova.toml`, for editor TOML-schema integration.
#[must_use]
pub fn json_schema() -> RootSchema {
    schema_for!(NovaConfig)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_lists_every_section() {
        let schema = serde_json::to_value(json_schema()).expect("schema serializes");
        let properties = schema["properties"].as_object().expect("object schema");
        for section in ["completion", "search", "logging"] {
            assert!(properties.contains_key(section), "missing `{section}`");
        }
    }
}
