use std::sync::OnceLock;

use anyhow::{Result, anyhow};
use jsonschema::{Draft, JSONSchema};
use serde_json::Value;

static PAGE_SCHEMA: OnceLock<JSONSchema> = OnceLock::new();

fn compile_schema(source: &'static str) -> JSONSchema {
    let schema_value: Value =
        serde_json::from_str(source).expect("embedded schema should parse as JSON");
    JSONSchema::options()
        .with_draft(Draft::Draft202012)
        .compile(&schema_value)
        .expect("embedded schema should compile")
}

fn page_schema() -> &'static JSONSchema {
    PAGE_SCHEMA.get_or_init(|| compile_schema(include_str!("../schema/page.schema.json")))
}

/// Validates a `serde_json::Value` against the page schema.
///
/// Catches missing mandatory geometry before typed decoding so the error
/// lists every offending path at once.
pub fn validate_page_value(value: &Value) -> Result<()> {
    if let Err(errors) = page_schema().validate(value) {
        let messages: Vec<String> = errors
            .into_iter()
            .map(|err| format!("{} at {}", err, err.instance_path))
            .collect();
        let joined = messages.join("\n");
        return Err(anyhow!("page failed schema validation:\n{joined}"));
    }
    Ok(())
}
