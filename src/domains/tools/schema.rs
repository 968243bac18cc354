//! Input schemas and the validator seam.
//!
//! A tool's input schema is an opaque [`InputSchema`] handle. The router only
//! ever touches it through a [`SchemaValidator`], so the validation backend
//! can be swapped (or counted, in tests) without touching dispatch.

use schemars::JsonSchema;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::Diagnostics;

type CheckFn = fn(&Value) -> Result<Value, Diagnostics>;

/// Opaque input schema of a tool.
#[derive(Clone)]
pub struct InputSchema {
    json_schema: Value,
    check: CheckFn,
}

impl InputSchema {
    /// Build the schema of a typed input.
    pub fn of<T>() -> Self
    where
        T: DeserializeOwned + Serialize + JsonSchema,
    {
        let json_schema = serde_json::to_value(schemars::schema_for!(T))
            .unwrap_or_else(|_| serde_json::json!({ "type": "object" }));

        Self {
            json_schema,
            check: check_as::<T>,
        }
    }

    /// The JSON Schema describing the input.
    pub fn json_schema(&self) -> &Value {
        &self.json_schema
    }

    /// Check a candidate value, returning its normalized form.
    pub fn check(&self, value: &Value) -> Result<Value, Diagnostics> {
        (self.check)(value)
    }
}

impl std::fmt::Debug for InputSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputSchema")
            .field("json_schema", &self.json_schema)
            .finish_non_exhaustive()
    }
}

fn check_as<T>(value: &Value) -> Result<Value, Diagnostics>
where
    T: DeserializeOwned + Serialize,
{
    let parsed: T = serde_json::from_value(value.clone())?;
    Ok(serde_json::to_value(parsed)?)
}

/// Validates tool input and renders schemas for the wire.
pub trait SchemaValidator: Send + Sync {
    /// Validate `value` against `schema`, returning the validated value.
    fn validate(&self, schema: &InputSchema, value: &Value) -> Result<Value, Diagnostics>;

    /// Render `schema` as the JSON Schema sent in `tools/list`.
    fn to_wire_schema(&self, schema: &InputSchema) -> Value;
}

/// Validator backed by serde deserialization and schemars-generated schemas.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerdeSchemaValidator;

impl SchemaValidator for SerdeSchemaValidator {
    fn validate(&self, schema: &InputSchema, value: &Value) -> Result<Value, Diagnostics> {
        schema.check(value)
    }

    fn to_wire_schema(&self, schema: &InputSchema) -> Value {
        schema.json_schema().clone()
    }
}
