//! Tool handlers module.
//!
//! A [`Tool`] is the registry's unit: a name, an optional description, an
//! opaque input schema and an erased async handler. Tools are usually built
//! from a typed [`ToolDefinition`]; closures work too via [`Tool::from_fn`].

use anyhow::Context;
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use super::schema::InputSchema;

/// A typed tool implementation.
///
/// The handler only ever sees input that already passed validation against
/// the schema generated from [`ToolDefinition::Input`].
#[async_trait]
pub trait ToolDefinition: Send + Sync + 'static {
    /// Tool name as registered in MCP.
    const NAME: &'static str;

    /// Tool description shown to clients.
    const DESCRIPTION: &'static str;

    /// Validated input type.
    type Input: DeserializeOwned + Serialize + JsonSchema + Send + 'static;

    /// Output type, JSON-encoded into the text content of the result.
    type Output: Serialize + Send;

    /// Execute the tool.
    async fn call(&self, input: Self::Input) -> anyhow::Result<Self::Output>;
}

/// Erased tool handler operating on validated JSON values.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Execute the tool with already-validated input.
    async fn execute(&self, input: Value) -> anyhow::Result<Value>;
}

struct DefinitionHandler<D>(D);

#[async_trait]
impl<D: ToolDefinition> ToolHandler for DefinitionHandler<D> {
    async fn execute(&self, input: Value) -> anyhow::Result<Value> {
        let input: D::Input =
            serde_json::from_value(input).context("Validated input does not decode")?;
        let output = self.0.call(input).await?;
        serde_json::to_value(output).context("Tool output is not serializable")
    }
}

struct FnHandler<I, O, F> {
    f: F,
    _types: PhantomData<fn(I) -> O>,
}

#[async_trait]
impl<I, O, F, Fut> ToolHandler for FnHandler<I, O, F>
where
    I: DeserializeOwned + Send + 'static,
    O: Serialize + 'static,
    F: Fn(I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<O>> + Send + 'static,
{
    async fn execute(&self, input: Value) -> anyhow::Result<Value> {
        let input: I = serde_json::from_value(input).context("Validated input does not decode")?;
        let output = (self.f)(input).await?;
        serde_json::to_value(output).context("Tool output is not serializable")
    }
}

/// A registered tool.
#[derive(Clone)]
pub struct Tool {
    name: String,
    description: Option<String>,
    input_schema: InputSchema,
    handler: Arc<dyn ToolHandler>,
}

impl Tool {
    /// Create a tool from its parts.
    pub fn new(
        name: impl Into<String>,
        description: Option<String>,
        input_schema: InputSchema,
        handler: impl ToolHandler + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            description,
            input_schema,
            handler: Arc::new(handler),
        }
    }

    /// Create a tool from a typed definition.
    pub fn from_definition<D: ToolDefinition>(definition: D) -> Self {
        let description = Some(D::DESCRIPTION.to_string()).filter(|d| !d.is_empty());
        Self::new(
            D::NAME,
            description,
            InputSchema::of::<D::Input>(),
            DefinitionHandler(definition),
        )
    }

    /// Create a tool from an async closure over a typed input.
    pub fn from_fn<I, O, F, Fut>(name: impl Into<String>, description: Option<&str>, f: F) -> Self
    where
        I: DeserializeOwned + Serialize + JsonSchema + Send + 'static,
        O: Serialize + 'static,
        F: Fn(I) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<O>> + Send + 'static,
    {
        Self::new(
            name,
            description.map(str::to_string),
            InputSchema::of::<I>(),
            FnHandler {
                f,
                _types: PhantomData,
            },
        )
    }

    /// The unique tool name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The tool description, if any.
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The tool's input schema.
    pub fn input_schema(&self) -> &InputSchema {
        &self.input_schema
    }

    /// Run the handler on validated input.
    pub async fn execute(&self, input: Value) -> anyhow::Result<Value> {
        self.handler.execute(input).await
    }
}

impl std::fmt::Debug for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize, JsonSchema)]
    struct AddParams {
        a: i64,
        b: i64,
    }

    struct AddTool;

    #[async_trait]
    impl ToolDefinition for AddTool {
        const NAME: &'static str = "add";
        const DESCRIPTION: &'static str = "Add two integers";
        type Input = AddParams;
        type Output = Value;

        async fn call(&self, input: AddParams) -> anyhow::Result<Value> {
            Ok(json!({ "sum": input.a + input.b }))
        }
    }

    #[tokio::test]
    async fn test_tool_from_definition() {
        let tool = Tool::from_definition(AddTool);
        assert_eq!(tool.name(), "add");
        assert_eq!(tool.description(), Some("Add two integers"));

        let output = tool.execute(json!({ "a": 2, "b": 3 })).await.unwrap();
        assert_eq!(output, json!({ "sum": 5 }));
    }

    #[tokio::test]
    async fn test_tool_from_fn() {
        let tool = Tool::from_fn("negate", None, |p: AddParams| async move {
            Ok::<_, anyhow::Error>(json!(-(p.a + p.b)))
        });
        assert!(tool.description().is_none());

        let output = tool.execute(json!({ "a": 1, "b": 1 })).await.unwrap();
        assert_eq!(output, json!(-2));
    }

    #[tokio::test]
    async fn test_handler_error_propagates() {
        let tool = Tool::from_fn("fail", None, |_: AddParams| async move {
            Err::<Value, _>(anyhow::anyhow!("nope"))
        });
        let err = tool.execute(json!({ "a": 1, "b": 1 })).await.unwrap_err();
        assert_eq!(err.to_string(), "nope");
    }
}
