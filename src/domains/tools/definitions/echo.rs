//! Echo tool definition.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::domains::tools::ToolDefinition;

/// Parameters for the echo tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EchoParams {
    /// Text to send back.
    pub text: String,

    /// Number of times to repeat the text.
    #[serde(default = "default_repeat")]
    pub repeat: u32,
}

fn default_repeat() -> u32 {
    1
}

/// Output of the echo tool.
#[derive(Debug, Serialize)]
pub struct EchoOutput {
    pub text: String,
    pub length: usize,
}

/// Echo tool - returns its input, optionally repeated.
pub struct EchoTool;

#[async_trait]
impl ToolDefinition for EchoTool {
    const NAME: &'static str = "echo";
    const DESCRIPTION: &'static str = "Echo the given text back, optionally repeated.";

    type Input = EchoParams;
    type Output = EchoOutput;

    #[instrument(skip_all, fields(repeat = input.repeat))]
    async fn call(&self, input: EchoParams) -> anyhow::Result<EchoOutput> {
        anyhow::ensure!(input.repeat > 0, "repeat must be at least 1");

        let text = input.text.repeat(input.repeat as usize);
        debug!("Echoing {} bytes", text.len());

        Ok(EchoOutput {
            length: text.chars().count(),
            text,
        })
    }
}
