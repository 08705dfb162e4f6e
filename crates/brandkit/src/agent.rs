use crate::prelude::*;
use rig::client::CompletionClient;
use rig::completion::Prompt;
use rig::providers::ollama;

const SYSTEM_PREAMBLE: &str = "\
You are a branding expert working for small businesses.
You answer with exactly one branding suggestion in the format the user asks for.

Rules:
- Never offer several alternatives.
- Keep the slogan short and the concept to a few sentences.
- Do not add explanations outside the requested format.";

/// Send one prompt to the model and return its raw reply.
pub async fn ask(client: &ollama::Client, model: &str, prompt: &str) -> Result<String> {
    let agent = client.agent(model).preamble(SYSTEM_PREAMBLE).build();

    let prompt = prompt.to_string();
    agent
        .prompt(&prompt)
        .await
        .map_err(|e| eyre!("Model generation failed: {}", e))
}
