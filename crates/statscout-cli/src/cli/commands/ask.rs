//! Ask command handler: one chat turn, answer on stdout.

use anyhow::Result;
use statscout_core::chat::{ChatState, TurnOutcome};
use statscout_core::client::ApiClient;

use crate::render::TurnRenderer;

pub async fn run(client: &ApiClient, prompt: &str) -> Result<()> {
    let mut state = ChatState::new();
    let session_id = state.sessions.active_id().to_string();
    let mut renderer = TurnRenderer::new();

    let outcome = state
        .send_message(client, &session_id, prompt, &mut renderer)
        .await;
    renderer.finish();

    match outcome {
        TurnOutcome::Completed => Ok(()),
        TurnOutcome::TransportFailed => {
            anyhow::bail!("Could not reach the stats engine at {}", client.base_url())
        }
        TurnOutcome::SessionNotFound => anyhow::bail!("Session {session_id} not found"),
    }
}
