//! Matches command handler.

use anyhow::{Context, Result};
use statscout_core::client::ApiClient;

use crate::render;

pub async fn run(client: &ApiClient) -> Result<()> {
    let list = client
        .fetch_match_list()
        .await
        .context("fetch match list")?;
    print!("{}", render::format_match_list(&list));
    Ok(())
}
