use std::time::Instant;

use anyhow::Result;

use super::output::{banner, preview, rule};
use crate::chat::{ChatClient, RequestOptions};
use crate::core::{AppConfig, ModelAlias};

/// Asks every model the same question. A failing model is reported and
/// skipped so the others still run.
pub async fn run(config: &AppConfig, question: &str, max_tokens: u32) -> Result<()> {
    banner(&format!("Comparing models on: {}", question));

    for alias in ModelAlias::ALL {
        let mut client = ChatClient::from_config(config);
        client.set_model(alias.id());

        println!("[{}] {}", alias, alias.id());
        let start = Instant::now();
        match client
            .chat_with(question, None, &RequestOptions::max_tokens(max_tokens))
            .await
        {
            Ok(reply) => {
                let elapsed = start.elapsed();
                println!("{}", preview(&reply, 200));
                println!(
                    "Time: {:.2}s, tokens: {}",
                    elapsed.as_secs_f64(),
                    client.stats().total_tokens
                );
            }
            Err(e) => {
                tracing::warn!("Model {} failed: {}", alias.id(), e);
                println!("Error: {}", e);
            }
        }
        println!("{}", rule());
    }

    Ok(())
}
