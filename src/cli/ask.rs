use anyhow::Result;

use super::output::stream_to_stdout;
use crate::chat::{ChatClient, RequestOptions};
use crate::core::AppConfig;

pub async fn run(
    config: &AppConfig,
    question: &str,
    stream: bool,
    system_prompt: Option<&str>,
) -> Result<()> {
    let mut client = ChatClient::from_config(config);
    let system_prompt = system_prompt.or(config.system_message.as_deref());

    if stream {
        let fragments = client.chat_stream(question, system_prompt, &RequestOptions::default());
        stream_to_stdout(fragments).await?;
        client.record_stream();
    } else {
        let reply = client.chat(question, system_prompt).await?;
        println!("{}", reply);
    }

    Ok(())
}
