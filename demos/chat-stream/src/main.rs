use anyhow::Result;
use chat_adapter_rs::{ChatCompletionsAdapter, ChatCompletionsOptions, ChatModel, Message};
use futures_util::StreamExt;
use std::io::Write;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// Run with:
//   OPENAI_API_KEY=sk-... cargo run -p chat-stream
// Optional:
//   OPENAI_MODEL=gpt-4o-mini   (default)
//   OPENAI_BASE_URL=https://api.openai.com/v1 (or any compatible server)
//   RUST_LOG=chat_adapter=debug

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    if std::env::var("OPENAI_API_KEY").unwrap_or_default().is_empty() {
        eprintln!("OPENAI_API_KEY is not set. Set it in your environment.");
        std::process::exit(1);
    }
    let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());

    let adapter = ChatCompletionsAdapter::new(
        ChatCompletionsOptions::new(model)
            .temperature(0.2)
            .max_tokens(200)
            .timeout(Duration::from_secs(60)),
    )?;

    let prompt = vec![
        Message::system("You are a terse assistant."),
        Message::human("Name three prime numbers."),
    ];

    // One-shot call.
    let reply = adapter.invoke(&prompt).await?;
    println!("invoke: {}", reply.content);
    if let Some(usage) = reply.usage_metadata {
        println!(
            "usage: input={} output={} total={}",
            usage.input_tokens, usage.output_tokens, usage.total_tokens
        );
    }

    // Streamed call; the last chunk carries usage and timing only.
    print!("stream: ");
    let mut stream = adapter.stream(&prompt, None).await?;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if chunk.is_metadata_only() {
            println!();
            if let Some(usage) = chunk.message.usage_metadata {
                println!(
                    "usage: input={} output={} total={}",
                    usage.input_tokens, usage.output_tokens, usage.total_tokens
                );
            }
            if let Some(secs) = chunk.message.response_metadata.get("time_in_seconds") {
                println!("time_in_seconds: {secs}");
            }
            continue;
        }
        print!("{}", chunk.text());
        let _ = std::io::stdout().flush();
    }
    Ok(())
}
