use crate::agent::{prompt::AUTONOMOUS_PROMPT, AgentRuntime, StepEvent};
use anyhow::Result;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::watch;
use tracing::{error, info};

const SEPARATOR: &str = "-------------------";

/// Runs one message through a session, printing each step as it arrives.
async fn print_run(runtime: &AgentRuntime, message: &str) -> Result<()> {
    let session = runtime.session(None);
    let mut steps = session.run(message).await;
    while let Some(step) = steps.next_step().await {
        let step = step?;
        if let StepEvent::Checkpoint { .. } = step {
            continue;
        }
        if let Some(text) = step.text() {
            println!("{text}");
        }
        println!("{SEPARATOR}");
    }
    Ok(())
}

pub async fn run_chat_mode(runtime: &AgentRuntime) -> Result<()> {
    println!("Starting chat mode... Type 'exit' to end.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"\nPrompt: ").await?;
        stdout.flush().await?;

        let input = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(input) = input else {
            break;
        };
        let input = input.trim();
        if input.eq_ignore_ascii_case("exit") {
            break;
        }
        if input.is_empty() {
            continue;
        }

        if let Err(e) = print_run(runtime, input).await {
            error!("run failed: {:#}", e);
        }
    }

    println!("Goodbye Agent!");
    Ok(())
}

pub async fn run_autonomous_mode(runtime: &AgentRuntime, interval: Duration) -> Result<()> {
    info!("Starting autonomous mode, acting every {}s", interval.as_secs());

    let (stop_tx, stop) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = stop_tx.send(true);
        }
    });
    run_autonomous_loop(runtime, interval, stop).await;

    println!("Goodbye Agent!");
    Ok(())
}

/// Acts every `interval` until `stop` flips. A stop only takes effect
/// between runs, never in the middle of a tool.
pub async fn run_autonomous_loop(
    runtime: &AgentRuntime,
    interval: Duration,
    mut stop: watch::Receiver<bool>,
) {
    loop {
        if let Err(e) = print_run(runtime, AUTONOMOUS_PROMPT).await {
            error!("autonomous run failed: {:#}", e);
        }
        if *stop.borrow() {
            break;
        }

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = stop.changed() => break,
        }
    }
}
