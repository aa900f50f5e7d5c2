//! Run a sync session, exchanging messages through files.
//!
//! There is no transport here: each outgoing SyncML message is written to
//! `out-NNN.xml` in the exchange directory, and when the engine needs the
//! peer's answer it is read from the matching `in-NNN.xml`. This is a
//! smoke harness for engine modules, not a sync client.

use anyhow::{Context, Result};
use engine_api::Engine;
use engine_types::{StepCommand, StepDirective};
use std::path::Path;

/// Run the sync command.
pub fn run(engine: &Engine, selector: u32, name: Option<&str>, exchange: &Path) -> Result<()> {
    std::fs::create_dir_all(exchange)
        .with_context(|| format!("failed to create exchange directory {}", exchange.display()))?;

    let session = engine
        .open_session(selector, name)
        .context("failed to open session")?;
    println!("session {} open", session.handle());

    let mut cmd = StepCommand::ClientStart;
    let mut exchanges = 0u32;
    loop {
        let step = session.step(cmd).context("session step failed")?;
        if let Some(progress) = step.progress {
            println!(
                "  progress: {} target={} ({}, {}, {})",
                progress.event, progress.target_id, progress.extra1, progress.extra2,
                progress.extra3
            );
        }
        cmd = match step.directive {
            StepDirective::Ok => StepCommand::Step,
            StepDirective::SendData | StepDirective::ResendData => {
                let message = session.read_message().context("failed to read message")?;
                exchanges += 1;
                let out = exchange.join(format!("out-{:03}.xml", exchanges));
                std::fs::write(&out, &message)
                    .with_context(|| format!("failed to write {}", out.display()))?;
                println!("  sent {} ({} bytes)", out.display(), message.len());
                StepCommand::SentData
            }
            StepDirective::NeedData => {
                let reply = exchange.join(format!("in-{:03}.xml", exchanges));
                let data = std::fs::read(&reply).with_context(|| {
                    format!("engine needs the peer's answer at {}", reply.display())
                })?;
                session
                    .write_message(&data)
                    .context("failed to deliver message")?;
                println!("  received {} ({} bytes)", reply.display(), data.len());
                StepCommand::GotData
            }
            StepDirective::Restart => StepCommand::ClientStart,
            StepDirective::Done => break,
        };
    }

    session.close().context("failed to close session")?;
    println!("session complete after {} exchange(s)", exchanges);
    Ok(())
}
