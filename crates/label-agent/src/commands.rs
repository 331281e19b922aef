use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use application::printer::PrinterSession;
use domain::{PowerState, RequesterId};
use infrastructure::AgentConfig;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::cli::Command;

/// Run one command against an open session, writing human output to `out`
///
/// Cancelling `shutdown` ends `serve` cleanly. Any other command is abandoned
/// mid-flight and fails with an "Interrupted" error.
pub async fn execute<W: Write>(
    session: &PrinterSession,
    config: &AgentConfig,
    command: Command,
    shutdown: CancellationToken,
    out: &mut W,
) -> Result<()> {
    if command == Command::Serve {
        tokio::select! {
            result = session.initialize() => {
                result.context("Printer unavailable")?;
            }
            _ = shutdown.cancelled() => anyhow::bail!("Interrupted"),
        }
        let stdin = BufReader::new(tokio::io::stdin());
        let printed = serve(session, stdin, shutdown, out).await?;
        info!(printed, "Serve finished");
        return Ok(());
    }

    tokio::select! {
        result = one_shot(session, config, command, out) => result,
        _ = shutdown.cancelled() => {
            warn!("🛑 Interrupted, abandoning command");
            anyhow::bail!("Interrupted")
        }
    }
}

async fn one_shot<W: Write>(
    session: &PrinterSession,
    config: &AgentConfig,
    command: Command,
    out: &mut W,
) -> Result<()> {
    match command {
        Command::Status => status(session, out).await,
        Command::Version => {
            writeln!(out, "{}", session.version().await.trim())?;
            Ok(())
        }
        Command::Print { text, size } => {
            let text = non_empty(&text)?;
            let size = size.unwrap_or(session.default_font_size());
            session.print_label(text, size).await?;
            writeln!(out, "Printed \"{}\" (font size {})", text, size)?;
            Ok(())
        }
        Command::Preset { name, text } => {
            let text = non_empty(&text)?;
            let preset = config
                .preset(&name)
                .with_context(|| format!("Unknown preset '{}'", name))?;
            session.print_with_preset(text, preset).await?;
            writeln!(out, "Printed \"{}\" with preset {}", text, name)?;
            Ok(())
        }
        Command::Presets => list_presets(config, out),
        Command::Preview {
            text,
            out: path,
            requester,
            preset,
        } => {
            let text = non_empty(&text)?;
            let requester = RequesterId::new(requester);
            let image = match preset {
                Some(name) => {
                    let preset = config
                        .preset(&name)
                        .with_context(|| format!("Unknown preset '{}'", name))?;
                    session.preview_with_preset(text, requester, preset).await?
                }
                None => session.preview_label(text, requester).await?,
            };
            save_preview(&path, &image).await?;
            writeln!(out, "Preview written to {} ({} bytes)", path.display(), image.len())?;
            Ok(())
        }
        Command::Serve => anyhow::bail!("serve is not a one-shot command"),
    }
}

async fn status<W: Write>(session: &PrinterSession, out: &mut W) -> Result<()> {
    let info = session
        .initialize()
        .await
        .context("Printer unavailable")?;

    let power = match session.power().power_state() {
        Some(PowerState::On) => "on",
        Some(PowerState::Off) => "off",
        None => "no relay",
    };
    writeln!(out, "Power: {}", power)?;
    writeln!(out, "{}", info.trim())?;
    Ok(())
}

fn list_presets<W: Write>(config: &AgentConfig, out: &mut W) -> Result<()> {
    let names = config.preset_names();
    if names.is_empty() {
        writeln!(out, "No presets configured")?;
        return Ok(());
    }

    for name in names {
        let Some(preset) = config.preset(name) else {
            continue;
        };
        if preset.description.is_empty() {
            writeln!(out, "{}: {}", name, preset.summary())?;
        } else {
            writeln!(out, "{}: {} ({})", name, preset.summary(), preset.description)?;
        }
    }
    Ok(())
}

/// Print each non-empty line from `input` with default settings
///
/// Stops at end of input or when `shutdown` is cancelled. A failed print is
/// reported and the loop keeps going. Returns how many labels were printed.
pub async fn serve<R, W>(
    session: &PrinterSession,
    input: R,
    shutdown: CancellationToken,
    out: &mut W,
) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    let mut printed = 0;
    info!("📥 Waiting for labels on stdin");

    loop {
        let line = tokio::select! {
            _ = shutdown.cancelled() => {
                info!("🛑 Shutting down...");
                break;
            }
            line = lines.next_line() => line.context("Failed to read label text")?,
        };

        let Some(line) = line else {
            break;
        };
        let text = line.trim();
        if text.is_empty() {
            continue;
        }

        match session.print_default(text).await {
            Ok(()) => {
                printed += 1;
                writeln!(out, "Printed \"{}\"", text)?;
            }
            Err(e) => {
                error!(label = %text, error = %e, "Failed to print label");
                writeln!(out, "Failed \"{}\": {}", text, e)?;
            }
        }
    }

    Ok(printed)
}

fn non_empty(text: &str) -> Result<&str> {
    let text = text.trim();
    anyhow::ensure!(!text.is_empty(), "Label text is empty");
    Ok(text)
}

async fn save_preview(path: &Path, image: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    tokio::fs::write(path, image)
        .await
        .with_context(|| format!("Failed to write preview to {}", path.display()))
}
