//! Whoseline CLI - turn a scripted dialog into one synthesized audio file

use anyhow::Context;
use clap::Parser;
use indicatif::ProgressBar;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod progress;

use cli::{Cli, Command, ProviderKind};
use progress::LineProgress;
use whoseline_core::{
    synthesize_multispeaker, AppConfig, BatchOptions, Dialog, GoogleTtsProvider,
    OpenAiChatAudioProvider, OpenAiSpeechProvider, Pipeline, PipelineOptions, SpeechSynthesizer,
    VoiceMap,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "whoseline_cli=info,whoseline_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;

    match cli.command {
        Command::Lines {
            provider,
            output,
            scratch_dir,
        } => {
            let mut options = PipelineOptions::from(&config.pipeline);
            if let Some(output) = output {
                options.output_path = output;
            }
            if let Some(dir) = scratch_dir {
                options.scratch_dir = Some(dir);
            }
            run_lines(&config, provider, &cli.script, options).await
        }
        Command::Batch {
            output_uri,
            max_turns,
            timeout_secs,
        } => {
            let mut config = config;
            if output_uri.is_some() {
                config.batch.output_uri = output_uri;
            }
            if let Some(max_turns) = max_turns {
                config.batch.max_turns = max_turns;
            }
            if let Some(timeout_secs) = timeout_secs {
                config.batch.timeout_secs = timeout_secs;
            }
            run_batch(&config, &cli.script).await
        }
    }
}

/// Build the per-line provider; fails before any work when its credential is missing
fn build_synthesizer(
    config: &AppConfig,
    kind: ProviderKind,
) -> whoseline_core::Result<Box<dyn SpeechSynthesizer>> {
    Ok(match kind {
        ProviderKind::OpenaiSpeech => Box::new(OpenAiSpeechProvider::new(
            &config.openai,
            config.openai_api_key()?,
        )?),
        ProviderKind::OpenaiChat => Box::new(OpenAiChatAudioProvider::new(
            &config.openai,
            config.openai_api_key()?,
        )?),
        ProviderKind::Google => Box::new(GoogleTtsProvider::new(
            &config.google,
            config.google_access_token()?,
        )?),
    })
}

/// Voice table matching the provider's voice names
fn voices_for(config: &AppConfig, kind: ProviderKind) -> whoseline_core::Result<VoiceMap> {
    match kind {
        ProviderKind::Google => config.google_voice_map(),
        ProviderKind::OpenaiSpeech | ProviderKind::OpenaiChat => config.voice_map(),
    }
}

async fn run_lines(
    config: &AppConfig,
    kind: ProviderKind,
    script: &std::path::Path,
    options: PipelineOptions,
) -> anyhow::Result<()> {
    let synthesizer = build_synthesizer(config, kind)?;
    let voices = voices_for(config, kind)?;

    let dialog = Dialog::load(script)
        .with_context(|| format!("Failed to load dialog from {}", script.display()))?;
    let merged = dialog.merged();
    info!(
        "Synthesizing {} lines ({} before merging) with {}",
        merged.len(),
        dialog.len(),
        synthesizer.name()
    );

    let progress = LineProgress::new(merged.len());
    let report = Pipeline::new(synthesizer.as_ref(), &voices, options)
        .run(&merged, &progress)
        .await?;
    progress.finish();

    println!(
        "Conversation audio, duration {:.2}s, saved as {}",
        report.duration.as_secs_f64(),
        report.output.display()
    );
    Ok(())
}

async fn run_batch(config: &AppConfig, script: &std::path::Path) -> anyhow::Result<()> {
    let provider = GoogleTtsProvider::new(&config.google, config.google_access_token()?)?;
    let tags = config.speaker_tag_map()?;
    let options = BatchOptions::from_config(config)?;

    let dialog = Dialog::load(script)
        .with_context(|| format!("Failed to load dialog from {}", script.display()))?;

    let spinner = ProgressBar::new_spinner();
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner.set_message(format!(
        "Waiting for long audio synthesis (up to {}s)",
        options.timeout.as_secs()
    ));
    let result = synthesize_multispeaker(&provider, &dialog, &tags, &options).await;
    spinner.finish_and_clear();
    let report = result?;

    println!(
        "Finished processing {} turns, audio written to {} (operation {})",
        report.turns, report.output_uri, report.operation
    );
    Ok(())
}
