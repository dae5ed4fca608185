//! Command-line arguments

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(author, version, about = "Synthesize a scripted dialog into one audio file")]
pub struct Cli {
    /// Configuration file (defaults to ./whoseline.toml when present)
    #[arg(long, short, global = true, env = "WHOSELINE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Dialog script: a JSON array of {"actor": <int>, "line": <text>}
    #[arg(long, short, global = true, default_value = "script.json")]
    pub script: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Synthesize line by line and export one local WAV file
    Lines {
        #[arg(long, value_enum, default_value = "openai-speech")]
        provider: ProviderKind,

        /// Overrides pipeline.output_path
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Keep the raw per-line payloads in this directory
        #[arg(long)]
        scratch_dir: Option<PathBuf>,
    },

    /// Submit one multi-speaker long-audio job to Google Text-to-Speech
    Batch {
        /// Overrides batch.output_uri, e.g. gs://bucket/dialog.wav
        #[arg(long)]
        output_uri: Option<String>,

        /// Overrides batch.max_turns
        #[arg(long)]
        max_turns: Option<usize>,

        /// Overrides batch.timeout_secs
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProviderKind {
    /// OpenAI /audio/speech
    OpenaiSpeech,
    /// OpenAI chat completion with audio output
    OpenaiChat,
    /// Google Cloud Text-to-Speech
    Google,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lines_defaults() {
        let cli = Cli::try_parse_from(["whoseline", "lines"]).unwrap();
        assert_eq!(cli.script, PathBuf::from("script.json"));
        match cli.command {
            Command::Lines {
                provider, output, ..
            } => {
                assert_eq!(provider, ProviderKind::OpenaiSpeech);
                assert!(output.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_batch_with_global_args_after_subcommand() {
        let cli = Cli::try_parse_from([
            "whoseline",
            "batch",
            "--script",
            "dialog.json",
            "--output-uri",
            "gs://bucket/out.wav",
            "--max-turns",
            "4",
        ])
        .unwrap();
        assert_eq!(cli.script, PathBuf::from("dialog.json"));
        match cli.command {
            Command::Batch {
                output_uri,
                max_turns,
                timeout_secs,
            } => {
                assert_eq!(output_uri.as_deref(), Some("gs://bucket/out.wav"));
                assert_eq!(max_turns, Some(4));
                assert_eq!(timeout_secs, None);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_rejects_unknown_provider() {
        assert!(Cli::try_parse_from(["whoseline", "lines", "--provider", "espeak"]).is_err());
        let cli =
            Cli::try_parse_from(["whoseline", "lines", "--provider", "openai-chat"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Lines {
                provider: ProviderKind::OpenaiChat,
                ..
            }
        ));
    }
}
