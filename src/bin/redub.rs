use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use redub::{DubbingPipeline, OpenAiClient, Providers, Settings, default_output_path};

#[derive(Parser, Debug)]
#[command(name = "redub", version, about = "Replace a video's narration with synthesized speech")]
struct Cli {
    /// Source video.
    #[arg(short = 'i', long = "input")]
    input: PathBuf,

    /// Translate the narration into this language before synthesis.
    #[arg(short = 'l', long)]
    language: Option<String>,

    /// Extra guidance for the translation model.
    #[arg(long)]
    translation_instruction: Option<String>,

    /// Narration style instruction; overrides TTS_INSTRUCTION.
    #[arg(long)]
    tts_instruction: Option<String>,

    /// Prepared transcript JSON; skips extraction and transcription.
    #[arg(short = 't', long)]
    transcript: Option<PathBuf>,

    /// Output video (default: `<stem>.dubbed.<ext>` next to the input).
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Maximum concurrent speech requests.
    #[arg(long)]
    max_concurrency: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("redub=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut settings = Settings::from_env().context("load settings from environment")?;
    if let Some(lang) = cli.language {
        settings.target_language = Some(lang);
    }
    if let Some(instruction) = cli.translation_instruction {
        settings.translation_instruction = Some(instruction);
    }
    if let Some(instruction) = cli.tts_instruction {
        settings.tts_instruction_override = Some(instruction);
    }
    if let Some(n) = cli.max_concurrency {
        settings.max_concurrency = n;
    }
    settings.validate()?;

    let client = Arc::new(OpenAiClient::from_settings(&settings)?);
    let pipeline = DubbingPipeline::new(settings, Providers::from_shared(client))?;

    let output = cli
        .output
        .unwrap_or_else(|| default_output_path(&cli.input));
    let written = pipeline
        .run(&cli.input, &output, cli.transcript.as_deref())
        .await
        .with_context(|| format!("dub '{}'", cli.input.display()))?;

    eprintln!("wrote {}", written.display());
    Ok(())
}
