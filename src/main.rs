use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, anyhow, bail};
use clap::{Parser, Subcommand};
use tracing::info;

use waav_synth::core::utterance::relation_names;
use waav_synth::{
    NullAudioPlayer, SynthConfig, Synthesizer, Tokenizer, Utterance, Voice, create_audio_player,
    pipeline::{
        Durator, PcmAudioOutput, PcmStreamCollector, PhoneListStage, Pipeline, TokenizerStage,
    },
};

/// WaaV Synth - text-to-speech utterance pipeline
#[derive(Parser, Debug)]
#[command(name = "waav-synth")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short = 'c', long = "config", value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the tokens of a text as JSON lines
    Tokenize {
        /// Text file to read (stdin if not specified)
        #[arg(short = 'i', long = "input")]
        input: Option<PathBuf>,
    },

    /// Print predicted segment end times for a phone string as JSON lines
    Durations {
        /// Whitespace-separated phone names, e.g. "pau h e l o pau"
        #[arg(short = 'p', long = "phones")]
        phones: String,
    },

    /// Deliver a raw 16 kHz 16-bit mono PCM stream to the configured sink
    Render {
        /// Raw PCM produced by an external synthesizer
        #[arg(short = 'i', long = "input")]
        input: PathBuf,

        /// Text the audio was synthesized from
        #[arg(short = 't', long = "text", default_value = "")]
        text: String,
    },
}

fn load_config(path: Option<PathBuf>) -> anyhow::Result<SynthConfig> {
    let config = if let Some(config_path) = path {
        info!(path = %config_path.display(), "Loading configuration");
        SynthConfig::from_file(&config_path)?
    } else {
        SynthConfig::from_env()?
    };
    Ok(config)
}

fn tokenize(config: &SynthConfig, input: Option<PathBuf>) -> anyhow::Result<()> {
    let reader: Box<dyn BufRead + Send> = match input {
        Some(path) => {
            let file = File::open(&path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(io::stdin())),
    };

    let mut tokenizer = Tokenizer::from_reader(reader).with_symbols(config.tokenizer.clone());
    let stdout = io::stdout();
    let mut out = stdout.lock();

    while tokenizer.has_more_tokens() {
        let token = tokenizer.next_token();
        let line = serde_json::json!({
            "token": token,
            "break": tokenizer.is_break(),
        });
        writeln!(out, "{line}")?;
    }

    if let Some(error) = tokenizer.error_description() {
        return Err(anyhow!("Input read failed: {error}"));
    }
    Ok(())
}

fn durations(config: &SynthConfig, phones: &str) -> anyhow::Result<()> {
    let Some(durator) = Durator::from_config(&config.voice)? else {
        bail!("durations needs voice.duration_tree and voice.duration_table");
    };

    let voice = Voice::new(config.voice.name.clone(), Arc::new(NullAudioPlayer::new()))
        .with_rate(config.voice.rate);
    let pipeline = Pipeline::builder("durations")
        .stage(PhoneListStage::new())
        .stage(durator)
        .build();

    let mut utterance = Utterance::new(Arc::new(voice), phones);
    pipeline.run(&mut utterance)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if let Some(segments) = utterance.relation(relation_names::SEGMENT) {
        for segment in segments.iter() {
            let line = serde_json::json!({
                "name": segment.name(),
                "end": segment.features().get_float("end").ok(),
            });
            writeln!(out, "{line}")?;
        }
    }
    Ok(())
}

fn render(config: &SynthConfig, input: PathBuf, text: &str) -> anyhow::Result<()> {
    let player = create_audio_player(config)
        .with_context(|| format!("Failed to open {}", config.output.path.display()))?;

    let voice = Voice::new(config.voice.name.clone(), Arc::clone(&player))
        .with_rate(config.voice.rate)
        .with_volume(config.voice.volume);

    let pipeline = Pipeline::builder("render")
        .stage(TokenizerStage::new(config.tokenizer.clone()))
        .stage(PcmStreamCollector::from_file(&input))
        .stage(PcmAudioOutput::new())
        .build();

    let synthesizer = Synthesizer::new(Arc::new(voice), pipeline);
    let result = synthesizer.speak(text);
    player.close();
    let utterance = result?;

    info!(
        utterance_id = %utterance.id(),
        sink = %config.output.sink,
        path = %config.output.path.display(),
        playback_ms = player.time_ms(),
        "Render complete"
    );
    Ok(())
}

fn main() -> anyhow::Result<()> {
    // Load .env file if it exists (must be done before config loading)
    let _ = dotenvy::dotenv();

    // Initialize tracing; stdout carries command output
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let cli = Cli::parse();
    let config = load_config(cli.config)?;

    match cli.command {
        Commands::Tokenize { input } => tokenize(&config, input),
        Commands::Durations { phones } => durations(&config, &phones),
        Commands::Render { input, text } => render(&config, input, &text),
    }
}
