use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use nura::voice::{
    AudioPlayback, ConsoleInput, ConsoleOutput, MicStream, MicrophoneInput, PLAYBACK_SAMPLE_RATE,
    SAMPLE_RATE, SpeakerOutput, TextToSpeech, rms,
};
use nura::{
    Assistant, AssistantParts, Config, FactStore, Interpreter, Shell, SpeechInput, SpeechOutput,
    StatusDisplay,
};

/// NURA - Neural personal assistant
#[derive(Parser)]
#[command(name = "nura", version, about)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Type commands and read answers in the terminal instead of using audio
    #[arg(long, env = "NURA_CONSOLE")]
    console: bool,

    /// Fact database path
    #[arg(long, env = "NURA_DB")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
#[allow(clippy::enum_variant_names)]
enum Command {
    /// Test microphone input
    TestMic {
        /// Duration in seconds
        #[arg(short, long, default_value = "5")]
        duration: u64,
    },
    /// Test speaker output
    TestSpeaker,
    /// Test TTS output
    TestTts {
        /// Text to speak
        #[arg(default_value = "Hello! This is a test of the text to speech system.")]
        text: String,
    },
    /// List remembered facts
    Facts,
    /// Answer one query without listening
    Ask {
        /// Query text, e.g. "what is my name"
        #[arg(required = true)]
        query: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,nura=info",
        1 => "info,nura=debug",
        2 => "debug",
        _ => "trace",
    };

    // stdout belongs to the status display
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::future_not_send)]
async fn run(cli: Cli) -> anyhow::Result<()> {
    if let Some(cmd) = cli.command {
        return match cmd {
            Command::TestMic { duration } => test_mic(duration).await,
            Command::TestSpeaker => blocking(test_speaker).await,
            Command::TestTts { text } => {
                let config = Config::load(cli.db)?;
                blocking(move || test_tts(&config, &text)).await
            }
            Command::Facts => list_facts(cli.db),
            Command::Ask { query } => ask(cli.db, &query.join(" ")),
        };
    }

    let config = Config::load(cli.db)?;
    tracing::info!(
        db = %config.db_path.display(),
        console = cli.console,
        "starting nura"
    );

    let store = Arc::new(FactStore::open(&config.db_path)?);
    let (input, output) = collaborators(&config, cli.console);

    let assistant = Assistant::new(
        AssistantParts {
            input,
            output,
            interpreter: Interpreter::new().with_knowledge(config.knowledge()),
            store,
            wake: config.wake_matcher(),
            exit: config.exit_matcher(),
            pacing: config.pacing,
        },
        Shell::new(StatusDisplay::stdout("NURA")),
    );

    tracing::info!(wake_phrases = ?config.wake_phrases, "nura ready");

    // Run until interrupted
    assistant
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
            }
        })
        .await?;

    tracing::info!("nura stopped");
    Ok(())
}

/// Pick speech collaborators, falling back to the terminal when audio
/// services are not configured
fn collaborators(
    config: &Config,
    console: bool,
) -> (Arc<dyn SpeechInput>, Arc<dyn SpeechOutput>) {
    let typed = || Arc::new(ConsoleInput::new());

    if console {
        return (typed(), Arc::new(ConsoleOutput));
    }

    let input: Arc<dyn SpeechInput> = match config.listen_settings() {
        Ok(settings) => Arc::new(MicrophoneInput::new(settings)),
        Err(e) => {
            tracing::warn!(error = %e, "speech recognition unavailable, reading from the terminal");
            typed()
        }
    };

    let output: Arc<dyn SpeechOutput> = match config.speak_settings() {
        Ok(settings) => Arc::new(SpeakerOutput::new(settings)),
        Err(e) => {
            tracing::warn!(error = %e, "speech synthesis unavailable, printing responses");
            Arc::new(ConsoleOutput)
        }
    };

    (input, output)
}

/// Run blocking audio/HTTP work off the async runtime
async fn blocking<F>(f: F) -> anyhow::Result<()>
where
    F: FnOnce() -> anyhow::Result<()> + Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}

/// Test microphone input
#[allow(clippy::future_not_send)]
async fn test_mic(duration: u64) -> anyhow::Result<()> {
    println!("Testing microphone for {duration} seconds...");
    println!("Speak into your microphone!\n");

    let mic = MicStream::open()?;
    println!("Sample rate: {SAMPLE_RATE} Hz");
    println!("---");

    for i in 0..duration {
        tokio::time::sleep(Duration::from_secs(1)).await;

        let samples = mic.drain();
        let energy = rms(&samples);
        let peak = samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let meter_len = (energy * 100.0).min(50.0) as usize;
        let meter: String = "#".repeat(meter_len) + &" ".repeat(50 - meter_len);

        println!("[{:2}s] RMS: {energy:.4} | Peak: {peak:.4} | [{meter}]", i + 1);
    }

    drop(mic);

    println!("\n---");
    println!("If you saw movement in the meter, your mic is working!");
    println!("If RMS stayed near 0, check:");
    println!("  1. Is your mic plugged in?");
    println!("  2. Run: pactl info | grep 'Default Source'");
    println!("  3. Run: arecord -l (to list devices)");

    Ok(())
}

/// Test speaker output with a sine wave
fn test_speaker() -> anyhow::Result<()> {
    println!("Testing speaker output...");
    println!("You should hear a 440Hz tone for 2 seconds\n");

    let playback = AudioPlayback::new(1.0)?;

    let frequency = 440.0_f32;
    let num_samples = PLAYBACK_SAMPLE_RATE as usize * 2;

    #[allow(clippy::cast_precision_loss)]
    let samples: Vec<f32> = (0..num_samples)
        .map(|i| {
            let t = i as f32 / PLAYBACK_SAMPLE_RATE as f32;
            (2.0 * std::f32::consts::PI * frequency * t).sin() * 0.3
        })
        .collect();

    println!("Playing {} samples at {PLAYBACK_SAMPLE_RATE} Hz...", samples.len());
    playback.play(samples)?;

    println!("\n---");
    println!("If you heard the tone, your speakers are working!");
    println!("If you didn't hear anything, check:");
    println!("  1. Run: pactl info | grep 'Default Sink'");
    println!("  2. Run: pactl list sinks short");

    Ok(())
}

/// Test TTS output
fn test_tts(config: &Config, text: &str) -> anyhow::Result<()> {
    println!("Testing TTS with text: \"{text}\"\n");

    let settings = config.speak_settings()?;
    let tts = TextToSpeech::new(
        settings.provider,
        settings.api_key,
        &settings.voice,
        settings.speed,
        settings.model,
    )?;

    println!("Synthesizing speech with voice {}...", tts.voice());
    let mp3_data = tts.synthesize(text)?;
    println!("Got {} bytes of audio data", mp3_data.len());

    println!("Playing audio...");
    AudioPlayback::new(settings.volume)?.play_mp3(&mp3_data)?;

    println!("\n---");
    println!("If you heard the speech, TTS is working!");

    Ok(())
}

/// List remembered facts
fn list_facts(db: Option<PathBuf>) -> anyhow::Result<()> {
    let config = Config::load(db)?;
    let store = FactStore::open(&config.db_path)?;
    let facts = store.list()?;

    if facts.is_empty() {
        println!("No facts remembered yet ({})", config.db_path.display());
    }

    for fact in facts {
        println!(
            "{:<20} {:<30} {}",
            fact.key_phrase,
            fact.value,
            fact.updated_at.format("%Y-%m-%d %H:%M:%S")
        );
    }

    store.close();
    Ok(())
}

/// Answer one query against the fact store
fn ask(db: Option<PathBuf>, query: &str) -> anyhow::Result<()> {
    let config = Config::load(db)?;
    let store = FactStore::open(&config.db_path)?;
    let interpreter = Interpreter::new().with_knowledge(config.knowledge());

    println!("{}", interpreter.interpret(query, &store));

    store.close();
    Ok(())
}
