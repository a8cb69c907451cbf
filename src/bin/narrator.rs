// narrator - CLI for the screen / game-event narrator and its MCP tool server

use anyhow::Context;
use clap::{Parser, Subcommand};
use narrator::capture::SystemCapture;
use narrator::config::{CONFIG_FILE_NAME, NarratorConfig};
use narrator::playback::SystemPlayer;
use narrator::tools::{ToolRouter, mcp};
use narrator::{Narrator, Pipeline, PipelineSettings};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Sarcastic sports-commentator narration for your screen or Minecraft session", long_about = None)]
struct Args {
    /// Path to configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory for screenshots and audio (overrides config and SCREENSHOT_DIR)
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Take a screenshot every interval and narrate what changed
    Screen,

    /// Narrate Minecraft events reported by the companion mod (no screenshots)
    Events,

    /// Serve the narrator tools over MCP on stdin/stdout
    Serve,

    /// Call a single tool and print its output
    Tool {
        /// Tool name, e.g. get_sfx
        name: String,

        /// Tool arguments as a JSON object
        #[arg(default_value = "{}")]
        arguments: String,
    },

    /// Write an example narrator.toml
    Init {
        #[arg(default_value = CONFIG_FILE_NAME)]
        path: PathBuf,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "narrator=debug" } else { "narrator=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // stdout belongs to the MCP transport
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Config (file, then env, then `--dir`) and the narrator built from it
fn setup(args: &Args) -> anyhow::Result<(NarratorConfig, Arc<Narrator>)> {
    let mut config = NarratorConfig::load(args.config.as_deref())?;
    if let Some(dir) = &args.dir {
        config.storage.dir = dir.clone();
    }
    if config.gemini.api_key.is_none() {
        warn!("GEMINI_API_KEY is not set; narration calls will fail");
    }
    if config.elevenlabs.api_key.is_none() {
        warn!("ELEVENLABS_API_KEY is not set; hosted speech is unavailable");
    }

    let narrator = Narrator::from_config(&config).context("Failed to set up narrator")?;
    Ok((config, Arc::new(narrator)))
}

fn init_config(path: &Path) -> anyhow::Result<()> {
    if path.exists() {
        anyhow::bail!("{} already exists", path.display());
    }
    NarratorConfig::default().to_file(path)?;
    println!("✅ Created example config at: {}", path.display());
    Ok(())
}

fn print_attribution() {
    println!("🎵 Sound Effects: MyInstants API (https://github.com/abdipr/myinstants-api)");
    println!("   Sounds from MyInstants.com - Used with attribution");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    init_tracing(args.verbose);

    match &args.command {
        Command::Init { path } => init_config(path)?,
        Command::Screen => {
            let (config, narrator) = setup(&args)?;
            println!("🚀 Screenshot Narrator Started");
            println!("📁 Screenshots directory: {}", config.storage.dir.display());
            println!("⏱️  Taking screenshots every {} seconds", config.capture.interval_secs);
            print_attribution();
            println!("\nPress Ctrl+C to stop\n");

            let pipeline = Arc::new(Pipeline::new(
                narrator,
                Arc::new(SystemPlayer),
                PipelineSettings::from_config(&config),
            ));

            tokio::select! {
                result = pipeline.run_screen(Arc::new(SystemCapture)) => result?,
                _ = tokio::signal::ctrl_c() => println!("\n👋 Stopping screenshot narrator..."),
            }
        }
        Command::Events => {
            let (config, narrator) = setup(&args)?;
            println!("🚀 Minecraft Narrator Started");
            println!("📁 Events file: {}", config.events_file().display());
            println!(
                "⏱️  Checking for events every {} seconds, narrating every {} events",
                config.minecraft.check_interval_secs, config.minecraft.min_batch
            );
            print_attribution();
            println!("\nPress Ctrl+C to stop\n");

            let pipeline = Arc::new(Pipeline::new(
                narrator,
                Arc::new(SystemPlayer),
                PipelineSettings::from_config(&config),
            ));

            tokio::select! {
                result = pipeline.run_events() => result?,
                _ = tokio::signal::ctrl_c() => println!("\n👋 Stopping Minecraft narrator..."),
            }
        }
        Command::Serve => {
            let (config, narrator) = setup(&args)?;
            let router = ToolRouter::new(narrator).with_default_sfx_limit(config.sfx.default_limit);
            info!("Serving narrator tools over stdio");
            mcp::serve(&router, tokio::io::stdin(), tokio::io::stdout()).await?;
        }
        Command::Tool { name, arguments } => {
            let (config, narrator) = setup(&args)?;
            let arguments: serde_json::Value =
                serde_json::from_str(arguments).context("Tool arguments must be a JSON object")?;
            let router = ToolRouter::new(narrator).with_default_sfx_limit(config.sfx.default_limit);

            let output = router.call(name, &arguments).await;
            for text in &output.content {
                println!("{}", text);
            }
            if output.is_error {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
