//! postsmith binary entrypoint.
//! Thin CLI wrapper around the generation pipeline; all real work lives in
//! the library. See `README.md` for quickstart.

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use postsmith::config::{AppConfig, ENV_API_KEY};
use postsmith::generation::AnthropicBackend;
use postsmith::pipeline::{GenerateRequest, Pipeline, ReviseRequest};
use postsmith::store::OutputStore;
use postsmith::verify::UrlVerifier;
use postsmith::voice::VoiceProfile;

#[derive(Parser)]
#[command(name = "postsmith", about = "Draft social posts from aggregated sources")]
struct Cli {
    /// Path to the TOML config file.
    #[arg(long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch sources and generate a fresh batch of drafts.
    Generate {
        /// Re-fetch from connectors even if cached data exists upstream.
        #[arg(long)]
        scrape: bool,
    },
    /// Request one alternative for an existing draft.
    Revise {
        #[arg(long)]
        id: String,
        #[arg(long)]
        feedback: String,
        /// Original draft content (pasted verbatim).
        #[arg(long)]
        content: String,
    },
    /// List persisted batches, most recent first.
    List,
    /// Check reachability of a draft's source URL.
    Verify {
        #[arg(long)]
        url: String,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(p) => AppConfig::load_from_file(p)?,
        None => AppConfig::load_default()?,
    };

    match cli.command {
        Command::Generate { scrape } => {
            let pipeline = build_pipeline(config)?;
            let resp = pipeline
                .generate(GenerateRequest {
                    scrape_first: scrape,
                    ..Default::default()
                })
                .await?;
            println!(
                "{} drafts generated by {} ({} tokens)",
                resp.drafts.len(),
                resp.model,
                resp.tokens_used
            );
            for d in &resp.drafts {
                println!("\n[{}] ({:?}, confidence {:.2})", d.id, d.source, d.confidence);
                println!("{}", d.content);
            }
        }
        Command::Revise { id, feedback, content } => {
            let pipeline = build_pipeline(config)?;
            let resp = pipeline
                .revise(ReviseRequest {
                    draft_id: id,
                    feedback,
                    original_content: content,
                })
                .await?;
            println!("{}", resp.content);
        }
        Command::Verify { url } => {
            let status = UrlVerifier::new().verify(&url).await;
            println!("{url}: {status:?}");
        }
        Command::List => {
            let store = OutputStore::new(config.data_dir.clone());
            for batch in store.load_all() {
                println!(
                    "{}  {} drafts  (generated {})",
                    batch.date,
                    batch.drafts.len(),
                    batch.generated_at.format("%Y-%m-%d %H:%M UTC")
                );
            }
        }
    }

    Ok(())
}

fn build_pipeline(config: AppConfig) -> anyhow::Result<Pipeline<AnthropicBackend>> {
    let Some(api_key) = AppConfig::api_key() else {
        bail!("missing {ENV_API_KEY} environment variable");
    };
    let voice = VoiceProfile::load_from_file(&config.persona.voice_profile)
        .with_context(|| format!("loading voice profile {}", config.persona.voice_profile))?;
    let backend = AnthropicBackend::new(api_key, config.generation.model.clone());
    Ok(Pipeline::new(config, voice, backend))
}
