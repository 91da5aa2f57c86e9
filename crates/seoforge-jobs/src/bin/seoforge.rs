//! seoforge: command-line access to populate specs, prompt contexts, SEO
//! synthesis, public metadata and backfill sweeps.
//!
//! Entities, schemas and stores are read from JSON files; results are printed
//! as JSON on stdout. Configuration comes from the environment (and `.env`).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde_json::{json, Value as JsonValue};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use seoforge_inference::{OpenAIBackend, PromptBuilder};
use seoforge_jobs::{
    clamp_depth, ContentKind, ContentTarget, GlobalDefaults, MemoryHost, PopulateTreeBuilder,
    PublicationStatus, SchemaRegistry, SeoConfig, SeoContextBuilder, SeoService,
};

#[derive(Parser)]
#[command(name = "seoforge")]
#[command(author, version, about = "SEO metadata synthesis for headless CMS content")]
#[command(propagate_version = true)]
struct Cli {
    /// Override the public site URL
    #[arg(long, global = true)]
    site_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Derive the populate spec of a content type from a schema dump
    Populate {
        /// Schema dump: {"contentTypes": {"<uid>": {"attributes": {..}}}, "components": {..}}
        #[arg(short, long)]
        schema: PathBuf,

        /// Content type or component id
        #[arg(short = 't', long = "type")]
        type_id: String,

        /// Traversal depth (clamped to 1..=8, default 4)
        #[arg(short, long)]
        depth: Option<i64>,
    },

    /// Build the prompt context and prompt for an entity
    Context {
        #[arg(short, long)]
        entity: PathBuf,

        /// page, article, news or event
        #[arg(short, long, default_value = "page")]
        kind: String,

        /// Prompt label (default: derived from the kind)
        #[arg(short, long)]
        label: Option<String>,
    },

    /// Generate and merge an SEO record for an entity
    Synthesize {
        #[arg(short, long)]
        entity: PathBuf,

        #[arg(short, long, default_value = "page")]
        kind: String,

        #[arg(short, long)]
        label: Option<String>,

        /// Global defaults JSON
        #[arg(short, long)]
        global: Option<PathBuf>,
    },

    /// Render the public metadata of an entity
    Render {
        #[arg(short, long)]
        entity: PathBuf,

        #[arg(short, long, default_value = "page")]
        kind: String,

        #[arg(short, long)]
        global: Option<PathBuf>,

        /// Entity attribute used as share image fallback
        #[arg(long)]
        fallback_image: Option<String>,
    },

    /// Look a document up by document id, numeric id or slug
    Resolve {
        /// Store: {"documents": {"<model uid>": [..]}, "global": {..}}
        #[arg(long)]
        store: PathBuf,

        #[arg(short = 't', long = "type")]
        model_uid: String,

        identifier: String,

        #[arg(long, default_value = "published")]
        status: String,
    },

    /// Run one backfill sweep against a store file
    Backfill {
        #[arg(long)]
        store: PathBuf,

        /// Schema dump used for populate specs (same shape as `populate --schema`)
        #[arg(short, long)]
        schema: Option<PathBuf>,

        /// Write the updated store back to the file
        #[arg(long)]
        write: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let mut config = SeoConfig::from_env();
    if let Some(url) = cli.site_url.as_deref() {
        config = config.with_site_url(url);
    }

    let output = match cli.command {
        Commands::Populate {
            schema,
            type_id,
            depth,
        } => {
            let schema = load_schema(&schema).await?;
            PopulateTreeBuilder::new(&schema)
                .build(&type_id, clamp_depth(depth))
                .to_json()
        }
        Commands::Context {
            entity,
            kind,
            label,
        } => {
            let entity = read_json(&entity).await?;
            let kind = parse_kind(&kind)?;
            let label = label.unwrap_or_else(|| default_label(kind).to_string());
            let site_url = config.effective_site_url();
            let mut context = SeoContextBuilder::new(config.context.clone(), config.base_paths.clone())
                .build_context(&entity, kind, &label, site_url.as_deref());
            let prompt = PromptBuilder::new(config.context.locale.clone()).build(&context);
            context.prompt = Some(prompt.clone());
            json!({"context": context, "prompt": prompt})
        }
        Commands::Synthesize {
            entity,
            kind,
            label,
            global,
        } => {
            let entity = read_json(&entity).await?;
            let kind = parse_kind(&kind)?;
            let label = label.unwrap_or_else(|| default_label(kind).to_string());
            let host = host_with_global(global.as_deref()).await?;
            let service = build_service(config, host, SchemaRegistry::new())?;
            let record = service.synthesize_record(&entity, kind, &label).await?;
            serde_json::to_value(record)?
        }
        Commands::Render {
            entity,
            kind,
            global,
            fallback_image,
        } => {
            let entity = read_json(&entity).await?;
            let kind = parse_kind(&kind)?;
            let host = host_with_global(global.as_deref()).await?;
            let service = build_service(config, host, SchemaRegistry::new())?;
            let fallback = fallback_image.as_deref().and_then(|field| entity.get(field));
            serde_json::to_value(service.render(&entity, kind, fallback).await)?
        }
        Commands::Resolve {
            store,
            model_uid,
            identifier,
            status,
        } => {
            let status: PublicationStatus = status
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid status: {}", e))?;
            let host = Arc::new(MemoryHost::from_json(&read_json(&store).await?)?);
            let service = build_service(config, host, SchemaRegistry::new())?;
            service
                .resolve(&model_uid, &identifier, status)
                .await?
                .unwrap_or(JsonValue::Null)
        }
        Commands::Backfill {
            store,
            schema,
            write,
        } => {
            let host = Arc::new(MemoryHost::from_json(&read_json(&store).await?)?);
            let schema = match schema {
                Some(path) => load_schema(&path).await?,
                None => SchemaRegistry::new(),
            };
            let service = build_service(config, host.clone(), schema)?;
            let report = service.run_backfill().await;
            if write {
                let updated = serde_json::to_string_pretty(&host.to_json()?)?;
                tokio::fs::write(&store, updated)
                    .await
                    .with_context(|| format!("writing {}", store.display()))?;
                info!(path = %store.display(), "Store written");
            }
            serde_json::to_value(report)?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// RUST_LOG filters (default `seoforge=info`); LOG_FORMAT is `json` or `text`.
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "seoforge=info,seoforge_jobs=info,seoforge_inference=info".into());

    let registry = tracing_subscriber::registry().with(env_filter);
    if log_format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn build_service(
    config: SeoConfig,
    host: Arc<MemoryHost>,
    schema: SchemaRegistry,
) -> anyhow::Result<SeoService> {
    let backend = OpenAIBackend::new(config.generation.clone())?;
    Ok(SeoService::new(
        config,
        host,
        Arc::new(backend),
        Arc::new(schema),
    ))
}

async fn host_with_global(path: Option<&Path>) -> anyhow::Result<Arc<MemoryHost>> {
    let global = match path {
        Some(path) => serde_json::from_value::<GlobalDefaults>(read_json(path).await?)
            .with_context(|| format!("parsing global defaults in {}", path.display()))?,
        None => GlobalDefaults::default(),
    };
    Ok(Arc::new(MemoryHost::new().with_global(global)))
}

async fn load_schema(path: &Path) -> anyhow::Result<SchemaRegistry> {
    Ok(SchemaRegistry::from_json(&read_json(path).await?)?)
}

async fn read_json(path: &Path) -> anyhow::Result<JsonValue> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

fn parse_kind(value: &str) -> anyhow::Result<ContentKind> {
    match value.parse() {
        Ok(kind) => Ok(kind),
        Err(e) => bail!("invalid kind: {}", e),
    }
}

fn default_label(kind: ContentKind) -> &'static str {
    seoforge_jobs::CONTENT_TARGETS
        .iter()
        .find(|target: &&ContentTarget| target.kind == kind)
        .map(|target| target.label)
        .unwrap_or_else(|| kind.as_str())
}
