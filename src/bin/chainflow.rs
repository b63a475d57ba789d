use clap::{Parser, Subcommand};
use chainflow::compiler::extractor::{extract_runs, orphans};
use chainflow::compiler::loader::load_layout_from_yaml;
use chainflow::config::Settings;
use chainflow::dsl::{Layout, PipelineKind};
use chainflow::nodes::Vocabulary;
use chainflow::runtime::executor::HttpExecutor;
use chainflow::runtime::redis_storage::RedisBackupStore;
use chainflow::runtime::session::PipelineSession;
use chainflow::runtime::storage::{BackupStore, FileBackupStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use anyhow::{Result, anyhow};
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Settings file (YAML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the node types of a pipeline
    Describe {
        #[arg(long, short)]
        pipeline: PipelineKind,
    },

    /// Show the runs of a layout and whether it can be run
    Validate {
        /// Path to the layout YAML file
        #[arg(long, short)]
        file: PathBuf,
    },

    /// Print the payload a layout would dispatch
    Payload {
        #[arg(long, short)]
        file: PathBuf,
    },

    /// Dispatch a layout to the execution service
    Run {
        #[arg(long, short)]
        file: PathBuf,

        /// Overrides executor.endpoint from the settings file
        #[arg(long)]
        endpoint: Option<String>,

        /// Node to run from (defaults to the End node of the valid run)
        #[arg(long)]
        trigger: Option<String>,
    },
}

fn load(file: &Path) -> Result<(Layout, Arc<Vocabulary>)> {
    let layout = load_layout_from_yaml(file)?;
    let vocabulary = Arc::new(Vocabulary::for_kind(layout.pipeline));
    info!(layout = %layout.id, pipeline = %layout.pipeline, nodes = layout.nodes.len(), "Loaded layout");
    Ok((layout, vocabulary))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut settings = Settings::load_or_default(cli.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_max_level(settings.log_level())
        .init();

    match cli.command {
        Commands::Describe { pipeline } => {
            let vocabulary = Vocabulary::for_kind(pipeline);
            println!("{} pipeline", pipeline);
            for (tag, descriptor) in vocabulary.registry.iter() {
                let limit = descriptor
                    .instance_limit
                    .map(|l| l.to_string())
                    .unwrap_or_else(|| "-".to_string());
                let source = if vocabulary.source_category.iter().any(|s| *s == tag) { " (source)" } else { "" };
                println!(
                    "  {:<16} input={:<5} output={:<5} limit={:<2} immortal={}{}",
                    tag, descriptor.accepts_input, descriptor.accepts_output, limit, descriptor.immortal, source
                );
            }
        }

        Commands::Validate { file } => {
            let (layout, vocabulary) = load(&file)?;
            let store = vocabulary.restore(layout.nodes)?;
            let runs = extract_runs(&store)?;

            for run in &runs {
                let marker = if run.is_complete() { "complete" } else { "fragment" };
                println!("[{}] {}", marker, run.ids().join(" -> "));
            }
            let orphan_count = orphans(&runs).count();
            if orphan_count > 0 {
                println!("{} unlinked fragment(s)", orphan_count);
            }

            match vocabulary.validate(&store) {
                Ok(run) => println!("OK: {} node(s) ready to run", run.len()),
                Err(e) => {
                    println!("INVALID: {}", e);
                    std::process::exit(1);
                }
            }
        }

        Commands::Payload { file } => {
            let (layout, vocabulary) = load(&file)?;
            let store = vocabulary.restore(layout.nodes)?;
            let run = vocabulary.validate(&store)?;
            let payload = vocabulary.aggregate(&run, &run.tail().id)?;
            println!("{}", serde_json::to_string_pretty(&payload)?);
        }

        Commands::Run { file, endpoint, trigger } => {
            if let Some(endpoint) = endpoint {
                settings.executor.endpoint = endpoint;
            }
            let (layout, vocabulary) = load(&file)?;

            let executor = Arc::new(HttpExecutor::from_settings(&settings.executor)?);
            let backup: Arc<dyn BackupStore> = match &settings.storage.redis_url {
                Some(url) => Arc::new(RedisBackupStore::new(redis::Client::open(url.as_str())?)),
                None => Arc::new(FileBackupStore::new(settings.storage.backup_dir.clone())),
            };

            let mut session = PipelineSession::from_nodes(vocabulary, layout.nodes, executor, backup)?;
            let trigger = match trigger {
                Some(t) => t,
                None => match session.validation() {
                    Ok(ids) => ids.last().cloned().ok_or_else(|| anyhow!("Valid run is empty"))?,
                    Err(e) => return Err(anyhow!("Layout {} cannot run: {}", layout.id, e)),
                },
            };

            let result = session.run(&trigger).await?;
            if result.success {
                println!("{}", serde_json::to_string_pretty(&result.result)?);
            } else {
                let message = result.error.unwrap_or_else(|| "unknown error".to_string());
                return Err(anyhow!("Execution failed: {} (payload backed up)", message));
            }
        }
    }

    Ok(())
}
