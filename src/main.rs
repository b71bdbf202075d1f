// SPDX-License-Identifier: MIT

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use futures::future::join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use flowviz_rs::dag::{DagExport, FlowError, Pipeline};
use flowviz_rs::viz::{
    describe_flow, list_requests, request_trace, DirectorySource, DotGenerator, FlowSource,
    RenderStyle,
};

const STYLE_ENV: &str = "FLOWVIZ_STYLE";
const DATA_DIR_ENV: &str = "FLOWVIZ_DATA_DIR";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// YAML style file (falls back to $FLOWVIZ_STYLE, then built-in defaults)
    #[arg(short, long, global = true)]
    style: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render dag exports into DOT
    Render {
        /// Export files to render
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Directory receiving one .dot file per export (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Describe a flow function and render its dag
    Describe {
        /// Flow function name
        function: String,

        /// Data directory (falls back to $FLOWVIZ_DATA_DIR)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
    /// List the requests served by a flow function
    Requests {
        function: String,

        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
    /// Show the timing breakdown of one request trace
    Trace {
        trace_id: String,

        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
    /// Show the node a pipeline state currently points at
    Position {
        /// Dag export file
        #[arg(short, long)]
        dag: PathBuf,

        /// Pipeline state document
        #[arg(short = 't', long)]
        state: PathBuf,
    },
}

fn load_style(path: Option<PathBuf>) -> Result<RenderStyle> {
    let path = path.or_else(|| std::env::var_os(STYLE_ENV).map(PathBuf::from));
    match path {
        Some(path) => {
            log::info!("Using style file: {}", path.display());
            RenderStyle::from_yaml_file(&path)
                .with_context(|| format!("failed to load style {}", path.display()))
        }
        None => Ok(RenderStyle::default()),
    }
}

fn data_source(dir: Option<PathBuf>) -> Result<DirectorySource> {
    let dir = dir
        .or_else(|| std::env::var_os(DATA_DIR_ENV).map(PathBuf::from))
        .with_context(|| format!("no data directory given (use --dir or {})", DATA_DIR_ENV))?;
    Ok(DirectorySource::new(dir))
}

fn render_file(generator: &DotGenerator, path: &Path) -> Result<String, FlowError> {
    let content = std::fs::read_to_string(path)?;
    generator.generate_from_json(&content)
}

async fn render(generator: DotGenerator, files: Vec<PathBuf>, output: Option<PathBuf>) -> Result<()> {
    let generator = Arc::new(generator);

    let tasks = files.iter().cloned().map(|path| {
        let generator = Arc::clone(&generator);
        tokio::task::spawn_blocking(move || render_file(&generator, &path))
    });
    let results = join_all(tasks).await;

    if let Some(dir) = &output {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }

    for (path, result) in files.iter().zip(results) {
        let doc = result
            .context("render task panicked")?
            .with_context(|| format!("failed to render {}", path.display()))?;

        match &output {
            Some(dir) => {
                let stem = path.file_stem().unwrap_or(path.as_os_str());
                let target = dir.join(format!("{}.dot", stem.to_string_lossy()));
                tokio::fs::write(&target, doc)
                    .await
                    .with_context(|| format!("failed to write {}", target.display()))?;
                log::info!("Wrote {}", target.display());
            }
            None => print!("{}", doc),
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();

    match args.command {
        Commands::Render { files, output } => {
            let generator = DotGenerator::new(load_style(args.style)?);
            render(generator, files, output).await?;
        }
        Commands::Describe { function, dir } => {
            let source = data_source(dir)?;
            let generator = DotGenerator::new(load_style(args.style)?);
            let desc = describe_flow(&source, &generator, &function)
                .await
                .with_context(|| format!("failed to describe flow '{}'", function))?;
            println!("{}", serde_json::to_string_pretty(&desc)?);
        }
        Commands::Requests { function, dir } => {
            let source = data_source(dir)?;
            let traces = source
                .requests(&function)
                .await
                .with_context(|| format!("failed to load requests of '{}'", function))?;
            println!("{}", serde_json::to_string_pretty(&list_requests(&traces))?);
        }
        Commands::Trace { trace_id, dir } => {
            let source = data_source(dir)?;
            let traces = source
                .trace(&trace_id)
                .await
                .with_context(|| format!("failed to load trace '{}'", trace_id))?;
            let trace = request_trace(&traces, &trace_id)?;
            if let Some(started) = trace.started_at() {
                log::info!("Request '{}' started at {}", trace.request_id, started);
            }
            println!("{}", serde_json::to_string_pretty(&trace)?);
        }
        Commands::Position { dag, state } => {
            let export = tokio::fs::read_to_string(&dag)
                .await
                .with_context(|| format!("failed to read {}", dag.display()))?;
            let state = tokio::fs::read_to_string(&state)
                .await
                .with_context(|| format!("failed to read {}", state.display()))?;

            let mut pipeline = Pipeline::new(DagExport::from_json(&export)?.into_dag()?);
            pipeline.apply_state(&state)?;
            let (node, owner) = pipeline.current_node_dag()?;
            println!(
                "depth {}: node '{}' ({}) in dag '{}'",
                pipeline.execution_depth(),
                node.id(),
                node.unique_id(),
                owner.id()
            );
        }
    }

    Ok(())
}
