use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::{Context, IntoDiagnostic, Result};
use writeup_common::Config;
use writeup_common::config::FileStore;
use writeup_common::telemetry::{self, TelemetryConfig};
use writeup_editor_core::import_markdown_file;
use writeup_posts::PostDraft;
use writeup_renderer::ContentRenderer;

#[derive(Parser)]
#[command(version, about = "Writeup - render and import CTF writeups", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to a .json or .toml config file
    #[arg(long, env = "WRITEUP_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sanitize and render a stored post
    Render {
        /// HTML file with the stored post content
        file: PathBuf,

        /// Print the heading outline as JSON after the markup
        #[arg(long)]
        toc: bool,
    },
    /// Convert a markdown file to editor markup
    Import {
        /// Markdown file
        file: PathBuf,

        /// Title already entered in the draft; kept over the guessed one
        #[arg(long)]
        title: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_miette()?;
    telemetry::init(TelemetryConfig::from_env("writeup-cli"));

    let cli = Cli::parse();
    let config = load_config(cli.config).await?;

    match cli.command {
        Commands::Render { file, toc } => render(config, file, toc).await,
        Commands::Import { file, title } => import(file, title).await,
    }
}

async fn load_config(path: Option<PathBuf>) -> Result<Config> {
    match path {
        Some(path) => {
            let config = Config::load(&FileStore::new(&path)).await?;
            tracing::info!(path = %path.display(), "using config file");
            Ok(config)
        }
        None => Ok(Config::default()),
    }
}

async fn render(config: Config, file: PathBuf, toc: bool) -> Result<()> {
    let raw = tokio::fs::read_to_string(&file)
        .await
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to read {}", file.display()))?;

    let renderer = ContentRenderer::new(config.renderer);
    let rendered = renderer.render(&raw);
    tracing::info!(headings = rendered.headings.len(), "rendered post");

    println!("{}", rendered.html);
    if toc {
        let outline = serde_json::to_string_pretty(&rendered.table_of_contents()).into_diagnostic()?;
        println!("{outline}");
    }
    Ok(())
}

async fn import(file: PathBuf, title: Option<String>) -> Result<()> {
    let import = import_markdown_file(&file).await?;

    let mut draft = PostDraft {
        title: title.unwrap_or_default(),
        ..Default::default()
    };
    let title_guess = import.title_guess.clone();
    draft.apply_import(import);

    let output = serde_json::json!({
        "title": draft.title,
        "title_guess": title_guess,
        "html": draft.content,
    });
    println!("{}", serde_json::to_string_pretty(&output).into_diagnostic()?);
    Ok(())
}

fn init_miette() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .with_cause_chain()
                .color(true)
                .context_lines(5)
                .tab_width(2)
                .break_words(true)
                .build(),
        )
    }))
    .into_diagnostic()?;
    miette::set_panic_hook();
    Ok(())
}
