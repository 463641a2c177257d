use canvas::block::{BlockId, BlockKind, Position};
use canvas::render::DrawItem;
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use folio::api::{ApiClient, ApiError};
use folio::config::{ConfigError, FolioConfig};
use folio::editor::{EditorError, EditorSession};
use folio::session::Session;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Editor(#[from] EditorError),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to read stdin: {0}")]
    Stdin(#[from] std::io::Error),
    #[error("not signed in; pass --session-token or set FOLIO_SESSION_TOKEN")]
    MissingSessionToken,
    #[error("no block with id {0}")]
    UnknownBlock(String),
    #[error("no portfolio #{index}; the server proposed {count}")]
    NoSuchPortfolio { index: usize, count: usize },
}

#[derive(Parser, Debug)]
#[command(name = "folio", about = "Portfolio canvas editor CLI")]
struct Cli {
    /// Overrides `FOLIO_BASE_URL`.
    #[arg(long)]
    base_url: Option<String>,

    /// Overrides `FOLIO_SESSION_TOKEN`.
    #[arg(long)]
    session_token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the signed-in profile.
    Whoami,
    Layout(LayoutCommand),
    Ai(AiCommand),
}

#[derive(Args, Debug)]
struct LayoutCommand {
    #[command(subcommand)]
    command: LayoutSubcommand,
}

#[derive(Subcommand, Debug)]
enum LayoutSubcommand {
    /// Print the saved layout as an outline, or as JSON with `--json`.
    Show {
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Add a block and save.
    Add {
        #[arg(value_parser = parse_kind)]
        kind: BlockKind,
        #[arg(long, default_value_t = 0.0)]
        x: f64,
        #[arg(long, default_value_t = 0.0)]
        y: f64,
    },
    /// Copy a block next to itself and save.
    Duplicate { block_id: String },
    /// Delete a block (and its children) and save.
    Delete { block_id: String },
}

#[derive(Args, Debug)]
struct AiCommand {
    #[command(subcommand)]
    command: AiSubcommand,
}

#[derive(Subcommand, Debug)]
enum AiSubcommand {
    /// Rewrite one text block and save.
    Rewrite {
        block_id: String,
        #[arg(long)]
        instruction: String,
    },
    /// Let the AI revise the whole layout and save.
    Edit { prompt: String },
    /// List generated portfolios; `--apply N` adopts one and saves it.
    Generate {
        prompt: String,
        #[arg(long)]
        apply: Option<usize>,
    },
    /// Ask the assistant; without a message, chat line by line from stdin.
    Chat {
        message: Option<String>,
        /// Block to discuss.
        #[arg(long)]
        block: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = FolioConfig::from_env()?.with_overrides(cli.base_url, cli.session_token)?;
    let token = config.session_token.clone().ok_or(CliError::MissingSessionToken)?;
    let session = Session::with_token(token);
    let api = ApiClient::new(&config, &session)?;
    tracing::debug!(base_url = %api.base_url(), "client ready");

    match cli.command {
        Command::Whoami => {
            let profile = api.me().await?;
            println!("{} <{}> @{}", profile.name(), profile.email, profile.username);
            Ok(())
        }
        Command::Layout(layout) => run_layout(api, layout).await,
        Command::Ai(ai) => run_ai(api, ai).await,
    }
}

async fn run_layout(api: ApiClient, layout: LayoutCommand) -> Result<(), CliError> {
    let mut editor = EditorSession::open(api).await?;
    match layout.command {
        LayoutSubcommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(editor.core().blocks())?);
            } else {
                print_outline(editor.name(), &editor.core().draw_list());
            }
            Ok(())
        }
        LayoutSubcommand::Add { kind, x, y } => {
            editor.core_mut().add_block(kind, Position::new(x, y));
            editor.save().await?;
            print_selected(&editor);
            Ok(())
        }
        LayoutSubcommand::Duplicate { block_id } => {
            let id = existing(&editor, &block_id)?;
            editor.core_mut().duplicate_block(&id);
            editor.save().await?;
            print_selected(&editor);
            Ok(())
        }
        LayoutSubcommand::Delete { block_id } => {
            let id = existing(&editor, &block_id)?;
            editor.core_mut().delete_block(&id);
            editor.save().await?;
            Ok(())
        }
    }
}

async fn run_ai(api: ApiClient, ai: AiCommand) -> Result<(), CliError> {
    let mut editor = EditorSession::open(api).await?;
    match ai.command {
        AiSubcommand::Rewrite { block_id, instruction } => {
            let id = BlockId::from(block_id);
            editor.rewrite(&id, &instruction).await?;
            editor.save().await?;
            if let Some(text) = editor.core().block(&id).and_then(|b| b.text()) {
                println!("{text}");
            }
            Ok(())
        }
        AiSubcommand::Edit { prompt } => {
            editor.ai_edit(&prompt).await?;
            editor.save().await?;
            print_outline(editor.name(), &editor.core().draw_list());
            Ok(())
        }
        AiSubcommand::Generate { prompt, apply } => {
            let mut portfolios = editor.generate(&prompt).await?;
            let Some(index) = apply else {
                for (i, p) in portfolios.iter().enumerate() {
                    println!("{i}: {} ({} blocks) {}", p.name, p.blocks.len(), p.description);
                }
                return Ok(());
            };
            if index >= portfolios.len() {
                return Err(CliError::NoSuchPortfolio { index, count: portfolios.len() });
            }
            editor.apply_portfolio(portfolios.swap_remove(index)).await?;
            print_outline(editor.name(), &editor.core().draw_list());
            Ok(())
        }
        AiSubcommand::Chat { message, block } => {
            if let Some(raw) = block {
                let id = existing(&editor, &raw)?;
                editor.core_mut().select(Some(id));
            }
            if let Some(message) = message {
                println!("{}", editor.chat(&message).await?);
                return Ok(());
            }
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Some(line) = lines.next_line().await? {
                if line.trim().is_empty() {
                    continue;
                }
                match editor.chat(&line).await {
                    Ok(reply) => println!("{reply}"),
                    Err(e) => eprintln!("error: {e}"),
                }
            }
            Ok(())
        }
    }
}

fn parse_kind(raw: &str) -> Result<BlockKind, String> {
    serde_json::from_value(Value::String(raw.to_ascii_lowercase()))
        .map_err(|_| format!("unknown block type '{raw}' (expected text, image, rectangle or section)"))
}

fn existing(editor: &EditorSession, raw: &str) -> Result<BlockId, CliError> {
    let id = BlockId::from(raw);
    if editor.core().block(&id).is_none() {
        return Err(CliError::UnknownBlock(raw.to_owned()));
    }
    Ok(id)
}

fn print_selected(editor: &EditorSession) {
    if let Some(id) = editor.core().selection() {
        println!("{id}");
    }
}

fn print_outline(name: Option<&str>, items: &[DrawItem]) {
    println!("{}", name.unwrap_or("Untitled"));
    for item in items {
        let indent = "  ".repeat(item.depth + 1);
        println!(
            "{indent}{} {} @ ({}, {}) {}x{}{}",
            item.kind,
            item.id,
            item.rect.x,
            item.rect.y,
            item.rect.width,
            item.rect.height,
            if item.rotation.abs() < f64::EPSILON { String::new() } else { format!(" rot {}", item.rotation) },
        );
    }
}
