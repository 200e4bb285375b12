//! databot binary: open-data assistant from the command line.
//!
//! Subcommands: `serve` (WebSocket server), `refresh-tags`, `find <tag>`, `chat` (local REPL).

mod render;
mod repl;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use databot::{build_bot, build_finder, openai_from_settings, FindError, LlmClient, ReqwestHttpClient};
use env_config::BotSettings;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "databot")]
#[command(about = "databot: find open datasets on uData portals by talking to a bot")]
struct Args {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// Run the WebSocket server (one chat session per connection)
    Serve(ServeArgs),
    /// Download the tag list from every portal and replace the local tag file
    RefreshTags,
    /// Search every portal for live datasets with this tag
    Find(FindArgs),
    /// Chat with the bot on stdin/stdout
    Chat,
}

#[derive(clap::Args, Debug, Clone)]
struct ServeArgs {
    /// WebSocket listen address (default: DATABOT_WS_ADDR or 127.0.0.1:8764)
    #[arg(long, value_name = "ADDR")]
    addr: Option<String>,
    /// Exit after the first connection closes
    #[arg(long)]
    once: bool,
}

#[derive(clap::Args, Debug, Clone)]
struct FindArgs {
    /// Tag, exactly as known to the portals (see `refresh-tags`)
    tag: String,
    /// Print the records as a JSON array
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_config::load_and_apply("databot", None::<&std::path::Path>).ok();
    let settings = BotSettings::from_env();
    let _log_guard = env_config::logging::init(settings.log_dir.as_deref())?;

    let args = Args::parse();
    match args.cmd {
        Command::Serve(sa) => serve(&settings, sa).await,
        Command::RefreshTags => refresh_tags(&settings).await,
        Command::Find(fa) => find(&settings, fa).await,
        Command::Chat => {
            let bot = build_bot(&settings).await?;
            repl::run_chat_loop(&bot).await
        }
    }
}

async fn serve(settings: &BotSettings, args: ServeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let bot = build_bot(settings).await?;
    let finder = bot.services().finder();
    if finder.tags().is_empty().await {
        info!("tag list is empty, refreshing before serving");
        let report = finder.refresh_tags().await?;
        info!(tags = report.tag_count, "tag list ready");
    }
    let addr = args.addr.unwrap_or_else(|| settings.ws_addr.clone());
    if let Err(e) = serve::run_serve(Some(&addr), Arc::new(bot), args.once).await {
        eprintln!("serve error: {}", e);
        std::process::exit(1);
    }
    Ok(())
}

async fn refresh_tags(settings: &BotSettings) -> Result<(), Box<dyn std::error::Error>> {
    let finder = build_finder(settings, Arc::new(ReqwestHttpClient::new()), None).await?;
    let report = finder.refresh_tags().await?;
    println!(
        "{} tags written to {} ({} pages read)",
        report.tag_count,
        finder.tags().path().display(),
        report.pages
    );
    if !report.failed_portals.is_empty() {
        eprintln!("portals with errors: {}", report.failed_portals.join(", "));
    }
    Ok(())
}

async fn find(settings: &BotSettings, args: FindArgs) -> Result<(), Box<dyn std::error::Error>> {
    let llm: Option<Arc<dyn LlmClient>> = if settings.enrich {
        Some(Arc::new(openai_from_settings(settings)))
    } else {
        None
    };
    let finder = build_finder(settings, Arc::new(ReqwestHttpClient::new()), llm).await?;
    match finder.find_datasets(&args.tag).await {
        Ok(records) if args.json => {
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        Ok(records) => {
            println!("{}", render::render_datasets(&records));
        }
        Err(FindError::UnknownTag { tag, known }) => {
            let suggestions = databot::tags::closest_tags(&tag, &known, 5);
            if suggestions.is_empty() {
                eprintln!("databot: unknown tag '{}'", tag);
            } else {
                eprintln!(
                    "databot: unknown tag '{}' (did you mean: {}?)",
                    tag,
                    suggestions.join(", ")
                );
            }
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("databot: {}", e);
            std::process::exit(1);
        }
    }
    Ok(())
}
