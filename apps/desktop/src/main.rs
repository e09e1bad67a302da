mod commands;
mod present;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    controller::{Action, Controller, ViewConfig},
    load_settings, CancelToken, ClientSettings, OccupationApi, RiskApiClient,
};
use shared::domain::{SocCode, SortKey};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::commands::{parse_command, parse_page_size, ReplCommand, HELP};

#[derive(Parser, Debug)]
#[command(about = "Browse occupations by AI exposure risk")]
struct Args {
    /// Overrides `api_base` from risk_client.toml and RISK_API_BASE.
    #[arg(long)]
    api_base: Option<String>,
    #[arg(long)]
    data_version: Option<String>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print one page of the occupation listing.
    List {
        #[arg(long)]
        search: Option<String>,
        #[arg(long, default_value_t = SortKey::Risk)]
        sort: SortKey,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, value_parser = parse_page_size)]
        page_size: Option<u32>,
    },
    /// Print the detail record of one occupation.
    Detail { soc_code: String },
    /// Print the highest-risk occupations.
    Ranking {
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Check that the API answers.
    Health,
    /// Interactive browser (default).
    Browse,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut settings = load_settings();
    if let Some(api_base) = args.api_base {
        settings.api_base = client_core::config::normalize_api_base(&api_base);
    }
    if let Some(data_version) = args.data_version {
        settings.default_data_version = settings.resolve_data_version(Some(data_version.as_str()));
    }

    let client = RiskApiClient::new(&settings)
        .with_context(|| format!("invalid api base {}", settings.api_base))?;
    info!(api_base = %client.base_url(), data_version = %settings.default_data_version, "client ready");

    match args.command.unwrap_or(Command::Browse) {
        Command::List {
            search,
            sort,
            page,
            page_size,
        } => list(client, &settings, search, sort, page, page_size).await,
        Command::Detail { soc_code } => {
            let detail = client
                .occupation_detail(&SocCode::from(soc_code.trim()), None, &CancelToken::new())
                .await
                .context("detail request failed")?;
            print!("{}", present::render_detail(&detail));
            Ok(())
        }
        Command::Ranking { limit } => {
            let limit = limit.unwrap_or(settings.ranking_limit);
            let ranking = client
                .rankings(Some(limit), None, &CancelToken::new())
                .await
                .context("ranking request failed")?;
            let snapshot = client_core::controller::risk_snapshot(&ranking.items);
            print!(
                "{}",
                present::render_ranking(&ranking.items, snapshot.as_ref())
            );
            Ok(())
        }
        Command::Health => {
            let status = client
                .health(&CancelToken::new())
                .await
                .context("health check failed")?;
            println!("{} {status}", client.base_url());
            Ok(())
        }
        Command::Browse => browse(client, &settings).await,
    }
}

async fn list(
    client: RiskApiClient,
    settings: &ClientSettings,
    search: Option<String>,
    sort: SortKey,
    page: u32,
    page_size: Option<u32>,
) -> Result<()> {
    let mut controller = Controller::new(Arc::new(client), ViewConfig::from(settings));
    controller.dispatch(Action::SetSort(sort));
    if let Some(page_size) = page_size {
        controller.dispatch(Action::SetPageSize(page_size));
    }
    // Committing a search resets the page, so the page goes last.
    controller.dispatch(Action::SubmitSearch(search.unwrap_or_default()));
    controller.dispatch(Action::SetPage(page));
    controller.dispatch(Action::Mount);
    controller.settle().await;

    let state = controller.state();
    print!("{}", present::render_listing(state));
    if let Some(error) = state.error() {
        bail!("{}", error.message);
    }
    controller.shutdown();
    Ok(())
}

async fn browse(client: RiskApiClient, settings: &ClientSettings) -> Result<()> {
    let mut controller = Controller::new(Arc::new(client), ViewConfig::from(settings));
    controller.dispatch(Action::Mount);
    controller.settle().await;
    println!("{}", present::render_view(controller.state()));
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                match parse_command(&line) {
                    Ok(ReplCommand::Dispatch(action)) => controller.dispatch(action),
                    Ok(ReplCommand::Show) => println!("{}", present::render_view(controller.state())),
                    Ok(ReplCommand::Help) => println!("{HELP}"),
                    Ok(ReplCommand::Quit) => break,
                    Err(message) => warn!("{message}"),
                }
            }
            completion = controller.next_completion() => {
                let Some(action) = completion else {
                    break;
                };
                controller.dispatch(action);
                if !controller.state().is_busy() {
                    println!("{}", present::render_view(controller.state()));
                }
            }
        }
    }

    controller.shutdown();
    info!("browser closed");
    Ok(())
}
