use std::sync::Arc;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use portal_core::{ChatMessage, ChatSession, Config, PortalClient, SubmitOutcome};

mod app;
mod handler;
mod logging;
mod tui;
mod ui;

use app::App;
use tui::EventHandler;

#[derive(Parser)]
#[command(name = "portal")]
#[command(about = "Chat with the property management assistant about your projects", version)]
struct Cli {
    /// Portal backend URL (overrides PORTAL_API_URL and the config file)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask the assistant a single question and print the conversation
    Ask {
        /// Your question
        text: String,
    },
    /// List your projects
    Projects,
    /// Show the configuration, or store a backend URL in it
    Config {
        /// Backend URL to save (an empty string clears it)
        #[arg(long)]
        set_api_url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load().unwrap_or_else(|_| Config::new());
    let api_url = config.resolve_api_url(cli.api_url.as_deref());
    let client = PortalClient::new(&api_url);

    match cli.command {
        None => {
            let log_path = config.log_path()?;
            logging::init_file(&log_path)?;
            tracing::info!(api_url = %api_url, "starting portal");
            run_tui(client).await
        }
        Some(Commands::Ask { text }) => {
            logging::init_stderr()?;
            ask_once(client, &text).await
        }
        Some(Commands::Projects) => {
            logging::init_stderr()?;
            list_projects(&client).await
        }
        Some(Commands::Config { set_api_url }) => {
            logging::init_stderr()?;
            configure(set_api_url.as_deref(), cli.api_url.as_deref())
        }
    }
}

async fn run_tui(client: PortalClient) -> Result<()> {
    let mut app = App::new(Arc::new(client.clone()));
    app.load_profile(client);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();

    let result = async {
        while !app.should_quit {
            app.poll_tasks().await;
            terminal.draw(|frame| ui::render(&mut app, frame))?;

            match events.next().await {
                Some(event) => handler::handle_event(&mut app, event)?,
                None => break,
            }
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    tui::restore()?;
    tracing::info!("portal exited");
    result
}

async fn ask_once(client: PortalClient, text: &str) -> Result<()> {
    let session = ChatSession::new(Arc::new(client));

    if let SubmitOutcome::Rejected(reason) = session.submit(text).await {
        anyhow::bail!("Nothing to send ({:?})", reason);
    }

    for message in session.snapshot() {
        print_message(&message);
    }

    Ok(())
}

fn print_message(message: &ChatMessage) {
    println!("{} [{}]", message.role.label(), message.local_time());
    for line in message.content.lines() {
        println!("  {}", line);
    }
    println!();
}

async fn list_projects(client: &PortalClient) -> Result<()> {
    let user = client
        .fetch_user()
        .await
        .with_context(|| format!("Could not load user from {}", client.base_url()))?;

    println!("{} ({})", user.name, user.identity_line());
    println!("{}", "=".repeat(40));

    if user.projects.is_empty() {
        println!("No projects found");
        return Ok(());
    }

    for project in &user.projects {
        println!("\n{} - {} [{}]", project.category, project.number, project.status);
        println!("  {} ({}, store {})", project.address, project.kind, project.store);
        if let Some((date, time)) = project.schedule() {
            println!("  Scheduled: {} {}", date, time);
        }
        println!("  Technician: {}", project.technician);
    }

    Ok(())
}

fn configure(set_api_url: Option<&str>, cli_api_url: Option<&str>) -> Result<()> {
    let path = Config::get_config_path()?;
    let mut config = Config::load_from(&path)
        .with_context(|| format!("Could not read config {:?}", path))?;

    if let Some(url) = set_api_url {
        config.set_api_url(url);
        config.save()?;
        tracing::info!(path = ?path, "saved config");
    }

    println!("Config file: {}", path.display());
    println!(
        "Saved API URL: {}",
        config.api_base_url.as_deref().unwrap_or("(none)")
    );
    println!("Effective API URL: {}", config.resolve_api_url(cli_api_url));
    println!("Log file: {}", config.log_path()?.display());

    Ok(())
}
