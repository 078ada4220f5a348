use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use colored::*;
use llm_chat::chat::ChatProvider;
use llm_chat::config::{Config, Mode, Settings};
use llm_chat::error::LLMError;

/// Command line arguments for the chat front-end
#[derive(Parser)]
#[clap(
    name = "llm-chat",
    about = "Chat with Gemini from the browser or the terminal"
)]
struct CliArgs {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    settings: Settings,
}

#[derive(Subcommand)]
enum Command {
    /// Manage the secrets store read in web mode
    Secret {
        #[command(subcommand)]
        action: SecretAction,
    },
}

#[derive(Subcommand)]
enum SecretAction {
    /// Store a secret
    Set { key: String, value: String },
    /// Print a secret
    Get { key: String },
    /// Remove a secret
    Delete { key: String },
}

fn manage_secret(settings: &Settings, action: SecretAction) -> Result<(), LLMError> {
    let mut store = settings.secret_store()?;
    match action {
        SecretAction::Set { key, value } => {
            store.set(&key, &value)?;
            println!("{} Secret '{}' has been set.", "✓".bright_green(), key);
        }
        SecretAction::Get { key } => match store.get(&key) {
            Some(value) => println!("{key}: {value}"),
            None => println!("{} Secret '{}' not found", "!".bright_yellow(), key),
        },
        SecretAction::Delete { key } => {
            store.delete(&key)?;
            println!("{} Secret '{}' has been deleted.", "✓".bright_green(), key);
        }
    }
    Ok(())
}

async fn serve(settings: Settings) -> Result<(), LLMError> {
    let config = Config::resolve(&settings)?;
    log::debug!("Resolved {config:?}");
    let provider: Arc<dyn ChatProvider> = Arc::from(config.build_provider()?);
    let store = config.history_store();

    match config.mode {
        Mode::Web => {
            println!(
                "{} http://{}",
                "LLM Chat listening on".bright_cyan(),
                config.bind
            );
            llm_chat::api::Server::new(provider, store)
                .with_idle_timeout(config.idle_timeout)
                .run(&config.bind)
                .await
        }
        Mode::Terminal => llm_chat::repl::run(provider, store).await.map(|_| ()),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    llm_chat::init_logging();
    let args = CliArgs::parse();

    let result = match args.command {
        Some(Command::Secret { action }) => manage_secret(&args.settings, action),
        None => serve(args.settings).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "❌".bright_red(), e);
            ExitCode::FAILURE
        }
    }
}
