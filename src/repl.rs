//! Terminal front-end for the conversation engine.
//!
//! Interactive use gets a prompt loop with line editing and a spinner while
//! the model answers. When stdin is piped, the whole input is sent as a
//! single turn. Either way the session is flushed to disk when it ends.

use std::io::{self, IsTerminal, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;

use colored::*;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use spinners::{Spinner, Spinners};

use crate::chat::ChatProvider;
use crate::conversation::{HistoryStore, Session};
use crate::error::LLMError;
use crate::ui::{self, Rendered};

/// Runs one terminal session and returns the path its transcript was saved to.
pub async fn run(provider: Arc<dyn ChatProvider>, store: HistoryStore) -> Result<PathBuf, LLMError> {
    let mut session = Session::start(provider, store)?;

    if io::stdin().is_terminal() {
        interactive(&mut session).await?;
    } else {
        let mut input = String::new();
        io::stdin().read_to_string(&mut input)?;
        one_shot(&mut session, &input, &mut io::stdout(), &mut io::stderr()).await?;
    }

    let path = session.finish()?;
    if io::stdout().is_terminal() {
        println!("{} {}", "Saved conversation to".bright_black(), path.display());
    }
    Ok(path)
}

/// Sends `input` as one turn, writing the reply to `out` or the error banner
/// to `err`. Blank input sends nothing; otherwise only the trailing line
/// break is dropped.
///
/// Returns whether the turn produced a reply.
pub async fn one_shot<O: Write, E: Write>(
    session: &mut Session,
    input: &str,
    out: &mut O,
    err: &mut E,
) -> Result<bool, LLMError> {
    if input.trim().is_empty() {
        return Ok(false);
    }
    let prompt = input.trim_end_matches(['\n', '\r']);
    match ui::respond(session, prompt).await {
        Rendered::Reply(reply) => {
            writeln!(out, "{reply}")?;
            Ok(true)
        }
        Rendered::Error(banner) => {
            writeln!(err, "{banner}")?;
            Ok(false)
        }
    }
}

async fn interactive(session: &mut Session) -> Result<(), LLMError> {
    println!("{}", ui::APP_TITLE.bright_cyan());
    println!("{}", "Type 'exit' to quit".bright_black());
    println!("{}", "─".repeat(50).bright_black());
    for message in session.transcript().messages() {
        println!("{} {}", format!("{}:", message.role).bright_black(), message.content);
    }
    println!("{}", ui::WELCOME);

    let mut rl = DefaultEditor::new().map_err(|e| LLMError::Generic(e.to_string()))?;

    loop {
        io::stdout().flush()?;
        match rl.readline("> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                if trimmed.eq_ignore_ascii_case("exit") || trimmed.eq_ignore_ascii_case("quit") {
                    println!("{}", "👋 Goodbye!".bright_cyan());
                    break;
                }
                let _ = rl.add_history_entry(trimmed);

                let mut sp = Spinner::new(Spinners::Dots12, ui::THINKING.bright_magenta().to_string());
                let rendered = ui::respond(session, &line).await;
                sp.stop();
                print!("\r\x1B[K");

                match rendered {
                    Rendered::Reply(reply) => {
                        println!("{} {}", "> Assistant:".bright_green(), reply);
                    }
                    Rendered::Error(banner) => {
                        eprintln!("{}", banner.bright_red());
                    }
                }
                println!("{}", "─".repeat(50).bright_black());
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                println!("\n{}", "👋 Goodbye!".bright_cyan());
                break;
            }
            Err(err) => {
                eprintln!("{} {:?}", "Error:".bright_red(), err);
                break;
            }
        }
    }

    Ok(())
}
