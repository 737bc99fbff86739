//! Console transport
//!
//! Line-oriented front end for `pd serve`: reads commands from stdin,
//! prints rendered tallies to stdout. Plannings are referenced by any
//! unambiguous fragment of their id (hex prefix or slug substring).
//!
//! This is glue over the engine boundary - resolution of references to
//! planning ids happens here, never inside the engine.

use std::io::Write as _;

use async_trait::async_trait;
use colored::*;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;
use tracing::debug;

use crate::domain::{IdMatch, VoteDelta, Voter, resolve};
use crate::engine::PlanningEngine;

use super::{ChatTransport, EngineReply, InboundAction};

const HELP: &str = "\
Commands:
  new [--single] <title> | <option> | <option> ...   create a planning
  plannings                                          list plannings in this scope
  show <planning>                                    print the current tally
  vote <planning> <option-number> [name]             toggle a vote
  close <planning> [name]                            close a planning (creator only)
  help                                               this text
  quit                                               end the session

<planning> is any unambiguous part of a planning id.";

/// A command as typed, before references are resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    New {
        title: String,
        options: Vec<String>,
        single_select: bool,
    },
    Plannings,
    Show {
        reference: String,
    },
    Vote {
        reference: String,
        option_id: u32,
        user: Option<String>,
    },
    Close {
        reference: String,
        user: Option<String>,
    },
    Help,
    Quit,
}

/// Parse one input line. `Ok(None)` means "nothing to do" (blank line).
pub fn parse_command(line: &str) -> Result<Option<ConsoleCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((w, r)) => (w, r.trim()),
        None => (line, ""),
    };

    match word {
        "new" => parse_new(rest).map(Some),
        "plannings" | "list" => Ok(Some(ConsoleCommand::Plannings)),
        "show" => {
            if rest.is_empty() {
                return Err("usage: show <planning>".to_string());
            }
            Ok(Some(ConsoleCommand::Show {
                reference: rest.to_string(),
            }))
        }
        "vote" => parse_vote(rest).map(Some),
        "close" => {
            let mut parts = rest.split_whitespace();
            let reference = parts.next().ok_or("usage: close <planning> [name]")?.to_string();
            let user = parts.next().map(str::to_string);
            Ok(Some(ConsoleCommand::Close { reference, user }))
        }
        "help" => Ok(Some(ConsoleCommand::Help)),
        "quit" | "exit" => Ok(Some(ConsoleCommand::Quit)),
        other => Err(format!("unknown command: {other} (try `help`)")),
    }
}

fn parse_new(rest: &str) -> Result<ConsoleCommand, String> {
    let (single_select, rest) = match rest.strip_prefix("--single") {
        Some(stripped) => (true, stripped.trim()),
        None => (false, rest),
    };

    let mut parts = rest.split('|').map(str::trim);
    let title = parts.next().unwrap_or("").to_string();
    let options: Vec<String> = parts.filter(|s| !s.is_empty()).map(str::to_string).collect();

    if title.is_empty() || options.is_empty() {
        return Err("usage: new [--single] <title> | <option> | <option> ...".to_string());
    }
    Ok(ConsoleCommand::New {
        title,
        options,
        single_select,
    })
}

fn parse_vote(rest: &str) -> Result<ConsoleCommand, String> {
    let mut parts = rest.split_whitespace();
    let usage = "usage: vote <planning> <option-number> [name]";
    let reference = parts.next().ok_or(usage)?.to_string();
    let option_id: u32 = parts
        .next()
        .ok_or(usage)?
        .parse()
        .map_err(|_| "option must be a number".to_string())?;
    let user = parts.next().map(str::to_string);
    Ok(ConsoleCommand::Vote {
        reference,
        option_id,
        user,
    })
}

/// Interactive stdin/stdout session front end
pub struct ConsoleTransport {
    engine: PlanningEngine,
    scope: String,
    default_user: String,
    lines: Mutex<Lines<BufReader<Stdin>>>,
}

impl ConsoleTransport {
    pub fn new(engine: PlanningEngine, scope: impl Into<String>, default_user: impl Into<String>) -> Self {
        Self {
            engine,
            scope: scope.into(),
            default_user: default_user.into(),
            lines: Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
        }
    }

    fn voter(&self, user: Option<String>) -> Voter {
        let name = user.unwrap_or_else(|| self.default_user.clone());
        Voter::new(name.clone(), name)
    }

    /// Resolve a typed reference against the registered planning ids.
    async fn resolve_reference(&self, reference: &str) -> Result<String, String> {
        let ids = self.engine.planning_ids().await;
        match resolve(reference, ids.iter().map(String::as_str)) {
            IdMatch::One(id) => Ok(id),
            IdMatch::None => Err(format!("no planning matches `{reference}`")),
            IdMatch::Ambiguous(candidates) => {
                Err(format!("`{reference}` is ambiguous: {}", candidates.join(", ")))
            }
        }
    }

    async fn to_action(&self, command: ConsoleCommand) -> Result<Option<InboundAction>, String> {
        let action = match command {
            ConsoleCommand::New {
                title,
                options,
                single_select,
            } => InboundAction::Create {
                scope: self.scope.clone(),
                title,
                creator: self.voter(None),
                options,
                single_select,
            },
            ConsoleCommand::Plannings => InboundAction::List {
                scope: self.scope.clone(),
            },
            ConsoleCommand::Show { reference } => InboundAction::Show {
                planning_id: self.resolve_reference(&reference).await?,
            },
            ConsoleCommand::Vote {
                reference,
                option_id,
                user,
            } => InboundAction::Toggle {
                planning_id: self.resolve_reference(&reference).await?,
                option_id,
                voter: self.voter(user),
            },
            ConsoleCommand::Close { reference, user } => InboundAction::Close {
                planning_id: self.resolve_reference(&reference).await?,
                requester_id: self.voter(user).id,
            },
            ConsoleCommand::Help => {
                println!("{HELP}");
                return Ok(None);
            }
            // Quit never reaches here; next_action intercepts it.
            ConsoleCommand::Quit => return Ok(None),
        };
        Ok(Some(action))
    }
}

#[async_trait]
impl ChatTransport for ConsoleTransport {
    async fn next_action(&self) -> Option<InboundAction> {
        let mut lines = self.lines.lock().await;
        loop {
            print!("{} ", ">".bold());
            let _ = std::io::stdout().flush();

            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) | Err(_) => return None, // EOF
            };

            let command = match parse_command(&line) {
                Ok(Some(ConsoleCommand::Quit)) => return None,
                Ok(Some(command)) => command,
                Ok(None) => continue,
                Err(message) => {
                    println!("{} {message}", "✗".red());
                    continue;
                }
            };

            debug!(?command, "console command");
            match self.to_action(command).await {
                Ok(Some(action)) => return Some(action),
                Ok(None) => continue,
                Err(message) => {
                    println!("{} {message}", "✗".red());
                    continue;
                }
            }
        }
    }

    async fn deliver(&self, reply: EngineReply) {
        match reply {
            EngineReply::Snapshot { snapshot, delta } => {
                match delta {
                    Some(VoteDelta::Added) => println!("{} vote added", "✓".green()),
                    Some(VoteDelta::Removed) => println!("{} vote retracted", "✓".green()),
                    Some(VoteDelta::Switched { from }) => {
                        println!("{} vote moved (was option {from})", "✓".green())
                    }
                    None => {}
                }
                println!("{snapshot}");
            }
            EngineReply::Summaries(summaries) => {
                if summaries.is_empty() {
                    println!("No plannings here yet. Start one with `new`.");
                } else {
                    for (num, summary) in summaries.iter().enumerate() {
                        println!("{}  [{}]", summary.short_description(num), summary.id.dimmed());
                    }
                }
            }
            EngineReply::Rejected(err) => println!("{} {err}", "✗".red()),
        }
    }
}
