use crate::app::App;
use crate::errors::ApiError;
use crate::managers::auth::Registration;
use crate::managers::channels::{NewChannel, NewThread};
use crate::managers::messages::NewMessage;
use crate::managers::presence::{default_stats_period, default_status_period, PresenceUpdate};
use crate::managers::search::ThreadFilter;
use crate::services::config::ClientConfig;
use crate::utils::redact::redact_token;
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "chatgw", version, about = "Messaging gateway client")]
pub struct Cli {
    /// Gateway base URL (overrides CHATGW_API_BASE_URL).
    #[arg(long, global = true)]
    pub base_url: Option<String>,
    /// Session file (overrides CHATGW_SESSION_PATH).
    #[arg(long, global = true)]
    pub session_path: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    Login {
        username_or_email: String,
        #[arg(long, env = "CHATGW_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "CHATGW_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        full_name: String,
    },
    Logout,
    /// Show the stored session, refreshing the profile from the gateway.
    Whoami {
        #[arg(long)]
        offline: bool,
    },
    #[command(subcommand)]
    Channels(ChannelsCommand),
    #[command(subcommand)]
    Threads(ThreadsCommand),
    #[command(subcommand)]
    Messages(MessagesCommand),
    #[command(subcommand)]
    Search(SearchCommand),
    #[command(subcommand)]
    Presence(PresenceCommand),
    #[command(subcommand)]
    Ask(AskCommand),
    #[command(subcommand)]
    Health(BotKind),
}

#[derive(Debug, Subcommand)]
pub enum ChannelsCommand {
    Mine,
    Create {
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    Show {
        channel_id: String,
    },
    Members {
        channel_id: String,
    },
    Threads {
        channel_id: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum ThreadsCommand {
    Create {
        channel_id: String,
        title: String,
        #[arg(long)]
        category: Option<String>,
    },
    Delete {
        thread_id: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum MessagesCommand {
    List {
        thread_id: String,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        cursor: Option<String>,
    },
    Send {
        thread_id: String,
        content: String,
    },
    Edit {
        thread_id: String,
        message_id: String,
        content: String,
    },
    Delete {
        thread_id: String,
        message_id: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum SearchCommand {
    Messages { q: String },
    Files { q: String },
    Channels { q: String },
    Threads(ThreadSearch),
}

#[derive(Debug, Args)]
pub struct ThreadSearch {
    #[arg(long, conflicts_with_all = ["author", "status", "id", "start_date"])]
    pub keyword: Option<String>,
    #[arg(long)]
    pub author: Option<String>,
    #[arg(long)]
    pub status: Option<String>,
    #[arg(long)]
    pub id: Option<String>,
    #[arg(long, requires = "end_date")]
    pub start_date: Option<String>,
    #[arg(long, requires = "start_date")]
    pub end_date: Option<String>,
}

impl ThreadSearch {
    fn into_filter(self) -> Result<ThreadFilter, ApiError> {
        if let Some(keyword) = self.keyword {
            return Ok(ThreadFilter::Keyword(keyword));
        }
        if let Some(author) = self.author {
            return Ok(ThreadFilter::Author(author));
        }
        if let Some(status) = self.status {
            return Ok(ThreadFilter::Status(status));
        }
        if let Some(id) = self.id {
            return Ok(ThreadFilter::Id(id));
        }
        match (self.start_date, self.end_date) {
            (Some(start_date), Some(end_date)) => Ok(ThreadFilter::DateRange {
                start_date,
                end_date,
            }),
            _ => Err(ApiError::invalid_request(
                "Pick one of --keyword, --author, --status, --id or --start-date/--end-date",
            )),
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum PresenceCommand {
    Show {
        user_id: Option<String>,
    },
    Stats,
    List {
        #[arg(long)]
        status: Option<String>,
    },
    Set {
        status: String,
    },
    /// Poll a user's status (or the global stats with --stats).
    Watch {
        user_id: Option<String>,
        #[arg(long)]
        stats: bool,
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        interval_secs: Option<u64>,
        #[arg(long)]
        count: Option<usize>,
    },
}

#[derive(Debug, Subcommand)]
pub enum AskCommand {
    Wikipedia {
        question: String,
        #[arg(long)]
        language: Option<String>,
    },
    Programming {
        question: String,
        #[arg(long)]
        context: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, Subcommand)]
pub enum BotKind {
    Wikipedia,
    Programming,
}

fn items(values: Vec<Value>) -> Value {
    Value::Array(values)
}

fn to_value<T: serde::Serialize>(value: &T) -> Result<Value, ApiError> {
    serde_json::to_value(value)
        .map_err(|err| ApiError::decode(format!("Failed to render output: {}", err)))
}

fn print_line(value: &Value) {
    println!("{}", value);
}

impl Command {
    /// Commands that read the stored session. Login, register and logout
    /// replace or ignore it; `whoami` hydrates on its own terms.
    fn uses_session(&self) -> bool {
        !matches!(
            self,
            Command::Login { .. } | Command::Register { .. } | Command::Logout | Command::Whoami { .. }
        )
    }

    /// Commands that print their own lines while running.
    fn streams(&self) -> bool {
        matches!(self, Command::Presence(PresenceCommand::Watch { .. }))
    }
}

fn require_user_id(app: &App) -> Result<String, ApiError> {
    app.api.session().user()?.map(|user| user.id).ok_or_else(|| {
        ApiError::auth("Not logged in").with_hint("Run `chatgw login <username>` first.")
    })
}

pub async fn run(cli: Cli) -> Result<Option<Value>, ApiError> {
    let config = ClientConfig::resolve(cli.base_url.as_deref(), cli.session_path)?;
    let app = App::initialize(config)?;
    execute(&app, cli.command).await
}

/// Runs one command against a wired client. The profile is hydrated once
/// up front so every request carries `X-User-Id` when it can. `None` means
/// the command already wrote its output.
pub async fn execute(app: &App, command: Command) -> Result<Option<Value>, ApiError> {
    if command.uses_session() {
        app.auth.hydrate().await;
    }
    let streams = command.streams();
    let value = dispatch(app, command).await.map_err(|err| {
        if err.is_unauthorized() && err.hint.is_none() {
            err.with_hint("The stored token was rejected; run `chatgw login` again.")
        } else {
            err
        }
    })?;
    Ok((!streams).then_some(value))
}

async fn dispatch(app: &App, command: Command) -> Result<Value, ApiError> {
    match command {
        Command::Login {
            username_or_email,
            password,
        } => to_value(&app.auth.login(&username_or_email, &password).await?),
        Command::Register {
            username,
            email,
            password,
            full_name,
        } => {
            app.auth
                .register(&Registration {
                    username,
                    email,
                    password,
                    full_name,
                })
                .await
        }
        Command::Logout => {
            app.auth.logout()?;
            Ok(serde_json::json!({ "success": true }))
        }
        Command::Whoami { offline } => {
            let user = if offline {
                app.api.session().user()?
            } else {
                app.auth.hydrate().await
            };
            let token = app.api.session().token()?;
            Ok(serde_json::json!({
                "base_url": app.api.base_url(),
                "token": token.as_deref().map(redact_token),
                "user": user,
            }))
        }
        Command::Channels(cmd) => match cmd {
            ChannelsCommand::Mine => {
                let user_id = require_user_id(app)?;
                Ok(items(app.channels.my_channels(&user_id).await?))
            }
            ChannelsCommand::Create { name, description } => {
                let user_id = require_user_id(app)?;
                let mut channel = NewChannel::owned_by(name, user_id);
                channel.description = description;
                app.channels.create(&channel).await
            }
            ChannelsCommand::Show { channel_id } => app.channels.get(&channel_id).await,
            ChannelsCommand::Members { channel_id } => app.channels.members(&channel_id).await,
            ChannelsCommand::Threads { channel_id } => {
                Ok(items(app.channels.threads(&channel_id).await?))
            }
        },
        Command::Threads(cmd) => match cmd {
            ThreadsCommand::Create {
                channel_id,
                title,
                category,
            } => {
                let user_id = require_user_id(app)?;
                let thread = NewThread::new(channel_id, title, user_id, category);
                let created = app.channels.create_thread(&thread).await?;
                Ok(serde_json::json!({ "thread_id": thread.thread_id, "result": created }))
            }
            ThreadsCommand::Delete { thread_id } => app.channels.delete_thread(&thread_id).await,
        },
        Command::Messages(cmd) => match cmd {
            MessagesCommand::List {
                thread_id,
                limit,
                cursor,
            } => Ok(items(
                app.messages
                    .list(&thread_id, limit, cursor.as_deref())
                    .await?,
            )),
            MessagesCommand::Send { thread_id, content } => {
                let author = app.api.session().user()?.map(|user| user.username);
                let message = NewMessage {
                    content,
                    kind: None,
                    author,
                };
                app.messages.send(&thread_id, &message).await
            }
            MessagesCommand::Edit {
                thread_id,
                message_id,
                content,
            } => app.messages.update(&thread_id, &message_id, &content).await,
            MessagesCommand::Delete {
                thread_id,
                message_id,
            } => app.messages.delete(&thread_id, &message_id).await,
        },
        Command::Search(cmd) => match cmd {
            SearchCommand::Messages { q } => Ok(items(app.search.messages(&q).await?)),
            SearchCommand::Files { q } => Ok(items(app.search.files(&q).await?)),
            SearchCommand::Channels { q } => Ok(items(app.search.channels(&q).await?)),
            SearchCommand::Threads(search) => {
                Ok(items(app.search.threads(&search.into_filter()?).await?))
            }
        },
        Command::Presence(cmd) => match cmd {
            PresenceCommand::Show { user_id } => {
                let user_id = match user_id {
                    Some(id) => id,
                    None => require_user_id(app)?,
                };
                app.presence.get(&user_id).await
            }
            PresenceCommand::Stats => app.presence.stats().await,
            PresenceCommand::List { status } => app.presence.list(status.as_deref()).await,
            PresenceCommand::Set { status } => {
                let user_id = require_user_id(app)?;
                let update = PresenceUpdate {
                    status: Some(status),
                    heartbeat: None,
                };
                app.presence.update(&user_id, &update).await
            }
            PresenceCommand::Watch {
                user_id,
                stats,
                interval_secs,
                count,
            } => {
                if stats {
                    let period = interval_secs
                        .map(Duration::from_secs)
                        .unwrap_or_else(default_stats_period);
                    app.presence
                        .watch_stats(period, count, |stats| print_line(stats))
                        .await?;
                } else {
                    let user_id = match user_id {
                        Some(id) => id,
                        None => require_user_id(app)?,
                    };
                    let period = interval_secs
                        .map(Duration::from_secs)
                        .unwrap_or_else(default_status_period);
                    app.presence
                        .watch_status(&user_id, period, count, |status| {
                            print_line(&serde_json::json!({
                                "at": chrono::Utc::now().to_rfc3339(),
                                "user_id": user_id,
                                "status": status,
                            }))
                        })
                        .await?;
                }
                Ok(Value::Null)
            }
        },
        Command::Ask(cmd) => match cmd {
            AskCommand::Wikipedia { question, language } => to_value(
                &app.chatbots
                    .ask_wikipedia(&question, language.as_deref())
                    .await?,
            ),
            AskCommand::Programming { question, context } => to_value(
                &app.chatbots
                    .ask_programming(&question, context.as_deref())
                    .await?,
            ),
        },
        Command::Health(kind) => match kind {
            BotKind::Wikipedia => app.chatbots.wikipedia_health().await,
            BotKind::Programming => app.chatbots.programming_health().await,
        },
    }
}
