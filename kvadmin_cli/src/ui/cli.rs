use clap::{Parser, Subcommand};
use log::info;

use kvadmin_core::api::{connections, kv};
use kvadmin_core::models::{ConnectionStatus, LoginRequest, RegisterRequest};
use kvadmin_core::{ApiError, AppContext, ClientStore};

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "kvadmin", version, subcommand_required = true)]
pub struct Args {
    /// Base URL of the admin backend
    #[arg(long, default_value = "http://localhost:8080/api/v1")]
    pub server: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in and store the session token
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account (you still have to log in afterwards)
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// End the current session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// List the connections configured on the backend
    Connections,
    /// Open a configured connection and probe it
    Open { id: u64 },
    /// Close an open connection
    Close { id: u64 },
    /// Make an open connection the current one
    Use { id: u64 },
    /// List keys on the current connection
    Keys {
        #[arg(long)]
        prefix: Option<String>,
    },
    /// Read a key from the current connection
    Get { key: String },
    /// Write a key on the current connection (the value is parsed as JSON,
    /// falling back to a plain string)
    Set { key: String, value: String },
    /// Delete a key on the current connection
    Del { key: String },
}

pub async fn run_cli(args: Args) -> Result<(), ApiError> {
    let store = ClientStore::new()
        .map_err(|e| ApiError::Transport(format!("cannot open client store: {e}")))?;
    let context = AppContext::new(&args.server, store)?;
    context
        .initialize()
        .await
        .map_err(|e| ApiError::Transport(format!("cannot restore client state: {e}")))?;

    match args.command {
        Command::Login { username, password } => {
            context
                .session()
                .login(LoginRequest { username, password })
                .await?;
            println!("logged in");
        }
        Command::Register {
            username,
            email,
            password,
        } => {
            context
                .session()
                .register(RegisterRequest {
                    username,
                    email,
                    password,
                })
                .await?;
            println!("account created; log in with `kvadmin login`");
        }
        Command::Logout => {
            context.session().logout().await;
            println!("logged out");
        }
        Command::Whoami => match context.session().current_user().await {
            Some(user) => println!("{} <{}> ({})", user.username, user.email, user.role),
            None => println!("not logged in"),
        },
        Command::Connections => {
            let envelope = connections::list(context.client()).await?;
            let configured = envelope.data.unwrap_or_default();
            let current = context.registry().current_connection_id().await;
            let open = context.registry().active_connections().await;
            for connection in configured {
                let marker = if current == Some(connection.id) {
                    "*"
                } else if open.iter().any(|active| active.id() == connection.id) {
                    "+"
                } else {
                    " "
                };
                println!(
                    "{marker} {:>4}  {:<20} {}",
                    connection.id,
                    connection.name,
                    connection.endpoint_list().join(",")
                );
            }
        }
        Command::Open { id } => {
            let envelope = connections::get(context.client(), id).await?;
            let Some(connection) = envelope.data else {
                return Err(ApiError::Rejected(format!("connection {id} not found")));
            };
            info!("opening connection {} ('{}')", id, connection.name);
            context.registry().add_active_connection(connection).await;
            match connections::test(context.client(), id).await {
                Ok(result) => {
                    context
                        .registry()
                        .update_connection_status(id, ConnectionStatus::Connected, None)
                        .await;
                    println!("connection {id} opened: {}", result.message);
                }
                Err(e) => {
                    context
                        .registry()
                        .update_connection_status(id, ConnectionStatus::Error, Some(e.to_string()))
                        .await;
                    return Err(e);
                }
            }
        }
        Command::Close { id } => {
            context
                .registry()
                .update_connection_status(id, ConnectionStatus::Disconnected, None)
                .await;
            context.registry().remove_active_connection(id).await;
            println!("connection {id} closed");
        }
        Command::Use { id } => {
            context.registry().set_current_connection(id).await;
            if context.registry().current_connection_id().await == Some(id) {
                println!("current connection is now {id}");
            } else {
                return Err(ApiError::Rejected(format!(
                    "connection {id} is not open; run `kvadmin open {id}` first"
                )));
            }
        }
        Command::Keys { prefix } => {
            let id = current_id(&context).await?;
            let envelope = kv::list_keys(context.client(), id, prefix.as_deref()).await?;
            if let Some(list) = envelope.data {
                for key in list.keys {
                    println!("{key}");
                }
            }
        }
        Command::Get { key } => {
            let id = current_id(&context).await?;
            let envelope = kv::get_value(context.client(), id, &key).await?;
            if let Some(item) = envelope.data {
                println!("{}", pretty(&item.value));
            }
        }
        Command::Set { key, value } => {
            let id = current_id(&context).await?;
            let value = serde_json::from_str(&value).unwrap_or(serde_json::Value::String(value));
            kv::set_value(context.client(), id, &key, value).await?;
            println!("ok");
        }
        Command::Del { key } => {
            let id = current_id(&context).await?;
            let envelope = kv::delete_key(context.client(), id, &key).await?;
            match envelope.data {
                Some(deleted) => println!("deleted {}", deleted.key),
                None => println!("deleted"),
            }
        }
    }
    Ok(())
}

/// The key-value commands operate on the current connection.
async fn current_id(context: &AppContext) -> Result<u64, ApiError> {
    context
        .registry()
        .current_connection_id()
        .await
        .ok_or_else(|| ApiError::Rejected("no connection is open; run `kvadmin open <id>` first".into()))
}

fn pretty(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
