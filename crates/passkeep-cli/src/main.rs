//! `PassKeep` CLI — terminal front end for the `PassKeep` password manager.
//!
//! Every credential and sharing command goes through the
//! [`PasswordManagerView`] controller, so the CLI validates and behaves the
//! same way any other front end would.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::collections::HashSet;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use passkeep_client::generator::{self, GeneratorOptions};
use passkeep_client::{
    ClientConfig, ClientError, HttpClient, PasswordManagerView, ShareMessage, SubmitOutcome,
    ViewState,
};
use tracing::debug;

// ── ANSI color helpers ───────────────────────────────────────────────

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const CYAN: &str = "\x1b[36m";
const WHITE: &str = "\x1b[37m";

// ── CLI structure ────────────────────────────────────────────────────

/// `PassKeep`: store, generate, and share website passwords.
#[derive(Parser)]
#[command(
    name = "passkeep",
    version,
    about = "PassKeep CLI — store, generate, and share website passwords",
    long_about = None,
    after_help = format!(
        "{DIM}Environment variables:{RESET}\n  \
         PASSKEEP_URL      Server address (default: http://127.0.0.1:8300)\n  \
         PASSKEEP_TOKEN    Session token from `passkeep login`\n  \
         PASSKEEP_USER     Logged-in username\n  \
         PASSKEEP_LOG      Log filter for stderr (default: warn)\n\n\
         {DIM}Examples:{RESET}\n  \
         passkeep register alice --password 'correct horse'\n  \
         passkeep add https://mail.example --lowercase --digits --length 16\n  \
         passkeep share https://mail.example bob\n  \
         passkeep watch"
    ),
)]
struct Cli {
    /// PassKeep server address.
    #[arg(long, env = "PASSKEEP_URL", default_value = "http://127.0.0.1:8300")]
    url: String,

    /// Session token.
    #[arg(long, env = "PASSKEEP_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Logged-in username (needed for sharing and the inbox).
    #[arg(long, env = "PASSKEEP_USER")]
    user: Option<String>,

    /// Retry attempts for read requests.
    #[arg(long, default_value = "3")]
    retries: u32,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the server is reachable.
    Health,
    /// Create an account.
    Register {
        username: String,
        #[arg(long, env = "PASSKEEP_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Log in and print the session token.
    Login {
        username: String,
        #[arg(long, env = "PASSKEEP_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Revoke the current session.
    Logout,
    /// List users, or show one.
    Users { username: Option<String> },
    /// List stored passwords.
    List {
        /// Print passwords in clear text.
        #[arg(long)]
        show: bool,
    },
    /// Store a password. Without --password one is generated first.
    Add {
        url: String,
        #[arg(long)]
        password: Option<String>,
        #[command(flatten)]
        generator: GeneratorArgs,
    },
    /// Generate a password locally without storing it.
    Generate {
        #[command(flatten)]
        generator: GeneratorArgs,
        /// Print only the password.
        #[arg(long)]
        raw: bool,
    },
    /// Replace the password stored for a URL.
    Update {
        url: String,
        #[arg(long)]
        password: String,
    },
    /// Delete the password stored for a URL.
    Delete { url: String },
    /// Offer a stored password to another user.
    Share { url: String, to: String },
    /// Show pending share requests.
    Inbox,
    /// Poll the inbox and print requests as they arrive (Ctrl-C to stop).
    Watch {
        /// Poll interval in milliseconds.
        #[arg(long, default_value = "2000")]
        interval_ms: u64,
    },
    /// Accept a pending share request.
    Accept { url: String },
    /// Reject a pending share request.
    Reject { url: String },
}

#[derive(Args)]
struct GeneratorArgs {
    /// Password length (4-50).
    #[arg(long, default_value_t = generator::DEFAULT_LENGTH)]
    length: usize,
    /// Include lowercase letters.
    #[arg(long)]
    lowercase: bool,
    /// Include digits.
    #[arg(long)]
    digits: bool,
    /// Include symbols.
    #[arg(long)]
    symbols: bool,
}

impl From<&GeneratorArgs> for GeneratorOptions {
    fn from(args: &GeneratorArgs) -> Self {
        Self {
            length: args.length,
            lowercase: args.lowercase,
            digits: args.digits,
            symbols: args.symbols,
        }
    }
}

// ── Pretty output helpers ────────────────────────────────────────────

fn header(icon: &str, title: &str) {
    println!("{BOLD}{CYAN}{icon} {title}{RESET}");
    println!("{DIM}─────────────────────────────────────────{RESET}");
}

fn kv_line(key: &str, value: &str) {
    println!("  {DIM}{key:<20}{RESET} {WHITE}{value}{RESET}");
}

fn success(msg: &str) {
    println!("{GREEN}{BOLD}✓{RESET} {msg}");
}

fn warning(msg: &str) {
    println!("{YELLOW}{BOLD}⚠{RESET} {YELLOW}{msg}{RESET}");
}

fn print_entries(state: &ViewState) {
    header("🔑", "Passwords");
    if state.passwords.is_empty() {
        println!("  {DIM}(empty){RESET}");
    }
    for entry in &state.passwords {
        let password = state.display_password(&entry.password);
        println!("  {CYAN}├─{RESET} {BOLD}{}{RESET}", entry.url);
        println!("  {CYAN}│{RESET}  {password}  {DIM}{}{RESET}", entry.last_updated);
    }
    println!();
}

fn print_message(message: &ShareMessage) {
    println!(
        "  {CYAN}├─{RESET} {BOLD}{}{RESET} {DIM}from{RESET} {}",
        message.service_url, message.sender_user_name
    );
}

// ── Entry point ──────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("PASSKEEP_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let message = match e.downcast_ref::<ClientError>() {
                Some(client_err) => client_err.notice(),
                None => format!("{e:#}"),
            };
            eprintln!();
            eprintln!("  {RED}{BOLD}✗ Error:{RESET} {message}");
            eprintln!();
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    if let Commands::Generate { generator, raw } = &cli.command {
        return cmd_generate(generator, *raw);
    }

    let client = HttpClient::new(ClientConfig {
        base_url: cli.url,
        token: cli.token.unwrap_or_default(),
        max_retries: cli.retries,
        ..ClientConfig::default()
    })?;
    debug!(server = %client.base_url(), "using server");
    let user = cli.user;

    match cli.command {
        Commands::Health => cmd_health(&client).await,
        Commands::Register { username, password } => {
            cmd_register(&client, &username, &password).await
        }
        Commands::Login { username, password } => cmd_login(&client, &username, &password).await,
        Commands::Logout => {
            client.logout().await?;
            success("Logged out");
            Ok(())
        }
        Commands::Users { username } => cmd_users(&client, username.as_deref()).await,
        Commands::List { show } => {
            let view = view(client, user.as_deref());
            view.refresh().await?;
            view.edit(|s| s.show_password = show).await;
            print_entries(&view.state().await);
            Ok(())
        }
        Commands::Add {
            url,
            password,
            generator,
        } => cmd_add(&view(client, user.as_deref()), url, password, &generator).await,
        Commands::Update { url, password } => {
            view(client, user.as_deref())
                .update_password(&url, &password)
                .await?;
            success(&format!("Updated password for {url}"));
            Ok(())
        }
        Commands::Delete { url } => {
            view(client, user.as_deref()).delete_password(&url).await?;
            success(&format!("Deleted password for {url}"));
            Ok(())
        }
        Commands::Share { url, to } => {
            let view = view(client, Some(require_user(user)?.as_str()));
            cmd_share(&view, &url, &to).await
        }
        Commands::Inbox => cmd_inbox(&view(client, Some(require_user(user)?.as_str()))).await,
        Commands::Watch { interval_ms } => {
            let view = view(client, Some(require_user(user)?.as_str()))
                .with_poll_interval(Duration::from_millis(interval_ms));
            cmd_watch(view).await
        }
        Commands::Accept { url } => {
            view(client, Some(require_user(user)?.as_str()))
                .accept(&url)
                .await?;
            success(&format!("Accepted {url}, it is now in your passwords"));
            Ok(())
        }
        Commands::Reject { url } => {
            view(client, Some(require_user(user)?.as_str()))
                .reject(&url)
                .await?;
            success(&format!("Rejected {url}"));
            Ok(())
        }
        Commands::Generate { .. } => Ok(()),
    }
}

fn view(client: HttpClient, user: Option<&str>) -> PasswordManagerView {
    PasswordManagerView::new(Arc::new(client), user.unwrap_or_default())
}

fn require_user(user: Option<String>) -> Result<String> {
    match user {
        Some(u) if !u.trim().is_empty() => Ok(u),
        _ => bail!("no user set, pass --user or set PASSKEEP_USER"),
    }
}

// ── Commands ─────────────────────────────────────────────────────────

fn cmd_generate(args: &GeneratorArgs, raw: bool) -> Result<()> {
    let password = generator::generate(&GeneratorOptions::from(args)).map_err(ClientError::from)?;
    if raw {
        println!("{password}");
    } else {
        header("🎲", "Generated password");
        kv_line("Password", &password);
        kv_line("Length", &password.chars().count().to_string());
        println!();
    }
    Ok(())
}

async fn cmd_health(client: &HttpClient) -> Result<()> {
    let health = client.health().await?;
    header("💓", "Server");
    kv_line("Address", client.base_url());
    kv_line("Status", &health.status);
    kv_line("Version", &health.version);
    println!();
    Ok(())
}

async fn cmd_register(client: &HttpClient, username: &str, password: &str) -> Result<()> {
    let user = client.register(username, password).await?;
    success(&format!("Registered {}", user.username));
    println!("  {DIM}Next: passkeep login {}{RESET}", user.username);
    Ok(())
}

async fn cmd_login(client: &HttpClient, username: &str, password: &str) -> Result<()> {
    let login = client.login(username, password).await?;
    success(&format!("Logged in as {}", login.username));
    kv_line("Expires", &login.expires_at);
    println!();
    println!("  {DIM}Use this session in your shell:{RESET}");
    println!("  export PASSKEEP_TOKEN={}", login.token);
    println!("  export PASSKEEP_USER={}", login.username);
    println!();
    Ok(())
}

async fn cmd_users(client: &HttpClient, username: Option<&str>) -> Result<()> {
    if let Some(username) = username {
        let user = client.get_user(username).await?;
        header("👤", &user.username);
        kv_line("Created", &user.created_at);
    } else {
        let users = client.list_users().await?;
        header("👥", "Users");
        for user in users {
            println!("  {CYAN}├─{RESET} {}", user.username);
        }
    }
    println!();
    Ok(())
}

async fn cmd_add(
    view: &PasswordManagerView,
    url: String,
    password: Option<String>,
    args: &GeneratorArgs,
) -> Result<()> {
    let options = GeneratorOptions::from(args);
    view.edit(|s| {
        s.url = url;
        s.password = password.unwrap_or_default();
        s.options = options;
    })
    .await;

    // An empty password input generates into the form; submitting again stores it.
    let mut outcome = view.submit().await?;
    let generated = matches!(outcome, SubmitOutcome::Generated(_));
    if generated {
        outcome = view.submit().await?;
    }

    if let SubmitOutcome::Stored(stored) = outcome {
        success(&format!("Password stored for {}", stored.url));
        // A generated password is shown once so the user can copy it.
        view.edit(|s| s.show_password = generated).await;
        let shown = view.state().await.display_password(&stored.password);
        kv_line("Password", &shown);
        kv_line("Updated", &stored.last_updated);
    } else {
        warning("Nothing was stored");
    }
    println!();
    Ok(())
}

async fn cmd_share(view: &PasswordManagerView, url: &str, to: &str) -> Result<()> {
    view.edit(|s| s.shared_username = to.to_owned()).await;
    view.request_share(url).await?;
    success(&format!("Share request for {url} sent to {to}"));
    Ok(())
}

async fn cmd_inbox(view: &PasswordManagerView) -> Result<()> {
    view.refresh_inbox().await?;
    let messages = view.state().await.messages;
    header("📥", "Share requests");
    if messages.is_empty() {
        println!("  {DIM}(empty){RESET}");
    }
    for message in &messages {
        print_message(message);
    }
    println!();
    Ok(())
}

async fn cmd_watch(mut view: PasswordManagerView) -> Result<()> {
    header("📥", &format!("Watching share requests for {}", view.username()));
    println!("  {DIM}Ctrl-C to stop{RESET}");

    view.attach();
    let mut seen: HashSet<(String, String)> = HashSet::new();
    let mut ticker = tokio::time::interval(Duration::from_millis(250));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                for message in view.state().await.messages {
                    let key = (message.sender_user_name.clone(), message.service_url.clone());
                    if seen.insert(key) {
                        print_message(&message);
                    }
                }
            }
            res = &mut ctrl_c => {
                res.context("failed to listen for Ctrl-C")?;
                break;
            }
        }
    }

    view.detach().await;
    println!();
    Ok(())
}
