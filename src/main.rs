use std::env;
use std::fmt;
use std::fs;
use std::io::{self, IsTerminal, Write};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use config::{Config, Environment, File, FileFormat};

use log::{LevelFilter, debug, info, warn};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;

mod api;
mod auth;
mod db;
mod oauth;
mod session;
mod user;

const APP_NAME: &str = "wicket";

fn main() {
    if let Err(err) = try_main() {
        let _ = writeln!(io::stderr(), "{err:?}");
        std::process::exit(1);
    }
}

#[tokio::main]
async fn async_serve(ctx: RuntimeContext, cmd: ServeCommand) -> Result<()> {
    handle_serve(&ctx, cmd).await
}

#[tokio::main]
async fn async_sessions(ctx: RuntimeContext, cmd: SessionsCommand) -> Result<()> {
    handle_sessions(&ctx, cmd).await
}

#[tokio::main]
async fn async_users(ctx: RuntimeContext, cmd: UsersCommand) -> Result<()> {
    handle_users(&ctx, cmd).await
}

fn try_main() -> Result<()> {
    let cli = Cli::parse();

    let mut ctx = RuntimeContext::new(cli.common.clone())?;
    ctx.init_logging()?;
    debug!("resolved paths: {:#?}", ctx.paths);

    match cli.command {
        Command::Serve(cmd) => async_serve(ctx, cmd),
        Command::Init(cmd) => handle_init(&ctx, cmd),
        Command::Config { command } => handle_config(&ctx, command),
        Command::Sessions { command } => async_sessions(ctx, command),
        Command::Users { command } => async_users(ctx, command),
        Command::Completions { shell } => handle_completions(shell),
    }
}

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Wicket - OAuth session and RBAC gate server.",
    propagate_version = true
)]
struct Cli {
    #[command(flatten)]
    common: CommonOpts,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Args)]
struct CommonOpts {
    /// Override the config file path
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Reduce output to only errors
    #[arg(short, long, action = clap::ArgAction::SetTrue, global = true)]
    quiet: bool,
    /// Increase logging verbosity (stackable)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    /// Enable debug logging (equivalent to -vv)
    #[arg(long, global = true)]
    debug: bool,
    /// Enable trace logging (overrides other levels)
    #[arg(long, global = true)]
    trace: bool,
    /// Output machine readable JSON
    #[arg(long, global = true, conflicts_with = "yaml")]
    json: bool,
    /// Output machine readable YAML
    #[arg(long, global = true)]
    yaml: bool,
    /// Disable ANSI colors in output
    #[arg(long = "no-color", global = true, conflicts_with = "color")]
    no_color: bool,
    /// Control color output (auto, always, never)
    #[arg(long, value_enum, default_value_t = ColorOption::Auto, global = true)]
    color: ColorOption,
    /// Do not change anything on disk
    #[arg(long = "dry-run", global = true)]
    dry_run: bool,
    /// Assume "yes" for interactive prompts
    #[arg(short = 'y', long = "yes", alias = "force", global = true)]
    assume_yes: bool,
    /// Emit additional diagnostics for troubleshooting
    #[arg(long = "diagnostics", global = true)]
    diagnostics: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ColorOption {
    Auto,
    Always,
    Never,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Start the HTTP API server
    Serve(ServeCommand),
    /// Create config directories and default files
    Init(InitCommand),
    /// Inspect and manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Inspect and revoke login sessions
    Sessions {
        #[command(subcommand)]
        command: SessionsCommand,
    },
    /// Manage user accounts and roles
    Users {
        #[command(subcommand)]
        command: UsersCommand,
    },
    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Clone, Args)]
struct ServeCommand {
    /// Host address to bind to
    #[arg(long, default_value = "0.0.0.0")]
    host: String,
    /// Port to listen on
    #[arg(short, long, default_value = "8080")]
    port: u16,
}

#[derive(Debug, Clone, Args)]
struct InitCommand {
    /// Recreate configuration even if it already exists
    #[arg(long = "force")]
    force: bool,
}

#[derive(Debug, Subcommand)]
enum ConfigCommand {
    /// Output the effective configuration
    Show,
    /// Print the resolved config file path
    Path,
    /// Regenerate the default configuration file
    Reset,
}

#[derive(Debug, Subcommand)]
enum SessionsCommand {
    /// List sessions, newest first
    List(SessionsListCommand),
    /// Revoke a session by token
    Revoke(SessionsRevokeCommand),
    /// Delete sessions that are expired or revoked
    Prune,
}

#[derive(Debug, Clone, Args)]
struct SessionsListCommand {
    /// Only list sessions belonging to this user ID
    #[arg(long, value_name = "USER_ID")]
    user_id: Option<String>,
    /// Maximum number of sessions to list
    #[arg(short, long, default_value = "100")]
    limit: i64,
}

#[derive(Debug, Clone, Args)]
struct SessionsRevokeCommand {
    /// Token of the session to revoke
    token: String,
}

#[derive(Debug, Subcommand)]
enum UsersCommand {
    /// List user accounts
    List(UsersListCommand),
    /// Grant a role to a user
    GrantRole(UsersRoleCommand),
    /// Revoke a role from a user
    RevokeRole(UsersRoleCommand),
}

#[derive(Debug, Clone, Args)]
struct UsersListCommand {
    /// Maximum number of users to list
    #[arg(short, long, default_value = "100")]
    limit: i64,
}

#[derive(Debug, Clone, Args)]
struct UsersRoleCommand {
    /// Email of the account to modify
    email: String,
    /// Role name (community, expert, moderator, admin)
    role: auth::Role,
}

#[derive(Debug, Clone)]
struct RuntimeContext {
    common: CommonOpts,
    paths: AppPaths,
    config: AppConfig,
}

impl RuntimeContext {
    fn new(common: CommonOpts) -> Result<Self> {
        let mut paths = AppPaths::discover(common.config.clone())?;
        let config = load_or_init_config(&mut paths, &common)?;
        let paths = paths.apply_overrides(&config)?;
        let ctx = Self {
            common,
            paths,
            config,
        };
        ctx.ensure_directories()?;
        Ok(ctx)
    }

    fn init_logging(&self) -> Result<()> {
        use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

        if self.common.quiet {
            log::set_max_level(LevelFilter::Off);
            return Ok(());
        }

        // Determine filter level
        let level = match self.effective_log_level() {
            LevelFilter::Off => "off",
            LevelFilter::Error => "error",
            LevelFilter::Warn => "warn",
            LevelFilter::Info => "info",
            LevelFilter::Debug => "debug",
            LevelFilter::Trace => "trace",
        };

        let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("wicket={level},tower_http={level}"))
        });

        // Use JSON output if --json flag is set, otherwise pretty format
        if self.common.json {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .try_init()
                .ok();
        } else {
            let force_color = matches!(self.common.color, ColorOption::Always)
                || env::var_os("FORCE_COLOR").is_some();
            let disable_color = self.common.no_color
                || matches!(self.common.color, ColorOption::Never)
                || env::var_os("NO_COLOR").is_some()
                || (!force_color && !io::stderr().is_terminal());

            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(!disable_color)
                        .with_target(self.common.diagnostics)
                        .with_file(self.common.diagnostics)
                        .with_line_number(self.common.diagnostics),
                )
                .try_init()
                .ok();
        }

        // Also init env_logger for compatibility with log crate users
        let mut builder =
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
        builder.filter_level(self.effective_log_level());
        builder.try_init().ok();

        Ok(())
    }

    fn effective_log_level(&self) -> LevelFilter {
        if self.common.trace {
            LevelFilter::Trace
        } else if self.common.debug {
            LevelFilter::Debug
        } else {
            match self.common.verbose {
                0 => LevelFilter::Info,
                1 => LevelFilter::Debug,
                _ => LevelFilter::Trace,
            }
        }
    }

    fn ensure_directories(&self) -> Result<()> {
        if self.common.dry_run {
            info!(
                "dry-run: would ensure data dir {} and state dir {}",
                self.paths.data_dir.display(),
                self.paths.state_dir.display()
            );
            return Ok(());
        }

        fs::create_dir_all(&self.paths.data_dir).with_context(|| {
            format!("creating data directory {}", self.paths.data_dir.display())
        })?;
        fs::create_dir_all(&self.paths.state_dir).with_context(|| {
            format!(
                "creating state directory {}",
                self.paths.state_dir.display()
            )
        })?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct AppPaths {
    config_file: PathBuf,
    data_dir: PathBuf,
    state_dir: PathBuf,
}

impl AppPaths {
    fn discover(override_path: Option<PathBuf>) -> Result<Self> {
        let config_file = match override_path {
            Some(path) => {
                let expanded = expand_path(path)?;
                if expanded.is_dir() {
                    expanded.join("config.toml")
                } else {
                    expanded
                }
            }
            None => default_config_dir()?.join("config.toml"),
        };

        if config_file.parent().is_none() {
            return Err(anyhow!("invalid config file path: {config_file:?}"));
        }

        let data_dir = default_data_dir()?;
        let state_dir = default_state_dir()?;

        Ok(Self {
            config_file,
            data_dir,
            state_dir,
        })
    }

    fn apply_overrides(mut self, cfg: &AppConfig) -> Result<Self> {
        if let Some(ref data_override) = cfg.paths.data_dir {
            self.data_dir = expand_str_path(data_override)?;
        }
        if let Some(ref state_override) = cfg.paths.state_dir {
            self.state_dir = expand_str_path(state_override)?;
        }
        Ok(self)
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
struct AppConfig {
    logging: LoggingConfig,
    server: ServerConfig,
    paths: PathsConfig,
    auth: auth::AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
struct LoggingConfig {
    level: String,
    file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// HTTP listener configuration. CLI arguments take precedence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
struct ServerConfig {
    host: String,
    port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
struct PathsConfig {
    data_dir: Option<String>,
    state_dir: Option<String>,
}

fn handle_init(ctx: &RuntimeContext, cmd: InitCommand) -> Result<()> {
    if ctx.paths.config_file.exists() && !(cmd.force || ctx.common.assume_yes) {
        return Err(anyhow!(
            "config already exists at {} (use --force to overwrite)",
            ctx.paths.config_file.display()
        ));
    }

    if ctx.common.dry_run {
        info!(
            "dry-run: would write default config to {}",
            ctx.paths.config_file.display()
        );
        return Ok(());
    }

    write_default_config(&ctx.paths.config_file)
}

fn handle_config(ctx: &RuntimeContext, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Show => {
            if ctx.common.json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&ctx.config)
                        .context("serializing config to JSON")?
                );
            } else if ctx.common.yaml {
                println!(
                    "{}",
                    serde_yaml::to_string(&ctx.config).context("serializing config to YAML")?
                );
            } else {
                println!("{:#?}", ctx.config);
            }
            Ok(())
        }
        ConfigCommand::Path => {
            println!("{}", ctx.paths.config_file.display());
            Ok(())
        }
        ConfigCommand::Reset => {
            if ctx.common.dry_run {
                info!(
                    "dry-run: would reset config at {}",
                    ctx.paths.config_file.display()
                );
                return Ok(());
            }
            write_default_config(&ctx.paths.config_file)
        }
    }
}

fn handle_completions(shell: Shell) -> Result<()> {
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, APP_NAME, &mut io::stdout());
    Ok(())
}

async fn handle_sessions(ctx: &RuntimeContext, cmd: SessionsCommand) -> Result<()> {
    // Initialize database
    let db_path = ctx.paths.data_dir.join("wicket.db");
    let database = db::Database::new(&db_path).await?;
    let session_repo = session::SessionRepository::new(database.pool().clone());

    match cmd {
        SessionsCommand::List(list_cmd) => {
            let sessions = session_repo
                .list(list_cmd.user_id.as_deref(), list_cmd.limit)
                .await?;

            if ctx.common.json {
                let output: Vec<_> = sessions
                    .iter()
                    .map(|s| {
                        serde_json::json!({
                            "token": s.token,
                            "user_id": s.user_id,
                            "created_at": s.created_at,
                            "expires_at": s.expires_at,
                            "revoked_at": s.revoked_at,
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                let now = chrono::Utc::now();
                println!(
                    "{:<26} {:<8} {:<28} {}",
                    "USER", "STATE", "EXPIRES", "TOKEN"
                );
                println!("{}", "-".repeat(100));
                for s in &sessions {
                    let state = if s.revoked_at.is_some() {
                        "revoked"
                    } else if s.is_valid_at(now) {
                        "active"
                    } else {
                        "expired"
                    };
                    println!(
                        "{:<26} {:<8} {:<28} {}",
                        s.user_id, state, s.expires_at, s.token
                    );
                }
                println!();
                println!("Total: {} sessions", sessions.len());
            }
        }
        SessionsCommand::Revoke(revoke_cmd) => {
            let revoked = session_repo
                .revoke(&revoke_cmd.token, chrono::Utc::now())
                .await?;

            if ctx.common.json {
                let status = if revoked { "revoked" } else { "unchanged" };
                println!(
                    r#"{{"status": "{}", "token": "{}"}}"#,
                    status, revoke_cmd.token
                );
            } else if revoked {
                println!("Revoked session: {}", revoke_cmd.token);
            } else {
                println!(
                    "Session already revoked or unknown: {}",
                    revoke_cmd.token
                );
            }
        }
        SessionsCommand::Prune => {
            let now = chrono::Utc::now();

            if ctx.common.dry_run {
                let count = session_repo.prunable_count(now).await?;
                info!("dry-run: would delete {} session(s)", count);
                return Ok(());
            }

            let deleted = session_repo.prune(now).await?;
            if ctx.common.json {
                println!(r#"{{"deleted": {}}}"#, deleted);
            } else {
                println!("Pruned {} session(s)", deleted);
            }
        }
    }

    Ok(())
}

async fn handle_users(ctx: &RuntimeContext, cmd: UsersCommand) -> Result<()> {
    // Initialize database
    let db_path = ctx.paths.data_dir.join("wicket.db");
    let database = db::Database::new(&db_path).await?;
    let user_service = user::UserService::new(user::UserRepository::new(database.pool().clone()));

    match cmd {
        UsersCommand::List(list_cmd) => {
            let users = user_service.list(list_cmd.limit).await?;

            if ctx.common.json {
                let output: Vec<_> = users
                    .iter()
                    .map(|u| {
                        serde_json::json!({
                            "id": u.id,
                            "email": u.email,
                            "username": u.username,
                            "roles": u.roles,
                            "created_at": u.created_at,
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                println!(
                    "{:<26} {:<30} {:<18} {:<26} {}",
                    "ID", "EMAIL", "USERNAME", "ROLES", "CREATED"
                );
                println!("{}", "-".repeat(110));
                for u in &users {
                    println!(
                        "{:<26} {:<30} {:<18} {:<26} {}",
                        u.id,
                        u.email,
                        u.username.as_deref().unwrap_or("-"),
                        u.roles.to_string(),
                        u.created_at
                    );
                }
                println!();
                println!("Total: {} users", users.len());
            }
        }
        UsersCommand::GrantRole(role_cmd) => {
            let user = user_service
                .grant_role(&role_cmd.email, role_cmd.role)
                .await?;

            if ctx.common.json {
                println!(
                    r#"{{"status": "granted", "email": "{}", "roles": "{}"}}"#,
                    user.email, user.roles
                );
            } else {
                println!(
                    "Granted {} to {} (roles: {})",
                    role_cmd.role, user.email, user.roles
                );
            }
        }
        UsersCommand::RevokeRole(role_cmd) => {
            let user = user_service
                .revoke_role(&role_cmd.email, role_cmd.role)
                .await?;

            if ctx.common.json {
                println!(
                    r#"{{"status": "revoked", "email": "{}", "roles": "{}"}}"#,
                    user.email, user.roles
                );
            } else {
                println!(
                    "Revoked {} from {} (roles: {})",
                    role_cmd.role, user.email, user.roles
                );
            }
        }
    }

    Ok(())
}

async fn handle_serve(ctx: &RuntimeContext, cmd: ServeCommand) -> Result<()> {
    info!("Starting wicket server...");

    // Initialize database
    let db_path = ctx.paths.data_dir.join("wicket.db");
    info!("Database path: {}", db_path.display());
    let database = db::Database::new(&db_path).await?;

    // Validate authentication config before accepting traffic
    let auth_config = ctx.config.auth.clone();
    auth_config
        .validate()
        .context("Invalid auth configuration")?;

    let mut providers = Vec::new();
    if auth_config.google.is_some() {
        providers.push("google");
    }
    if auth_config.discord.is_some() {
        providers.push("discord");
    }
    if providers.is_empty() {
        warn!("No OAuth providers configured; login endpoints will return 404");
    } else {
        info!("OAuth providers: {}", providers.join(", "));
    }

    let session_repo = session::SessionRepository::new(database.pool().clone());
    let user_repo = user::UserRepository::new(database.pool().clone());

    // Report sessions awaiting pruning
    match session_repo.prunable_count(chrono::Utc::now()).await {
        Ok(0) => {}
        Ok(count) => info!(
            "{} dead session(s) on disk, run `{} sessions prune` to delete them",
            count, APP_NAME
        ),
        Err(e) => warn!("Could not count prunable sessions: {:?}", e),
    }

    let session_service = session::SessionService::new(
        session_repo,
        user_repo.clone(),
        auth_config.session_ttl_secs,
    );
    let user_service = user::UserService::new(user_repo);

    let identity: std::sync::Arc<dyn oauth::IdentityExchange> =
        std::sync::Arc::new(oauth::OAuthClient::new(auth_config.clone()));

    // Create app state
    let state = api::AppState::new(auth_config, session_service, user_service, identity);

    // Create router
    let app = api::create_router(state);

    // Listener address: CLI args override config file values
    let host = if cmd.host != "0.0.0.0" {
        cmd.host.clone()
    } else {
        ctx.config.server.host.clone()
    };
    let port = if cmd.port != 8080 {
        cmd.port
    } else {
        ctx.config.server.port
    };

    // Bind and serve
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .context("invalid address")?;

    info!("Listening on http://{}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .context("binding to address")?;

    // Set up graceful shutdown
    let shutdown_signal = async {
        let ctrl_c = async {
            tokio::signal::ctrl_c()
                .await
                .expect("failed to install Ctrl+C handler");
        };

        #[cfg(unix)]
        let terminate = async {
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install signal handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {},
            _ = terminate => {},
        }

        info!("Shutdown signal received, draining connections...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
        .context("running server")?;

    info!("Shutdown complete");

    Ok(())
}

fn load_or_init_config(paths: &mut AppPaths, common: &CommonOpts) -> Result<AppConfig> {
    if !paths.config_file.exists() {
        if common.dry_run {
            info!(
                "dry-run: would create default config at {}",
                paths.config_file.display()
            );
        } else {
            write_default_config(&paths.config_file)?;
        }
    }

    let env_prefix = env_prefix();
    let built = Config::builder()
        .set_default("logging.level", "info")?
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8080_i64)?
        .add_source(
            File::from(paths.config_file.as_path())
                .format(FileFormat::Toml)
                .required(false),
        )
        .add_source(Environment::with_prefix(env_prefix.as_str()).separator("__"))
        .build()?;

    let mut config: AppConfig = built.try_deserialize()?;

    if let Some(ref file) = config.logging.file {
        let expanded = expand_str_path(file)?;
        config.logging.file = Some(expanded.display().to_string());
    }

    Ok(config)
}

fn write_default_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating config directory {parent:?}"))?;
    }

    let config = AppConfig::default();
    let toml = toml::to_string_pretty(&config).context("serializing default config to TOML")?;
    let mut body = default_config_header(path)?;
    body.push_str(&toml);
    fs::write(path, body).with_context(|| format!("writing config file to {}", path.display()))
}

fn default_config_header(path: &Path) -> Result<String> {
    let mut buffer = String::new();
    buffer.push_str("# Configuration for ");
    buffer.push_str(APP_NAME);
    buffer.push('\n');
    buffer.push_str("# File: ");
    buffer.push_str(&path.display().to_string());
    buffer.push('\n');
    buffer.push('\n');
    Ok(buffer)
}

fn expand_path(path: PathBuf) -> Result<PathBuf> {
    if let Some(text) = path.to_str() {
        expand_str_path(text)
    } else {
        Ok(path)
    }
}

fn expand_str_path(text: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(text).context("expanding path")?;
    Ok(PathBuf::from(expanded.to_string()))
}

fn default_config_dir() -> Result<PathBuf> {
    if let Some(dir) = env::var_os("XDG_CONFIG_HOME").filter(|v| !v.is_empty()) {
        let mut path = PathBuf::from(dir);
        path.push(APP_NAME);
        return Ok(path);
    }

    if let Some(mut dir) = dirs::config_dir() {
        dir.push(APP_NAME);
        return Ok(dir);
    }

    dirs::home_dir()
        .map(|home| home.join(".config").join(APP_NAME))
        .ok_or_else(|| anyhow!("unable to determine configuration directory"))
}

fn default_data_dir() -> Result<PathBuf> {
    if let Some(dir) = env::var_os("XDG_DATA_HOME").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir).join(APP_NAME));
    }

    if let Some(mut dir) = dirs::data_dir() {
        dir.push(APP_NAME);
        return Ok(dir);
    }

    dirs::home_dir()
        .map(|home| home.join(".local").join("share").join(APP_NAME))
        .ok_or_else(|| anyhow!("unable to determine data directory"))
}

fn default_state_dir() -> Result<PathBuf> {
    if let Some(dir) = env::var_os("XDG_STATE_HOME").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir).join(APP_NAME));
    }

    if let Some(mut dir) = dirs::state_dir() {
        dir.push(APP_NAME);
        return Ok(dir);
    }

    dirs::home_dir()
        .map(|home| home.join(".local").join("state").join(APP_NAME))
        .ok_or_else(|| anyhow!("unable to determine state directory"))
}

fn env_prefix() -> String {
    APP_NAME
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

impl fmt::Display for AppPaths {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "config: {}, data: {}, state: {}",
            self.config_file.display(),
            self.data_dir.display(),
            self.state_dir.display()
        )
    }
}
