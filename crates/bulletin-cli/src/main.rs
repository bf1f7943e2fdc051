use std::time::Duration;

use anyhow::{Context, Result};
use bulletin_acquire::config::{
    ClientConfig, DeploymentMode, PortalConfig, ProxyConfig, ProxyCredentials, DEFAULT_PORTAL_URL,
    DEFAULT_PROXY_HOST, DEFAULT_PROXY_PORT, DEFAULT_USER_AGENT,
};
use bulletin_model::{FetchedBulletin, RawGradeRequest};
use bulletin_server::{AppState, Diagnostics};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "bulletin")]
#[command(about = "Fetch Moutamadris grade reports, one-shot or as an HTTP service")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("BUILD_HASH"), ")"))]
struct Cli {
    /// Log level: error, warn, info, debug, trace
    #[arg(long, global = true, default_value = "info", value_enum)]
    log_level: LogLevel,

    /// Use UTC timestamps instead of local time
    #[arg(long, global = true)]
    utc: bool,

    /// Portal application root
    #[arg(long, global = true, env = "BULLETIN_PORTAL_URL", default_value = DEFAULT_PORTAL_URL)]
    portal_url: String,

    /// Timeout for each portal request, in seconds
    #[arg(long, global = true, default_value_t = 15, value_parser = clap::value_parser!(u64).range(1..))]
    timeout_secs: u64,

    /// User-Agent sent to the portal
    #[arg(long, global = true, default_value = DEFAULT_USER_AGENT)]
    user_agent: String,

    /// How portal traffic leaves this host; "auto" proxies when VERCEL is set
    #[arg(long, global = true, default_value = "auto", value_enum)]
    deployment: Deployment,

    /// Outbound proxy host for proxied deployments
    #[arg(long, global = true, default_value = DEFAULT_PROXY_HOST)]
    proxy_host: String,

    /// Outbound proxy port for proxied deployments
    #[arg(long, global = true, default_value_t = DEFAULT_PROXY_PORT)]
    proxy_port: u16,

    /// Proxy username (requires --proxy-password)
    #[arg(long, global = true)]
    proxy_user: Option<String>,

    /// Proxy password (requires --proxy-user)
    #[arg(long, global = true, env = "BULLETIN_PROXY_PASSWORD", hide_env_values = true)]
    proxy_password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, clap::ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Clone, Debug, PartialEq, Eq, clap::ValueEnum)]
enum Deployment {
    /// Proxied if the VERCEL environment variable is set, direct otherwise
    Auto,
    /// Connect to the portal directly
    Direct,
    /// Route all portal traffic through --proxy-host:--proxy-port
    Proxied,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve POST /api/fetch-grades over HTTP
    Serve {
        /// Address to listen on
        #[arg(short, long, default_value = "0.0.0.0:3000")]
        bind: String,

        /// Return only error summaries to callers, never portal markup or cause chains
        #[arg(long)]
        redact_diagnostics: bool,
    },

    /// Fetch one grade report and print or save its raw HTML
    Fetch {
        /// Portal username (usually the student's @taalim.ma address)
        #[arg(short, long)]
        username: String,

        /// Portal password
        #[arg(short, long, env = "BULLETIN_PASSWORD", hide_env_values = true)]
        password: String,

        /// Term identifier (IdSession)
        #[arg(short, long)]
        semester: String,

        /// Academic year, e.g. "2023/2024"
        #[arg(short, long)]
        year: String,

        /// Write bulletin.html, bulletin.json and source.md here instead of printing to stdout
        #[arg(short = 'O', long)]
        output_dir: Option<String>,
    },
}

impl Cli {
    /// Resolve how outbound traffic leaves the process. Done once, at startup.
    fn deployment_mode(&self) -> Result<DeploymentMode> {
        let credentials = match (&self.proxy_user, &self.proxy_password) {
            (Some(username), Some(password)) => Some(ProxyCredentials {
                username: username.clone(),
                password: password.clone(),
            }),
            (None, None) => None,
            _ => anyhow::bail!("--proxy-user and --proxy-password must be given together"),
        };
        let proxy = ProxyConfig {
            host: self.proxy_host.clone(),
            port: self.proxy_port,
            credentials,
        };

        Ok(match self.deployment {
            Deployment::Auto => DeploymentMode::from_env(proxy),
            Deployment::Direct => DeploymentMode::Direct,
            Deployment::Proxied => DeploymentMode::Proxied(proxy),
        })
    }

    fn client_config(&self, mode: &DeploymentMode) -> ClientConfig {
        ClientConfig {
            timeout: Duration::from_secs(self.timeout_secs),
            user_agent: self.user_agent.clone(),
            ..ClientConfig::for_mode(mode)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Map log level, suppressing noisy HTML-parsing crates at debug/trace
    let level = match cli.log_level {
        LogLevel::Error => "error",
        LogLevel::Warn  => "warn",
        LogLevel::Info  => "info",
        LogLevel::Debug => "debug,selectors=warn,html5ever=warn",
        LogLevel::Trace => "trace,selectors=warn,html5ever=warn",
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    // Timestamp format: 2026-02-14 19:44:09.123 -08:00
    let time_format = "%Y-%m-%d %H:%M:%S%.3f %:z";

    // Logs go to stderr; stdout carries the fetched HTML
    if cli.utc {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_timer(tracing_subscriber::fmt::time::ChronoUtc::new(time_format.to_string()))
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .with_timer(tracing_subscriber::fmt::time::ChronoLocal::new(time_format.to_string()))
            .init();
    }

    let mode = cli.deployment_mode()?;
    let portal = PortalConfig::new(&cli.portal_url)?;
    let client = cli.client_config(&mode);
    tracing::info!(portal = %portal.base_url(), deployment = %mode, timeout_secs = cli.timeout_secs, "Resolved configuration");

    match cli.command {
        Commands::Serve { bind, redact_diagnostics } => {
            let diagnostics = if redact_diagnostics {
                Diagnostics::Redact
            } else {
                Diagnostics::Expose
            };
            let listener = tokio::net::TcpListener::bind(&bind)
                .await
                .with_context(|| format!("Failed to bind {bind}"))?;
            bulletin_server::serve(
                listener,
                AppState {
                    portal,
                    client,
                    diagnostics,
                },
            )
            .await?;
        }
        Commands::Fetch {
            username,
            password,
            semester,
            year,
            output_dir,
        } => {
            let raw = RawGradeRequest {
                username: Some(username),
                password: Some(password),
                semester: Some(semester),
                year: Some(year),
            };
            let request = bulletin_validate::validate_request(raw).map_err(|errors| {
                let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
                anyhow::anyhow!(messages.join(", "))
            })?;

            let raw_html = bulletin_acquire::fetch_grades(&portal, &client, &request)
                .await
                .with_context(|| format!("Could not fetch bulletin for {}", request.username))?;

            match output_dir {
                Some(dir) => {
                    let bulletin =
                        FetchedBulletin::new(&portal.bulletins_url(), &request.year, &request.semester, raw_html);
                    bulletin_acquire::output::write_bulletin(&bulletin, &dir)?;
                }
                None => println!("{raw_html}"),
            }
        }
    }

    Ok(())
}
