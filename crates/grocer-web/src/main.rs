//! Grocer server - web backend on a BaaS platform

use clap::Parser;
use grocer_web::{run_server, Environment, ServerConfig};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "grocer-server")]
#[command(about = "Web backend for the Grocer app")]
#[command(version)]
struct Args {
    /// Host to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0", env = "HOST")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "3000", env = "PORT")]
    port: u16,

    /// Deployment mode; only `development` enables verbose error pages
    #[arg(long, env = "APP_ENV")]
    app_env: Option<String>,

    /// Secret used to sign session cookies
    #[arg(long, env = "SESSION_SECRET", hide_env_values = true)]
    session_secret: String,

    /// Do not re-resolve the session user from the platform on each request
    #[arg(long, env = "SESSION_NO_FETCH_USER")]
    no_fetch_user: bool,

    /// Directory of static assets
    #[arg(long, default_value = "public", env = "PUBLIC_DIR")]
    public_dir: PathBuf,

    /// Deadline for platform calls in milliseconds
    #[arg(long, default_value = "10000", env = "BAAS_TIMEOUT_MS")]
    baas_timeout_ms: u64,

    /// Platform API server URL
    #[arg(long, default_value = "https://api.leancloud.cn", env = "BAAS_SERVER_URL")]
    baas_server_url: String,

    /// Platform application id
    #[arg(long, env = "BAAS_APP_ID")]
    baas_app_id: Option<String>,

    /// Platform application key
    #[arg(long, env = "BAAS_APP_KEY", hide_env_values = true)]
    baas_app_key: Option<String>,

    /// Use the in-memory platform backend (users and files will not persist)
    #[arg(long, env = "GROCER_MEMORY_BACKEND")]
    memory_backend: bool,

    /// Demo account for the in-memory backend, as `username:password`
    #[arg(long, env = "DEMO_USER", hide_env_values = true)]
    demo_user: Option<String>,

    /// Token shared with the wechat platform
    #[arg(long, env = "WECHAT_TOKEN", hide_env_values = true)]
    wechat_token: Option<String>,

    /// Enable debug logging
    #[arg(short, long, env = "GROCER_DEBUG")]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Parse arguments
    let args = Args::parse();

    // Setup logging
    let log_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| format!("grocer_web={},grocer_baas={},tower_http=debug", log_level, log_level).into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Panics outside a request boundary still reach the log
    std::panic::set_hook(Box::new(|info| {
        tracing::error!("panic: {}", info);
    }));

    let environment = Environment::from_flag(args.app_env.as_deref());
    tracing::info!("Starting Grocer server on {}:{} ({:?})", args.host, args.port, environment);

    if args.memory_backend {
        tracing::warn!("⚠️  Using in-memory platform backend - data will NOT persist!");
    } else {
        tracing::info!("Platform API: {}", args.baas_server_url);
    }

    // Build configuration
    let config = ServerConfig {
        host: args.host,
        port: args.port,
        environment,
        session_secret: args.session_secret,
        fetch_user: !args.no_fetch_user,
        public_dir: args.public_dir,
        collaborator_timeout_ms: args.baas_timeout_ms,
        use_memory_backend: args.memory_backend,
        baas_server_url: args.baas_server_url,
        baas_app_id: args.baas_app_id,
        baas_app_key: args.baas_app_key,
        demo_user: args.demo_user,
        wechat_token: args.wechat_token,
        ..Default::default()
    };

    // Run the server
    run_server(config).await
}
