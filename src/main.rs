mod config;
mod routes;

use axum::ServiceExt;
use axum::http::{HeaderValue, Method, header};
use clap::Parser;
use config::{Config, CorsMode};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::normalize_path::NormalizePath;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const GIT_HASH: &str = env!("GIT_HASH");
pub const BUILD_TIME: &str = env!("BUILD_TIME");

/// Server-wide conversion defaults, shared by every request.
pub struct AppState {
    pub placeholder: String,
    pub mistral_prefix: bool,
    pub cache_ttl: String,
}

#[derive(Parser)]
#[command(name = "prompt-converter")]
#[command(about = "Chat prompt normalization and provider conversion service")]
struct Args {
    /// Host to bind to
    #[arg(short = 'H', long, env = "PROMPT_CONVERTER_HOST")]
    host: Option<String>,

    /// Port to bind to
    #[arg(short, long, env = "PROMPT_CONVERTER_PORT")]
    port: Option<u16>,
}

fn cors_layer(mode: &CorsMode) -> CorsLayer {
    let cors_origins = mode.clone();
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(move |origin: &HeaderValue, _| {
            let Ok(origin_str) = origin.to_str() else {
                return false;
            };

            match &cors_origins {
                CorsMode::AllowAll => true,
                CorsMode::LocalhostOnly => {
                    let Ok(url) = url::Url::parse(origin_str) else {
                        return false;
                    };
                    matches!(
                        url.host_str(),
                        Some("localhost") | Some("127.0.0.1") | Some("[::1]")
                    )
                }
                CorsMode::AllowList(allowed) => allowed.iter().any(|a| a == origin_str),
            }
        }))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = Config::from_env();

    let host = args.host.unwrap_or(config.host);
    let port = args.port.unwrap_or(config.port);

    match &config.cors_mode {
        CorsMode::AllowAll => info!("CORS: Allowing all origins"),
        CorsMode::LocalhostOnly => info!("CORS: Localhost only"),
        CorsMode::AllowList(list) => info!("CORS: Allowing origins: {:?}", list),
    }
    info!(
        placeholder = %config.placeholder,
        mistral_prefix = config.mistral_prefix,
        cache_ttl = %config.cache_ttl,
        "Conversion defaults"
    );

    let cors = cors_layer(&config.cors_mode);
    let state = Arc::new(AppState {
        placeholder: config.placeholder,
        mistral_prefix: config.mistral_prefix,
        cache_ttl: config.cache_ttl,
    });

    let app = NormalizePath::trim_trailing_slash(routes::build_router(state).layer(cors));

    info!(
        "Starting prompt-converter v{}-{} (built {})",
        VERSION, GIT_HASH, BUILD_TIME
    );
    let listener = tokio::net::TcpListener::bind((host.as_str(), port)).await?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(
        listener,
        ServiceExt::<axum::extract::Request>::into_make_service(app),
    )
    .await
}
