//! Strata demo server.
//!
//! Serves a handful of handlers, either from the `[[routes]]` of a config
//! file (resolved by name through a registry) or from a built-in table.
//!
//! ```text
//! strata --config strata.toml
//! strata -H 127.0.0.1:3000 -d
//! ```

use std::path::PathBuf;

use clap::Parser;
use serde_json::json;

use strata::config::{load_config, ServerConfig};
use strata::context::Link;
use strata::http::middleware::{logger, request_id};
use strata::observability::{logging, metrics};
use strata::{handler, HandlerRegistry, HttpError, Server};

#[derive(Parser)]
#[command(name = "strata")]
#[command(about = "Composable HTTP request pipeline server", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to listen on (overrides the configuration)
    #[arg(short = 'H', long)]
    address: Option<String>,

    /// Log at debug level
    #[arg(short, long)]
    debug: bool,
}

const ITEM_COUNT: u64 = 95;
const PAGE_SIZE: u64 = 10;

fn registry() -> HandlerRegistry {
    let mut registry = HandlerRegistry::new();
    registry
        .register("logger", logger("access"))
        .register("request_id", request_id())
        .register("hello", handler(|ctx| ctx.text("Hello, World!")))
        .register(
            "user",
            handler(|ctx| {
                let id = ctx
                    .param("id")
                    .ok_or_else(|| HttpError::with_status(axum::http::StatusCode::BAD_REQUEST))?
                    .to_string();
                ctx.json(&json!({ "id": id }))
            }),
        )
        .register(
            "items",
            handler(|ctx| {
                let last = ITEM_COUNT.div_ceil(PAGE_SIZE);
                let page = ctx
                    .query("page")
                    .and_then(|p| p.parse::<u64>().ok())
                    .unwrap_or(1)
                    .clamp(1, last);
                let start = (page - 1) * PAGE_SIZE;
                let items: Vec<u64> = (start..(start + PAGE_SIZE).min(ITEM_COUNT)).collect();

                ctx.set_link_header(&Link::new(1, page, last))?;
                ctx.json(&json!({ "page": page, "items": items }))
            }),
        );
    registry
}

fn default_routes(server: &mut Server, registry: &HandlerRegistry) -> Result<(), strata::PipelineError> {
    server.use_middleware(registry.resolve(&["request_id", "logger"])?)?;
    server.get("/", registry.resolve(&["hello"])?)?;
    server.get("/users/{id}", registry.resolve(&["user"])?)?;
    server.get("/items", registry.resolve(&["items"])?)?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ServerConfig::default(),
    };

    logging::init_logging(&config.observability, cli.debug)?;
    tracing::info!("strata v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let address = cli
        .address
        .clone()
        .unwrap_or_else(|| config.listener.bind_address.clone());
    let from_file = !config.routes.is_empty();

    let registry = registry();
    let mut server = Server::new(config);
    if from_file {
        server.load_routes(&registry)?;
    } else {
        default_routes(&mut server, &registry)?;
    }

    tracing::info!(
        address = %address,
        routes = server.routes().len(),
        "Configuration loaded"
    );

    server.listen(&address).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
