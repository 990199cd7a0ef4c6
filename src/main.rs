use anyhow::Context;
use deepest::{
    api::routes::create_router,
    cli::{output::Output, Cli, Commands},
    types::Message,
    AppState, ResearchConfig, ResearchPorts,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse_args();
    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    let config = match ResearchConfig::load(Some(cli.config.as_path())) {
        Ok(config) => config,
        Err(e) => {
            output.error(&e.to_string());
            std::process::exit(1);
        }
    };
    init_tracing(&config.server.log_level, cli.verbose, cli.log_json);

    let overrides = cli.command.overrides();
    match cli.command {
        Commands::Ask { topic, .. } => {
            let state = AppState::new(Arc::new(config), ResearchPorts::http());
            output.banner();
            output.info(&format!("Researching: {}", topic));

            let start = Instant::now();
            let outcome = match state
                .coordinator
                .run(vec![Message::user(topic)], overrides)
                .await
            {
                Ok(outcome) => outcome,
                Err(e) => {
                    output.error(&e.to_string());
                    std::process::exit(1);
                }
            };

            output.header("Answer");
            output.answer(&outcome.answer);
            output.header("Sources");
            output.sources(&outcome.sources);
            output.header("Run");
            output.kv("research loops", &outcome.research_loops.to_string());
            output.kv("queries run", &outcome.queries_run.len().to_string());
            output.kv("duration", &format!("{:.1}s", start.elapsed().as_secs_f64()));
            output.success("Research complete");
        }
        Commands::Serve { host, port } => {
            let mut config = config;
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            let addr = format!("{}:{}", config.server.host, config.server.port);

            let state = AppState::new(Arc::new(config), ResearchPorts::http());
            let app = create_router(state);

            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .with_context(|| format!("failed to bind {}", addr))?;
            info!("Listening on http://{}", addr);
            output.success(&format!("Serving research API on http://{}", addr));
            output.hint("POST /api/research with {\"topic\": \"...\"}");

            axum::serve(listener, app).await?;
        }
    }

    Ok(())
}

/// Install the global subscriber; `RUST_LOG` wins over the configured level
fn init_tracing(log_level: &str, verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { log_level };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let layer = if json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .init();
}
