use asciiarena::{Server, ServerArgs, ServerConfig};
use clap::Parser;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

fn main() {
    let args = ServerArgs::parse();

    let level = if args.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .init();

    let config = ServerConfig::from(args);
    tracing::info!(
        port = config.port,
        players = config.players,
        points = config.points,
        arena_size = config.arena_size,
        seed = config.seed.as_deref().unwrap_or("random"),
        frame_rate = config.frame_rate,
        "starting asciiarena server"
    );

    match Server::start(config) {
        Ok(server) => server.wait(),
        Err(e) => {
            tracing::error!(error = %e, "server failed to start");
            std::process::exit(1);
        }
    }
}
