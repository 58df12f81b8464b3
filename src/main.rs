use std::sync::Arc;
use tokio::sync::Notify;

use static_file_middleware::config::{AppState, Config};
use static_file_middleware::{logger, server};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = load_config()?;
    logger::init(&cfg)?;

    // Worker thread count comes from config, CPU cores otherwise
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    let runtime = runtime_builder.build()?;

    runtime.block_on(async_main(cfg))
}

/// `--config <path>` selects the config file, `config.toml` otherwise
fn load_config() -> Result<Config, Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let mut path = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-c" | "--config" => {
                path = Some(args.next().ok_or("--config requires a path")?);
            }
            other => return Err(format!("Unknown argument: {other}").into()),
        }
    }

    let cfg = match path {
        Some(path) => Config::load_from(&path)?,
        None => Config::load()?,
    };
    Ok(cfg)
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let state = Arc::new(AppState::new(&cfg)?);
    if state.router.is_empty() {
        logger::log_warning("No mounts configured, every request will get 404");
    }

    let listener = server::create_reusable_listener(addr)?;
    logger::log_server_start(&addr, &cfg);

    let shutdown = Arc::new(Notify::new());
    server::start_signal_handler(Arc::clone(&shutdown));

    // Connections are spawned with spawn_local
    let local = tokio::task::LocalSet::new();
    local
        .run_until(server::start_server_loop(listener, state, shutdown))
        .await?;
    Ok(())
}
