use forkhttp::config::Config;
use forkhttp::server::{Server, Shutdown};

fn main() -> anyhow::Result<()> {
    let cfg = Config::load()?;
    forkhttp::logging::init(&cfg.log_sink, &cfg.log_level)?;

    let server = Server::new(cfg)?;
    let listener = server.bind()?;

    // Forked workers get a copy of the signal runtime without its thread.
    // They must not use it or take any lock it may hold.
    let shutdown = Shutdown::new();
    watch_ctrl_c(shutdown.clone())?;

    server.serve(&listener, &shutdown);

    Ok(())
}

/// Triggers `shutdown` on Ctrl-C from a small dedicated runtime.
fn watch_ctrl_c(shutdown: Shutdown) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    std::thread::Builder::new()
        .name("signal".to_string())
        .spawn(move || {
            runtime.block_on(async {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("Shutdown signal received");
                    shutdown.trigger();
                }
            })
        })?;

    Ok(())
}
