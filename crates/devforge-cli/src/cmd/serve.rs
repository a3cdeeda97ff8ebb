use devforge_core::config::Config;
use devforge_server::AppState;
use std::path::Path;

pub fn run(root: &Path, port: Option<u16>, open: bool) -> anyhow::Result<()> {
    let config = Config::load_or_default(root)?;
    let port = port.unwrap_or(config.server.port);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let state = AppState::from_config(root.to_path_buf(), config)?;
        tokio::select! {
            res = devforge_server::serve(state, port, open) => res,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutting down");
                Ok(())
            }
        }
    })
}
