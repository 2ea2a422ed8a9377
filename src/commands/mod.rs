pub mod flow;
pub mod tokens;

use anyhow::Result;
use std::path::PathBuf;

use crate::config::ConfigSource;
use crate::store::Store;

/// Resolved locations shared by every subcommand.
#[derive(Debug, Clone)]
pub struct Context {
    pub state_dir: PathBuf,
    pub config_source: ConfigSource,
}

impl Context {
    pub fn open_store(&self) -> Result<Store> {
        Store::open(&self.state_dir)
    }
}

/// Run a future on a fresh runtime, for the synchronous CLI entry points.
pub(crate) fn block_on<F: std::future::Future>(future: F) -> Result<F::Output> {
    let rt = tokio::runtime::Runtime::new()?;
    Ok(rt.block_on(future))
}
