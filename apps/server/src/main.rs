use anyhow::Context;
use masonry::domain::config::AppConfig;
use masonry::domain::constants::CONFIG_FILE;
use masonry::kernel::config::load_config;
use masonry_server::{Server, init_logger};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg: AppConfig =
        load_config(Some(CONFIG_FILE)).context("Critical: Configuration is malformed")?;

    let _log = init_logger(&cfg.logging)?;

    Server::builder().config(cfg).build()?.run().await
}
