use anyhow::{anyhow, Result};
use dirmock::{Config, DirectoryMock};
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_init();

    let mut first_args = std::env::args().take(2);
    let (program_name, config_file) = (
        first_args.next().unwrap_or("dirmock".to_string()),
        first_args.next(),
    );

    let config = config_init(&program_name, config_file)?;
    let (api_addr, dns_addr) = (config.api_bind_addr, config.dns_udp_bind_addr);
    let mock = DirectoryMock::new(config)?;

    mock.start_dns(dns_addr).await?;
    if let Err(err) = mock.start_http(api_addr).await {
        mock.stop_dns().await.ok();
        return Err(err.into());
    }

    signal::ctrl_c().await?;
    tracing::info!("quitting from signal");

    let http_res = mock.stop_http().await;
    let dns_res = mock.stop_dns().await;
    http_res?;
    dns_res?;
    tracing::info!("goodbye");
    Ok(())
}

fn tracing_init() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dirmock=info,tower_http=info".into()),
        )
        .init();
}

fn config_init(program_name: &str, config_file: Option<String>) -> Result<Config> {
    match config_file {
        None => Err(anyhow!("usage: {program_name} /path/to/config.json")),
        Some(config_file) => {
            let config = Config::try_from_file(&config_file)?;
            tracing::debug!("loaded config from {config_file}");
            Ok(config)
        }
    }
}
