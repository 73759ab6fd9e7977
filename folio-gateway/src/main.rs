use anyhow::Result;
use folio_gateway::GatewaySettings;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = GatewaySettings::from_env()?;
    let addr = settings.addr();

    folio_gateway::build(settings).listen(addr).await
}
