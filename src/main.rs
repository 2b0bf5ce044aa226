use clap::Parser;
use dw_feature_api::config::ServiceConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dw_feature_api::init_tracing();

    let config = ServiceConfig::parse();
    dw_feature_api::run(config).await
}
