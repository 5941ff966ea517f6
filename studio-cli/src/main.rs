use studio::{
    config::AppConfig,
    telemetry::{get_subscriber, init_subscriber},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let subscriber = get_subscriber("studio", &config.log.level, std::io::stderr);
    init_subscriber(subscriber)?;

    studio_cli::run(config).await
}
