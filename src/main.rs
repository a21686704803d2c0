use rewards_server::{Config, Server, ServerState, init_logger_with_file};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let config = Config::from_env();

    let log_dir = config.log_dir();
    let _ = std::fs::create_dir_all(&log_dir);
    init_logger_with_file(None, log_dir.to_str());

    tracing::info!(
        environment = %config.environment,
        port = config.http_port,
        "Rewards server starting"
    );

    let state = ServerState::initialize(&config).await?;
    let server = Server::with_state(config, state);

    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}
