use clap::Parser;
use cli::Cli;
use mobility_coach_lib::config::AppConfig;

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  // Load environment variables from .env file
  dotenvy::dotenv().ok();
  mobility_coach_lib::init_tracing();

  let cli = Cli::parse();
  let config = AppConfig::from_env()?;
  let state = mobility_coach_lib::bootstrap(config).await?;

  cli::run(cli, &state).await
}
