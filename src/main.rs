use askpdf::cli::{Cli, Commands, ConfigAction};
use askpdf::config::{validate_config, Config};
use askpdf::logging;
use askpdf::server;
use clap::Parser;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(opts) => {
            let config = Config::load(opts.config.as_deref())?;
            logging::init(config.logging.level.as_deref());
            info!("Starting askpdf server");
            let errors = validate_config(&config);
            if !errors.is_empty() {
                for e in &errors {
                    error!("config error: {e}");
                }
                anyhow::bail!("invalid configuration ({} errors)", errors.len());
            }
            server::serve(config, opts).await?;
        }
        Commands::Config(opts) => {
            logging::init(None);
            match opts.action {
                ConfigAction::Show => {
                    let config = Config::load(opts.config.as_deref())?;
                    println!("{}", serde_json::to_string_pretty(&config)?);
                }
                ConfigAction::Validate => {
                    let config = Config::load(opts.config.as_deref())?;
                    let errors = validate_config(&config);
                    if errors.is_empty() {
                        info!("Configuration is valid");
                    } else {
                        for e in &errors {
                            error!("config error: {e}");
                        }
                        anyhow::bail!("invalid configuration ({} errors)", errors.len());
                    }
                }
                ConfigAction::Init => {
                    Config::write_default(opts.config.as_deref().unwrap_or("askpdf.json"))?;
                    info!("Configuration file created");
                }
            }
        }
        Commands::Version => {
            println!("askpdf {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
