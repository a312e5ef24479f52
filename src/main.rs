//! Key fob gateway binary.
//!
//! # Usage
//!
//! ```bash
//! # Print a starter configuration
//! keyfob-gateway example-config > gateway.toml
//!
//! # Provision a new fob secret
//! keyfob-gateway generate-secret
//!
//! # Run the gateway
//! keyfob-gateway serve --config gateway.toml
//!
//! # Act as a fob (testing)
//! keyfob-gateway send --address 127.0.0.1:10001 --secret <hex> --sequence 41 --action open
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use keyfob_gateway::auth::freshness::DEFAULT_PERIOD;
use keyfob_gateway::auth::DeviceSecret;
use keyfob_gateway::config::GatewayConfig;
use keyfob_gateway::core::package::Action;
use keyfob_gateway::protocol::dispatcher::Dispatcher;
use keyfob_gateway::transport::{GatewayServer, Transmitter};
use keyfob_gateway::utils::logging::init_logging;
use std::path::PathBuf;

/// Rolling-code key fob gateway
#[derive(Parser, Debug)]
#[command(name = "keyfob-gateway")]
#[command(about = "Authenticates key fob command frames")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the gateway listener
    Serve {
        /// Path to TOML configuration; environment overrides still apply
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Send one command frame, as a fob would
    Send {
        /// Gateway address
        #[arg(short, long, default_value = "127.0.0.1:10001")]
        address: String,

        /// Device secret (64 hex characters)
        #[arg(short, long)]
        secret: String,

        /// Last sequence this fob sent; the frame uses the next one
        #[arg(long, default_value_t = 0)]
        sequence: u16,

        /// Command to send
        #[arg(long, value_enum, default_value_t = CliAction::Open)]
        action: CliAction,

        /// Freshness period the gateway is configured with
        #[arg(long, default_value_t = DEFAULT_PERIOD)]
        period: u16,
    },
    /// Print a fresh random device secret
    GenerateSecret,
    /// Print an example configuration file
    ExampleConfig,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum CliAction {
    Open,
    Close,
}

impl From<CliAction> for Action {
    fn from(action: CliAction) -> Self {
        match action {
            CliAction::Open => Action::Open,
            CliAction::Close => Action::Close,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    match args.command {
        Command::Serve { config } => serve(config).await?,
        Command::Send {
            address,
            secret,
            sequence,
            action,
            period,
        } => {
            let logging = GatewayConfig::from_env()?.logging;
            init_logging(&logging)?;

            let mut fob =
                Transmitter::new(DeviceSecret::from_hex(&secret)?, sequence).with_period(period);
            let package = fob.send(&address, action.into()).await?;
            tracing::info!(
                sequence = package.sequence,
                time = package.time,
                action = %package.action,
                "Command sent"
            );
        }
        Command::GenerateSecret => {
            let secret = DeviceSecret::generate()?;
            #[allow(clippy::print_stdout)]
            {
                println!("{}", secret.to_hex());
            }
        }
        Command::ExampleConfig => {
            #[allow(clippy::print_stdout)]
            {
                println!("{}", GatewayConfig::example_config());
            }
        }
    }

    Ok(())
}

async fn serve(path: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match path {
        Some(path) => GatewayConfig::from_file(path)?,
        None => GatewayConfig::default(),
    };
    config.apply_env_overrides();

    init_logging(&config.logging)?;
    tracing::info!(devices = config.devices.len(), "Gateway starting");

    let dispatcher = Dispatcher::new();
    for action in [Action::Open, Action::Close] {
        dispatcher.register(action, move |command| {
            tracing::info!(device = %command.device, %action, "Actuating");
            Ok(())
        })?;
    }

    let server = GatewayServer::from_config(&config, dispatcher)?;
    server.run().await?;

    Ok(())
}
