mod cli;

use anyhow::Context;
use clap::Parser;
use pinlink_device::PinDevice;
use pinlink_network::{TcpTransport, Transport};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = cli.device_config()?;
    let transport = TcpTransport::new(config.transport_config());
    let mut device = PinDevice::new(config, transport)
        .await
        .context("creating device")?;

    let outcome = run(&mut device, &cli.command).await;
    device.shutdown().await;
    outcome
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

async fn run<T: Transport>(device: &mut PinDevice<T>, command: &Command) -> anyhow::Result<()> {
    match command {
        Command::Status => {
            println!("state:  {}", device.state());
            println!("status: {}", device.status());
            println!("pins:   {}", device.pins());
        }
        Command::Attributes => {
            for name in device.attribute_names() {
                println!("{name}");
            }
        }
        Command::Read { attribute } => {
            let value = device
                .read_attribute(attribute)
                .await
                .with_context(|| format!("reading {attribute}"))?;
            println!("{attribute} = {value}");
        }
        Command::Write { attribute, value } => {
            device
                .write_attribute(attribute, *value)
                .await
                .with_context(|| format!("writing {attribute}"))?;
            println!("{attribute} = {value}");
        }
        Command::TurnOff => {
            device.turn_off().await.context("turning the device off")?;
            println!("state: {}", device.state());
        }
        Command::ResetAll => {
            device.reset_all().await.context("resetting all pins")?;
            println!("state: {}", device.state());
        }
    }
    Ok(())
}
