use clap::Parser;
use log::{error, info, warn};
use radar_turret::app::{Intent, Turret, read_intents};
use radar_turret::config::{CONFIG_FILE, TurretConfig};
use radar_turret::error::Result;
use radar_turret::serial::port::{self, PortTasks, SerialPortType};
use radar_turret::serial::{DetachedLink, Transport};
use radar_turret::view::{LogView, TurretView};
use std::path::PathBuf;
use std::time::Duration;
use tokio::runtime::Builder as TokioBuilder;
use tokio::sync::mpsc;

/// operator intents queued for the event loop
const INTENT_QUEUE_DEPTH: usize = 16;
/// how long the writer gets to flush the final commands
const DRAIN_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Parser)]
#[command(author, version, about = "Radar / laser turret serial controller")]
struct Args {
    /// RON configuration file, created with defaults when missing
    #[arg(long, short)]
    config: Option<PathBuf>,
    /// Serial port name, skips USB discovery
    #[arg(long, short)]
    port: Option<String>,
    #[arg(long, short)]
    baud: Option<u32>,
    /// Print the attached serial ports and exit
    #[arg(long, default_value_t = false)]
    list_ports: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if args.list_ports {
        print_ports();
        return Ok(());
    }

    let mut config = match &args.config {
        Some(path) => TurretConfig::load(path)?,
        None => TurretConfig::load_or_default(CONFIG_FILE),
    };
    if let Some(port_name) = args.port {
        config.port.port_name = Some(port_name);
    }
    if let Some(baud) = args.baud {
        config.port.baud_rate = baud;
    }
    config.validate()?;

    let runtime = TokioBuilder::new_current_thread().enable_all().build()?;
    runtime.block_on(run(config));
    // stdin is read on a blocking thread that never returns on its own
    runtime.shutdown_timeout(Duration::from_millis(100));
    Ok(())
}

async fn run(config: TurretConfig) {
    let (intent_tx, intent_rx) = mpsc::channel(INTENT_QUEUE_DEPTH);

    let stdin_tx = intent_tx.clone();
    tokio::spawn(async move {
        read_intents(tokio::io::BufReader::new(tokio::io::stdin()), stdin_tx).await;
    });
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received shutdown signal");
                let _ = intent_tx.send(Intent::Quit).await;
            }
            Err(e) => warn!("Failed to listen for Ctrl-C: {}", e),
        }
    });

    let mut view = LogView;
    let opened = port::resolve_port_name(&config.port)
        .and_then(|name| port::open_port(&name, &config.port));
    match opened {
        Ok(stream) => {
            let (link, inbound, tasks) = port::spawn_port_io(stream);
            serve(&config, link, view, inbound, intent_rx).await;
            drain(tasks).await;
        }
        Err(e) => {
            view.device_missing(&e.to_string());
            // never fed, keeps the inbound branch idle instead of closed
            let (_idle_tx, inbound) = mpsc::channel(1);
            serve(&config, DetachedLink, view, inbound, intent_rx).await;
        }
    }
}

async fn serve<T, V>(
    config: &TurretConfig,
    link: T,
    view: V,
    inbound: mpsc::Receiver<Vec<u8>>,
    intents: mpsc::Receiver<Intent>,
) where
    T: Transport,
    V: TurretView,
{
    let mut turret = Turret::new(config, link, view);
    info!("turret ready (auto, <angle>, angle <n>, status, quit)");
    turret.run(inbound, intents).await;
    let dropped = turret.controller().dropped_commands();
    if dropped > 0 {
        warn!("{} commands were dropped", dropped);
    }
}

/// Lets the writer flush the shutdown commands, then stops the reader.
async fn drain(tasks: PortTasks) {
    let PortTasks { reader, writer } = tasks;
    reader.abort();
    // the link went away with the turret, so the writer ends once empty
    match tokio::time::timeout(DRAIN_TIMEOUT, writer).await {
        Ok(Ok(())) => info!("serial port closed"),
        Ok(Err(e)) => error!("serial writer failed: {}", e),
        Err(_) => warn!("serial writer did not drain in time"),
    }
}

fn print_ports() {
    let ports = port::list_ports();
    if ports.is_empty() {
        println!("No serial ports found");
    }
    for info in ports {
        match info.port_type {
            SerialPortType::UsbPort(usb) => println!(
                "{}  usb {:04x}:{:04x} {}",
                info.port_name,
                usb.vid,
                usb.pid,
                usb.product.unwrap_or_default()
            ),
            _ => println!("{}", info.port_name),
        }
    }
}
