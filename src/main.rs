mod command;
mod progress;
mod sink;
mod transport;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use command::{CommandDispatcher, DispatcherConfig, Operation};
use locklink_shared::interpret::DispatchOutcome;
use sink::{event_channel, pump_events, Severity, StatusSink};
use transport::HttpTransport;

use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "locklink", about = "Smart-lock command console")]
struct Cli {
    /// Target device MAC
    #[arg(long, default_value = "869701070802882")]
    mac: String,
    /// Cloud relay endpoint
    #[arg(long, default_value = "https://svr.yefiot.com/yefiot/v1/mqttpost/")]
    server: String,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Cmd {
    /// Unlock the door
    Unlock,
    /// Query the lock status
    Status,
    /// Test connectivity to the relay
    Test,
}

impl Cmd {
    fn operation(self) -> Operation {
        match self {
            Cmd::Unlock => Operation::Unlock,
            Cmd::Status => Operation::QueryStatus,
            Cmd::Test => Operation::TestConnection,
        }
    }
}

/// Console presentation layer: prints every sink event and remembers
/// whether the terminal outcome succeeded
#[derive(Debug, Default)]
struct ConsoleSink {
    failed: bool,
}

impl StatusSink for ConsoleSink {
    fn on_status(&mut self, text: &str, severity: Severity) {
        println!("[{}] {text}", severity_tag(severity));
    }

    fn on_log(&mut self, line: &str) {
        println!("      {line}");
    }

    fn on_progress(&mut self, percent: u8) {
        println!("      progress {percent:>3}%");
    }

    fn on_outcome(&mut self, outcome: &DispatchOutcome) {
        self.failed = !outcome.is_success();
        println!("=> {outcome}");
    }
}

fn severity_tag(severity: Severity) -> &'static str {
    match severity {
        Severity::Info => "info",
        Severity::Pending => "busy",
        Severity::Success => " ok ",
        Severity::Warning => "warn",
        Severity::Error => "fail",
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let cli = Cli::parse();
    info!("Locklink starting: server {}", cli.server);

    let config = DispatcherConfig {
        server_url: cli.server.clone(),
        ..Default::default()
    };
    let transport = Arc::new(HttpTransport::new(config.request_timeout)?);
    let (events, receiver) = event_channel();
    let dispatcher = CommandDispatcher::new(config, transport, events);

    let handle = dispatcher.dispatch(cli.cmd.operation(), &cli.mac)?;

    // Interactive context: a single task drains sink events; background
    // tasks only ever post messages into the channel
    let pump = tokio::spawn(async move {
        let mut console = ConsoleSink::default();
        pump_events(receiver, &mut console).await;
        console
    });

    handle.finished().await;
    drop(dispatcher);
    let console = pump.await?;

    if console.failed {
        std::process::exit(1);
    }
    Ok(())
}
