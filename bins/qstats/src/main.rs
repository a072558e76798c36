//! qstats - show queueing discipline statistics.
//!
//! Dumps every qdisc on the host (or on one device) over rtnetlink and
//! prints its kind, handle, parent and counters.

use std::time::Duration;

use clap::Parser;
use qstats::netlink::dump::DEFAULT_BUFFER_FLOOR;
use qstats::netlink::{DumpOptions, RecordPolicy};
use qstats::output::{OutputFormat, OutputOptions, print_all};
use qstats::util::ifname;
use qstats::{Connection, Result};

#[derive(Parser)]
#[command(name = "qstats", version, about = "Queueing discipline statistics")]
struct Cli {
    /// Only show qdiscs of this device (name or index).
    #[arg(value_name = "DEV")]
    dev: Option<String>,

    /// Output JSON.
    #[arg(short = 'j', long)]
    json: bool,

    /// Pretty print JSON.
    #[arg(short = 'p', long)]
    pretty: bool,

    /// Show statistics.
    #[arg(short = 's', long)]
    stats: bool,

    /// Show details.
    #[arg(short = 'd', long)]
    details: bool,

    /// Don't resolve interface names.
    #[arg(short = 'n', long)]
    numeric: bool,

    /// Give up after waiting this long for the kernel, in milliseconds.
    #[arg(long, value_name = "MS")]
    timeout: Option<u64>,

    /// Fail on the first qdisc record that cannot be decoded.
    #[arg(long)]
    strict: bool,

    /// Minimum receive buffer size.
    #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_BUFFER_FLOOR)]
    buffer_floor: usize,
}

impl Cli {
    fn dump_options(&self, ifindex: Option<u32>) -> DumpOptions {
        let mut options = DumpOptions::new()
            .buffer_floor(self.buffer_floor)
            .resolve_names(!self.numeric);
        if let Some(ifindex) = ifindex {
            options = options.ifindex(ifindex);
        }
        if let Some(ms) = self.timeout {
            options = options.timeout(Duration::from_millis(ms));
        }
        if self.strict {
            options = options.record_policy(RecordPolicy::Abort);
        }
        options
    }
}

async fn run(cli: Cli) -> Result<()> {
    let ifindex = match cli.dev.as_deref() {
        Some(dev) => Some(ifname::resolve(dev)?.index),
        None => None,
    };
    let options = cli.dump_options(ifindex);

    let mut conn = Connection::new()?;
    let records = conn.dump_qdiscs(&options).await?.into_result()?;

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };
    let opts = OutputOptions {
        stats: cli.stats,
        details: cli.details,
        pretty: cli.pretty,
    };
    print_all(&records, format, &opts)?;

    Ok(())
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}: {}", e.kind(), e);
        std::process::exit(1);
    }
}
