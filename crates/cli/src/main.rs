use anyhow::Context;
use clap::Parser;
use ferrous_stub_domain::{CliOverrides, TransportProtocol};
use ferrous_stub_infrastructure::dns::{create_client, MessageBuilder};
use hickory_proto::op::Message;
use hickory_proto::rr::RecordType;
use std::net::IpAddr;
use std::str::FromStr;
use tracing::{info, warn};

mod bootstrap;

#[derive(Parser)]
#[command(name = "ferrous-stub")]
#[command(version)]
#[command(about = "Ferrous Stub - send DNS queries over UDP or TCP and match the responses")]
struct Cli {
    /// Domain names to query; all are sent over one connection
    #[arg(required = true)]
    names: Vec<String>,

    /// Record type (A, AAAA, MX, TXT, ...)
    #[arg(short = 't', long = "type", default_value = "A")]
    record_type: String,

    /// Upstream server address
    #[arg(short = 's', long)]
    server: Option<IpAddr>,

    /// Upstream server port
    #[arg(short = 'p', long)]
    port: Option<u16>,

    /// Use TCP instead of UDP
    #[arg(long)]
    tcp: bool,

    /// Seconds to wait for each response; zero or less fails immediately
    #[arg(long, allow_hyphen_values = true)]
    timeout: Option<f64>,

    /// Local address to send from
    #[arg(long)]
    source: Option<IpAddr>,

    /// Local port to send from
    #[arg(long)]
    source_port: Option<u16>,

    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let record_type = RecordType::from_str(&cli.record_type.to_ascii_uppercase())
        .with_context(|| format!("Unknown record type '{}'", cli.record_type))?;

    let cli_overrides = CliOverrides {
        server: cli.server,
        port: cli.port,
        protocol: cli.tcp.then_some(TransportProtocol::Tcp),
        source_address: cli.source,
        source_port: cli.source_port,
        timeout_secs: cli.timeout,
        log_level: cli.log_level.clone(),
    };

    let config = bootstrap::load_config(cli.config.as_deref(), cli_overrides)?;
    bootstrap::init_logging(&config);
    bootstrap::log_config(&config);

    let endpoint = config.upstream.endpoint();
    let timeout = config.query.timeout();
    info!(upstream = %endpoint, queries = cli.names.len(), ?timeout, "Sending queries");

    let client = create_client(&endpoint, &config.query).await?;

    let queries = MessageBuilder::build_batch(cli.names.as_slice(), record_type)?;

    let handles: Vec<_> = queries
        .into_iter()
        .map(|query| client.query(query, timeout))
        .collect();
    let results = futures::future::join_all(handles).await;
    client.close();

    let mut failures = 0usize;
    for (name, result) in cli.names.iter().zip(results) {
        match result {
            Ok(response) => print_response(name, record_type, &response),
            Err(e) => {
                failures += 1;
                warn!(name = %name, error = %e, "Query failed");
                println!(";; {} {}: {}", name, record_type, e);
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} queries failed", failures, cli.names.len());
    }
    Ok(())
}

fn print_response(name: &str, record_type: RecordType, response: &Message) {
    println!(
        ";; {} {}: {} ({} answers)",
        name,
        record_type,
        response.response_code(),
        response.answers().len()
    );
    for record in response.answers() {
        println!("{}", record);
    }
}
