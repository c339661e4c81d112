//! oraload - Oracle active-session load monitor.
//!
//! Connects to an Oracle instance, polls its active sessions on an interval
//! and prints a ranked table (or one JSON snapshot per line).

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::io::BufRead;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use clap::Parser;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use oraload::collector::OracleExecutor;
use oraload::config::{ConnectionDetails, SamplerConfig};
use oraload::models::{ImpactTier, Operation, Snapshot};
use oraload::sampler::{ConnectionId, SampleError, Sampler, SessionRegistry};
use oraload::view::{SessionFilter, SortKey, SortOrder, build_sessions_view};

/// Oracle active-session load monitor.
#[derive(Parser)]
#[command(name = "oraload", about = "Oracle active-session load monitor", version)]
struct Args {
    /// Database user.
    #[arg(short, long, env = "ORACLE_USER")]
    user: Option<String>,

    /// Database password.
    #[arg(long, env = "ORACLE_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Listener host.
    #[arg(long, env = "ORACLE_HOST")]
    host: Option<String>,

    /// Listener port (default 1521 when --host is given).
    #[arg(long, env = "ORACLE_PORT")]
    port: Option<u16>,

    /// Service name.
    #[arg(long, env = "ORACLE_SERVICE")]
    service: Option<String>,

    /// EZConnect string or TNS alias, used when host/port/service is incomplete.
    #[arg(short = 'c', long, env = "ORACLE_CONNECT_STRING")]
    connect_string: Option<String>,

    /// Polling interval in seconds.
    #[arg(short, long, default_value = "5")]
    interval: u64,

    /// Stop after this many successful polls.
    #[arg(short = 'n', long)]
    count: Option<u64>,

    /// Print each snapshot as a JSON line instead of a table.
    #[arg(long)]
    json: bool,

    /// Number of top offenders per snapshot.
    #[arg(long, default_value_t = SamplerConfig::default().top_offenders)]
    top: usize,

    /// Show only sessions whose owner contains this text.
    #[arg(long)]
    owner: Option<String>,

    /// Show only this operation (SELECT, INSERT, UPDATE, DELETE, MERGE).
    #[arg(long, value_parser = parse_operation)]
    operation: Option<Operation>,

    /// Show only sessions running at least this many seconds.
    #[arg(long)]
    min_duration: Option<f64>,

    /// Show only this impact level (low/medium/high or Baixo/Médio/Alto).
    #[arg(long, value_parser = parse_impact)]
    impact: Option<ImpactTier>,

    /// Show only sessions whose main table contains this text.
    #[arg(long)]
    table: Option<String>,

    /// Sort column: sid, user, owner, op, table, duration, mb, impact, cpu, locks.
    #[arg(long, default_value = "duration")]
    sort: SortKey,

    /// Sort direction: asc or desc.
    #[arg(long, default_value = "desc")]
    order: SortOrder,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

impl Args {
    fn connection_details(&self) -> ConnectionDetails {
        let env = ConnectionDetails::from_env();
        let host = self.host.clone().or(env.host);
        let port = self
            .port
            .or(env.port)
            .or(host.as_ref().map(|_| oraload::config::DEFAULT_PORT));
        ConnectionDetails {
            user: self.user.clone().unwrap_or(env.user),
            password: self.password.clone().unwrap_or(env.password),
            host,
            port,
            service_name: self.service.clone().or(env.service_name),
            connect_string: self.connect_string.clone().or(env.connect_string),
        }
    }

    fn filter(&self) -> SessionFilter {
        SessionFilter {
            owner: self.owner.clone(),
            operation: self.operation,
            min_duration_sec: self.min_duration,
            impact: self.impact,
            table: self.table.clone(),
        }
    }
}

fn parse_operation(s: &str) -> Result<Operation, String> {
    match Operation::from_keyword(&s.trim().to_uppercase()) {
        Operation::Unknown => Err(format!("unknown operation '{}'", s)),
        op => Ok(op),
    }
}

fn parse_impact(s: &str) -> Result<ImpactTier, String> {
    ImpactTier::parse(s).ok_or_else(|| format!("unknown impact level '{}'", s))
}

/// Initializes the tracing subscriber with the appropriate log level.
/// Default level is INFO. Use -q for quiet mode (errors only).
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn render(snapshot: &Snapshot, args: &Args, filter: &SessionFilter) {
    if args.json {
        match serde_json::to_string(snapshot) {
            Ok(line) => println!("{}", line),
            Err(e) => error!("Failed to serialize snapshot: {}", e),
        }
        return;
    }
    let view = build_sessions_view(snapshot, filter, args.sort, args.order);
    println!(
        "{}",
        snapshot.timestamp.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S")
    );
    print!("{}", view.render_text());
    println!();
}

/// Blocks until the operator presses Enter. Returns false on EOF.
fn wait_for_enter() -> bool {
    eprintln!("Polling paused. Press Enter to resume, Ctrl-C to quit.");
    let mut line = String::new();
    matches!(std::io::stdin().lock().read_line(&mut line), Ok(n) if n > 0)
}

/// Sleeps for `total`, waking every 100ms to check the shutdown flag.
fn sleep_while_running(total: Duration, running: &AtomicBool) {
    let sleep_interval = Duration::from_millis(100);
    let mut remaining = total;
    while remaining > Duration::ZERO && running.load(Ordering::SeqCst) {
        let sleep_time = remaining.min(sleep_interval);
        std::thread::sleep(sleep_time);
        remaining = remaining.saturating_sub(sleep_time);
    }
}

fn connect(
    sampler: &mut Sampler<OracleExecutor>,
    details: &ConnectionDetails,
) -> Option<ConnectionId> {
    match sampler.connect(details) {
        Ok(id) => {
            info!("Connected as {} ({})", details.user, id);
            Some(id)
        }
        Err(e) => {
            error!("Failed to connect: {}", e);
            None
        }
    }
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    let details = args.connection_details();
    if let Err(e) = details.resolve_connect_string() {
        error!("{}", e);
        std::process::exit(2);
    }
    debug!("Connection settings: {:?}", details);

    let filter = args.filter();
    let config = SamplerConfig::default().with_top_offenders(args.top);
    let mut sampler = Sampler::with_config(SessionRegistry::new(), config);

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    }) {
        warn!("Failed to set Ctrl-C handler: {}", e);
    }

    let Some(mut conn) = connect(&mut sampler, &details) else {
        std::process::exit(1);
    };

    let interval = Duration::from_secs(args.interval.max(1));
    let mut polls: u64 = 0;

    while running.load(Ordering::SeqCst) {
        match sampler.poll(&conn) {
            Ok(snapshot) => {
                polls += 1;
                render(&snapshot, &args, &filter);
                if args.count.is_some_and(|n| polls >= n) {
                    break;
                }
            }
            Err(e) => {
                error!("Poll failed: {}", e);
                if !wait_for_enter() || !running.load(Ordering::SeqCst) {
                    break;
                }
                if matches!(e, SampleError::ConnectionLost(_) | SampleError::ConnectionNotFound(_)) {
                    match connect(&mut sampler, &details) {
                        Some(id) => conn = id,
                        None => continue,
                    }
                }
                continue;
            }
        }
        sleep_while_running(interval, &running);
    }

    info!("Shutting down...");
    sampler.registry_mut().disconnect(&conn);
}
