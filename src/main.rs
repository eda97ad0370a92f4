extern crate clap;

use clap::Parser;
use clap_verbosity_flag::Verbosity;
use cloud_speedtest::cloudflare::client::BASE_URL;
use cloud_speedtest::cloudflare::tests::adaptive::MIB;
use cloud_speedtest::cloudflare::tests::engine::{timeout_from_secs, DEFAULT_ATTEMPTS, DEFAULT_SIZE_MB};
use cloud_speedtest::errors::format_error_for_display;
use cloud_speedtest::{
    AdaptiveSizing, ErrorKind, Report, ServerMetadata, SessionConfig, SpeedResult,
    SpeedTestError, SpeedTestSession,
};
use colored::Colorize;
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use std::process;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Run the download test (default: both)
    #[arg(short, long)]
    download: bool,

    /// Run the upload test (default: both)
    #[arg(short, long)]
    upload: bool,

    /// Download size in MB; disables adaptive sizing for downloads
    #[arg(long, value_name = "MB")]
    download_size: Option<u64>,

    /// Upload size in MB; disables adaptive sizing for uploads
    #[arg(long, value_name = "MB")]
    upload_size: Option<u64>,

    /// Timed attempts per test
    #[arg(short, long, default_value_t = DEFAULT_ATTEMPTS)]
    attempts: usize,

    /// Time budget for each test's attempts
    #[arg(short, long, value_name = "SECONDS", default_value_t = 10.0)]
    timeout: f64,

    /// Speed test server
    #[arg(long, default_value = BASE_URL)]
    url: String,

    /// Size transfers from a short bandwidth probe (default)
    #[arg(long, overrides_with = "no_adaptive")]
    adaptive: bool,

    /// Use fixed transfer sizes
    #[arg(long, overrides_with = "adaptive")]
    no_adaptive: bool,

    /// Print the report as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Also write the JSON report to a file
    #[arg(long, value_name = "PATH")]
    json_output: Option<PathBuf>,

    #[command(flatten)]
    verbose: Verbosity,
}

impl Cli {
    /// Which tests to run; neither flag means both.
    fn selected_tests(&self) -> (bool, bool) {
        if !self.download && !self.upload {
            (true, true)
        } else {
            (self.download, self.upload)
        }
    }

    /// Adaptive sizing for a test, unless disabled or a size was given.
    fn sizing(&self, explicit_size: Option<u64>) -> Option<AdaptiveSizing> {
        let enabled = self.adaptive || !self.no_adaptive;

        (enabled && explicit_size.is_none())
            .then(|| AdaptiveSizing::new(DEFAULT_SIZE_MB))
    }

    fn session_config(&self) -> Result<SessionConfig, SpeedTestError> {
        let megabytes =
            |size: Option<u64>| size.unwrap_or(DEFAULT_SIZE_MB).saturating_mul(MIB);

        Ok(SessionConfig {
            base_url: self.url.clone(),
            download_size: megabytes(self.download_size),
            upload_size: megabytes(self.upload_size),
            attempts: self.attempts,
            timeout: Some(timeout_from_secs(self.timeout)?),
            ..Default::default()
        })
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.verbose.log_level_filter())
        .init();

    debug!(
        "{} {} ({})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        option_env!("CLOUDSPEEDTEST_BUILD_GIT_HASH").unwrap_or("unknown")
    );

    if let Err(e) = run(cli).await {
        eprintln!("{}", format_error_for_display(&e).red());
        process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<(), SpeedTestError> {
    let (run_download, run_upload) = cli.selected_tests();
    let mut session = SpeedTestSession::new(cli.session_config()?)?;

    let metadata = match session.metadata().await {
        Ok(metadata) => Some(metadata),
        Err(e) => {
            warn!("Could not fetch server metadata: {}", e);
            None
        }
    };

    if !cli.json {
        if let Some(metadata) = &metadata {
            print_metadata(metadata);
        }
    }

    let download = if run_download {
        let result = session.download_speed(cli.sizing(cli.download_size)).await?;
        if !cli.json {
            print_result("Download", &result);
        }
        Some(result)
    } else {
        None
    };

    let upload = if run_upload {
        let result = session.upload_speed(cli.sizing(cli.upload_size)).await?;
        if !cli.json {
            print_result("Upload", &result);
        }
        Some(result)
    } else {
        None
    };

    let report = Report::new(download, upload, metadata);

    if cli.json {
        println!("{}", report_json(&report)?);
    }

    if let Some(path) = &cli.json_output {
        write_report(path, &report)?;
    }

    Ok(())
}

fn print_metadata(metadata: &ServerMetadata) {
    println!(
        "{} {} {}",
        "Server Location:".bold().white(),
        metadata.city.bright_blue(),
        format!("({})", metadata.colo).bright_blue()
    );
    println!(
        "{} {} {}",
        "Your IP:".bold().white(),
        metadata.client_ip.bright_blue(),
        format!("({})", metadata.country).bright_blue()
    );
    println!("{} {}", "ISP:".bold().white(), metadata.isp);
}

fn print_result(label: &str, result: &SpeedResult) {
    let speed = match result.speed {
        Some(mbps) => format!("{:.2} Mbps", mbps),
        None => "N/A".to_string(),
    };

    println!(
        "{} {}",
        format!("{} speed:", label).bold().white(),
        speed.bright_cyan()
    );
    println!("{} {}", "Jitter:".bold().white(), millis(result.jitter));

    if let Some(latency) = result.latency {
        println!("{} {}", "Latency:".bold().white(), latency);
    }

    println!("{} {}", "HTTP latency:".bold().white(), millis(result.http_latency));
}

fn millis(value: Option<f64>) -> String {
    match value {
        Some(ms) => format!("{:.2} ms", ms),
        None => "N/A".to_string(),
    }
}

fn report_json(report: &Report) -> Result<String, SpeedTestError> {
    serde_json::to_string_pretty(report).map_err(|e| {
        SpeedTestError::new(ErrorKind::Unknown, "serializing report").with_source(e)
    })
}

fn write_report(path: &Path, report: &Report) -> Result<(), SpeedTestError> {
    std::fs::write(path, report_json(report)?).map_err(|e| {
        SpeedTestError::new(
            ErrorKind::Unknown,
            format!("writing report to {}", path.display()),
        )
        .with_source(e)
    })?;

    info!("Report written to {}", path.display());

    Ok(())
}
