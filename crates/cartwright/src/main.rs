use anyhow::Context;
use cartwright_e::{WebDriverHostFactory, WebDriverOptions};
use cartwright_engine::api::ApiHelper;
use cartwright_engine::config::{CartwrightConfig, ConfigLoader, HostKind};
use cartwright_engine::logging;
use cartwright_engine::runner::{self, HostFactory, Runner};
use cartwright_engine::scenarios;
use cartwright_h::{CdpHostFactory, CdpOptions};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "cartwright", version, about = "Storefront end-to-end suite runner")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the scenarios against a browser
    Run(RunArgs),
    /// Print every scenario without running anything
    List {
        /// Only list scenarios whose suite or name contains this text
        #[arg(long)]
        grep: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum HostArg {
    /// Chromium via CDP
    Headless,
    /// A browser behind a WebDriver server
    Webdriver,
}

#[derive(clap::Args)]
struct RunArgs {
    /// Config file (defaults to ./cartwright.yaml, then ~/.cartwright/config.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Browser host to drive
    #[arg(long, value_enum)]
    host: Option<HostArg>,

    /// WebDriver server URL (webdriver host only)
    #[arg(long)]
    driver_url: Option<String>,

    /// Storefront base URL (overrides BASE_URL and the config file)
    #[arg(long)]
    base_url: Option<String>,

    /// Only run scenarios whose suite or name contains this text
    #[arg(short, long)]
    grep: Option<String>,

    /// Number of scenarios run in parallel
    #[arg(short, long)]
    workers: Option<usize>,

    /// Retries for a failed scenario
    #[arg(long)]
    retries: Option<u32>,

    /// Show the browser window
    #[arg(long)]
    headed: bool,

    /// Skip the API check before the run and the cleanup after it
    #[arg(long)]
    skip_setup: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl RunArgs {
    fn apply(&self, config: &mut CartwrightConfig) {
        if let Some(host) = self.host {
            config.browser.host = match host {
                HostArg::Headless => HostKind::Headless,
                HostArg::Webdriver => HostKind::Webdriver,
            };
        }
        if let Some(url) = &self.driver_url {
            config.browser.driver_url = url.clone();
        }
        if let Some(url) = &self.base_url {
            config.base_url = url.clone();
        }
        if let Some(workers) = self.workers {
            config.runner.workers = workers;
        }
        if let Some(retries) = self.retries {
            config.runner.retries = retries;
        }
        if self.headed {
            config.browser.headless = false;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    match args.command {
        Command::List { grep } => {
            for scenario in scenarios::select(grep.as_deref()) {
                println!("{}", scenario.title());
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Run(run_args) => run(run_args).await,
    }
}

async fn run(args: RunArgs) -> anyhow::Result<ExitCode> {
    let mut config = match &args.config {
        Some(path) => ConfigLoader::load_from(path)
            .await
            .with_context(|| format!("loading {}", path.display()))?,
        None => ConfigLoader::load_default().await?,
    };
    config.apply_env();
    args.apply(&mut config);

    let _log_guard = logging::init(&config.runner.report_dir, args.verbose)?;

    let selected = scenarios::select(args.grep.as_deref());
    if selected.is_empty() {
        error!("No scenarios match {:?}", args.grep.unwrap_or_default());
        return Ok(ExitCode::FAILURE);
    }

    info!("Testing {} with the {:?} host", config.base_url, config.browser.host);
    let api = ApiHelper::new(&config.base_url)?;
    if !args.skip_setup {
        runner::global_setup(&api)
            .await
            .context("global setup failed")?;
    }

    let factory: Arc<dyn HostFactory> = match config.browser.host {
        HostKind::Headless => Arc::new(CdpHostFactory::new(CdpOptions::from(&config.browser))),
        HostKind::Webdriver => Arc::new(WebDriverHostFactory::new(WebDriverOptions::from(
            &config.browser,
        ))),
    };

    let report_dir = config.runner.report_dir.clone();
    let started = Instant::now();
    let summary = Runner::new(factory, config)?.run(selected).await;

    if !args.skip_setup {
        runner::global_teardown(&api).await;
    }

    println!("{}", runner::format_summary(&summary, started.elapsed()));
    match summary.write_json(&report_dir).await {
        Ok(path) => info!("Summary written to {}", path.display()),
        Err(e) => error!("Failed to write summary: {}", e),
    }

    Ok(if summary.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
