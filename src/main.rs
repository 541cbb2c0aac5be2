//! gpio2hid daemon.
//!
//! Startup order: settings, gadget, report channel, GPIO lines. Any
//! failure before the executor starts is fatal and reported with context.
//! Once running, the process ends on SIGINT/SIGTERM (exit 0) or when the
//! report channel is lost (exit 1).

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use embassy_executor::{Executor, Spawner};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use log::{error, info, warn};
use static_cell::StaticCell;

use gpio2hid::config::{Settings, GPIO_CONSUMER, MAX_LINES};
use gpio2hid::input::line::EdgeSource;
use gpio2hid::pipeline::{Pipeline, ShutdownReason};
use gpio2hid::usb::gadget::{self, Provisioned};
use gpio2hid::usb::hidg::HidgDevice;

type AppPipeline = Pipeline<CriticalSectionRawMutex, HidgDevice>;

static PIPELINE: StaticCell<AppPipeline> = StaticCell::new();
static EXECUTOR: StaticCell<Executor> = StaticCell::new();

#[derive(Parser)]
#[command(name = "gpio2hid")]
#[command(about = "Type fixed text over a USB HID gadget when a GPIO line changes")]
struct Cli {
    /// TOML settings file; built-in defaults when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Assume the USB gadget is already provisioned and bound
    #[arg(long)]
    skip_gadget: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = Settings::load(cli.config.as_deref()).context("loading settings")?;
    info!("gpio2hid {} starting, {} line(s)", env!("CARGO_PKG_VERSION"), settings.lines.len());

    if settings.gadget.enabled && !cli.skip_gadget {
        match gadget::provision(&settings.gadget).context("provisioning USB gadget")? {
            Provisioned::Bound { udc } => info!("Gadget bound to {}", udc),
            Provisioned::AlreadyBound { udc } => info!("Gadget already bound to {}", udc),
        }
    }

    let device = HidgDevice::open(&settings.device.path)
        .with_context(|| format!("opening {}", settings.device.path.display()))?;

    let pipeline: &'static AppPipeline = PIPELINE.init(
        Pipeline::from_settings(&settings, device).context("building pipeline")?,
    );

    for (line, gate_line) in settings.lines.iter().zip(pipeline.lines()) {
        let source = EdgeSource::request(line, GPIO_CONSUMER)
            .with_context(|| format!("requesting line {}", line.name))?;
        source
            .spawn(gate_line.gate())
            .with_context(|| format!("starting reader for line {}", line.name))?;
    }

    ctrlc::set_handler(move || pipeline.shutdown(ShutdownReason::Requested))
        .context("installing signal handler")?;

    let executor = EXECUTOR.init(Executor::new());
    executor.run(move |spawner| start(spawner, pipeline))
}

fn start(spawner: Spawner, pipeline: &'static AppPipeline) {
    if let Err(e) = spawner.spawn(supervisor_task(pipeline)) {
        error!("Failed to spawn supervisor: {:?}", e);
        std::process::exit(1);
    }
    for index in 0..pipeline.lines().len() {
        if let Err(e) = spawner.spawn(line_task(pipeline, index)) {
            error!("Failed to spawn line {}: {:?}", index, e);
            std::process::exit(1);
        }
    }
}

#[embassy_executor::task(pool_size = MAX_LINES)]
async fn line_task(pipeline: &'static AppPipeline, index: usize) {
    pipeline.run_line(index).await;
}

#[embassy_executor::task]
async fn supervisor_task(pipeline: &'static AppPipeline) {
    let reason = pipeline.wait_shutdown().await;
    match pipeline.close().await {
        Some(device) => info!("Closing {}", device.path().display()),
        None => warn!("Report channel was already closed"),
    }

    let stats = pipeline.stats();
    info!(
        "Stopped ({:?}): {} triggers, {} bursts, {} failures",
        reason, stats.triggers, stats.bursts, stats.failures
    );
    std::process::exit(reason.exit_code());
}
