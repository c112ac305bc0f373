use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use log::info;
use revboard_common::Typeface;

use crate::auth::CredentialStore;
use crate::device::{DeviceClient, HttpTransport};
use crate::metrics::{AccountRevenue, AdSenseClient};
use crate::poll::{PollLoop, Schedule};

pub mod auth;
pub mod device;
pub mod error;
pub mod metrics;
pub mod model;
pub mod poll;

#[cfg(test)]
mod testutil;

#[derive(Debug, Parser)]
#[clap(about = "Shows AdSense revenue on a Pixoo 64 display")]
struct Opt {
    /// Display address, host or host:port
    #[clap(short, long, env = "REVBOARD_DEVICE", default_value = "192.168.1.100")]
    device: String,

    /// Seconds between updates
    #[clap(short, long, env = "REVBOARD_INTERVAL_SECS", default_value_t = 30 * 60)]
    interval_secs: u64,

    /// Milliseconds the device needs to apply the background before text sticks
    #[clap(long, env = "REVBOARD_SETTLE_MS", default_value_t = 200)]
    settle_ms: u64,

    #[clap(long, env = "REVBOARD_TOKEN_FILE", default_value = "token.json")]
    token_file: PathBuf,

    #[clap(long, env = "REVBOARD_CLIENT_SECRET", default_value = "client_secret.json")]
    client_secret: PathBuf,

    /// TrueType pixel font for the background labels
    #[clap(long, env = "REVBOARD_FONT", default_value = "PressStart2P-Regular.ttf")]
    font: PathBuf,

    /// Run a single update and exit
    #[clap(long)]
    once: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), anyhow::Error> {
    let opt = Opt::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let store = CredentialStore::new(opt.token_file.clone(), opt.client_secret.clone());
    let credential = store.obtain().await.context("authorization failed")?;

    let mut client = AdSenseClient::new(store, credential);
    let account = client.account_id().await.context("failed to pick an account")?;
    info!("reporting on {}", account);

    let background = revboard_common::render(&Typeface::load(&opt.font));
    let transport = HttpTransport::new(&opt.device)?;
    info!("display endpoint {}", transport.url());
    let device = DeviceClient::new(transport);
    let schedule = Schedule {
        interval: Duration::from_secs(opt.interval_secs),
        settle: Duration::from_millis(opt.settle_ms),
    };
    let mut poll = PollLoop::new(
        AccountRevenue::new(client, account),
        device,
        &background,
        schedule,
    );

    if opt.once {
        let readings = poll.cycle().await?;
        info!("display updated: {:?}", readings.0);
        return Ok(());
    }

    info!("updating every {}s, Ctrl-C to stop", opt.interval_secs);
    poll.run().await;

    Ok(())
}
