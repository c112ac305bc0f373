//! The update loop: fetch the three totals, repaint, sleep, repeat.

use std::time::Duration;

use log::{error, info};
use revboard_common::PixelImage;
use tokio::time::sleep;

use crate::device::{DeviceClient, Transport};
use crate::error::CycleError;
use crate::metrics::RevenueSource;
use crate::model::MetricWindow;

/// Where the device draws each figure; one text slot per window so every
/// cycle overwrites the previous numbers in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overlay {
    pub window: MetricWindow,
    pub slot: u32,
    pub x: i32,
    pub y: i32,
}

pub const OVERLAYS: [Overlay; 3] = [
    Overlay { window: MetricWindow::Today, slot: 11, x: 38, y: 22 },
    Overlay { window: MetricWindow::Last7Days, slot: 12, x: 38, y: 34 },
    Overlay { window: MetricWindow::Last30Days, slot: 13, x: 38, y: 46 },
];

#[derive(Debug, Clone, Copy)]
pub struct Schedule {
    /// Pause between the end of one cycle and the start of the next.
    pub interval: Duration,
    /// Pause between pushing the background and drawing text. The device
    /// applies both asynchronously and text sent too early is lost; 200ms
    /// works on the Pixoo 64, other hardware may need more.
    pub settle: Duration,
}

/// Figures fetched in one cycle, in [`OVERLAYS`] order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Readings(pub [f64; 3]);

pub struct PollLoop<S, T> {
    source: S,
    device: DeviceClient<T>,
    background: String,
    schedule: Schedule,
}

impl<S: RevenueSource, T: Transport> PollLoop<S, T> {
    pub fn new(source: S, device: DeviceClient<T>, background: &PixelImage, schedule: Schedule) -> Self {
        Self {
            source,
            device,
            background: background.to_base64(),
            schedule,
        }
    }

    /// Runs until the process is killed.
    pub async fn run(mut self) {
        loop {
            self.tick().await;
        }
    }

    /// One cycle followed by the interval sleep. Failures are logged and
    /// dropped so the next tick starts clean.
    pub async fn tick(&mut self) -> Option<Readings> {
        let outcome = match self.cycle().await {
            Ok(readings) => {
                info!("display updated: {:?}", readings.0);
                Some(readings)
            }
            Err(e) => {
                error!("update failed: {:?}", anyhow::Error::new(e));
                None
            }
        };
        sleep(self.schedule.interval).await;
        outcome
    }

    pub async fn cycle(&mut self) -> Result<Readings, CycleError> {
        let mut values = [0.0; 3];
        for (value, overlay) in values.iter_mut().zip(OVERLAYS.iter()) {
            *value = self.source.total(overlay.window).await?;
        }

        self.device.push_image(&self.background).await?;
        sleep(self.schedule.settle).await;

        for (value, overlay) in values.iter().zip(OVERLAYS.iter()) {
            self.device
                .draw_text(overlay.slot, overlay.x, overlay.y, &format_money(*value))
                .await?;
        }
        Ok(Readings(values))
    }
}

/// Whole currency units, rounded half away from zero.
pub fn format_money(value: f64) -> String {
    format!("{}", value.round() as i64)
}
