//! Client for the display's local HTTP control endpoint.
//!
//! Every command is a JSON object POSTed to `http://<device>/post` with a
//! `Command` field naming the operation; the device answers with JSON.

use std::time::Duration;

use log::debug;
use serde::Serialize;
use serde_json::Value;

use crate::error::DeviceError;

pub const FRAME_WIDTH: u32 = 64;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
const FALLBACK_FRAME_ID: i64 = 1;
// The firmware has used all of these spellings.
const FRAME_ID_KEYS: [&str; 3] = ["PicID", "PicId", "picId"];

const TEXT_FONT: u8 = 4;
const TEXT_COLOR: &str = "#FFFFFF";
const TEXT_ALIGN: u8 = 1;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "Command")]
pub enum DeviceCommand<'a> {
    #[serde(rename = "Draw/GetHttpGifId")]
    GetHttpGifId,

    #[serde(rename = "Draw/SendHttpGif", rename_all = "PascalCase")]
    SendHttpGif {
        pic_num: u32,
        #[serde(rename = "PicID")]
        pic_id: i64,
        pic_offset: u32,
        pic_speed: u32,
        pic_width: u32,
        pic_data: &'a str,
    },

    #[serde(rename = "Draw/SendHttpText")]
    SendHttpText {
        #[serde(rename = "TextId")]
        text_id: u32,
        x: i32,
        y: i32,
        dir: u8,
        font: u8,
        #[serde(rename = "TextWidth")]
        text_width: u32,
        speed: u32,
        #[serde(rename = "TextString")]
        text_string: &'a str,
        color: &'a str,
        align: u8,
    },
}

impl DeviceCommand<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            DeviceCommand::GetHttpGifId => "Draw/GetHttpGifId",
            DeviceCommand::SendHttpGif { .. } => "Draw/SendHttpGif",
            DeviceCommand::SendHttpText { .. } => "Draw/SendHttpText",
        }
    }
}

/// Delivers one command and returns the device's JSON reply.
pub trait Transport {
    async fn send(&self, command: &DeviceCommand<'_>) -> Result<Value, DeviceError>;
}

pub struct HttpTransport {
    http: reqwest::Client,
    url: String,
}

impl HttpTransport {
    /// `address` is the device's host or `host:port`.
    pub fn new(address: &str) -> Result<Self, DeviceError> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            url: format!("http://{}/post", address),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Transport for HttpTransport {
    async fn send(&self, command: &DeviceCommand<'_>) -> Result<Value, DeviceError> {
        debug!("sending {} to {}", command.name(), self.url);
        let res = self
            .http
            .post(&self.url)
            .json(command)
            .send()
            .await?
            .error_for_status()?;
        Ok(res.json().await?)
    }
}

pub struct DeviceClient<T> {
    transport: T,
}

impl<T: Transport> DeviceClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Id the device expects for the next pushed animation.
    pub async fn get_current_frame_id(&self) -> Result<i64, DeviceError> {
        let reply = self.transport.send(&DeviceCommand::GetHttpGifId).await?;
        Ok(frame_id(&reply))
    }

    /// Replaces the screen with a single 64x64 frame. The id is queried
    /// right before sending so a stale one never clobbers the device's
    /// current animation.
    pub async fn push_image(&self, picdata: &str) -> Result<(), DeviceError> {
        let pic_id = self.get_current_frame_id().await?;
        self.transport
            .send(&DeviceCommand::SendHttpGif {
                pic_num: 1,
                pic_id,
                pic_offset: 0,
                pic_speed: 100,
                pic_width: FRAME_WIDTH,
                pic_data: picdata,
            })
            .await?;
        Ok(())
    }

    /// Draws `text` in overlay `slot`; reusing a slot replaces its text.
    pub async fn draw_text(&self, slot: u32, x: i32, y: i32, text: &str) -> Result<(), DeviceError> {
        self.transport
            .send(&DeviceCommand::SendHttpText {
                text_id: slot,
                x,
                y,
                dir: 0,
                font: TEXT_FONT,
                text_width: FRAME_WIDTH,
                speed: 0,
                text_string: text,
                color: TEXT_COLOR,
                align: TEXT_ALIGN,
            })
            .await?;
        Ok(())
    }
}

/// The first set key wins: null, zero and empty strings count as unset.
/// That one value is parsed; anything unparseable gives
/// [`FALLBACK_FRAME_ID`] without looking at later keys.
fn frame_id(reply: &Value) -> i64 {
    FRAME_ID_KEYS
        .iter()
        .filter_map(|key| reply.get(*key))
        .find(|value| is_set(value))
        .and_then(parse_id)
        .unwrap_or(FALLBACK_FRAME_ID)
}

fn is_set(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn parse_id(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(true) => Some(1),
        _ => None,
    }
}
