//! Fakes shared by the unit tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::Router;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use crate::device::{DeviceCommand, Transport};
use crate::error::DeviceError;

/// One request as the fake server saw it.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    /// Path and query, e.g. `/accounts?pageSize=50`.
    pub uri: String,
    pub authorization: Option<String>,
    pub body: String,
}

impl Recorded {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

#[derive(Clone, Default)]
struct Script {
    responses: Arc<Mutex<VecDeque<(u16, String)>>>,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

/// HTTP server answering every request, whatever its path, with the next
/// canned `(status, body)` pair and recording what it was sent.
pub struct FakeServer {
    pub url: String,
    script: Script,
}

impl FakeServer {
    pub async fn start(responses: Vec<(u16, String)>) -> Self {
        let script = Script {
            responses: Arc::new(Mutex::new(responses.into())),
            ..Script::default()
        };
        let app = Router::new().fallback(answer).with_state(script.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { url, script }
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.script.requests.lock().unwrap().clone()
    }
}

async fn answer(
    State(script): State<Script>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, [(header::HeaderName, &'static str); 1], String) {
    script.requests.lock().unwrap().push(Recorded {
        method,
        uri: uri.to_string(),
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body,
    });

    let (status, body) = script
        .responses
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or((500, r#"{"error":"script exhausted"}"#.to_string()));
    (
        StatusCode::from_u16(status).unwrap(),
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
}

/// Device transport that records every command and replies from a script,
/// falling back to the device's usual `{"error_code": 0}`.
#[derive(Clone, Default)]
pub struct Recorder {
    sent: Rc<RefCell<Vec<Value>>>,
    replies: Rc<RefCell<VecDeque<Value>>>,
}

impl Recorder {
    pub fn reply_with(&self, reply: Value) {
        self.replies.borrow_mut().push_back(reply);
    }

    pub fn sent(&self) -> Vec<Value> {
        self.sent.borrow().clone()
    }

    pub fn clear(&self) {
        self.sent.borrow_mut().clear();
    }
}

impl Transport for Recorder {
    async fn send(&self, command: &DeviceCommand<'_>) -> Result<Value, DeviceError> {
        self.sent
            .borrow_mut()
            .push(serde_json::to_value(command).unwrap());
        let reply = self.replies.borrow_mut().pop_front();
        Ok(reply.unwrap_or_else(|| json!({"error_code": 0})))
    }
}
