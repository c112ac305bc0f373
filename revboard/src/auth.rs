//! Reporting API credential: load, refresh, or obtain through the browser.
//!
//! The token file uses the authorized-user JSON layout written by Google's
//! client libraries, so a `token.json` produced by other tools is reused.

use std::fmt::{self, Debug};
use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use chrono::{DateTime, Duration, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::oneshot;

use crate::error::AuthError;

pub const SCOPE: &str = "https://www.googleapis.com/auth/adsense.readonly";

const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

// Treat tokens this close to expiry as already expired.
const EXPIRY_MARGIN_SECS: i64 = 60;

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// OAuth client registration, the `installed` (or `web`) section of
/// `client_secret.json`.
#[derive(Clone, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

#[derive(Deserialize)]
struct ClientSecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

impl ClientSecrets {
    pub fn load(path: &Path) -> Result<Self, AuthError> {
        let raw = std::fs::read_to_string(path).map_err(|source| AuthError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&raw)
    }

    fn parse(raw: &str) -> Result<Self, AuthError> {
        let file: ClientSecretsFile =
            serde_json::from_str(raw).map_err(|source| AuthError::Malformed {
                what: "client secret file",
                source,
            })?;
        file.installed
            .or(file.web)
            .ok_or(AuthError::MissingClientSection)
    }
}

/// Access token plus everything needed to refresh it.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credential {
    #[serde(rename = "token", default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default = "default_token_uri")]
    token_uri: String,
    client_id: String,
    client_secret: String,
    #[serde(default)]
    scopes: Vec<String>,
    #[serde(default)]
    expiry: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<i64>,
    refresh_token: Option<String>,
    scope: Option<String>,
}

impl Credential {
    fn for_client(secrets: &ClientSecrets) -> Self {
        Self {
            access_token: None,
            refresh_token: None,
            token_uri: secrets.token_uri.clone(),
            client_id: secrets.client_id.clone(),
            client_secret: secrets.client_secret.clone(),
            scopes: vec![SCOPE.to_string()],
            expiry: None,
        }
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    /// Usable without a refresh. A token without an expiry never expires.
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.access_token.is_some()
            && self
                .expiry
                .map_or(true, |expiry| expiry - Duration::seconds(EXPIRY_MARGIN_SECS) > now)
    }

    fn apply(&mut self, token: TokenResponse, now: DateTime<Utc>) {
        self.access_token = Some(token.access_token);
        // an out-of-range lifetime is treated as no expiry at all
        self.expiry = token
            .expires_in
            .and_then(Duration::try_seconds)
            .and_then(|lifetime| now.checked_add_signed(lifetime));
        // refresh responses usually omit the refresh token; keep the old one
        if token.refresh_token.is_some() {
            self.refresh_token = token.refresh_token;
        }
        if let Some(scope) = token.scope {
            self.scopes = scope.split_whitespace().map(str::to_string).collect();
        }
    }
}

impl Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("client_id", &self.client_id)
            .field("scopes", &self.scopes)
            .field("expiry", &self.expiry)
            .field("has_refresh_token", &self.refresh_token.is_some())
            .finish_non_exhaustive()
    }
}

/// Persists the credential and talks to the token endpoint.
pub struct CredentialStore {
    token_path: PathBuf,
    secrets_path: PathBuf,
    http: reqwest::Client,
}

impl CredentialStore {
    pub fn new(token_path: PathBuf, secrets_path: PathBuf) -> Self {
        Self {
            token_path,
            secrets_path,
            http: reqwest::Client::new(),
        }
    }

    /// Returns a usable credential: the stored one, the stored one after a
    /// silent refresh, or a new one from the interactive consent flow.
    pub async fn obtain(&self) -> Result<Credential, AuthError> {
        match self.load() {
            Ok(Some(mut credential)) => {
                if credential.is_valid(Utc::now()) {
                    info!("using stored credential from {}", self.token_path.display());
                    return Ok(credential);
                }
                match self.refresh(&mut credential).await {
                    Ok(()) => return Ok(credential),
                    Err(e) => warn!("stored credential could not be refreshed: {}", e),
                }
            }
            Ok(None) => info!("no stored credential at {}", self.token_path.display()),
            Err(e) => warn!("ignoring stored credential: {}", e),
        }

        let secrets = ClientSecrets::load(&self.secrets_path)?;
        let credential = authorize(&self.http, &secrets).await?;
        self.save(&credential)?;
        info!("authorization complete, credential saved to {}", self.token_path.display());
        Ok(credential)
    }

    pub fn load(&self) -> Result<Option<Credential>, AuthError> {
        if !self.token_path.exists() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&self.token_path).map_err(|source| AuthError::Read {
            path: self.token_path.display().to_string(),
            source,
        })?;
        let credential = serde_json::from_str(&raw).map_err(|source| AuthError::Malformed {
            what: "credential file",
            source,
        })?;
        Ok(Some(credential))
    }

    pub fn save(&self, credential: &Credential) -> Result<(), AuthError> {
        let json = serde_json::to_string_pretty(credential).map_err(|source| {
            AuthError::Malformed {
                what: "credential",
                source,
            }
        })?;
        std::fs::write(&self.token_path, json).map_err(|source| AuthError::Write {
            path: self.token_path.display().to_string(),
            source,
        })
    }

    /// Exchanges the refresh token for a new access token and persists it.
    pub async fn refresh(&self, credential: &mut Credential) -> Result<(), AuthError> {
        let refresh_token = credential
            .refresh_token
            .clone()
            .ok_or(AuthError::NoRefreshToken)?;

        let res = self
            .http
            .post(&credential.token_uri)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.as_str()),
                ("client_id", credential.client_id.as_str()),
                ("client_secret", credential.client_secret.as_str()),
            ])
            .send()
            .await?;

        let token = token_response(res).await?;
        credential.apply(token, Utc::now());
        self.save(credential)?;
        info!("access token refreshed");
        Ok(())
    }
}

async fn token_response(res: reqwest::Response) -> Result<TokenResponse, AuthError> {
    if !res.status().is_success() {
        let status = res.status().as_u16();
        let body = res.text().await.unwrap_or_default();
        return Err(AuthError::TokenEndpoint { status, body });
    }
    Ok(res.json().await?)
}

pub fn authorization_url(
    secrets: &ClientSecrets,
    redirect_uri: &str,
    state: &str,
) -> Result<reqwest::Url, AuthError> {
    reqwest::Url::parse_with_params(
        &secrets.auth_uri,
        &[
            ("client_id", secrets.client_id.as_str()),
            ("redirect_uri", redirect_uri),
            ("response_type", "code"),
            ("scope", SCOPE),
            ("state", state),
            ("access_type", "offline"),
            ("prompt", "consent"),
        ],
    )
    .map_err(|e| AuthError::Endpoint {
        url: secrets.auth_uri.clone(),
        reason: e.to_string(),
    })
}

/// Installed-app flow: wait on a loopback listener for the browser redirect
/// and trade the code for tokens.
async fn authorize(http: &reqwest::Client, secrets: &ClientSecrets) -> Result<Credential, AuthError> {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await?;
    let redirect_uri = redirect_uri(listener.local_addr()?);
    let state = uuid::Uuid::new_v4().simple().to_string();
    let url = authorization_url(secrets, &redirect_uri, &state)?;

    info!("waiting for authorization callback on {}", redirect_uri);
    println!("Open this URL in a browser to grant read-only access:\n\n{}\n", url);

    let code = wait_for_code(listener, &state).await?;

    let res = http
        .post(&secrets.token_uri)
        .form(&[
            ("grant_type", "authorization_code"),
            ("code", code.as_str()),
            ("client_id", secrets.client_id.as_str()),
            ("client_secret", secrets.client_secret.as_str()),
            ("redirect_uri", redirect_uri.as_str()),
        ])
        .send()
        .await?;

    let token = token_response(res).await?;
    let mut credential = Credential::for_client(secrets);
    credential.apply(token, Utc::now());
    Ok(credential)
}

/// Loopback redirect target, spelled with the bound IP rather than
/// `localhost`.
fn redirect_uri(addr: SocketAddr) -> String {
    format!("http://{}/", addr)
}

/// Query of the browser redirect.
#[derive(Debug, Default, Deserialize)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

impl CallbackParams {
    /// `Ok(None)` when the request carries neither a code nor an error.
    fn outcome(self, expected_state: &str) -> Result<Option<String>, AuthError> {
        if let Some(reason) = self.error {
            return Err(AuthError::Denied(reason));
        }
        match self.code {
            Some(_) if self.state.as_deref() != Some(expected_state) => Err(AuthError::StateMismatch),
            code => Ok(code),
        }
    }
}

type CallbackOutcome = Result<String, AuthError>;

#[derive(Clone)]
struct CallbackState {
    expected_state: Arc<str>,
    reply: Arc<Mutex<Option<oneshot::Sender<CallbackOutcome>>>>,
}

fn callback_router(expected_state: &str) -> (Router, oneshot::Receiver<CallbackOutcome>) {
    let (tx, rx) = oneshot::channel();
    let state = CallbackState {
        expected_state: expected_state.into(),
        reply: Arc::new(Mutex::new(Some(tx))),
    };
    let app = Router::new().route("/", get(callback)).with_state(state);
    (app, rx)
}

async fn callback(
    State(state): State<CallbackState>,
    Query(params): Query<CallbackParams>,
) -> (StatusCode, &'static str) {
    let outcome = match params.outcome(&state.expected_state) {
        Ok(None) => return (StatusCode::BAD_REQUEST, "Missing authorization code."),
        Ok(Some(code)) => Ok(code),
        Err(e) => Err(e),
    };
    let reply = if outcome.is_ok() {
        (StatusCode::OK, "Authorization complete. You can close this window.")
    } else {
        (StatusCode::BAD_REQUEST, "Authorization failed. See the revboard log.")
    };

    let sender = state.reply.lock().ok().and_then(|mut slot| slot.take());
    match sender {
        Some(tx) => {
            let _ = tx.send(outcome);
            reply
        }
        None => (StatusCode::GONE, "Authorization already handled."),
    }
}

/// Serves the redirect target on `listener` until the first code or error
/// arrives, then stops the server.
async fn wait_for_code(listener: TcpListener, expected_state: &str) -> Result<String, AuthError> {
    let (app, outcome) = callback_router(expected_state);
    let (stop, stopped) = oneshot::channel::<()>();
    tokio::spawn(async move {
        let served = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = stopped.await;
            })
            .await;
        if let Err(e) = served {
            warn!("consent callback server failed: {}", e);
        }
    });

    let outcome = outcome.await.map_err(|_| {
        io::Error::new(io::ErrorKind::ConnectionAborted, "consent callback server stopped")
    });
    let _ = stop.send(());
    outcome?
}
