use thiserror::Error;

/// Failures while obtaining or refreshing the reporting API credential.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed {what}: {source}")]
    Malformed {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("client secret file has neither an \"installed\" nor a \"web\" section")]
    MissingClientSection,

    #[error("credential has no refresh token")]
    NoRefreshToken,

    #[error("credential has no access token")]
    NoAccessToken,

    #[error("consent callback listener failed: {0}")]
    Callback(#[from] std::io::Error),

    #[error("authorization was denied: {0}")]
    Denied(String),

    #[error("authorization callback state did not match")]
    StateMismatch,

    #[error("invalid authorization endpoint {url}: {reason}")]
    Endpoint { url: String, reason: String },

    #[error("token endpoint returned {status}: {body}")]
    TokenEndpoint { status: u16, body: String },

    #[error("token request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Failures talking to the reporting API.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("no reporting accounts are available to this credential")]
    NotFound,

    #[error("reporting API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("report for {window} has an unreadable total: {detail}")]
    MalformedReport { window: String, detail: String },

    #[error("reporting API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("credential refresh failed: {0}")]
    Auth(#[from] AuthError),
}

/// Failures talking to the display.
#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("device request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Everything that can abort one poll iteration.
#[derive(Error, Debug)]
pub enum CycleError {
    #[error("fetching revenue failed")]
    Metrics(#[from] ApiError),

    #[error("updating the display failed")]
    Device(#[from] DeviceError),
}
