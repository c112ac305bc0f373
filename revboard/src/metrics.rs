use chrono::Utc;
use serde::de::DeserializeOwned;

use crate::auth::{Credential, CredentialStore};
use crate::error::{ApiError, AuthError};
use crate::model::{AccountList, MetricWindow, Report};

pub const API_BASE: &str = "https://adsense.googleapis.com/v2";

const EARNINGS_METRIC: &str = "ESTIMATED_EARNINGS";
const ACCOUNT_PAGE_SIZE: &str = "50";

/// Something the poll loop can ask for a revenue total.
pub trait RevenueSource {
    async fn total(&mut self, window: MetricWindow) -> Result<f64, ApiError>;
}

/// Read-only AdSense Management API client. Refreshes its access token
/// whenever it has expired; nothing else is cached.
pub struct AdSenseClient {
    http: reqwest::Client,
    base_url: String,
    store: CredentialStore,
    credential: Credential,
}

impl AdSenseClient {
    pub fn new(store: CredentialStore, credential: Credential) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: API_BASE.to_string(),
            store,
            credential,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Resource name of the first account visible to the credential.
    pub async fn account_id(&mut self) -> Result<String, ApiError> {
        let url = format!("{}/accounts", self.base_url);
        let list: AccountList = self
            .get_json(&url, &[("pageSize", ACCOUNT_PAGE_SIZE)])
            .await?;
        list.accounts
            .into_iter()
            .next()
            .map(|account| account.name)
            .ok_or(ApiError::NotFound)
    }

    /// Estimated earnings for `account` over `window`.
    pub async fn total(&mut self, account: &str, window: MetricWindow) -> Result<f64, ApiError> {
        let url = format!("{}/{}/reports:generate", self.base_url, account);
        let report: Report = self
            .get_json(
                &url,
                &[
                    ("dateRange", window.as_api_str()),
                    ("metrics", EARNINGS_METRIC),
                ],
            )
            .await?;
        report.total().map_err(|detail| ApiError::MalformedReport {
            window: window.to_string(),
            detail,
        })
    }

    async fn bearer(&mut self) -> Result<String, ApiError> {
        if !self.credential.is_valid(Utc::now()) {
            self.store.refresh(&mut self.credential).await?;
        }
        let token = self
            .credential
            .access_token()
            .ok_or(AuthError::NoAccessToken)?;
        Ok(token.to_string())
    }

    async fn get_json<T: DeserializeOwned>(
        &mut self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<T, ApiError> {
        let token = self.bearer().await?;
        let res = self
            .http
            .get(url)
            .query(query)
            .bearer_auth(token)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(ApiError::Status { status, body });
        }
        Ok(res.json().await?)
    }
}

/// Reports for one fixed account.
pub struct AccountRevenue {
    client: AdSenseClient,
    account: String,
}

impl AccountRevenue {
    pub fn new(client: AdSenseClient, account: String) -> Self {
        Self { client, account }
    }
}

impl RevenueSource for AccountRevenue {
    async fn total(&mut self, window: MetricWindow) -> Result<f64, ApiError> {
        self.client.total(&self.account, window).await
    }
}
