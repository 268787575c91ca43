//! Thin asynchronous client for the spreadsheet web-app backend.
//!
//! - Every call is a single POST to one endpoint; the `route` field selects
//!   the action.
//! - Bodies go out as `text/plain` so the web app accepts them without a
//!   CORS preflight.
//! - One attempt per call; failures are surfaced, never retried.

use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client, Url};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::domain::{CostingRecord, RemoteStore};
use crate::util::version::user_agent;

const ROUTE_SAVE_COSTING: &str = "save-costing";
const ROUTE_COSTING_LIST: &str = "costing-list";
const ROUTE_STATUS: &str = "status";

const DEFAULT_FAILURE: &str = "บันทึกไม่สำเร็จ";

#[derive(Debug, Error)]
pub enum SheetClientError {
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("http request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid payload: {0}")]
    Payload(#[from] serde_json::Error),
    /// Rejection reported by the backend, carried verbatim.
    #[error("{0}")]
    Api(String),
}

/// Response envelope shared by every route.
#[derive(Debug, Default, Deserialize)]
pub struct SheetEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl SheetEnvelope {
    pub fn into_data(self) -> Result<Option<Value>, SheetClientError> {
        if self.success {
            return Ok(self.data);
        }
        let reason = self
            .error
            .or(self.message)
            .filter(|text| !text.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_FAILURE.to_string());
        Err(SheetClientError::Api(reason))
    }
}

/// Saved costing row as returned by the `costing-list` route.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedCosting {
    #[serde(default, alias = "product_name")]
    pub product_name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, alias = "recommended_price")]
    pub recommended_price: Option<Value>,
    #[serde(default, alias = "created_at")]
    pub created_at: Option<String>,
}

impl SavedCosting {
    pub fn recommended_price(&self) -> Option<f64> {
        match self.recommended_price.as_ref()? {
            Value::Number(number) => number.as_f64(),
            Value::String(text) => crate::domain::parse_optional_amount(text),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SheetClient {
    http: Client,
    endpoint: Url,
}

impl SheetClient {
    pub fn new(endpoint: &str) -> Result<Self, SheetClientError> {
        let endpoint = Url::parse(endpoint)?;
        let http = Client::builder().user_agent(user_agent()).build()?;
        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub async fn save_costing(&self, record: &CostingRecord) -> Result<(), SheetClientError> {
        self.request(ROUTE_SAVE_COSTING, record).await?;
        Ok(())
    }

    pub async fn list_costings(&self, user_id: &str) -> Result<Vec<SavedCosting>, SheetClientError> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct ListRequest<'a> {
            user_id: &'a str,
        }

        let data = self
            .request(ROUTE_COSTING_LIST, &ListRequest { user_id })
            .await?;
        parse_costing_list(data)
    }

    /// Connectivity check against the backend.
    pub async fn status(&self) -> Result<Option<Value>, SheetClientError> {
        self.request(ROUTE_STATUS, &Map::new()).await
    }

    async fn request<T>(&self, route: &str, payload: &T) -> Result<Option<Value>, SheetClientError>
    where
        T: Serialize + ?Sized,
    {
        let body = build_body(route, payload)?;
        debug!("[sheet] POST {route} to {}", self.endpoint);

        let response = self
            .http
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "text/plain")
            .body(body.to_string())
            .send()
            .await?
            .error_for_status()?;
        let envelope: SheetEnvelope = response.json().await?;

        envelope.into_data().inspect_err(|err| {
            warn!("[sheet] {route} rejected: {err}");
        })
    }
}

#[async_trait]
impl RemoteStore for SheetClient {
    type Error = SheetClientError;

    async fn submit_costing(&self, record: &CostingRecord) -> Result<(), Self::Error> {
        self.save_costing(record).await
    }
}

/// Merges the route name into the payload object.
fn build_body<T>(route: &str, payload: &T) -> Result<Value, SheetClientError>
where
    T: Serialize + ?Sized,
{
    let mut body = match serde_json::to_value(payload)? {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            let mut map = Map::new();
            map.insert("data".to_string(), other);
            map
        }
    };
    body.insert("route".to_string(), Value::String(route.to_string()));
    Ok(Value::Object(body))
}

fn parse_costing_list(data: Option<Value>) -> Result<Vec<SavedCosting>, SheetClientError> {
    match data {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(value) => Ok(serde_json::from_value(value)?),
    }
}
