use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tracing::{debug, instrument};
use url::Url;
use validator::Validate;

use crate::config::Config;
use crate::dto::vacancy_dto::{apply_path, company_path, FeedQuery, Page};
use crate::error::{Error, Result};
use crate::models::company::Company;
use crate::models::vacancy::Vacancy;
use crate::utils::case::{to_camel_case, to_snake_case};
use crate::utils::launch_params::LaunchParams;

/// HTTP access to the job-listing backend. Every request carries the `tma`
/// authorization header; every JSON answer is returned with camelCase keys.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Url,
    headers: HeaderMap,
}

impl ApiClient {
    pub fn new(config: &Config, launch_params: &LaunchParams) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        let mut authorization = HeaderValue::from_str(&launch_params.authorization())
            .map_err(|e| Error::Config(format!("Invalid launch parameters: {}", e)))?;
        authorization.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, authorization);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Ok(Self {
            client,
            base_url: config.backend_url.clone(),
            headers,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Joins a relative resource path onto the backend origin.
    pub fn resolve(&self, path: &str) -> Result<Url> {
        if Url::parse(path).is_ok() || path.starts_with("//") {
            return Err(Error::BadRequest(format!(
                "Expected a relative path, got {}",
                path
            )));
        }
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    /// Issues one request and returns the decoded body with camelCase keys.
    /// An empty body decodes to `null`.
    #[instrument(skip(self, body), fields(base = %self.base_url))]
    pub async fn request(
        &self,
        path: &str,
        method: Method,
        body: Option<&JsonValue>,
    ) -> Result<JsonValue> {
        let url = self.resolve(path)?;

        let mut request = self
            .client
            .request(method, url)
            .headers(self.headers.clone());
        if let Some(body) = body {
            request = request.json(&to_snake_case(body.clone()));
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        debug!(%status, bytes = text.len(), "Backend responded");

        if !status.is_success() {
            return Err(Error::Status { status, body: text });
        }
        if text.trim().is_empty() {
            return Ok(JsonValue::Null);
        }

        let raw: JsonValue = serde_json::from_str(&text)?;
        Ok(to_camel_case(raw))
    }

    pub async fn get(&self, path: &str) -> Result<JsonValue> {
        self.request(path, Method::GET, None).await
    }

    pub async fn post(&self, path: &str, body: Option<&JsonValue>) -> Result<JsonValue> {
        self.request(path, Method::POST, body).await
    }

    async fn get_as<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let value = self.get(path).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn jobs(&self, query: &FeedQuery) -> Result<Page<Vacancy>> {
        query.validate()?;
        self.get_as(&query.path()).await
    }

    /// Records approval of a vacancy. The response body is not inspected.
    pub async fn apply(&self, vacancy_id: i64) -> Result<()> {
        self.post(&apply_path(vacancy_id), None).await?;
        Ok(())
    }

    pub async fn company(&self, company_id: i64) -> Result<Company> {
        self.get_as(&company_path(company_id)).await
    }
}
