use std::time::Duration;

use tracing::trace;

use crate::error::{WidgetError, WidgetResult};

use super::{HttpClient, HttpRequest};

/// Blocking `reqwest` client for feeds that fetch history over HTTP.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::blocking::Client,
}

impl ReqwestHttpClient {
    pub fn new(timeout: Duration) -> WidgetResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WidgetError::Feed(format!("http client init error: {e}")))?;
        Ok(Self { client })
    }
}

impl HttpClient for ReqwestHttpClient {
    fn get(&self, url: &str, request: &HttpRequest) -> WidgetResult<String> {
        trace!(url, params = request.params.len(), "http get");
        let mut builder = self.client.get(url).query(&request.params);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder
            .send()
            .and_then(|response| response.error_for_status())
            .map_err(|e| WidgetError::DataLoad(format!("request to {url} failed: {e}")))?
            .text()
            .map_err(|e| WidgetError::DataLoad(format!("response from {url} unreadable: {e}")))
    }
}
