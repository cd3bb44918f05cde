use std::time::Duration;
use async_trait::async_trait;
use log::{debug, trace, error};
use serde_json::Value;

use super::{RawServerResponse, Transport};

/// reqwest-backed transport
#[derive(Debug, Clone)]
pub struct HttpTransport
{   http_client: reqwest::Client
}

impl HttpTransport
{   /// Build a client, applying the timeout when one is configured
    pub fn new(timeout_secs: Option<u64>)
      -> Result<Self, crate::error::Error>
    {   debug!("Creating HttpTransport (timeout: {:?})", timeout_secs);
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = timeout_secs
        {   builder = builder.timeout(Duration::from_secs(secs));
        }
        let http_client = builder.build().map_err(|e| {
          error!("Failed to build HTTP client: {}", e);
          crate::error::Error::InvalidConfiguration(e.to_string())
        })?;
        Ok(HttpTransport { http_client })
    }

    pub fn from_config(config: &crate::config::OrchestratorConfig)
      -> Result<Self, crate::error::Error>
    {   Self::new(config.timeout_secs)
    }
}

#[async_trait]
impl Transport for HttpTransport
{   async fn post_json(
      &self
    , url: &str
    , body: &Value
    ) -> Result<RawServerResponse, crate::error::Error>
    {   trace!("POST {} body: {}", url, body);

        let response = self.http_client
          .post(url)
          .header("Content-Type", "application/json")
          .json(body)
          .send()
          .await
          .map_err(|e| {
            error!("HTTP error: {}", e);
            crate::error::Error::from(e)
          })?;

        let status = response.status().as_u16();
        trace!("Comparison response status: {}", status);

        // body first as text, decoding is the guard's job
        let text = response.text().await.map_err(|e| {
          error!("Failed to read response body: {}", e);
          crate::error::Error::from(e)
        })?;
        trace!("Comparison response body: {} bytes", text.len());

        Ok(RawServerResponse::new(status, text))
    }
}
