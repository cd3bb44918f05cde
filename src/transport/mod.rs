//! Transport to the similarity backend

pub mod http;

// Re-export for convenience
pub use http::HttpTransport;

use async_trait::async_trait;
use serde_json::Value;

/// Undecoded response: HTTP status and the whole body as text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawServerResponse
{   pub status: u16
  , pub body: String
}

impl RawServerResponse
{   pub fn new(status: u16, body: impl Into<String>) -> Self
    {   RawServerResponse
        {   status
          , body: body.into()
        }
    }

    pub fn is_success(&self) -> bool
    {   (200..300).contains(&self.status)
    }
}

/// Posts a JSON body and hands back the raw response.
/// Any HTTP status is a response; only failures to talk to the
/// server at all are errors.
#[async_trait]
pub trait Transport: Send + Sync
{   async fn post_json(
      &self
    , url: &str
    , body: &Value
    ) -> Result<RawServerResponse, crate::error::Error>;
}
