//! Configuration for the comparison orchestrator and backend contract

use std::fs;
use std::path::Path;
use serde::{Deserialize, Serialize};
use log::debug;

/// Name of the window-size field in the request body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowField
{   /// `"window": n`
    Window
  , /// `"w": n`
    W
}

impl WindowField
{   pub fn key(&self) -> &'static str
    {   match self
        {   WindowField::Window => "window"
          , WindowField::W => "w"
        }
    }
}

/// Endpoint and parameter naming policy of the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireContract
{   /// Path of the comparison endpoint
    pub endpoint: String
  , pub window_field: WindowField
  , /// Whether the shingle size `k` is sent
    pub send_shingle: bool
}

impl WireContract
{   /// `/api/analyze` with `w` and `k`
    pub fn analyze() -> Self
    {   WireContract
        {   endpoint: "/api/analyze".to_string()
          , window_field: WindowField::W
          , send_shingle: true
        }
    }

    /// `/compare` with `window` only
    pub fn compare() -> Self
    {   WireContract
        {   endpoint: "/compare".to_string()
          , window_field: WindowField::Window
          , send_shingle: false
        }
    }
}

impl Default for WireContract
{   fn default() -> Self
    {   WireContract::analyze()
    }
}

/// Fallbacks applied to absent response fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldDefaults
{   /// Shown for an absent counter. `-` as the original frontend
    /// shows it; set to `unknown` for the wording of the display
    /// contract.
    pub count_placeholder: String
  , /// Status line after a success without `message`
    pub default_message: String
  , /// Value of an absent ratio
    pub ratio_fallback: f64
  , /// Status line for a failure without an `error` string
    pub server_error_fallback: String
}

impl Default for FieldDefaults
{   fn default() -> Self
    {   FieldDefaults
        {   count_placeholder: "-".to_string()
          , default_message: "Analysis complete.".to_string()
          , ratio_fallback: 0.0
          , server_error_fallback: "Unknown server error".to_string()
        }
    }
}

/// Orchestrator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig
{   /// Scheme and authority of the similarity backend
    pub base_url: String
  , pub contract: WireContract
  , /// Window size used when the form field is blank or unparseable
    pub default_window_size: u32
  , /// Shingle size used when the form field is blank or unparseable
    pub default_shingle_size: u32
  , /// Characters of a non-JSON body kept for the status line
    pub excerpt_chars: usize
  , /// Request timeout in seconds, transport default when unset
    pub timeout_secs: Option<u64>
  , pub fields: FieldDefaults
}

impl Default for OrchestratorConfig
{   fn default() -> Self
    {   OrchestratorConfig
        {   base_url: "http://127.0.0.1:8080".to_string()
          , contract: WireContract::default()
          , default_window_size: 4
          , default_shingle_size: 5
          , excerpt_chars: 200
          , timeout_secs: None
          , fields: FieldDefaults::default()
        }
    }
}

impl OrchestratorConfig
{   /// Default configuration pointed at `base_url`
    pub fn with_base_url(base_url: impl Into<String>) -> Self
    {   OrchestratorConfig
        {   base_url: base_url.into()
          , ..OrchestratorConfig::default()
        }
    }

    pub fn from_json_str(json: &str)
      -> Result<Self, crate::error::Error>
    {   let config: OrchestratorConfig = serde_json::from_str(json)
          .map_err(|e| {
            crate::error::Error::InvalidConfiguration(e.to_string())
          })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>)
      -> Result<Self, crate::error::Error>
    {   let path = path.as_ref();
        debug!("Loading orchestrator config from {}", path.display());
        let json = fs::read_to_string(path).map_err(|e| {
          crate::error::Error::InvalidConfiguration(
            format!("{}: {}", path.display(), e)
          )
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), crate::error::Error>
    {   let invalid = |msg: &str| {
          Err(crate::error::Error::InvalidConfiguration(
            msg.to_string()
          ))
        };
        if self.base_url.trim().is_empty()
        {   return invalid("base_url is empty");
        }
        if self.contract.endpoint.trim().is_empty()
        {   return invalid("endpoint is empty");
        }
        if self.default_window_size == 0
        {   return invalid("default_window_size must be >= 1");
        }
        if self.default_shingle_size == 0
        {   return invalid("default_shingle_size must be >= 1");
        }
        if self.excerpt_chars == 0
        {   return invalid("excerpt_chars must be >= 1");
        }
        Ok(())
    }

    /// Full URL of the comparison endpoint
    pub fn endpoint_url(&self) -> String
    {   format!(
          "{}/{}",
          self.base_url.trim_end_matches('/'),
          self.contract.endpoint.trim_start_matches('/')
        )
    }
}
