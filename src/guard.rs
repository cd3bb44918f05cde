//! Response guard: the backend's body is untrusted text until it
//! decodes, and every field read from it has a fallback.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use log::{debug, warn, error};

use crate::transport::RawServerResponse;

/// Decoded success payload. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult
{   pub jaccard: Option<f64>
  , pub edit_sim: Option<f64>
  , pub struct_sim: Option<f64>
  , /// Overall score, `jaccard` when absent
    pub score: Option<f64>
  , pub tokens_a: Option<u64>
  , pub tokens_b: Option<u64>
  , pub fps_a: Option<u64>
  , pub fps_b: Option<u64>
  , pub message: Option<String>
}

impl ComparisonResult
{   /// Read whatever fields are usable. Non-objects yield an
    /// all-absent result.
    pub fn from_value(value: &Value) -> Self
    {   let Some(obj) = value.as_object() else
        {   warn!("Success payload is not a JSON object, using fallbacks");
            return ComparisonResult::default();
        };
        let result = ComparisonResult
        {   jaccard: ratio(obj, "jaccard")
          , edit_sim: ratio(obj, "editSim")
          , struct_sim: ratio(obj, "structSim")
          , score: ratio(obj, "score")
          , tokens_a: counter(obj, "tokensA")
          , tokens_b: counter(obj, "tokensB")
          , fps_a: counter(obj, "fpsA")
          , fps_b: counter(obj, "fpsB")
          , message: obj.get("message")
              .and_then(Value::as_str)
              .filter(|m| !m.is_empty())
              .map(str::to_string)
        };
        if result.missing_fields() > 0
        {   debug!(
              "Success payload missing {} field(s)",
              result.missing_fields()
            );
        }
        result
    }

    /// Raw overall score: `score`, else `jaccard`
    pub fn overall_score(&self) -> Option<f64>
    {   self.score.or(self.jaccard)
    }

    fn missing_fields(&self) -> usize
    {   [self.jaccard, self.edit_sim, self.struct_sim, self.score]
          .iter()
          .filter(|v| v.is_none())
          .count()
        + [self.tokens_a, self.tokens_b, self.fps_a, self.fps_b]
          .iter()
          .filter(|v| v.is_none())
          .count()
    }
}

/// Numbers and numeric strings, like the counters
fn ratio(obj: &Map<String, Value>, key: &str) -> Option<f64>
{   match obj.get(key)?
    {   Value::Number(n) => n.as_f64()
      , Value::String(s) => s.trim().parse::<f64>().ok()
      , _ => None
    }
    .filter(|v| v.is_finite())
}

fn counter(obj: &Map<String, Value>, key: &str) -> Option<u64>
{   match obj.get(key)?
    {   Value::Number(n) => {
          n.as_u64().or_else(|| {
            n.as_f64()
              .filter(|f| *f >= 0.0 && f.fract() == 0.0)
              .map(|f| f as u64)
          })
        }
      , Value::String(s) => s.trim().parse::<u64>().ok()
      , _ => None
    }
}

/// The backend's `error` field, if it signals a failure
fn error_indicator(value: &Value) -> Option<String>
{   match value.as_object()?.get("error")?
    {   Value::Null | Value::Bool(false) => None
      , Value::String(s) if s.is_empty() => None
      , Value::String(s) => Some(s.clone())
      , Value::Number(n) if n.as_f64() == Some(0.0) => None
      , other => Some(other.to_string())
    }
}

/// Extra diagnostics some backends attach to an error
fn error_detail(value: &Value) -> Option<String>
{   let obj = value.as_object()?;
    ["stderr", "raw"]
      .iter()
      .filter_map(|key| obj.get(*key).and_then(Value::as_str))
      .find(|s| !s.trim().is_empty())
      .map(str::to_string)
}

/// First `max_chars` characters of `text`
pub fn excerpt(text: &str, max_chars: usize) -> String
{   text.chars().take(max_chars).collect()
}

/// Classify a raw response as success, malformed, or a logical
/// server error.
pub fn inspect(
  raw: &RawServerResponse
, config: &crate::config::OrchestratorConfig
) -> Result<ComparisonResult, crate::error::Error>
{   let value: Value = match serde_json::from_str(&raw.body)
    {   Ok(v) => v
      , Err(e) => {
          error!(
            "Non-JSON response (HTTP {}): {}",
            raw.status, e
          );
          return Err(crate::error::Error::MalformedResponse
          {   status: raw.status
            , excerpt: excerpt(&raw.body, config.excerpt_chars)
          });
        }
    };

    let indicator = error_indicator(&value);
    if !raw.is_success() || indicator.is_some()
    {   let detail = error_detail(&value);
        error!(
          "Backend reported failure (HTTP {}): {:?}",
          raw.status, indicator
        );
        if let Some(d) = &detail
        {   debug!("Backend error detail: {}", d);
        }
        return Err(crate::error::Error::LogicalServer
        {   status: raw.status
          , message: indicator.unwrap_or_else(|| {
              config.fields.server_error_fallback.clone()
            })
          , detail
        });
    }

    Ok(ComparisonResult::from_value(&value))
}
