//! Comparison input collection and request construction

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use log::{debug, trace};

pub const VALIDATION_MESSAGE: &str
  = "Please enter code in both boxes before comparing.";

/// Raw form values as the user typed them
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompareInput
{   pub code_a: String
  , pub code_b: String
  , /// Window size field, unparsed
    pub window: Option<String>
  , /// Shingle size field, unparsed
    pub shingle: Option<String>
}

impl CompareInput
{   pub fn new(
      code_a: impl Into<String>
    , code_b: impl Into<String>
    ) -> Self
    {   CompareInput
        {   code_a: code_a.into()
          , code_b: code_b.into()
          , window: None
          , shingle: None
        }
    }

    pub fn with_window(mut self, window: impl ToString) -> Self
    {   self.window = Some(window.to_string());
        self
    }

    pub fn with_shingle(mut self, shingle: impl ToString) -> Self
    {   self.shingle = Some(shingle.to_string());
        self
    }
}

/// A validated comparison request. Both snippets are non-empty
/// after trimming.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonRequest
{   pub snippet_a: String
  , pub snippet_b: String
  , pub window_size: u32
  , pub shingle_size: u32
}

impl ComparisonRequest
{   /// Trim, parse and validate the form values
    pub fn from_input(
      input: &CompareInput
    , config: &crate::config::OrchestratorConfig
    ) -> Result<Self, crate::error::Error>
    {   let snippet_a = input.code_a.trim();
        let snippet_b = input.code_b.trim();
        if snippet_a.is_empty() || snippet_b.is_empty()
        {   debug!(
              "Rejecting input: empty snippet (a: {}, b: {})",
              snippet_a.is_empty(), snippet_b.is_empty()
            );
            return Err(crate::error::Error::Validation(
              VALIDATION_MESSAGE.to_string()
            ));
        }

        let window_size = size_param(
          input.window.as_deref(),
          config.default_window_size,
          "Window size"
        )?;
        let shingle_size = size_param(
          input.shingle.as_deref(),
          config.default_shingle_size,
          "Shingle size"
        )?;

        Ok(ComparisonRequest
        {   snippet_a: snippet_a.to_string()
          , snippet_b: snippet_b.to_string()
          , window_size
          , shingle_size
        })
    }

    /// JSON body named according to the wire contract
    pub fn to_wire_body(
      &self
    , contract: &crate::config::WireContract
    ) -> Value
    {   let mut body = Map::new();
        body.insert("codeA".to_string(), Value::from(self.snippet_a.as_str()));
        body.insert("codeB".to_string(), Value::from(self.snippet_b.as_str()));
        body.insert(
          contract.window_field.key().to_string(),
          Value::from(self.window_size)
        );
        if contract.send_shingle
        {   body.insert("k".to_string(), Value::from(self.shingle_size));
        }
        trace!("Wire body keys: {:?}", body.keys().collect::<Vec<_>>());
        Value::Object(body)
    }
}

fn size_param(
  raw: Option<&str>
, default: u32
, label: &str
) -> Result<u32, crate::error::Error>
{   match raw.and_then(parse_leading_int)
    {   None => Ok(default)
      , Some(n) if n >= 1 && n <= u32::MAX as i64 => Ok(n as u32)
      , Some(n) => {
          debug!("{} out of range: {}", label, n);
          Err(crate::error::Error::Validation(
            format!("{} must be a positive integer (got {}).", label, n)
          ))
        }
    }
}

/// Leading-integer parse: skips leading whitespace, accepts an
/// optional sign, then reads digits up to the first non-digit.
/// `None` when no digit follows.
pub fn parse_leading_int(raw: &str) -> Option<i64>
{   let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first()
    {   Some(b'-') => (true, &s[1..])
      , Some(b'+') => (false, &s[1..])
      , _ => (false, s)
    };
    let end = digits
      .find(|c: char| !c.is_ascii_digit())
      .unwrap_or(digits.len());
    if end == 0
    {   return None;
    }
    // saturate instead of failing on absurdly long digit runs
    let magnitude = digits[..end]
      .parse::<i64>()
      .unwrap_or(i64::MAX);
    Some(if negative { -magnitude } else { magnitude })
}

#[cfg(test)]
mod tests
{   use super::*;
    use crate::config::{OrchestratorConfig, WireContract};
    use crate::error::Error;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_empty_or_blank_snippets_rejected()
    {   let config = OrchestratorConfig::default();
        for (a, b) in [("", "x"), ("x", ""), ("  \n\t", "int x;"), ("", "")]
        {   let err = assert_err!(ComparisonRequest::from_input(
              &CompareInput::new(a, b), &config
            ));
            assert_eq!(
              err,
              Error::Validation(VALIDATION_MESSAGE.to_string())
            );
        }
    }

    #[test]
    fn test_snippets_trimmed_and_defaults_applied()
    {   let config = OrchestratorConfig::default();
        let req = assert_ok!(ComparisonRequest::from_input(
          &CompareInput::new("  int a;\n", "\tint b; "),
          &config
        ));
        assert_eq!(req.snippet_a, "int a;");
        assert_eq!(req.snippet_b, "int b;");
        assert_eq!(req.window_size, 4);
        assert_eq!(req.shingle_size, 5);
    }

    #[test]
    fn test_lenient_parameter_parsing()
    {   assert_eq!(parse_leading_int(" 12px"), Some(12));
        assert_eq!(parse_leading_int("+7"), Some(7));
        assert_eq!(parse_leading_int("-3"), Some(-3));
        assert_eq!(parse_leading_int("abc"), None);
        assert_eq!(parse_leading_int(""), None);
        assert_eq!(parse_leading_int("-"), None);

        let config = OrchestratorConfig::default();
        let req = assert_ok!(ComparisonRequest::from_input(
          &CompareInput::new("a", "b")
            .with_window("8 tokens")
            .with_shingle("oops"),
          &config
        ));
        assert_eq!(req.window_size, 8);
        assert_eq!(req.shingle_size, 5);
    }

    #[test]
    fn test_non_positive_window_rejected()
    {   let config = OrchestratorConfig::default();
        let err = assert_err!(ComparisonRequest::from_input(
          &CompareInput::new("a", "b").with_window(0),
          &config
        ));
        assert!(matches!(err, Error::Validation(_)));
        assert_err!(ComparisonRequest::from_input(
          &CompareInput::new("a", "b").with_shingle("-2"),
          &config
        ));
    }

    #[test]
    fn test_wire_body_follows_contract()
    {   let req = ComparisonRequest
        {   snippet_a: "int main(){}".to_string()
          , snippet_b: "int main(){}".to_string()
          , window_size: 4
          , shingle_size: 5
        };

        let body = req.to_wire_body(&WireContract::analyze());
        assert_eq!(
          body,
          serde_json::json!({
            "codeA": "int main(){}",
            "codeB": "int main(){}",
            "w": 4,
            "k": 5
          })
        );

        let body = req.to_wire_body(&WireContract::compare());
        assert_eq!(
          body,
          serde_json::json!({
            "codeA": "int main(){}",
            "codeB": "int main(){}",
            "window": 4
          })
        );
    }
}
