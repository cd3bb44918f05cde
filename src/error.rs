use std::fmt;

/// Custom error type for comparison operations
/// Implements Clone for sending through channels
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error
{   /// Snippets missing or parameters out of range
    Validation(String)
  , /// The HTTP call itself failed (connect, send, body read)
    Transport(String)
  , /// Transport gave up waiting
    Timeout
  , /// Body was not JSON
    MalformedResponse
    {   status: u16
      , excerpt: String
    }
  , /// JSON body, but the backend reported a failure
    LogicalServer
    {   status: u16
      , message: String
      , detail: Option<String>
    }
  , /// Invalid configuration
    InvalidConfiguration(String)
  , /// Generic error
    Other(String)
}

/// Which part of the comparison lifecycle ended a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind
{   Validation
  , Transport
  , MalformedResponse
  , LogicalServer
  , Internal
}

impl Error
{   pub fn kind(&self) -> FailureKind
    {   match self
        {   Error::Validation(_) => FailureKind::Validation
          , Error::Transport(_) | Error::Timeout => {
              FailureKind::Transport
            }
          , Error::MalformedResponse { .. } => {
              FailureKind::MalformedResponse
            }
          , Error::LogicalServer { .. } => FailureKind::LogicalServer
          , Error::InvalidConfiguration(_) | Error::Other(_) => {
              FailureKind::Internal
            }
        }
    }

    /// Text for the status line of the display surface
    pub fn status_line(&self) -> String
    {   match self
        {   Error::Validation(msg) => msg.clone()
          , Error::Transport(reason) => {
              format!("Request failed: {}", reason)
            }
          , Error::Timeout => {
              "Request failed: request timed out".to_string()
            }
          , Error::MalformedResponse { excerpt, .. } => {
              format!(
                "Server returned invalid response:\n{}",
                excerpt
              )
            }
          , Error::LogicalServer { message, .. } => message.clone()
          , Error::InvalidConfiguration(_) | Error::Other(_) => {
              self.to_string()
            }
        }
    }
}

impl fmt::Display for Error
{   fn fmt(&self, f: &mut fmt::Formatter<'_>)
      -> fmt::Result
    {   match self
        {   Error::Validation(msg) => {
              write!(f, "Validation error: {}", msg)
            }
          , Error::Transport(msg) => {
              write!(f, "Transport error: {}", msg)
            }
          , Error::Timeout => {
              write!(f, "Request timed out")
            }
          , Error::MalformedResponse { status, excerpt } => {
              write!(f,
                "Malformed response (HTTP {}): {}",
                status, excerpt
              )
            }
          , Error::LogicalServer { status, message, .. } => {
              write!(f, "Server error (HTTP {}): {}", status, message)
            }
          , Error::InvalidConfiguration(msg) => {
              write!(f, "Invalid configuration: {}", msg)
            }
          , Error::Other(msg) => {
              write!(f, "Error: {}", msg)
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<&str> for Error
{   fn from(s: &str) -> Self
    {   Error::Other(s.to_string())
    }
}

impl From<reqwest::Error> for Error
{   fn from(e: reqwest::Error) -> Self
    {   if e.is_timeout()
        {   Error::Timeout
        } else
        {   Error::Transport(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests
{   use super::*;

    #[test]
    fn test_status_line_per_kind()
    {   let e = Error::Validation("empty".to_string());
        assert_eq!(e.status_line(), "empty");
        assert_eq!(e.kind(), FailureKind::Validation);

        let e = Error::Transport("connection refused".to_string());
        assert_eq!(e.status_line(), "Request failed: connection refused");
        assert_eq!(Error::Timeout.kind(), FailureKind::Transport);

        let e = Error::LogicalServer
        {   status: 500
          , message: "Core process timed out".to_string()
          , detail: None
        };
        assert_eq!(e.status_line(), "Core process timed out");

        let e = Error::MalformedResponse
        {   status: 500
          , excerpt: "Internal Server Error".to_string()
        };
        assert!(e.status_line().ends_with("Internal Server Error"));
        assert_eq!(e.kind(), FailureKind::MalformedResponse);
    }

    #[test]
    fn test_str_converts_to_internal_error()
    {   let e = Error::from("Backend disconnected");
        assert_eq!(e, Error::Other("Backend disconnected".to_string()));
        assert_eq!(e.kind(), FailureKind::Internal);
        assert_eq!(e.status_line(), "Error: Backend disconnected");
    }
}
