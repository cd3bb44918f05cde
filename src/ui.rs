//! Observable UI state and projection of results onto it

use serde::Serialize;
use tokio::sync::mpsc;
use log::trace;

use crate::config::FieldDefaults;
use crate::guard::ComparisonResult;

/// Readout text while a comparison is running
pub const PENDING: &str = "…";
pub const RUNNING_MESSAGE: &str
  = "Running similarity engine (Winnowing + AST)…";

// ===== Progress bar fill, percent =====

pub const PROGRESS_EMPTY: u8 = 0;
pub const PROGRESS_STARTED: u8 = 5;
pub const PROGRESS_TRANSPORT_DONE: u8 = 50;
pub const PROGRESS_RESULT_MIN: u8 = 5;
pub const PROGRESS_RESULT_MAX: u8 = 100;

/// Lifecycle phase of the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase
{   Idle
  , Validating
  , Submitting
  , ParsingResponse
  , Rendering
  , Failed
}

/// The eight text readouts of the display surface
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Readouts
{   pub jaccard: String
  , pub edit_sim: String
  , pub struct_sim: String
  , pub score: String
  , pub tokens_a: String
  , pub tokens_b: String
  , pub fps_a: String
  , pub fps_b: String
}

impl Readouts
{   /// Every readout showing the pending placeholder
    pub fn pending() -> Self
    {   let p = || PENDING.to_string();
        Readouts
        {   jaccard: p()
          , edit_sim: p()
          , struct_sim: p()
          , score: p()
          , tokens_a: p()
          , tokens_b: p()
          , fps_a: p()
          , fps_b: p()
        }
    }
}

/// Everything a renderer needs to draw
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UiState
{   pub phase: Phase
  , pub readouts: Readouts
  , pub status: String
  , /// Progress bar fill in [0, 100]
    pub progress: u8
  , /// Error that ended the last run, if it failed
    #[serde(skip)]
    pub last_error: Option<crate::error::Error>
}

impl Default for UiState
{   fn default() -> Self
    {   UiState
        {   phase: Phase::Idle
          , readouts: Readouts::default()
          , status: String::new()
          , progress: PROGRESS_EMPTY
          , last_error: None
        }
    }
}

impl UiState
{   pub fn is_idle(&self) -> bool
    {   self.phase == Phase::Idle
    }

    pub fn failure_kind(&self) -> Option<crate::error::FailureKind>
    {   self.last_error.as_ref().map(|e| e.kind())
    }
}

/// Readouts, status and progress derived from a success payload
#[derive(Debug, Clone, PartialEq)]
pub struct Projection
{   pub readouts: Readouts
  , pub status: String
  , pub progress: u8
}

/// Ratio in [0,1] as a percentage with two decimals, e.g. `"42.00%"`
pub fn format_percent(ratio: f64) -> String
{   format!("{:.2}%", ratio * 100.0)
}

/// `clamp(round(score * 100), 5, 100)`
pub fn progress_for_score(score: f64) -> u8
{   let pct = (score * 100.0).round();
    if pct.is_nan()
    {   return PROGRESS_RESULT_MIN;
    }
    pct.clamp(PROGRESS_RESULT_MIN as f64, PROGRESS_RESULT_MAX as f64) as u8
}

fn format_count(count: Option<u64>, defaults: &FieldDefaults) -> String
{   count
      .map(|c| c.to_string())
      .unwrap_or_else(|| defaults.count_placeholder.clone())
}

/// Map a decoded result onto the display, filling gaps from
/// `defaults`.
pub fn project(
  result: &ComparisonResult
, defaults: &FieldDefaults
) -> Projection
{   let fallback = defaults.ratio_fallback;
    let score = result.overall_score().unwrap_or(fallback);
    trace!("Projecting result, overall score {}", score);

    Projection
    {   readouts: Readouts
        {   jaccard: format_percent(result.jaccard.unwrap_or(fallback))
          , edit_sim: format_percent(result.edit_sim.unwrap_or(fallback))
          , struct_sim: format_percent(
              result.struct_sim.unwrap_or(fallback)
            )
          , score: format_percent(score)
          , tokens_a: format_count(result.tokens_a, defaults)
          , tokens_b: format_count(result.tokens_b, defaults)
          , fps_a: format_count(result.fps_a, defaults)
          , fps_b: format_count(result.fps_b, defaults)
        }
      , status: result.message
          .clone()
          .unwrap_or_else(|| defaults.default_message.clone())
      , progress: progress_for_score(score)
    }
}

/// Draws UI state. Called after every state change.
pub trait Renderer: Send
{   fn render(&mut self, state: &UiState);
}

/// Discards every update
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer
{   fn render(&mut self, _state: &UiState) {}
}

/// Forwards snapshots over a channel, ignoring a dropped receiver
impl Renderer for mpsc::UnboundedSender<UiState>
{   fn render(&mut self, state: &UiState)
    {   let _ = self.send(state.clone());
    }
}
