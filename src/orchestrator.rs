//! Comparison orchestrator: one linear pass per user action
//!
//! Idle -> Validating -> Submitting -> ParsingResponse -> Rendering -> Idle,
//! with any failure going through Failed back to Idle. The orchestrator
//! is the only writer of `UiState`; every change is pushed to the
//! renderer.

use log::{debug, info, warn};

use crate::config::OrchestratorConfig;
use crate::error::Error;
use crate::guard;
use crate::request::{CompareInput, ComparisonRequest};
use crate::transport::Transport;
use crate::ui::{self, Phase, Readouts, Renderer, UiState};

pub struct Orchestrator<T: Transport>
{   config: OrchestratorConfig
  , transport: T
  , renderer: Box<dyn Renderer>
  , state: UiState
}

impl<T: Transport> Orchestrator<T>
{   pub fn new(config: OrchestratorConfig, transport: T) -> Self
    {   debug!("Creating Orchestrator for {}", config.endpoint_url());
        Orchestrator
        {   config
          , transport
          , renderer: Box::new(ui::NullRenderer)
          , state: UiState::default()
        }
    }

    pub fn with_renderer(
      mut self
    , renderer: impl Renderer + 'static
    ) -> Self
    {   self.renderer = Box::new(renderer);
        self
    }

    pub fn state(&self) -> &UiState
    {   &self.state
    }

    pub fn config(&self) -> &OrchestratorConfig
    {   &self.config
    }

    /// Replace the configuration for subsequent comparisons
    pub fn set_config(
      &mut self
    , config: OrchestratorConfig
    ) -> Result<(), Error>
    {   config.validate()?;
        debug!("Config replaced, endpoint now {}", config.endpoint_url());
        self.config = config;
        Ok(())
    }

    /// Run one comparison to completion. Never fails: every outcome
    /// ends in `Idle`, with `last_error` set when the run failed.
    pub async fn compare(&mut self, input: &CompareInput) -> UiState
    {   match self.run(input).await
        {   Ok(()) => {
              info!("Comparison complete: score {}", self.state.readouts.score);
            }
          , Err(e) => {
              warn!("Comparison failed: {}", e);
              self.state.status = e.status_line();
              self.state.progress = ui::PROGRESS_EMPTY;
              self.state.last_error = Some(e);
              self.enter(Phase::Failed);
            }
        }
        self.enter(Phase::Idle);
        self.state.clone()
    }

    async fn run(&mut self, input: &CompareInput) -> Result<(), Error>
    {   self.state.readouts = Readouts::pending();
        self.state.status = ui::RUNNING_MESSAGE.to_string();
        self.state.progress = ui::PROGRESS_EMPTY;
        self.state.last_error = None;
        self.enter(Phase::Validating);

        let request = ComparisonRequest::from_input(input, &self.config)?;
        let body = request.to_wire_body(&self.config.contract);
        let url = self.config.endpoint_url();

        self.state.progress = ui::PROGRESS_STARTED;
        self.enter(Phase::Submitting);
        let raw = self.transport.post_json(&url, &body).await?;

        self.state.progress = ui::PROGRESS_TRANSPORT_DONE;
        self.enter(Phase::ParsingResponse);
        let result = guard::inspect(&raw, &self.config)?;

        let projection = ui::project(&result, &self.config.fields);
        self.state.readouts = projection.readouts;
        self.state.status = projection.status;
        self.state.progress = projection.progress;
        self.enter(Phase::Rendering);
        Ok(())
    }

    fn enter(&mut self, phase: Phase)
    {   debug!("{:?} -> {:?}", self.state.phase, phase);
        self.state.phase = phase;
        self.renderer.render(&self.state);
    }
}
