use tokio::sync::mpsc;
use log::{debug, error, info, warn};
use crate::{CompareFoot, HandlerCommand};
use crate::orchestrator::Orchestrator;
use crate::transport::{HttpTransport, Transport};
use crate::ui::{self, Phase, UiState};

/// Public API for the comparison backend - owns the task.
///
/// All commands share one queue and run in the order they were
/// sent, so a compare issued while another is in flight waits for
/// it, and a `set_config` applies to every compare queued after it.
pub struct CompareBackend
{   hand: crate::CompareHand
  , _task_handle: tokio::task::JoinHandle<()>
}

impl CompareBackend
{   /// Create and spawn a backend talking HTTP to `config.base_url`.
    /// `timeout_secs` is fixed here; later `set_config` calls do not
    /// rebuild the HTTP client.
    pub fn new(
      config: crate::config::OrchestratorConfig
    , render_tx: Option<mpsc::UnboundedSender<UiState>>
    ) -> Result<Self, crate::error::Error>
    {   config.validate()?;
        let transport = HttpTransport::from_config(&config)?;
        Ok(Self::with_transport(config, transport, render_tx))
    }

    /// Create and spawn a backend over any transport
    pub fn with_transport<T: Transport + 'static>(
      config: crate::config::OrchestratorConfig
    , transport: T
    , render_tx: Option<mpsc::UnboundedSender<UiState>>
    ) -> Self
    {   debug!("Creating CompareBackend with task ownership");

        let (command_tx, command_rx)
          = mpsc::unbounded_channel();

        let hand = crate::CompareHand { command_tx };
        let foot = crate::CompareFoot { command_rx };

        let mut orchestrator = Orchestrator::new(config, transport);
        if let Some(tx) = render_tx
        {   orchestrator = orchestrator.with_renderer(tx);
        }

        let _task_handle = tokio::spawn(async move {
          run_backend_loop(foot, orchestrator).await
        });

        CompareBackend
        {   hand
          , _task_handle
        }
    }

    fn send(&self, cmd: HandlerCommand)
      -> Result<(), crate::error::Error>
    {   self.hand.command_tx
          .send(cmd)
          .map_err(|_| {
            error!("Backend channel closed");
            crate::error::Error::from("Backend disconnected")
          })
    }

    /// Queue a comparison - returns almost immediately
    pub async fn compare(
      &self
    , input: crate::request::CompareInput
    ) -> Result<
        mpsc::UnboundedReceiver<crate::CompareReply>,
        crate::error::Error
      >
    {   debug!("compare queuing command");
        let (reply_tx, reply_rx)
          = mpsc::unbounded_channel();

        self.send(HandlerCommand::Compare(crate::CompareArgs
        {   input
          , reply: reply_tx
        }))?;

        Ok(reply_rx)
    }

    /// Replace the configuration - returns almost immediately
    pub async fn set_config(
      &self
    , config: crate::config::OrchestratorConfig
    ) -> Result<
        mpsc::UnboundedReceiver<crate::SetConfigReply>,
        crate::error::Error
      >
    {   debug!("set_config queuing for {}", config.endpoint_url());
        let (reply_tx, reply_rx)
          = mpsc::unbounded_channel();

        self.send(HandlerCommand::SetConfig(crate::SetConfigArgs
        {   config
          , reply: reply_tx
        }))?;

        Ok(reply_rx)
    }

    /// Snapshot of the UI state once earlier commands have run
    pub async fn get_state(
      &self
    ) -> Result<
        mpsc::UnboundedReceiver<crate::GetStateReply>,
        crate::error::Error
      >
    {   debug!("get_state queuing command");
        let (reply_tx, reply_rx)
          = mpsc::unbounded_channel();

        self.send(HandlerCommand::GetState(crate::GetStateArgs
        {   reply: reply_tx
        }))?;

        Ok(reply_rx)
    }

    /// Gracefully shutdown the backend. Compares queued before this
    /// call still run to completion.
    pub async fn shutdown(self)
      -> Result<(), crate::error::Error>
    {   debug!("Shutting down CompareBackend");
        let (reply_tx, mut reply_rx)
          = mpsc::unbounded_channel();

        self.send(HandlerCommand::KillProcess(crate::KillProcessArgs
        {   reply: reply_tx
        }))
          .map_err(|_| {
            crate::error::Error::from("Backend already shutdown")
          })?;

        // Wait for shutdown confirmation
        if let Some(result) = reply_rx.recv().await
        {   debug!("Backend shutdown confirmed");
            result
        } else
        {   error!("Backend exited without confirming shutdown");
            Err(crate::error::Error::from(
              "Backend exited without confirming shutdown"
            ))
        }
    }
}

/// Final state handed to a compare that arrived after shutdown
fn shut_down_state() -> UiState
{   let err = crate::error::Error::from("Backend shut down");
    UiState
    {   phase: Phase::Idle
      , readouts: ui::Readouts::default()
      , status: err.status_line()
      , progress: ui::PROGRESS_EMPTY
      , last_error: Some(err)
    }
}

/// Main backend event loop
///
/// Commands are taken one at a time from a single queue and each
/// runs to completion before the next, keeping comparisons strictly
/// sequential and in submission order.
async fn run_backend_loop<T: Transport>(
  foot: crate::CompareFoot
, mut orchestrator: Orchestrator<T>
)
{   debug!("Starting CompareBackend event loop");
    let CompareFoot { mut command_rx } = foot;

    while let Some(cmd) = command_rx.recv().await
    { match cmd
      {   HandlerCommand::Compare(cmd) => {
            debug!("Received Compare");
            let state = orchestrator.compare(&cmd.input).await;
            let _ = cmd.reply.send(state);
          }
        , HandlerCommand::SetConfig(cmd) => {
            debug!("Received SetConfig");
            let _ = cmd.reply.send(orchestrator.set_config(cmd.config));
          }
        , HandlerCommand::GetState(cmd) => {
            debug!("Received GetState");
            let _ = cmd.reply.send(Ok(orchestrator.state().clone()));
          }
        , HandlerCommand::KillProcess(cmd) => {
            debug!("Received KillProcess");
            let _ = cmd.reply.send(Ok(()));
            info!("CompareBackend shutting down");
            break;
          }
      }
    }

    // answer anything that slipped in behind the shutdown
    command_rx.close();
    while let Ok(cmd) = command_rx.try_recv()
    {   warn!("Rejecting command received after shutdown");
        match cmd
        {   HandlerCommand::Compare(cmd) => {
              let _ = cmd.reply.send(shut_down_state());
            }
          , HandlerCommand::SetConfig(cmd) => {
              let _ = cmd.reply.send(Err(
                crate::error::Error::from("Backend shut down")
              ));
            }
          , HandlerCommand::GetState(cmd) => {
              let _ = cmd.reply.send(Err(
                crate::error::Error::from("Backend shut down")
              ));
            }
          , HandlerCommand::KillProcess(cmd) => {
              let _ = cmd.reply.send(Err(
                crate::error::Error::from("Backend already shutdown")
              ));
            }
        }
    }
}

#[cfg(test)]
mod tests
{   use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use async_trait::async_trait;
    use serde_json::Value;
    use tokio_test::assert_ok;
    use crate::config::{OrchestratorConfig, WireContract};
    use crate::error::Error;
    use crate::request::CompareInput;
    use crate::transport::RawServerResponse;

    /// Slow transport recording every posted body
    #[derive(Clone, Default)]
    struct SlowTransport
    {   bodies: Arc<Mutex<Vec<Value>>>
    }

    #[async_trait]
    impl Transport for SlowTransport
    {   async fn post_json(
          &self
        , _url: &str
        , body: &Value
        ) -> Result<RawServerResponse, Error>
        {   tokio::time::sleep(Duration::from_millis(30)).await;
            self.bodies.lock().unwrap().push(body.clone());
            Ok(RawServerResponse::new(200, r#"{"jaccard":0.5}"#))
        }
    }

    #[tokio::test]
    async fn test_set_config_applies_to_next_queued_compare()
    {   let transport = SlowTransport::default();
        let bodies = transport.bodies.clone();
        let backend = CompareBackend::with_transport(
          OrchestratorConfig::default(),
          transport,
          None
        );

        let mut first = assert_ok!(
          backend.compare(CompareInput::new("a", "b")).await
        );
        let mut config_reply = assert_ok!(backend.set_config(
          OrchestratorConfig
          {   contract: WireContract::compare()
            , ..OrchestratorConfig::default()
          }
        ).await);
        let mut second = assert_ok!(
          backend.compare(CompareInput::new("a", "b")).await
        );

        assert!(first.recv().await.is_some());
        assert_eq!(config_reply.recv().await, Some(Ok(())));
        assert!(second.recv().await.is_some());

        let bodies = bodies.lock().unwrap().clone();
        assert_eq!(bodies.len(), 2);
        assert!(bodies[0].get("w").is_some());
        assert!(bodies[1].get("window").is_some());
        assert!(bodies[1].get("w").is_none());
        assert_ok!(backend.shutdown().await);
    }

    #[tokio::test]
    async fn test_shutdown_finishes_queued_compares()
    {   let backend = CompareBackend::with_transport(
          OrchestratorConfig::default(),
          SlowTransport::default(),
          None
        );

        let mut first = assert_ok!(
          backend.compare(CompareInput::new("a", "b")).await
        );
        let mut second = assert_ok!(
          backend.compare(CompareInput::new("c", "d")).await
        );
        assert_ok!(backend.shutdown().await);

        for rx in [&mut first, &mut second]
        {   let state = rx.recv().await.expect("final state");
            assert!(state.is_idle());
            assert_eq!(state.last_error, None);
            assert_eq!(state.readouts.score, "50.00%");
        }
    }

    #[tokio::test]
    async fn test_get_state_waits_for_queued_compare()
    {   let backend = CompareBackend::with_transport(
          OrchestratorConfig::default(),
          SlowTransport::default(),
          None
        );

        let _compare = assert_ok!(
          backend.compare(CompareInput::new("a", "b")).await
        );
        let mut state_rx = assert_ok!(backend.get_state().await);
        let state = assert_ok!(state_rx.recv().await.expect("state"));
        assert_eq!(state.readouts.score, "50.00%");
        assert_ok!(backend.shutdown().await);
    }

    #[tokio::test]
    async fn test_command_after_shutdown_gets_final_state()
    {   let (command_tx, command_rx) = mpsc::unbounded_channel();
        let orchestrator = Orchestrator::new(
          OrchestratorConfig::default(),
          SlowTransport::default()
        );

        let (kill_tx, mut kill_rx) = mpsc::unbounded_channel();
        let (late_tx, mut late_rx) = mpsc::unbounded_channel();
        assert_ok!(command_tx.send(HandlerCommand::KillProcess(
          crate::KillProcessArgs { reply: kill_tx }
        )));
        assert_ok!(command_tx.send(HandlerCommand::Compare(
          crate::CompareArgs
          {   input: CompareInput::new("a", "b")
            , reply: late_tx
          }
        )));

        run_backend_loop(crate::CompareFoot { command_rx }, orchestrator)
          .await;

        assert_eq!(kill_rx.recv().await, Some(Ok(())));
        let state = late_rx.recv().await.expect("final state");
        assert!(state.is_idle());
        assert_eq!(
          state.last_error,
          Some(Error::Other("Backend shut down".to_string()))
        );
    }
}
