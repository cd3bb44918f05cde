pub mod error;
pub mod config;
pub mod request;
pub mod transport;
pub mod guard;
pub mod ui;
pub mod orchestrator;
pub mod client;

pub use client::CompareBackend;
pub use config::{OrchestratorConfig, WireContract};
pub use error::{Error, FailureKind};
pub use request::CompareInput;
pub use ui::{Phase, UiState};

/*

simcmp is the async client side of a code-similarity tool: it
takes two snippets plus winnowing parameters, posts them to a
similarity backend, and turns whatever comes back into UI state.

simcmp/
├── Cargo.toml
├── src/
│   ├── lib.rs           # Channel API and re-exports
│   ├── error.rs         # Error type and failure kinds
│   ├── config.rs        # Endpoint, naming policy, field defaults
│   ├── request.rs       # Input collection and request body
│   ├── transport/       # Transport trait and reqwest impl
│   ├── guard.rs         # Text-first response decoding
│   ├── ui.rs            # UiState, projection, Renderer
│   ├── orchestrator.rs  # The comparison state machine
│   └── client.rs        # Task-owning backend
└── tests/               # Against a fake backend

*/

/// SIMCMP API INTERFACE:

// ===== Compare =====

/// Final UI state of the run; failures are carried inside it
pub type CompareReply = crate::ui::UiState;
pub type CompareReplySender
  = tokio::sync::mpsc::UnboundedSender<CompareReply>;

pub struct CompareArgs
{   pub input: crate::request::CompareInput
  , pub reply: CompareReplySender
}

// ===== SetConfig =====

pub type SetConfigReply = Result<(), crate::error::Error>;
pub type SetConfigReplySender
  = tokio::sync::mpsc::UnboundedSender<SetConfigReply>;

pub struct SetConfigArgs
{   pub config: crate::config::OrchestratorConfig
  , pub reply: SetConfigReplySender
}

// ===== GetState =====

pub type GetStateReply
  = Result<crate::ui::UiState, crate::error::Error>;
pub type GetStateReplySender
  = tokio::sync::mpsc::UnboundedSender<GetStateReply>;

pub struct GetStateArgs
{   pub reply: GetStateReplySender
}

// ===== KillProcess =====

pub type KillProcessReply = Result<(), crate::error::Error>;
pub type KillProcessReplySender
  = tokio::sync::mpsc::UnboundedSender<KillProcessReply>;

pub struct KillProcessArgs
{   pub reply: KillProcessReplySender
}

// ===== HandlerCommand =====

/// Union of all commands the backend task executes, in the order
/// they were sent
pub enum HandlerCommand
{   Compare(CompareArgs)
  , SetConfig(SetConfigArgs)
  , GetState(GetStateArgs)
  , KillProcess(KillProcessArgs)
}

// ===== CompareHand (sender side) =====

pub struct CompareHand
{   pub command_tx
      : tokio::sync::mpsc::UnboundedSender<HandlerCommand>
}

// ===== CompareFoot (receiver side) =====

pub struct CompareFoot
{   pub command_rx
      : tokio::sync::mpsc::UnboundedReceiver<HandlerCommand>
}
