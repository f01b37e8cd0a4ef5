//! Game session state machine

pub mod applier;
pub mod captures;
pub mod clock;
pub mod controller;
pub mod prompt;
pub mod replay;
pub mod resume;
pub mod status;

pub use applier::{apply_move, AppliedMove};
pub use captures::CapturedPieces;
pub use clock::{Clock, ClockState, ClockValue, TimeControl};
pub use controller::{
    Listener, SaveRequest, SaveTarget, SessionController, SessionEvent, SessionState, TerminalKind,
};
pub use prompt::{ActionVariant, ConfirmationPrompt, PromptAction, SessionAction};
pub use replay::ReplayViewer;
pub use resume::{replay_history, split_moves, Replayed, ResumeParams};
pub use status::{evaluate, side_name, GameOverReason, GameStatus};
