//! View state controller: pure reducer transitions, a single-slot debounce timer and
//! the effect runner that turns reducer effects into cancellable API calls.

pub mod debounce;
pub mod runner;
pub mod state;

pub use runner::Controller;
pub use state::{
    page_count, risk_snapshot, Action, Effect, Lane, LanePhase, RiskSnapshot, ViewConfig,
    ViewState, VisibleError,
};
