//! Meta crate that re-exports the dashflow layers with sensible defaults.
//! Depend on this crate and opt into layers via feature flags; the
//! underlying crates stay reachable for deeper integration.

#[cfg(feature = "common")]
pub use dashflow_common as common;

#[cfg(feature = "eval")]
pub use dashflow_eval as eval;

#[cfg(feature = "board")]
pub use dashflow_board as board;

#[cfg(feature = "eval")]
pub use dashflow_eval::{
    Computation, DashError, DashResult, Domain, EvalConfig, EvalContext, InvalidationPolicy,
    ParamId, ParamValue, Session,
};

#[cfg(feature = "board")]
pub use dashflow_board::{Dashboard, DashboardConfig, Dataset};

#[cfg(feature = "eval")]
pub mod doc_examples;
