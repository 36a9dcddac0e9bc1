pub mod engine;
pub mod telemetry;

pub use engine::{
    Computation, EvalConfig, EvalContext, EvalMetrics, EvalResult, InvalidationPolicy, NodeId, NodeState,
    ParamId, Session, SetOutcome,
};

pub use dashflow_common::{DashError, DashResult, Domain, FromParam, ParamValue};
