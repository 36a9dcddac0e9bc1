//! Temperature dashboard on top of the dashflow engine.
//!
//! A [`Dashboard`] owns one session: sidebar inputs become parameters and
//! each panel is a computation, so a slider move recomputes only the panels
//! that read it.

pub mod app;
pub mod config;
pub mod dataset;
pub mod error;
pub mod view;

pub use app::{Dashboard, Inputs, Outputs, format_mean};
pub use config::DashboardConfig;
pub use dataset::{Dataset, Reading};
pub use error::{BoardError, BoardResult};
pub use view::{ChartKind, ChartSpec, Point, Rendered, Series, TableView};
