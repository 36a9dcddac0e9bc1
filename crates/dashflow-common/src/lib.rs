pub mod domain;
pub mod error;
pub mod value;

pub use domain::*;
pub use error::*;
pub use value::*;
