//! Domain models for the sedation flow chart.

mod catalog;
mod derived;
mod fields;
mod flow;
mod patient;
mod record;
mod registry;

pub use catalog::*;
pub use derived::*;
pub use fields::*;
pub use flow::*;
pub use patient::*;
pub use record::*;
pub use registry::*;
