pub mod context;
pub mod layout;
pub mod operations;

pub use context::{EvalContext, DEFAULT_PARALLEL_THRESHOLD};
pub use layout::DataLayout;
