mod match_queue;
mod registry;
mod session_table;

pub use match_queue::*;
pub use registry::*;
pub use session_table::*;
