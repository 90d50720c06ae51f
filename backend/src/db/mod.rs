mod pool;
mod tasks;

pub use pool::*;
pub use tasks::*;
