mod dpad;
mod loop_runner;
mod metrics;
mod page;
mod rendering;

pub use loop_runner::{run_app, AppError, LoopConfig};
pub use page::Site;
