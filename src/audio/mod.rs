pub mod controller;
pub mod denormals;
pub mod file;
pub mod response;

pub use controller::{ChainController, RecomputePolicy};
pub use response::{ChainState, ResponseHandle};
