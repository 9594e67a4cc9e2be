pub mod chain;
pub mod coefficients;
pub mod design;
pub mod parameters;
pub mod stages;

pub use chain::{ChainCoefficients, ChannelChain};
pub use parameters::{ChainParameters, ParameterId, ParameterSnapshot, Slope};
