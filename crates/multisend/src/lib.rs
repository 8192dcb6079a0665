pub mod codec;
pub mod deployments;

pub use codec::*;
pub use deployments::*;
