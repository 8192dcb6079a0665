pub mod builder;
pub mod owners;
pub mod propose;
pub mod signing;

pub use builder::*;
pub use owners::*;
pub use propose::*;
pub use signing::*;
