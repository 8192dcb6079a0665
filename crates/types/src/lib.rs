pub mod abi;
pub mod address;
pub mod pending;
pub mod tx;
pub mod version;

pub use abi::*;
pub use address::*;
pub use pending::*;
pub use tx::*;
pub use version::*;
