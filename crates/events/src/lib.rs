pub mod bus;
pub mod recovery;
pub mod tx;

pub use bus::*;
pub use recovery::*;
pub use tx::*;
