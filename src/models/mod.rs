mod lead;
mod offer;
mod payment;
mod transaction;

pub use lead::*;
pub use offer::*;
pub use payment::*;
pub use transaction::*;
