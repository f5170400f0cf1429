pub mod error;
pub mod errors;
pub mod log;
pub mod net;

pub use error::{ComponentsError, Result};
pub use errors::{new_aggregate, Aggregate, BoxError, StringSet};
