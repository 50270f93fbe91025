pub mod error;
pub mod identity;
pub mod limits;
pub mod pricing;
pub mod types;

pub use error::{PipelineError, Result};
pub use identity::deal_id;
pub use limits::*;
pub use pricing::{derive_discount, discount_label};
pub use types::*;
