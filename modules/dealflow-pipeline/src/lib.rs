pub mod affiliate;
pub mod catalog;
pub mod classifier;
pub mod config;
pub mod intake;
pub mod pipeline;
pub mod resolver;
pub mod store;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;

pub use affiliate::{AffiliateConverter, AffiliateSettings, Conversion, ConversionMethod, RemoteMode};
pub use classifier::{Classifier, ClassifierError};
pub use config::AppConfig;
pub use pipeline::{LinkTrail, Phase, Pipeline, ProcessedDeal, RunStats};
pub use store::DealStore;
