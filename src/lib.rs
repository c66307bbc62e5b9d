// Library interface for DualCrypt
// The CLI binary and the tests drive everything through these modules

pub mod batch;
pub mod codec;
pub mod constants;
pub mod error;
pub mod interactive;
pub mod minify;
pub mod pipeline;
pub mod protect;
pub mod report;
pub mod settings;
pub mod wrapper;

pub use batch::{BatchReport, BatchRequest, CancelFlag, FileOutcome, FileStatus};
pub use codec::Mode;
pub use error::DualCryptError;
pub use pipeline::{transform, EncodedDocument, SourceDocument, TransformConfig};
pub use report::{BatchObserver, RunLog};
pub use settings::Settings;
