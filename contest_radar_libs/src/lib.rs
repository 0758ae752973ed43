pub mod cache;
pub mod cancel;
pub mod fetch;
pub mod ingest;
pub mod normalize;
pub mod platform;
pub mod registry;
pub mod store;
pub mod timeparse;
pub mod types;
pub mod verify;

pub use cancel::CancelToken;
pub use platform::Platform;
pub use types::{Contest, RawRecord, VerificationResult};
