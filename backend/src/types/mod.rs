mod envelope;
mod environment;
mod error;
mod extractors;

pub use envelope::{build_error, Envelope, ErrorBody};
pub use environment::Environment;
pub use error::AppError;
pub use extractors::{ValidatedJson, ValidatedPath};
