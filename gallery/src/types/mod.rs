mod environment;
mod error;
mod object;

pub use environment::{Environment, ImageSourceKind, DEFAULT_PRESIGNED_URL_EXPIRY_SECS};
pub use error::AppError;
pub use object::{ObjectKey, SignedUrl};
