mod api_error;

pub use api_error::{ApiError, ApiErrorKind, API_ERROR_MESSAGE};
