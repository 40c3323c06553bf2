//! Two-variant result envelope shared by every network-touching call.
//!
//! Adapters build their results with ordinary `Result` code and convert at
//! the boundary (see [`crate::network::try_connect`]); consumers only ever
//! see a `Response`.

use crate::error::ScraperError;
use std::sync::Arc;

/// Outcome of a fallible fetch or parse.
#[derive(Debug, Clone)]
pub enum Response<T> {
    /// The call produced data.
    Success(T),

    /// The call failed. `message` is user-readable; `cause` keeps the
    /// original error for diagnostics.
    Error {
        message: String,
        cause: Option<Arc<ScraperError>>,
    },
}

impl<T> Response<T> {
    /// Creates an error response from a bare message.
    pub fn error(message: impl Into<String>) -> Self {
        Response::Error {
            message: message.into(),
            cause: None,
        }
    }

    /// Creates an error response carrying its cause.
    pub fn from_error(err: ScraperError) -> Self {
        Response::Error {
            message: err.to_string(),
            cause: Some(Arc::new(err)),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Response::Success(_))
    }

    pub fn is_error(&self) -> bool {
        !self.is_success()
    }

    /// Transforms the success value.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Response<U> {
        match self {
            Response::Success(data) => Response::Success(f(data)),
            Response::Error { message, cause } => Response::Error { message, cause },
        }
    }

    /// Chains another fallible step onto a success value.
    pub fn flat_map<U>(self, f: impl FnOnce(T) -> Response<U>) -> Response<U> {
        match self {
            Response::Success(data) => f(data),
            Response::Error { message, cause } => Response::Error { message, cause },
        }
    }

    /// Transforms only the error branch.
    pub fn flat_map_error(
        self,
        f: impl FnOnce(String, Option<Arc<ScraperError>>) -> Response<T>,
    ) -> Response<T> {
        match self {
            Response::Success(data) => Response::Success(data),
            Response::Error { message, cause } => f(message, cause),
        }
    }

    /// Returns the success value, discarding any error.
    pub fn ok(self) -> Option<T> {
        match self {
            Response::Success(data) => Some(data),
            Response::Error { .. } => None,
        }
    }

    /// Returns the error message, if this is an error.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Response::Success(_) => None,
            Response::Error { message, .. } => Some(message),
        }
    }

    /// Converts into a std `Result` with the message as the error.
    pub fn into_result(self) -> Result<T, String> {
        match self {
            Response::Success(data) => Ok(data),
            Response::Error { message, .. } => Err(message),
        }
    }
}

impl<T> Response<Response<T>> {
    /// Collapses a nested response.
    pub fn flatten(self) -> Response<T> {
        self.flat_map(|inner| inner)
    }
}

impl<T> From<Result<T, ScraperError>> for Response<T> {
    fn from(result: Result<T, ScraperError>) -> Self {
        match result {
            Ok(data) => Response::Success(data),
            Err(err) => Response::from_error(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_and_flat_map() {
        let res: Response<u32> = Response::Success(2);
        assert_eq!(res.clone().map(|n| n * 3).ok(), Some(6));

        let chained = res.flat_map(|n| {
            if n > 1 {
                Response::<u32>::error("too big")
            } else {
                Response::Success(n)
            }
        });
        assert_eq!(chained.error_message(), Some("too big"));
    }

    #[test]
    fn test_map_keeps_error() {
        let res: Response<u32> = Response::from_error(ScraperError::NotFound("x".to_string()));
        let mapped = res.map(|n| n + 1);
        match mapped {
            Response::Error { message, cause } => {
                assert_eq!(message, "Not found: x");
                assert!(cause.is_some());
            }
            Response::Success(_) => panic!("expected error"),
        }
    }

    #[test]
    fn test_flatten() {
        let nested: Response<Response<&str>> = Response::Success(Response::Success("ok"));
        assert_eq!(nested.flatten().ok(), Some("ok"));

        let nested_err: Response<Response<&str>> = Response::Success(Response::error("inner"));
        assert_eq!(nested_err.flatten().error_message(), Some("inner"));
    }

    #[test]
    fn test_flat_map_error_only_touches_errors() {
        let ok: Response<u8> = Response::Success(1);
        let ok = ok.flat_map_error(|_, _| Response::Success(0));
        assert_eq!(ok.ok(), Some(1));

        let err: Response<u8> = Response::error("boom");
        let recovered = err.flat_map_error(|message, _| {
            Response::error(format!("wrapped: {}", message))
        });
        assert_eq!(recovered.error_message(), Some("wrapped: boom"));
    }

    #[test]
    fn test_from_result() {
        let res: Response<u8> = Ok::<u8, ScraperError>(4).into();
        assert!(res.is_success());

        let res: Response<u8> = Err(ScraperError::ParseError("bad".to_string())).into();
        assert!(res.is_error());
        assert_eq!(res.into_result().unwrap_err(), "Failed to parse content: bad");
    }
}
