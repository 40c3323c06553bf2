//! The single boundary where failures become [`Response::Error`] values.

use crate::error::ScraperError;
use crate::response::Response;
use futures::FutureExt;
use std::any::Any;
use std::error::Error as _;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// Runs `call` and funnels its error (or panic) into a classified `Response`.
///
/// `extra_error_info` is context shown to the user next to the failure,
/// typically the URL or the operation being attempted.
pub async fn try_connect<T, F>(extra_error_info: &str, call: F) -> Response<T>
where
    F: Future<Output = Result<T, ScraperError>>,
{
    let response = match AssertUnwindSafe(call).catch_unwind().await {
        Ok(result) => Response::from(result),
        Err(panic) => Response::from_error(ScraperError::Unexpected(panic_message(panic))),
    };
    specify_network_errors(response, extra_error_info)
}

/// Like [`try_connect`] for calls that already produce a `Response`.
pub async fn try_flat_connect<T, F>(extra_error_info: &str, call: F) -> Response<T>
where
    F: Future<Output = Result<Response<T>, ScraperError>>,
{
    let response = match AssertUnwindSafe(call).catch_unwind().await {
        Ok(result) => Response::from(result).flatten(),
        Err(panic) => Response::from_error(ScraperError::Unexpected(panic_message(panic))),
    };
    specify_network_errors(response, extra_error_info)
}

/// Builds the request URL inside the [`try_connect`] boundary, so a URL that
/// fails to build is reported like any other failed call.
///
/// The built URL is the error context; `fallback_info` stands in when there
/// is none.
pub async fn try_connect_url<T, F, Fut>(
    url: Result<String, ScraperError>,
    fallback_info: &str,
    fetch: F,
) -> Response<T>
where
    F: FnOnce(String) -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let info = url.as_ref().map_or(fallback_info, String::as_str).to_string();
    try_connect(&info, async move { fetch(url?).await }).await
}

fn specify_network_errors<T>(response: Response<T>, extra_error_info: &str) -> Response<T> {
    response.flat_map_error(|message, cause| {
        let info = if extra_error_info.trim().is_empty() {
            "No info"
        } else {
            extra_error_info
        };

        let detail = match &cause {
            Some(cause) if cause.is_timeout() => {
                ["Timeout error.", "", "Info:", info, "", "Message:", message.as_str()].join("\n")
            }
            Some(cause) => {
                let trace = source_chain(cause);
                [
                    "Unknown error.",
                    "",
                    "Info:",
                    info,
                    "",
                    "Message:",
                    message.as_str(),
                    "",
                    "Stacktrace:",
                    trace.as_str(),
                ]
                .join("\n")
            }
            None => ["Unknown error.", "", "Info:", info, "", "Message:", message.as_str()].join("\n"),
        };

        match &cause {
            Some(cause) => tracing::warn!(context = info, error = %cause, "request failed"),
            None => tracing::warn!(context = info, error = %message, "request failed"),
        }
        Response::Error {
            message: detail,
            cause,
        }
    })
}

/// Renders the error and every `source()` below it, one per line.
fn source_chain(err: &Arc<ScraperError>) -> String {
    let mut lines = vec![format!("{:?}", err)];
    let mut current = err.source();
    while let Some(source) = current {
        lines.push(format!("Caused by: {}", source));
        current = source.source();
    }
    lines.join("\n")
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_success_passes_through() {
        let res = try_connect("ctx", async { Ok::<_, ScraperError>(5) }).await;
        assert_eq!(res.ok(), Some(5));
    }

    #[tokio::test]
    async fn test_timeout_is_classified() {
        let res: Response<()> = try_connect("https://example.com/novel", async {
            Err(ScraperError::Timeout("read timed out".to_string()))
        })
        .await;

        let message = res.error_message().unwrap();
        assert!(message.starts_with("Timeout error."));
        assert!(message.contains("https://example.com/novel"));
        assert!(message.contains("read timed out"));
        assert!(!message.contains("Stacktrace:"));
    }

    #[tokio::test]
    async fn test_unknown_error_has_message_and_trace() {
        let res: Response<()> = try_connect("catalog page 2", async {
            Err(ScraperError::ElementNotFound("div.list".to_string()))
        })
        .await;

        let message = res.error_message().unwrap();
        assert!(message.starts_with("Unknown error."));
        assert!(message.contains("catalog page 2"));
        assert!(message.contains("Element not found: div.list"));
        assert!(message.contains("Stacktrace:"));
        assert!(message.contains("ElementNotFound"));
    }

    #[tokio::test]
    async fn test_blank_info_placeholder() {
        let res: Response<()> =
            try_connect("  ", async { Err(ScraperError::NotFound("x".to_string())) }).await;
        assert!(res.error_message().unwrap().contains("No info"));
    }

    #[tokio::test]
    async fn test_panic_is_caught() {
        let res: Response<u8> = try_connect("panicky", async {
            let missing: Option<u8> = None;
            Ok(missing.expect("content node"))
        })
        .await;

        let message = res.error_message().unwrap();
        assert!(message.contains("Unexpected failure"));
        assert!(message.contains("content node"));
    }

    #[tokio::test]
    async fn test_flat_connect_flattens_inner_error() {
        let res: Response<u8> = try_flat_connect("flat", async {
            Ok(Response::from_error(ScraperError::Timeout("slow".to_string())))
        })
        .await;
        assert!(res.error_message().unwrap().starts_with("Timeout error."));

        let res: Response<u8> = try_flat_connect("flat", async { Ok(Response::Success(1)) }).await;
        assert_eq!(res.ok(), Some(1));
    }

    #[tokio::test]
    async fn test_flat_connect_tags_causeless_error() {
        let res: Response<u8> =
            try_flat_connect("chapter list", async { Ok(Response::error("no chapters block")) }).await;

        let message = res.error_message().unwrap();
        assert!(message.starts_with("Unknown error."));
        assert!(message.contains("chapter list"));
        assert!(message.contains("no chapters block"));
        assert!(!message.contains("Stacktrace:"));
    }

    #[tokio::test]
    async fn test_url_build_failure_goes_through_boundary() {
        let res: Response<u8> = try_connect_url(
            Err(ScraperError::InvalidUrl("relative URL without a base".to_string())),
            "https://example.com/catalog",
            |_| async { Ok(1) },
        )
        .await;

        let message = res.error_message().unwrap();
        assert!(message.starts_with("Unknown error."));
        assert!(message.contains("https://example.com/catalog"));
        assert!(message.contains("relative URL without a base"));

        let res = try_connect_url(Ok("https://example.com/p2".to_string()), "unused", |url| async move {
            Ok::<_, ScraperError>(url)
        })
        .await;
        assert_eq!(res.ok().as_deref(), Some("https://example.com/p2"));
    }
}
