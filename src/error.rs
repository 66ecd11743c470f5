use reqwest::StatusCode;
use thiserror::Error;

/// Errors raised by the remote adapters (Notion and Canvas) and by the
/// class-label lookup.
#[derive(Error, Debug)]
pub enum Error {
    /// The request never produced a response (network, tls, timeout, decoding).
    #[error("request to {service} failed: {source}")]
    Transport {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-success status.
    #[error("{service} answered {status}: {body}")]
    Api {
        service: &'static str,
        status: StatusCode,
        body: String,
    },

    /// A record or the database schema lacks a field we rely on.
    #[error("{record} is missing the `{field}` field")]
    SchemaMismatch { record: String, field: String },

    /// Creating a page in the task store failed.
    #[error("failed to create task `{name}`: {source}")]
    RemoteWrite {
        name: String,
        #[source]
        source: Box<Error>,
    },

    /// A course label has no entry in the class mapping, even after
    /// stripping the trailing teacher name.
    #[error("no class label configured for course `{course}`")]
    ClassLabelResolution { course: String },
}

impl Error {
    pub(crate) fn transport(service: &'static str) -> impl FnOnce(reqwest::Error) -> Self {
        move |source| Self::Transport { service, source }
    }

    pub(crate) fn schema(record: impl Into<String>, field: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            record: record.into(),
            field: field.into(),
        }
    }
}

/// Checks the status of a response, turning failures into [`Error::Api`].
pub(crate) async fn check_status(
    service: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, Error> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(Error::Api {
        service,
        status,
        body,
    })
}
