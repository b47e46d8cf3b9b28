//! Unified error type.

use thiserror::Error;

/// The error type returned by rendra's fallible operations.
///
/// Application-level outcomes (404, 401, etc.) are expressed as HTTP
/// [`Response`](crate::Response) values, not as `Error`s. This type surfaces
/// infrastructure and configuration failures: binding a port, resolving a
/// service, or talking to the layout service.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("http client: {0}")]
    Http(#[from] reqwest::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    /// A handler factory asked for a service nobody registered.
    #[error("required service `{0}` is not registered")]
    MissingService(&'static str),

    #[error("no layout handler named `{0}`")]
    UnknownHandler(String),

    #[error("no default layout handler configured")]
    NoDefaultHandler,

    #[error("layout service responded with status {status}")]
    LayoutService { status: u16 },

    #[error("graphql: {0}")]
    GraphQl(String),

    #[error("invalid editing request: {0}")]
    InvalidEditingRequest(String),
}

/// Shorthand for `Result<T, rendra::Error>`.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_missing_service() {
        let err = Error::MissingService("GraphQlClientFactory");
        assert_eq!(err.to_string(), "required service `GraphQlClientFactory` is not registered");
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::AddrInUse, "taken");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
