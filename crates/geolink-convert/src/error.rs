use serde::Serialize;
use thiserror::Error;

/// Terminal failure categories surfaced to the user.
///
/// Every failed conversion carries exactly one of these; the message text
/// is the user-facing category, detail lives in the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionError {
    #[error("nothing to convert: the shared text was empty")]
    MissingInput,

    #[error("no supported map service recognized the shared text")]
    UnsupportedService,

    #[error("network access was declined")]
    PermissionDenied,

    #[error("the short link could not be resolved")]
    Unshorten,

    #[error("the short link could not be resolved: connection failed")]
    UnshortenConnection,

    #[error("the link matched a service but carried no location")]
    ParseUrl,

    #[error("the page did not contain a location")]
    ParseHtml,

    #[error("the page could not be downloaded: connection failed")]
    ParseHtmlConnection,

    #[error("the conversion was cancelled")]
    Cancelled,
}
