use thiserror::Error;

#[derive(Debug, Error)]
pub enum JwError {
    #[error("request to {url} failed: {message}")]
    RequestFailed { url: String, message: String },
    #[error("server returned HTTP {status} for {url}")]
    BadStatus { status: u16, url: String },
    #[error("malformed response from {url}: {message}")]
    MalformedResponse { url: String, message: String },
    #[error("terminal error: {message}")]
    Terminal { message: String },
}
