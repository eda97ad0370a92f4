//! Error type shared by the measurement engine and the binary.
//!
//! Every failure carries an [`ErrorKind`], which decides the process exit
//! code and the hint shown to the user.

use hickory_resolver::error::ResolveError;
use std::error::Error;
use std::fmt;
use std::io;

/// Process exit codes.
pub mod exit_codes {
    /// Connect, DNS, TLS or timeout failure.
    pub const NETWORK_ERROR: i32 = 1;
    /// The server answered with an error status or an unreadable body.
    pub const API_ERROR: i32 = 2;
    /// Invalid arguments or session configuration.
    pub const CONFIG_ERROR: i32 = 3;
    /// A measurement could not be completed.
    pub const MEASUREMENT_ERROR: i32 = 4;
    pub const UNKNOWN_ERROR: i32 = 99;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Dns,
    Timeout,
    Tls,
    /// Error status or malformed response from the server
    Api,
    Config,
    /// Orchestration failure, e.g. an upload worker that panicked
    Measurement,
    Unknown,
}

impl ErrorKind {
    pub fn exit_code(&self) -> i32 {
        match self {
            ErrorKind::Network | ErrorKind::Dns | ErrorKind::Timeout | ErrorKind::Tls => {
                exit_codes::NETWORK_ERROR
            }
            ErrorKind::Api => exit_codes::API_ERROR,
            ErrorKind::Config => exit_codes::CONFIG_ERROR,
            ErrorKind::Measurement => exit_codes::MEASUREMENT_ERROR,
            ErrorKind::Unknown => exit_codes::UNKNOWN_ERROR,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ErrorKind::Network => "Network error",
            ErrorKind::Dns => "DNS resolution error",
            ErrorKind::Timeout => "Timed out",
            ErrorKind::Tls => "TLS error",
            ErrorKind::Api => "Speed test server error",
            ErrorKind::Config => "Configuration error",
            ErrorKind::Measurement => "Measurement error",
            ErrorKind::Unknown => "Unexpected error",
        }
    }

    /// Default hint attached to errors of this kind.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            ErrorKind::Network => Some("Check your internet connection and try again."),
            ErrorKind::Dns => Some("Check your DNS settings or the --url host name."),
            ErrorKind::Timeout => {
                Some("The server may be slow or unreachable. Try a longer --timeout.")
            }
            ErrorKind::Tls => Some("Check your system clock and any TLS-intercepting proxy."),
            ErrorKind::Api => Some("The speed test server may be having issues. Try again later."),
            ErrorKind::Config | ErrorKind::Measurement | ErrorKind::Unknown => None,
        }
    }
}

#[derive(Debug)]
pub struct SpeedTestError {
    pub kind: ErrorKind,
    /// What failed, prefixed by any [`SpeedTestError::context`] calls
    pub message: String,
    pub suggestion: Option<String>,
    pub source: Option<Box<dyn Error + Send + Sync>>,
}

impl SpeedTestError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into(), suggestion: None, source: None }
    }

    /// An error of `kind` carrying that kind's default hint.
    pub fn hinted(kind: ErrorKind, message: impl Into<String>) -> Self {
        let error = Self::new(kind, message);

        match kind.hint() {
            Some(hint) => error.with_suggestion(hint),
            None => error,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_source(mut self, source: impl Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn exit_code(&self) -> i32 {
        self.kind.exit_code()
    }

    pub fn api(message: impl Into<String>) -> Self {
        Self::hinted(ErrorKind::Api, message)
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    pub fn measurement(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Measurement, message)
    }

    /// Prefix the message with the operation that failed.
    pub fn context(mut self, context: &str) -> Self {
        self.message = format!("{}: {}", context, self.message);
        self
    }
}

impl fmt::Display for SpeedTestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.description(), self.message)
    }
}

impl Error for SpeedTestError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as &(dyn Error + 'static))
    }
}

impl From<reqwest::Error> for SpeedTestError {
    fn from(error: reqwest::Error) -> Self {
        if let Some(status) = error.status() {
            return SpeedTestError::api(format!("server returned {}", status))
                .with_source(error);
        }

        let kind = if error.is_timeout() {
            ErrorKind::Timeout
        } else {
            match classify_error(&error) {
                ErrorKind::Unknown if error.is_connect() => ErrorKind::Network,
                ErrorKind::Unknown if error.is_body() || error.is_decode() => {
                    ErrorKind::Network
                }
                kind => kind,
            }
        };

        SpeedTestError::hinted(kind, error.to_string()).with_source(error)
    }
}

impl From<ResolveError> for SpeedTestError {
    fn from(error: ResolveError) -> Self {
        SpeedTestError::hinted(ErrorKind::Dns, error.to_string()).with_source(error)
    }
}

impl From<url::ParseError> for SpeedTestError {
    fn from(error: url::ParseError) -> Self {
        SpeedTestError::config(format!("invalid URL: {}", error))
            .with_suggestion("Pass --url as an absolute URL such as https://speed.cloudflare.com")
            .with_source(error)
    }
}

/// Work out what kind of failure `error` is.
///
/// I/O errors anywhere in the source chain are matched on their
/// [`io::ErrorKind`]; otherwise the chain's messages are searched.
pub fn classify_error(error: &(dyn Error + 'static)) -> ErrorKind {
    let mut messages = String::new();
    let mut current = Some(error);

    while let Some(inner) = current {
        if inner.is::<ResolveError>() {
            return ErrorKind::Dns;
        }

        if let Some(kind) = inner.downcast_ref::<io::Error>().and_then(io_kind) {
            return kind;
        }

        messages.push(' ');
        messages.push_str(&inner.to_string().to_lowercase());
        current = inner.source();
    }

    classify_message(&messages)
}

fn io_kind(error: &io::Error) -> Option<ErrorKind> {
    match error.kind() {
        io::ErrorKind::TimedOut => Some(ErrorKind::Timeout),
        io::ErrorKind::ConnectionRefused
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::NotConnected
        | io::ErrorKind::BrokenPipe
        | io::ErrorKind::UnexpectedEof => Some(ErrorKind::Network),
        _ => None,
    }
}

fn classify_message(message: &str) -> ErrorKind {
    let any = |needles: &[&str]| needles.iter().any(|needle| message.contains(needle));

    if any(&["dns error", "failed to lookup", "no such host", "name or service not known"]) {
        ErrorKind::Dns
    } else if any(&["timed out", "timeout", "deadline"]) {
        ErrorKind::Timeout
    } else if any(&["certificate", "tls", "ssl", "handshake"]) {
        ErrorKind::Tls
    } else if any(&["connection refused", "connection reset", "unreachable", "no route"]) {
        ErrorKind::Network
    } else {
        ErrorKind::Unknown
    }
}

/// Multi-line rendering for the terminal: message, cause chain, hint.
pub fn format_error_for_display(error: &SpeedTestError) -> String {
    let mut output = format!("Error: {}", error);

    let mut cause = error.source();
    while let Some(inner) = cause {
        output.push_str(&format!("\n  caused by: {}", inner));
        cause = inner.source();
    }

    if let Some(suggestion) = &error.suggestion {
        output.push_str(&format!("\n\n{}", suggestion));
    }

    output
}
