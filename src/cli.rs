use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// Default address for both the client and the server
///
/// The server can be moved with the POS_ADDRESS environment variable, the client takes the
/// address as its first argument.
pub const DEFAULT_ADDRESS: &str = "127.0.0.1:9898";

/// Errors that can occur when parsing the command line arguments or the configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CLIError {
    #[error("Invalid target format. Should be <host>:<port>")]
    InvalidUrlFormat,
    #[error("Missing parameter '{0}'")]
    MissingParameter(&'static str),
    #[error("Invalid parameter '{0}'")]
    InvalidParameter(String),
    #[error("Unknown action '{0}'")]
    UnknownAction(String),
}

fn address_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9\.\-]+:\d{1,5}$").expect("address pattern is a valid regex")
    })
}

/// Validate the format of the TCP address provided by the user
///
/// Returns its input if the address is in the format <host>:<port>, otherwise InvalidUrlFormat
pub fn validate_address(url: &str) -> std::result::Result<&str, CLIError> {
    if address_pattern().is_match(url) {
        Ok(url)
    } else {
        Err(CLIError::InvalidUrlFormat)
    }
}

/// Parse a numeric argument, naming it in the error
pub fn parse_number<T: std::str::FromStr>(raw: &str) -> std::result::Result<T, CLIError> {
    raw.parse::<T>()
        .map_err(|_| CLIError::InvalidParameter(raw.to_string()))
}
