#![forbid(unsafe_code)]

use thiserror::Error;

/// Error enumerates the errors returned by this application.
#[derive(Error, Debug)]
pub enum Errors {
    /// Input parameter logging.
    #[error("greeting_server input parameters:\n{}", .0)]
    InputParms(String),

    /// Represents all other cases of `std::io::Error`.
    #[error(transparent)]
    IOError(#[from] std::io::Error),

    /// Inaccessible or invalid logger configuration file.
    #[error("Unable to initialize Log4rs from configuration file: {}", .0)]
    Log4rsInitialization(String),

    #[error("Reading application configuration file: {}", .0)]
    ReadingConfigFile(String),

    #[error("Unable to parse TOML file: {}", .0)]
    TOMLParseError(String),

    /// Data directory that cannot be used.
    #[error("Invalid {} path: {}", .0, .1)]
    DataDirectory(String, String),
}

// ***************************************************************************
//                                  Tests
// ***************************************************************************
#[cfg(test)]
mod tests {
    use super::Errors;

    #[test]
    fn data_directory_message() {
        let e = Errors::DataDirectory("logs directory".to_string(), "/tmp/x".to_string());
        assert_eq!(e.to_string(), "Invalid logs directory path: /tmp/x");
    }

    #[test]
    fn io_error_is_transparent() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let e: Errors = io.into();
        assert_eq!(e.to_string(), "missing");
    }
}
