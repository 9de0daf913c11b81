//! Error types for pulumi-action

use miette::Diagnostic;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Main error type for pipeline operations
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// Transport failure or non-success HTTP status
    #[error("Network error: {message}")]
    #[diagnostic(code(pulumi_action::network))]
    Network {
        /// Description of the failure
        message: String,
    },

    /// A tool archive could not be downloaded
    #[error("Failed to download {url}")]
    #[diagnostic(
        code(pulumi_action::download),
        help("Check that the requested version exists and the download host is reachable")
    )]
    Download {
        /// The URL that was attempted
        url: String,
        /// The wrapped network failure
        #[source]
        source: Box<Error>,
    },

    /// Unreadable or malformed configuration (stack mapping file, inputs)
    #[error("Configuration error: {message}")]
    #[diagnostic(code(pulumi_action::config))]
    Config {
        /// Description of the problem
        message: String,
    },

    /// The branch has no entry in the stack mapping file
    #[error("No stack configured for branch '{branch}' in {}", file.display())]
    #[diagnostic(
        code(pulumi_action::stack_not_found),
        help("Add the branch to the mapping file or set the `stack` input")
    )]
    StackNotFound {
        /// Normalized branch name
        branch: String,
        /// Mapping file that was consulted
        file: Box<Path>,
    },

    /// Missing or rejected credentials
    #[error("Authentication error: {message}")]
    #[diagnostic(code(pulumi_action::auth))]
    Auth {
        /// Description of the problem
        message: String,
    },

    /// A subprocess exited with a non-zero status
    #[error("Command `{command}` failed with exit code {exit_code}")]
    #[diagnostic(code(pulumi_action::subprocess))]
    Subprocess {
        /// The command line that was run
        command: String,
        /// Its exit code
        exit_code: i32,
    },

    /// A downloaded archive could not be unpacked
    #[error("Extraction failed: {message}")]
    #[diagnostic(code(pulumi_action::extraction))]
    Extraction {
        /// Description of the problem
        message: String,
    },

    /// I/O error with path context
    #[error("I/O error during {operation}: {source}")]
    #[diagnostic(code(pulumi_action::io))]
    Io {
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
        /// The path involved, if any
        path: Option<Box<Path>>,
        /// Description of the operation that failed
        operation: String,
    },
}

impl Error {
    /// Create a network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Wrap a failure as a download error for `url`
    pub fn download(url: impl Into<String>, source: Self) -> Self {
        Self::Download {
            url: url.into(),
            source: Box::new(source),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a stack not found error
    pub fn stack_not_found(branch: impl Into<String>, file: impl Into<PathBuf>) -> Self {
        Self::StackNotFound {
            branch: branch.into(),
            file: file.into().into_boxed_path(),
        }
    }

    /// Create an authentication error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Create a subprocess error
    pub fn subprocess(command: impl Into<String>, exit_code: i32) -> Self {
        Self::Subprocess {
            command: command.into(),
            exit_code,
        }
    }

    /// Create an extraction error
    pub fn extraction(message: impl Into<String>) -> Self {
        Self::Extraction {
            message: message.into(),
        }
    }

    /// Create an I/O error with context
    pub fn io(source: std::io::Error, path: Option<PathBuf>, operation: impl Into<String>) -> Self {
        Self::Io {
            source,
            path: path.map(PathBuf::into_boxed_path),
            operation: operation.into(),
        }
    }
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;
