// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use mukadam_bid_api::ApiError;
use mukadam_bid_persistence::PersistenceError;

/// Failures reported by the operator console.
#[derive(Debug)]
pub enum CliError {
    /// The engine rejected the operation.
    Api(ApiError),
    /// The database could not be opened.
    Persistence(PersistenceError),
    /// A file named on the command line could not be read.
    Io {
        /// The file.
        path: String,
        /// What went wrong.
        message: String,
    },
    /// The weights file is not valid JSON.
    InvalidWeights(String),
    /// A command-line value passed parsing but is still unusable.
    InvalidArgument {
        /// The argument.
        argument: &'static str,
        /// What is wrong with it.
        message: String,
    },
    /// Output could not be rendered.
    Output(String),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Api(err) => write!(f, "{err}"),
            Self::Persistence(err) => write!(f, "{err}"),
            Self::Io { path, message } => write!(f, "Failed to read '{path}': {message}"),
            Self::InvalidWeights(message) => write!(f, "Invalid scoring weights: {message}"),
            Self::InvalidArgument { argument, message } => {
                write!(f, "Invalid argument '{argument}': {message}")
            }
            Self::Output(message) => write!(f, "Failed to render output: {message}"),
        }
    }
}

impl std::error::Error for CliError {}

impl From<ApiError> for CliError {
    fn from(err: ApiError) -> Self {
        Self::Api(err)
    }
}

impl From<PersistenceError> for CliError {
    fn from(err: PersistenceError) -> Self {
        Self::Persistence(err)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        Self::Output(err.to_string())
    }
}
