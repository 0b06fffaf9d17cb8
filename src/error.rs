// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the Arlo library.
//!
//! Only failures that definitely happened are errors: a command that could
//! not be transmitted, a rejected API call, an unparsable API response.
//! Timing-related non-events (a reply that never arrived, a push channel that
//! never acknowledged) are reported as values instead, so callers can tell
//! "definitely failed" apart from "don't know yet".

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred during protocol communication.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Error occurred while parsing a response.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// The client was shut down and no longer accepts requests.
    #[error("client has been shut down")]
    ShutDown,

    /// Login was requested without credentials.
    #[error("email and password are required to log in")]
    MissingCredentials,
}

/// Errors related to communication with the Arlo cloud.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// HTTP request failed.
    #[cfg(feature = "http")]
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Connection to the service failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Request timed out.
    #[error("request timed out after {0} ms")]
    Timeout(u64),

    /// Invalid URL or address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Authentication failed or the session token was refused.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// The service answered but reported `success: false`.
    #[error("{operation} rejected: {reason}")]
    Rejected {
        /// The operation that was rejected (e.g. `Notify`).
        operation: String,
        /// The response body describing the rejection.
        reason: String,
    },
}

/// Errors related to parsing Arlo responses.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Expected field is missing from the response.
    #[error("missing field in response: {0}")]
    MissingField(String),

    /// Unexpected response format.
    #[error("unexpected response format: {0}")]
    UnexpectedFormat(String),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
