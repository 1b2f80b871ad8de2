//! Redirect Types
//!
//! The final navigation target handed back to the caller's browser.

use serde::{Deserialize, Serialize};

/// Redirect status code used for the consent-screen redirect.
///
/// One per deployment: 302 for plain navigational GET flows, 307 when a
/// non-GET caller needs method-preserving semantics. Never mixed within a
/// deployment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedirectStatus {
    /// HTTP 302 Found.
    Found,
    /// HTTP 307 Temporary Redirect.
    TemporaryRedirect,
}

impl RedirectStatus {
    pub fn as_u16(&self) -> u16 {
        match self {
            Self::Found => 302,
            Self::TemporaryRedirect => 307,
        }
    }
}

impl Default for RedirectStatus {
    fn default() -> Self {
        Self::Found
    }
}

/// Resolved redirect target for a successful connect flow.
#[derive(Clone, Debug, PartialEq)]
pub struct RedirectTarget {
    /// Absolute URL of the upstream consent screen.
    pub url: String,
    /// Status code to redirect with.
    pub status: RedirectStatus,
}
