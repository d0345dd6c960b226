//! Connection identity produced by a completed handshake.

use std::fmt;

use hackvr_proto::value::SessionToken;
use url::Url;

/// The four HackVR transport dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// Plain TCP with the hello exchange. Default port 1913.
    Hackvr,
    /// TLS with the hello exchange. Default port 19133.
    Hackvrs,
    /// HTTP/1.1 Upgrade over plain TCP. Default port 80.
    HttpHackvr,
    /// HTTP/1.1 Upgrade over TLS. Default port 443.
    HttpsHackvr,
}

impl Protocol {
    /// The URL scheme for this dialect.
    #[must_use]
    pub const fn scheme(self) -> &'static str {
        match self {
            Self::Hackvr => "hackvr",
            Self::Hackvrs => "hackvrs",
            Self::HttpHackvr => "http+hackvr",
            Self::HttpsHackvr => "https+hackvr",
        }
    }

    /// Resolve a URL scheme to a dialect.
    #[must_use]
    pub fn from_scheme(scheme: &str) -> Option<Self> {
        match scheme {
            "hackvr" => Some(Self::Hackvr),
            "hackvrs" => Some(Self::Hackvrs),
            "http+hackvr" => Some(Self::HttpHackvr),
            "https+hackvr" => Some(Self::HttpsHackvr),
            _ => None,
        }
    }

    /// Port used when the URL does not carry one.
    #[must_use]
    pub const fn default_port(self) -> u16 {
        match self {
            Self::Hackvr => 1913,
            Self::Hackvrs => 19133,
            Self::HttpHackvr => 80,
            Self::HttpsHackvr => 443,
        }
    }

    /// Whether this dialect runs over TLS.
    #[must_use]
    pub const fn is_secure(self) -> bool {
        matches!(self, Self::Hackvrs | Self::HttpsHackvr)
    }

    /// Whether this dialect tunnels through an HTTP/1.1 Upgrade.
    #[must_use]
    pub const fn is_upgrade(self) -> bool {
        matches!(self, Self::HttpHackvr | Self::HttpsHackvr)
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.scheme())
    }
}

/// Identity of an established connection.
///
/// Created by a successful connect or accept, owned by the connection,
/// discarded on close. `source_url` never carries a fragment; a fragment
/// on the client URL is consumed as the session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionToken {
    /// The world URL the client asked for, fragment stripped.
    pub source_url: Url,
    /// Session token presented during the handshake, if any.
    pub session_token: Option<SessionToken>,
    /// Dialect the connection negotiated.
    pub protocol: Protocol,
    /// Whether the transport is TLS.
    pub is_secure: bool,
}
