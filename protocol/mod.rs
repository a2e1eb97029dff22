/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Target parsing and authorize-URL construction for the `web+ap` scheme.

pub mod handler;
pub mod links;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use url::Url;

/// The custom scheme this service brokers.
pub const SCHEME: &str = "web+ap";
pub const SCHEME_PREFIX: &str = "web+ap://";

pub const DEFAULT_SERVICE_DOMAIN: &str = "webap.to";
pub const DEFAULT_CONFIG_PAGE: &str = "handle.html";

/// Query-component encoding compatible with `encodeURIComponent`: everything
/// but ASCII alphanumerics and `- _ . ! ~ * ' ( )` is percent-escaped. The
/// authorize endpoint contract expects exactly this shape.
const AUTHORIZE_URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// The single endpoint shape every compatible Fediverse server exposes to
/// begin an interaction-authorization flow for a remote resource.
pub fn build_authorize_url(home_instance: &str, target: &str) -> String {
    let full_target = if target.starts_with("http") {
        target.to_string()
    } else {
        format!("https://{target}")
    };
    format!(
        "https://{home_instance}/authorize_interaction?uri={}",
        utf8_percent_encode(&full_target, AUTHORIZE_URI_COMPONENT)
    )
}

/// Parses incoming links into canonical `host/path…` targets.
///
/// Carries the redirector's own service domain so already-redirected URLs
/// (`https://<service>/<target>`) resolve to the same canonical form as raw
/// `web+ap://` links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetResolver {
    service_domain: String,
    config_page: String,
}

impl TargetResolver {
    pub fn new(service_domain: impl Into<String>, config_page: impl Into<String>) -> Self {
        Self {
            service_domain: service_domain.into(),
            config_page: config_page.into(),
        }
    }

    pub fn service_domain(&self) -> &str {
        &self.service_domain
    }

    /// Canonical target for a raw link value, or `None` when the link is
    /// structurally invalid (empty remainder, or the service's own
    /// configuration page, a self-referential non-target).
    pub fn parse_target(&self, raw: &str) -> Option<String> {
        let target = if let Some(rest) = raw.strip_prefix(SCHEME_PREFIX) {
            rest
        } else if let Some(rest) = self.strip_service_prefix(raw) {
            rest
        } else {
            raw
        };
        if target.is_empty() || target == self.config_page {
            return None;
        }
        Some(target.to_string())
    }

    /// Canonical target for a full navigation location: a `uri` query
    /// parameter when present, else the URL path, else the raw string when
    /// the location is not an absolute URL.
    pub fn incoming_target(&self, location: &str) -> Option<String> {
        if location.starts_with(SCHEME_PREFIX) {
            return self.parse_target(location);
        }
        let Ok(url) = Url::parse(location) else {
            return self.parse_target(location);
        };
        if let Some((_, uri)) = url.query_pairs().find(|(key, _)| key == "uri") {
            return self.parse_target(&uri);
        }
        self.parse_target(url.path().trim_start_matches('/'))
    }

    /// The web fallback for a target when no native handler picks it up:
    /// `https://<service-domain>/<target>`.
    pub fn fallback_url(&self, target: &str) -> String {
        format!("https://{}/{target}", self.service_domain)
    }

    fn strip_service_prefix<'a>(&self, raw: &'a str) -> Option<&'a str> {
        let rest = raw
            .strip_prefix("https://")
            .or_else(|| raw.strip_prefix("http://"))?;
        rest.strip_prefix(self.service_domain.as_str())?
            .strip_prefix('/')
    }
}

impl Default for TargetResolver {
    fn default() -> Self {
        Self::new(DEFAULT_SERVICE_DOMAIN, DEFAULT_CONFIG_PAGE)
    }
}
