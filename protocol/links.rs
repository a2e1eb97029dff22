/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Publisher-side link enhancement.
//!
//! Content publishers mark up links as `web+ap://…`; on click, the helper
//! first offers the navigation to a native handler and only falls back to
//! the redirector service when nothing appears to have taken it.

use std::time::Duration;

use log::warn;

use super::handler::{FocusSource, detect_handler_fired};
use super::{SCHEME_PREFIX, TargetResolver};

/// How long to wait for a native handler to claim the navigation before
/// falling back to the web redirector.
pub const DEFAULT_PROBE_WINDOW: Duration = Duration::from_millis(2000);

/// Where a clicked link ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkNavigation {
    /// A native handler appears to have accepted the navigation.
    Native,
    /// Navigate to this web fallback URL instead.
    Fallback(String),
}

/// Resolve a clicked `web+ap://` href: attempt native dispatch, watch for
/// focus loss within the window, fall back to the redirector service.
/// `None` means the href was structurally invalid and nothing happened.
pub fn resolve_link_click<L>(
    resolver: &TargetResolver,
    launch: L,
    focus: &dyn FocusSource,
    href: &str,
    window: Duration,
) -> Option<LinkNavigation>
where
    L: FnOnce(&str),
{
    let target = href.strip_prefix(SCHEME_PREFIX).unwrap_or(href);
    if target.is_empty() {
        warn!("Ignoring invalid {SCHEME_PREFIX} link: {href:?}");
        return None;
    }

    if detect_handler_fired(launch, focus, href, window) {
        return Some(LinkNavigation::Native);
    }
    Some(LinkNavigation::Fallback(resolver.fallback_url(target)))
}
