/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Native scheme-handler bridge.
//!
//! Thin capability-detection + registration wrapper around whatever
//! scheme-handler facility the host environment offers, plus the
//! focus-loss heuristic the publisher-side link helper uses to guess
//! whether a native handler accepted a navigation.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};

use super::SCHEME;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerError {
    /// The host has no native handler facility. Expected on some platforms;
    /// triggers the designed web fallback, not a fault.
    Unsupported,
    /// The host facility exists but refused the registration.
    Platform(String),
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerError::Unsupported => f.write_str("native protocol handlers unsupported"),
            HandlerError::Platform(e) => write!(f, "handler registration failed: {e}"),
        }
    }
}

/// The host environment's scheme-handler facility. One registration call:
/// a scheme literal plus a URL template with exactly one `%s` placeholder
/// for the escaped target URI.
pub trait HandlerHost {
    /// Pure capability probe, no side effects.
    fn supports_native_handler(&self) -> bool;

    fn register(&mut self, scheme: &str, url_template: &str) -> Result<(), HandlerError>;
}

/// The fixed handler template for an instance: its authorize endpoint with
/// the target substituted by the host at dispatch time.
pub fn handler_url_template(instance_domain: &str) -> String {
    format!("https://{instance_domain}/authorize_interaction?uri=%s")
}

/// Register `web+ap` dispatch to the given instance. Idempotent:
/// re-registering the same mapping is not an error.
pub fn register_handler(
    host: &mut dyn HandlerHost,
    instance_domain: &str,
) -> Result<(), HandlerError> {
    if !host.supports_native_handler() {
        return Err(HandlerError::Unsupported);
    }
    host.register(SCHEME, &handler_url_template(instance_domain))
}

/// A host with no handler facility at all (plain terminals, for one).
#[derive(Debug, Default)]
pub struct UnsupportedHandlerHost;

impl HandlerHost for UnsupportedHandlerHost {
    fn supports_native_handler(&self) -> bool {
        false
    }

    fn register(&mut self, _scheme: &str, _url_template: &str) -> Result<(), HandlerError> {
        Err(HandlerError::Unsupported)
    }
}

/// Recording host for tests and embedders that manage dispatch themselves.
#[derive(Debug, Default)]
pub struct InMemoryHandlerHost {
    registered: HashMap<String, String>,
}

impl InMemoryHandlerHost {
    pub fn template_for(&self, scheme: &str) -> Option<&str> {
        self.registered.get(scheme).map(String::as_str)
    }
}

impl HandlerHost for InMemoryHandlerHost {
    fn supports_native_handler(&self) -> bool {
        true
    }

    fn register(&mut self, scheme: &str, url_template: &str) -> Result<(), HandlerError> {
        self.registered
            .insert(scheme.to_string(), url_template.to_string());
        Ok(())
    }
}

/// Focus events observed on the page that attempted a native navigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusEvent {
    Lost,
    Gained,
}

/// Source of focus changes for the handler-fired heuristic. Injectable so
/// the detector can run against a fake feed in tests.
pub trait FocusSource {
    /// Blocks until a focus-loss event arrives or the window elapses.
    fn focus_lost_within(&self, window: Duration) -> bool;
}

/// Focus feed over a channel, fed by whatever the embedding environment
/// uses to observe its window losing focus.
pub struct ChannelFocusSource {
    events: Receiver<FocusEvent>,
}

impl ChannelFocusSource {
    pub fn new(events: Receiver<FocusEvent>) -> Self {
        Self { events }
    }
}

impl FocusSource for ChannelFocusSource {
    fn focus_lost_within(&self, window: Duration) -> bool {
        let deadline = Instant::now() + window;
        loop {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            match self.events.recv_timeout(deadline - now) {
                Ok(FocusEvent::Lost) => return true,
                Ok(FocusEvent::Gained) => continue,
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                    return false;
                },
            }
        }
    }
}

/// Best-effort detection of whether a native handler accepted a navigation:
/// fire it in a hidden context via `launch`, then treat a focus loss within
/// the window as acceptance.
///
/// This is inherently racy: anything else stealing focus reads as success,
/// and a slow handler reads as failure. It is a heuristic for choosing the
/// publisher-side fallback, never an authoritative signal, and the main
/// redirect engine does not use it.
pub fn detect_handler_fired<L>(
    launch: L,
    focus: &dyn FocusSource,
    navigation_url: &str,
    window: Duration,
) -> bool
where
    L: FnOnce(&str),
{
    launch(navigation_url);
    focus.focus_lost_within(window)
}
