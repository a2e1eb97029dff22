/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! The redirect resolution engine.
//!
//! An explicit finite-state machine: the host feeds it discrete events
//! (open, timer tick, user action, configuration completion) and executes
//! the effects it hands back. Navigation and timer control are emitted as
//! data, never performed inline, so transition logic runs without any
//! browser or terminal environment around it.

use log::{debug, warn};

use crate::protocol::{self, TargetResolver};
use crate::store::ConfigStore;
use crate::store::types::RedirectDelay;

/// Where a resolution attempt landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectMode {
    /// Navigate now, no intermediate visible state.
    Immediate,
    /// Count down, then navigate.
    Timed,
    /// Wait for an explicit user trigger.
    Manual,
    /// No home instance configured yet.
    NeedsConfiguration,
    /// The link never parsed to a target. Terminal.
    Invalid,
}

/// The outcome of one resolution attempt. `home_instance` and
/// `authorize_url` are present exactly when the mode actually redirects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectDecision {
    pub mode: RedirectMode,
    pub home_instance: Option<String>,
    pub authorize_url: Option<String>,
}

impl RedirectDecision {
    fn without_instance(mode: RedirectMode) -> Self {
        Self {
            mode,
            home_instance: None,
            authorize_url: None,
        }
    }
}

/// The pure decision: resolve the target, look up the home instance, pick
/// the redirect strategy from the configured delay. Hosts that don't need
/// the full state machine can act on this directly.
///
/// Category inference for incoming links is external. Nothing in the link
/// itself declares a category, so the lookup is the general home-instance
/// chain.
pub fn decide(store: &ConfigStore, resolver: &TargetResolver, location: &str) -> RedirectDecision {
    let Some(target) = resolver.incoming_target(location) else {
        return RedirectDecision::without_instance(RedirectMode::Invalid);
    };
    let Some(home_instance) = store.home_instance() else {
        return RedirectDecision::without_instance(RedirectMode::NeedsConfiguration);
    };
    let authorize_url = protocol::build_authorize_url(&home_instance, &target);
    let mode = match store.delay() {
        RedirectDelay::Never => RedirectMode::Manual,
        RedirectDelay::Seconds(0) => RedirectMode::Immediate,
        RedirectDelay::Seconds(_) => RedirectMode::Timed,
    };
    RedirectDecision {
        mode,
        home_instance: Some(home_instance),
        authorize_url: Some(authorize_url),
    }
}

/// Engine phases. `Timed ⇄ Manual` via cancel/resume; both terminate into
/// `Done` by navigating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectPhase {
    Loading,
    Invalid,
    NeedsConfiguration,
    Timed { remaining: u32 },
    Manual,
    Done,
}

/// Discrete inputs from the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectEvent {
    /// A navigation arrived: a `web+ap://` link or a redirector URL.
    Open { location: String },
    /// One second of countdown elapsed.
    Tick,
    /// User cancelled the countdown.
    Cancel,
    /// User restarted the countdown from the configured delay.
    Resume,
    /// User asked to navigate right now.
    ProceedNow,
    /// The configuration step finished with a freshly chosen home instance.
    ConfigurationComplete {
        instance: String,
        software: Option<String>,
    },
    /// The host is going away; nothing may fire after this.
    Teardown,
}

/// Instructions back to the host, to be executed in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectEffect {
    /// Perform the navigation. Emitted at most once per engine.
    Navigate { url: String },
    /// Begin delivering one `Tick` per second.
    StartCountdown,
    /// Stop delivering ticks.
    StopCountdown,
}

/// One in-flight resolution. Owns the resolved target and decision for the
/// duration of the flow; exactly one `Navigate` is ever emitted, guarded
/// against racing triggers (a countdown hitting zero and a user's "go now"
/// in the same instant; whichever is handled first wins).
#[derive(Debug)]
pub struct RedirectEngine {
    phase: RedirectPhase,
    target: Option<String>,
    home_instance: Option<String>,
    authorize_url: Option<String>,
    navigated: bool,
}

impl RedirectEngine {
    pub fn new() -> Self {
        Self {
            phase: RedirectPhase::Loading,
            target: None,
            home_instance: None,
            authorize_url: None,
            navigated: false,
        }
    }

    pub fn phase(&self) -> RedirectPhase {
        self.phase
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn home_instance(&self) -> Option<&str> {
        self.home_instance.as_deref()
    }

    pub fn authorize_url(&self) -> Option<&str> {
        self.authorize_url.as_deref()
    }

    /// Advance the machine. Events that make no sense in the current phase
    /// are no-ops; the host never needs to pre-filter.
    pub fn handle(
        &mut self,
        store: &mut ConfigStore,
        resolver: &TargetResolver,
        event: RedirectEvent,
    ) -> Vec<RedirectEffect> {
        match event {
            RedirectEvent::Open { location } => self.open(store, resolver, &location),
            RedirectEvent::Tick => self.tick(),
            RedirectEvent::Cancel => self.cancel(),
            RedirectEvent::Resume => self.resume(store),
            RedirectEvent::ProceedNow => self.proceed_now(),
            RedirectEvent::ConfigurationComplete { instance, software } => {
                self.configuration_complete(store, instance, software.as_deref())
            },
            RedirectEvent::Teardown => self.teardown(),
        }
    }

    fn open(
        &mut self,
        store: &mut ConfigStore,
        resolver: &TargetResolver,
        location: &str,
    ) -> Vec<RedirectEffect> {
        if self.phase != RedirectPhase::Loading {
            return Vec::new();
        }
        let Some(target) = resolver.incoming_target(location) else {
            warn!("Not a resolvable {} link: {location:?}", protocol::SCHEME);
            self.phase = RedirectPhase::Invalid;
            return Vec::new();
        };
        self.target = Some(target.clone());

        match store.home_instance() {
            Some(home_instance) => self.initiate(store, home_instance),
            None => {
                // Keep the target across a configuration step, even one
                // interrupted by a full page reload.
                store.set_pending_redirect(&target);
                self.phase = RedirectPhase::NeedsConfiguration;
                Vec::new()
            },
        }
    }

    /// Entry point for the "home instance known" half of the decision,
    /// shared by `open` and the configuration-completion path.
    fn initiate(&mut self, store: &ConfigStore, home_instance: String) -> Vec<RedirectEffect> {
        let Some(target) = self.target.as_deref() else {
            return Vec::new();
        };
        self.authorize_url = Some(protocol::build_authorize_url(&home_instance, target));
        self.home_instance = Some(home_instance);

        match store.delay() {
            RedirectDelay::Never => {
                self.phase = RedirectPhase::Manual;
                Vec::new()
            },
            RedirectDelay::Seconds(0) => self.navigate(),
            RedirectDelay::Seconds(delay) => {
                self.phase = RedirectPhase::Timed { remaining: delay };
                vec![RedirectEffect::StartCountdown]
            },
        }
    }

    fn tick(&mut self) -> Vec<RedirectEffect> {
        let RedirectPhase::Timed { remaining } = &mut self.phase else {
            return Vec::new();
        };
        *remaining = remaining.saturating_sub(1);
        if *remaining > 0 {
            return Vec::new();
        }
        let mut effects = vec![RedirectEffect::StopCountdown];
        effects.extend(self.navigate());
        effects
    }

    fn cancel(&mut self) -> Vec<RedirectEffect> {
        if !matches!(self.phase, RedirectPhase::Timed { .. }) {
            return Vec::new();
        }
        self.phase = RedirectPhase::Manual;
        vec![RedirectEffect::StopCountdown]
    }

    fn resume(&mut self, store: &ConfigStore) -> Vec<RedirectEffect> {
        if self.phase != RedirectPhase::Manual {
            return Vec::new();
        }
        match store.delay() {
            // Delay was switched to never-redirect meanwhile; stay manual.
            RedirectDelay::Never => Vec::new(),
            RedirectDelay::Seconds(0) => self.navigate(),
            RedirectDelay::Seconds(delay) => {
                self.phase = RedirectPhase::Timed { remaining: delay };
                vec![RedirectEffect::StartCountdown]
            },
        }
    }

    fn proceed_now(&mut self) -> Vec<RedirectEffect> {
        match self.phase {
            RedirectPhase::Timed { .. } => {
                let mut effects = vec![RedirectEffect::StopCountdown];
                effects.extend(self.navigate());
                effects
            },
            RedirectPhase::Manual => self.navigate(),
            _ => Vec::new(),
        }
    }

    fn configuration_complete(
        &mut self,
        store: &mut ConfigStore,
        instance: String,
        software: Option<&str>,
    ) -> Vec<RedirectEffect> {
        if self.phase != RedirectPhase::NeedsConfiguration {
            return Vec::new();
        }
        debug!(
            "Configuration completed with {instance} ({})",
            software.unwrap_or("software unknown")
        );
        // The in-memory target is reused; the pending record stays behind
        // for reload resilience and dies with the session or its read-once
        // consumption.
        self.initiate(store, instance)
    }

    fn teardown(&mut self) -> Vec<RedirectEffect> {
        // Whatever happens after this, a stray late navigation must not.
        self.navigated = true;
        if matches!(self.phase, RedirectPhase::Timed { .. }) {
            return vec![RedirectEffect::StopCountdown];
        }
        Vec::new()
    }

    fn navigate(&mut self) -> Vec<RedirectEffect> {
        if self.navigated {
            return Vec::new();
        }
        let Some(url) = self.authorize_url.clone() else {
            return Vec::new();
        };
        self.navigated = true;
        self.phase = RedirectPhase::Done;
        vec![RedirectEffect::Navigate { url }]
    }
}

impl Default for RedirectEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests;
