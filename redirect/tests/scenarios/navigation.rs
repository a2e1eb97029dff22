use super::super::harness::EngineHarness;
use crate::redirect::{RedirectEvent, RedirectMode, RedirectPhase, decide};
use crate::store::types::RedirectDelay;

#[test]
fn invalid_location_is_terminal() {
    let mut harness = EngineHarness::configured("mastodon.social", RedirectDelay::Seconds(0));
    harness.open("https://webap.to/handle.html");

    assert_eq!(harness.engine.phase(), RedirectPhase::Invalid);
    assert!(harness.navigations.is_empty());

    // No event recovers an invalid resolution; the user needs a new link.
    harness.send(RedirectEvent::ProceedNow);
    harness.send(RedirectEvent::ConfigurationComplete {
        instance: "mastodon.social".to_string(),
        software: None,
    });
    assert_eq!(harness.engine.phase(), RedirectPhase::Invalid);
    assert!(harness.navigations.is_empty());
}

#[test]
fn manual_delay_waits_for_an_explicit_trigger() {
    let mut harness = EngineHarness::configured("mastodon.social", RedirectDelay::Never);
    harness.open("web+ap://foo.bar/@x");

    assert_eq!(harness.engine.phase(), RedirectPhase::Manual);
    assert!(!harness.countdown_running);
    assert!(harness.navigations.is_empty());

    harness.send(RedirectEvent::ProceedNow);
    assert_eq!(harness.engine.phase(), RedirectPhase::Done);
    assert_eq!(harness.navigations.len(), 1);
}

#[test]
fn second_open_is_ignored() {
    let mut harness = EngineHarness::configured("mastodon.social", RedirectDelay::Seconds(0));
    harness.open("web+ap://foo.bar/@x");
    harness.open("web+ap://other.example/@y");

    assert_eq!(harness.navigations.len(), 1);
    assert_eq!(harness.engine.target(), Some("foo.bar/@x"));
}

#[test]
fn redirector_prefixed_location_resolves_like_the_raw_scheme() {
    let mut harness = EngineHarness::configured("mastodon.social", RedirectDelay::Seconds(0));
    harness.open("https://webap.to/pixelfed.social/p/1");

    assert_eq!(
        harness.navigations,
        vec!["https://mastodon.social/authorize_interaction?uri=https%3A%2F%2Fpixelfed.social%2Fp%2F1"]
    );
}

#[test]
fn decide_reports_modes_without_side_effects() {
    let harness = EngineHarness::configured("mastodon.social", RedirectDelay::Seconds(3));
    let decision = decide(&harness.store, &harness.resolver, "web+ap://foo.bar/@x");
    assert_eq!(decision.mode, RedirectMode::Timed);
    assert_eq!(decision.home_instance.as_deref(), Some("mastodon.social"));
    assert_eq!(
        decision.authorize_url.as_deref(),
        Some("https://mastodon.social/authorize_interaction?uri=https%3A%2F%2Ffoo.bar%2F%40x")
    );

    let decision = decide(&harness.store, &harness.resolver, "web+ap://");
    assert_eq!(decision.mode, RedirectMode::Invalid);
    assert_eq!(decision.home_instance, None);
    assert_eq!(decision.authorize_url, None);
}

#[test]
fn decide_without_configuration_needs_configuration_and_records_nothing() {
    let mut harness = EngineHarness::new();
    let decision = decide(&harness.store, &harness.resolver, "web+ap://foo.bar/@x");
    assert_eq!(decision.mode, RedirectMode::NeedsConfiguration);
    assert_eq!(
        harness.store.take_pending_redirect(),
        None,
        "only the engine records a pending redirect"
    );
}
