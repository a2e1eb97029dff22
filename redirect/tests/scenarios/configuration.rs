use super::super::harness::EngineHarness;
use crate::redirect::{RedirectEvent, RedirectPhase};
use crate::store::types::RedirectDelay;

#[test]
fn unconfigured_open_lands_in_needs_configuration() {
    let mut harness = EngineHarness::new();
    harness.open("web+ap://foo.bar/@x");

    assert_eq!(harness.engine.phase(), RedirectPhase::NeedsConfiguration);
    assert_eq!(harness.engine.target(), Some("foo.bar/@x"));
    assert!(harness.navigations.is_empty());
}

#[test]
fn pending_redirect_is_recorded_and_reads_exactly_once() {
    let mut harness = EngineHarness::new();
    harness.open("web+ap://foo.bar/@x");

    assert_eq!(
        harness.store.take_pending_redirect(),
        Some("foo.bar/@x".to_string())
    );
    assert_eq!(harness.store.take_pending_redirect(), None);
}

#[test]
fn configuration_complete_reenters_the_decision() {
    let mut harness = EngineHarness::new();
    harness.open("web+ap://foo.bar/@x");
    harness.send(RedirectEvent::ConfigurationComplete {
        instance: "mastodon.social".to_string(),
        software: Some("mastodon".to_string()),
    });

    // The store still has no configured delay, so the default timed flow
    // applies; the instance comes from the completion signal, not the store.
    assert_eq!(harness.engine.phase(), RedirectPhase::Timed { remaining: 3 });
    assert_eq!(harness.engine.home_instance(), Some("mastodon.social"));
    assert_eq!(
        harness.engine.authorize_url(),
        Some(
            "https://mastodon.social/authorize_interaction?uri=https%3A%2F%2Ffoo.bar%2F%40x"
        )
    );
    assert!(harness.countdown_running);
}

#[test]
fn configuration_complete_reuses_the_in_memory_target() {
    let mut harness = EngineHarness::new();
    harness.open("web+ap://foo.bar/@x");
    harness.send(RedirectEvent::ConfigurationComplete {
        instance: "mastodon.social".to_string(),
        software: None,
    });

    // The pending record was not consumed: it survives for a page reload
    // during configuration.
    assert_eq!(
        harness.store.take_pending_redirect(),
        Some("foo.bar/@x".to_string())
    );
}

#[test]
fn configuration_complete_out_of_phase_is_a_noop() {
    let mut harness = EngineHarness::configured("mastodon.social", RedirectDelay::Never);
    harness.open("web+ap://foo.bar/@x");
    assert_eq!(harness.engine.phase(), RedirectPhase::Manual);

    harness.send(RedirectEvent::ConfigurationComplete {
        instance: "other.example".to_string(),
        software: None,
    });
    assert_eq!(harness.engine.phase(), RedirectPhase::Manual);
    assert_eq!(harness.engine.home_instance(), Some("mastodon.social"));
}
