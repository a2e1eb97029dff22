use super::super::harness::EngineHarness;
use crate::redirect::{RedirectEvent, RedirectPhase};
use crate::store::types::RedirectDelay;

#[test]
fn zero_delay_navigates_immediately_without_timed_state() {
    let mut harness = EngineHarness::configured("mastodon.social", RedirectDelay::Seconds(0));
    harness.open("web+ap://foo.bar/@x");

    assert_eq!(harness.engine.phase(), RedirectPhase::Done);
    assert_eq!(
        harness.navigations,
        vec!["https://mastodon.social/authorize_interaction?uri=https%3A%2F%2Ffoo.bar%2F%40x"]
    );
    assert!(!harness.countdown_running);
}

#[test]
fn countdown_starts_at_the_configured_delay() {
    let mut harness = EngineHarness::configured("mastodon.social", RedirectDelay::Seconds(3));
    harness.open("web+ap://foo.bar/@x");

    assert_eq!(harness.engine.phase(), RedirectPhase::Timed { remaining: 3 });
    assert!(harness.countdown_running);
    assert!(harness.navigations.is_empty());
}

#[test]
fn countdown_reaching_zero_navigates_once() {
    let mut harness = EngineHarness::configured("mastodon.social", RedirectDelay::Seconds(2));
    harness.open("web+ap://foo.bar/@x");
    harness.tick();
    assert_eq!(harness.engine.phase(), RedirectPhase::Timed { remaining: 1 });
    assert!(harness.navigations.is_empty());

    harness.tick();
    assert_eq!(harness.engine.phase(), RedirectPhase::Done);
    assert_eq!(harness.navigations.len(), 1);
    assert!(!harness.countdown_running);
}

#[test]
fn cancel_at_tick_two_lands_in_manual_with_timer_stopped() {
    let mut harness = EngineHarness::configured("mastodon.social", RedirectDelay::Seconds(3));
    harness.open("web+ap://foo.bar/@x");
    harness.tick();
    assert_eq!(harness.engine.phase(), RedirectPhase::Timed { remaining: 2 });

    harness.send(RedirectEvent::Cancel);
    assert_eq!(harness.engine.phase(), RedirectPhase::Manual);
    assert!(!harness.countdown_running);
    assert!(harness.navigations.is_empty());

    // A straggling tick from an unstopped timer must change nothing.
    harness.tick();
    assert_eq!(harness.engine.phase(), RedirectPhase::Manual);
    assert!(harness.navigations.is_empty());
}

#[test]
fn proceed_now_during_countdown_navigates_and_stops_the_timer() {
    let mut harness = EngineHarness::configured("mastodon.social", RedirectDelay::Seconds(5));
    harness.open("web+ap://foo.bar/@x");
    harness.send(RedirectEvent::ProceedNow);

    assert_eq!(harness.engine.phase(), RedirectPhase::Done);
    assert_eq!(harness.navigations.len(), 1);
    assert!(!harness.countdown_running);
}

#[test]
fn racing_triggers_navigate_exactly_once() {
    let mut harness = EngineHarness::configured("mastodon.social", RedirectDelay::Seconds(1));
    harness.open("web+ap://foo.bar/@x");

    // Countdown hits zero, then a "go now" click that was already in
    // flight arrives. Whichever fires first wins; the other is a no-op.
    harness.tick();
    harness.send(RedirectEvent::ProceedNow);

    assert_eq!(harness.navigations.len(), 1);
}

#[test]
fn resume_restarts_the_countdown_from_the_configured_delay() {
    let mut harness = EngineHarness::configured("mastodon.social", RedirectDelay::Seconds(3));
    harness.open("web+ap://foo.bar/@x");
    harness.send(RedirectEvent::Cancel);
    assert_eq!(harness.engine.phase(), RedirectPhase::Manual);

    harness.send(RedirectEvent::Resume);
    assert_eq!(harness.engine.phase(), RedirectPhase::Timed { remaining: 3 });
    assert!(harness.countdown_running);
}

#[test]
fn teardown_during_countdown_suppresses_the_navigation() {
    let mut harness = EngineHarness::configured("mastodon.social", RedirectDelay::Seconds(2));
    harness.open("web+ap://foo.bar/@x");
    harness.send(RedirectEvent::Teardown);
    assert!(!harness.countdown_running);

    // Even if the host's timer manages one more tick, nothing navigates.
    harness.tick();
    harness.tick();
    assert!(harness.navigations.is_empty());
}
