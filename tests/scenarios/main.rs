use webap::VERSION;
use webap::protocol::TargetResolver;
use webap::redirect::{RedirectEffect, RedirectEngine, RedirectEvent, RedirectPhase};
use webap::store::ConfigStore;
use webap::store::types::{ContentCategory, HomeConfiguration, RedirectDelay};

#[test]
fn scenarios_binary_smoke_runs() {
    assert!(!VERSION.is_empty());
}

#[test]
fn configured_instance_redirects_end_to_end() {
    let mut store = ConfigStore::in_memory();
    store.set_home_instance("mastodon.social");
    let mut config = store.config();
    config.delay = RedirectDelay::Seconds(0);
    store.set_config(&config);

    let resolver = TargetResolver::default();
    let mut engine = RedirectEngine::new();
    let effects = engine.handle(
        &mut store,
        &resolver,
        RedirectEvent::Open {
            location: "web+ap://pixelfed.social/p/1".to_string(),
        },
    );

    assert_eq!(engine.phase(), RedirectPhase::Done);
    assert_eq!(
        effects,
        vec![RedirectEffect::Navigate {
            url: "https://mastodon.social/authorize_interaction?uri=https%3A%2F%2Fpixelfed.social%2Fp%2F1"
                .to_string(),
        }]
    );
}

#[test]
fn configuration_round_trip_preserves_category_overrides() {
    let mut store = ConfigStore::in_memory();
    let mut config =
        HomeConfiguration::with_all_categories("mastodon.social", RedirectDelay::Never);
    config.set_instance(ContentCategory::Photo, "pixelfed.social");
    store.set_config(&config);

    assert_eq!(store.config(), config);
    assert_eq!(
        store.instance_for(ContentCategory::Photo),
        Some("pixelfed.social".to_string())
    );
    assert_eq!(store.home_instance(), Some("mastodon.social".to_string()));
}

#[test]
fn unconfigured_flow_survives_a_configuration_step() {
    let mut store = ConfigStore::in_memory();
    let resolver = TargetResolver::default();
    let mut engine = RedirectEngine::new();

    engine.handle(
        &mut store,
        &resolver,
        RedirectEvent::Open {
            location: "https://webap.to/foo.bar/@x".to_string(),
        },
    );
    assert_eq!(engine.phase(), RedirectPhase::NeedsConfiguration);

    // The configuration UI validated a domain and signalled completion.
    store.set_home_instance("mastodon.social");
    let effects = engine.handle(
        &mut store,
        &resolver,
        RedirectEvent::ConfigurationComplete {
            instance: "mastodon.social".to_string(),
            software: Some("mastodon".to_string()),
        },
    );

    assert_eq!(engine.phase(), RedirectPhase::Timed { remaining: 3 });
    assert_eq!(effects, vec![RedirectEffect::StartCountdown]);
}
