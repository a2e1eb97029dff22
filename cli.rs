/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Command-line host for the redirect engine.
//!
//! The binary is the host environment: it owns the countdown timer, renders
//! engine phases as terminal output, and "performs" a navigation by writing
//! the authorize URL to stdout (everything else goes to stderr, so the URL
//! stays pipeable).

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

use bpaf::Bpaf;

use crate::classify::{self, SoftwareClass};
use crate::domain;
use crate::lookup::{InstanceValidator, SoftwareLookup};
use crate::prefs::ServicePrefs;
use crate::protocol::handler::{
    HandlerError, UnsupportedHandlerHost, handler_url_template, register_handler,
};
use crate::protocol::{SCHEME_PREFIX, TargetResolver};
use crate::redirect::{RedirectEffect, RedirectEngine, RedirectEvent, RedirectPhase};
use crate::store::ConfigStore;
use crate::store::types::{ContentCategory, RedirectDelay};

#[derive(Debug, Clone, Bpaf)]
#[bpaf(options, version)]
pub struct Options {
    /// Path to a TOML preferences file
    #[bpaf(argument("FILE"))]
    pub prefs: Option<PathBuf>,
    /// Override the redirector service domain
    #[bpaf(argument("DOMAIN"))]
    pub service_domain: Option<String>,
    /// Keep all state in memory; nothing on disk is read or written
    pub ephemeral: bool,
    #[bpaf(external(command))]
    pub command: Command,
}

#[derive(Debug, Clone, Bpaf)]
pub enum Command {
    /// Resolve a web+ap:// link and drive the redirect flow
    #[bpaf(command)]
    Resolve {
        /// Skip any countdown and navigate immediately
        now: bool,
        /// The incoming link: web+ap://… or a redirector URL
        #[bpaf(positional("URL"))]
        url: String,
    },
    /// Inspect or change the stored home-instance configuration
    #[bpaf(command)]
    Config {
        #[bpaf(external(config_action))]
        action: ConfigAction,
    },
    /// Look up which software an instance runs
    #[bpaf(command)]
    Validate {
        #[bpaf(positional("DOMAIN"))]
        domain: String,
    },
    /// Register the native web+ap handler for an instance
    #[bpaf(command)]
    Register {
        #[bpaf(positional("DOMAIN"))]
        domain: String,
    },
}

#[derive(Debug, Clone, Bpaf)]
pub enum ConfigAction {
    /// Print the stored configuration
    #[bpaf(command)]
    Show,
    /// Validate a domain and make it the home instance for every category
    #[bpaf(command("set-home"))]
    SetHome {
        #[bpaf(positional("DOMAIN"))]
        domain: String,
    },
    /// Set the home instance for one category
    #[bpaf(command)]
    Set {
        #[bpaf(positional("CATEGORY"))]
        category: String,
        #[bpaf(positional("DOMAIN"))]
        domain: String,
    },
    /// Set the redirect delay: a number of seconds, or "never"
    #[bpaf(command)]
    Delay {
        #[bpaf(positional("VALUE"))]
        value: String,
    },
    /// Erase the stored configuration and software info
    #[bpaf(command)]
    Clear,
}

pub fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let opts = options().run();

    let mut prefs = ServicePrefs::load(opts.prefs.as_deref());
    if let Some(service_domain) = opts.service_domain {
        prefs.service_domain = service_domain;
    }
    let resolver = prefs.resolver();
    let mut store = if opts.ephemeral {
        ConfigStore::in_memory()
    } else {
        ConfigStore::open_or_memory(&prefs.state_dir())
    };

    let exit_code = match opts.command {
        Command::Resolve { now, url } => run_resolve(&mut store, &resolver, &prefs, &url, now),
        Command::Config { action } => run_config(&mut store, &prefs, action),
        Command::Validate { domain } => run_validate(&prefs, &domain),
        Command::Register { domain } => run_register(&domain),
    };
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run_resolve(
    store: &mut ConfigStore,
    resolver: &TargetResolver,
    prefs: &ServicePrefs,
    url: &str,
    now: bool,
) -> i32 {
    let mut engine = RedirectEngine::new();
    let mut effects = engine.handle(
        store,
        resolver,
        RedirectEvent::Open {
            location: url.to_string(),
        },
    );

    loop {
        execute_effects(&effects);
        effects = match engine.phase() {
            RedirectPhase::Done | RedirectPhase::Loading => return 0,
            RedirectPhase::Invalid => {
                eprintln!("Invalid link: not a usable {SCHEME_PREFIX} link.");
                return 1;
            },
            RedirectPhase::NeedsConfiguration => {
                eprintln!(
                    "No home instance configured yet; one is needed to open {}.",
                    engine.target().unwrap_or(url)
                );
                let Some(input) = prompt_line("Home instance domain (empty to abort): ") else {
                    return 1;
                };
                if input.trim().is_empty() {
                    eprintln!("Aborted; the link will resume once a home instance is set.");
                    return 1;
                }
                let validator = SoftwareLookup::new(prefs.lookup_timeout);
                match apply_home_configuration(store, &validator, &input) {
                    Ok((instance, software)) => engine.handle(
                        store,
                        resolver,
                        RedirectEvent::ConfigurationComplete { instance, software },
                    ),
                    Err(message) => {
                        eprintln!("{message}");
                        continue;
                    },
                }
            },
            RedirectPhase::Timed { remaining } => {
                if now {
                    engine.handle(store, resolver, RedirectEvent::ProceedNow)
                } else {
                    eprintln!(
                        "Redirecting to {} in {remaining}s (Ctrl-C to cancel)…",
                        engine.home_instance().unwrap_or("your home instance"),
                    );
                    std::thread::sleep(Duration::from_secs(1));
                    engine.handle(store, resolver, RedirectEvent::Tick)
                }
            },
            RedirectPhase::Manual => {
                eprintln!(
                    "Ready to open {} on {}.",
                    engine.target().unwrap_or(url),
                    engine.home_instance().unwrap_or("your home instance"),
                );
                let _ = prompt_line("Press Enter to open: ");
                engine.handle(store, resolver, RedirectEvent::ProceedNow)
            },
        };
    }
}

fn run_config(store: &mut ConfigStore, prefs: &ServicePrefs, action: ConfigAction) -> i32 {
    match action {
        ConfigAction::Show => {
            let config = store.config();
            let software = store.software_info();
            for category in ContentCategory::ALL {
                let instance = config.instance(category).unwrap_or("-");
                let detected = software
                    .categories
                    .get(&category)
                    .and_then(|s| s.as_deref())
                    .unwrap_or("");
                let note = if !detected.is_empty() && classify::is_incompatible(category, detected)
                {
                    "  [incompatible]"
                } else {
                    ""
                };
                if detected.is_empty() {
                    println!("{category:>9}  {instance}");
                } else {
                    println!("{category:>9}  {instance}  ({detected}){note}");
                }
            }
            println!("{:>9}  {}", "delay", config.delay);
            0
        },
        ConfigAction::SetHome { domain } => {
            let validator = SoftwareLookup::new(prefs.lookup_timeout);
            match apply_home_configuration(store, &validator, &domain) {
                Ok((instance, software)) => {
                    match software {
                        Some(software) => {
                            println!("Home instance set to {instance} (running {software}).")
                        },
                        None => println!("Home instance set to {instance}."),
                    }
                    0
                },
                Err(message) => {
                    eprintln!("{message}");
                    1
                },
            }
        },
        ConfigAction::Set { category, domain } => {
            let Some(category) = ContentCategory::parse(&category) else {
                eprintln!(
                    "Unknown category {category:?}; expected one of: social, community, photo, \
                     video, music, blog."
                );
                return 1;
            };
            let normalized = domain::normalize(&domain);
            let mut config = store.config();
            config.set_instance(category, &normalized);
            store.set_config(&config);

            if normalized.is_empty() {
                store.set_category_software(category, None);
                println!("Cleared the {category} instance.");
                return 0;
            }
            let validator = SoftwareLookup::new(prefs.lookup_timeout);
            match validator.validate(&normalized) {
                Ok(record) => {
                    store.set_category_software(category, Some(&record.software));
                    if classify::is_incompatible(category, &record.software) {
                        eprintln!(
                            "Note: {normalized} runs {}, which cannot broker {category} \
                             interactions.",
                            record.software
                        );
                    }
                    println!("{category} instance set to {normalized}.");
                },
                Err(_) => {
                    store.set_category_software(category, None);
                    println!(
                        "{category} instance set to {normalized} (software could not be \
                         detected)."
                    );
                },
            }
            0
        },
        ConfigAction::Delay { value } => {
            let delay = if value == "never" {
                RedirectDelay::Never
            } else {
                match value.parse::<u32>() {
                    Ok(seconds) => RedirectDelay::Seconds(seconds),
                    Err(_) => {
                        eprintln!("Expected a number of seconds or \"never\", got {value:?}.");
                        return 1;
                    },
                }
            };
            let mut config = store.config();
            config.delay = delay;
            store.set_config(&config);
            println!("Redirect delay set to {delay}.");
            0
        },
        ConfigAction::Clear => {
            store.clear_home_instance();
            println!("Configuration cleared.");
            0
        },
    }
}

fn run_validate(prefs: &ServicePrefs, domain: &str) -> i32 {
    let validator = SoftwareLookup::new(prefs.lookup_timeout);
    match validator.validate(domain) {
        Ok(record) => {
            match record.version.as_deref() {
                Some(version) => println!("{} {version}", record.software),
                None => println!("{}", record.software),
            }
            eprintln!("{}", describe_class(classify::classify(&record.software)));
            0
        },
        Err(e) => {
            log::debug!("Validation failed for {domain:?}: {e}");
            eprintln!("Could not validate {domain:?}; check the domain and try again.");
            1
        },
    }
}

fn run_register(domain: &str) -> i32 {
    let normalized = domain::normalize(domain);
    if normalized.is_empty() {
        eprintln!("Expected an instance domain.");
        return 1;
    }
    let mut host = UnsupportedHandlerHost;
    match register_handler(&mut host, &normalized) {
        Ok(()) => {
            println!("Registered web+ap links to open on {normalized}.");
            0
        },
        Err(HandlerError::Unsupported) => {
            // The designed fallback: no native facility here, so hand the
            // user the template a browser would register.
            println!("{}", handler_url_template(&normalized));
            eprintln!(
                "This environment has no native protocol-handler facility; a browser would \
                 register the template above for the web+ap scheme."
            );
            0
        },
        Err(e) => {
            eprintln!("{e}");
            1
        },
    }
}

/// The shared set-home flow: normalize, validate, persist every category,
/// record detected software, attempt native registration.
fn apply_home_configuration(
    store: &mut ConfigStore,
    validator: &dyn InstanceValidator,
    domain: &str,
) -> Result<(String, Option<String>), String> {
    let normalized = domain::normalize(domain);
    if normalized.is_empty() {
        return Err("Please enter an instance domain.".to_string());
    }
    let record = validator.validate(&normalized).map_err(|e| {
        log::debug!("Validation failed for {normalized}: {e}");
        format!("Could not connect to {normalized}; check the domain and try again.")
    })?;

    let Some(instance) = store.set_home_instance(&normalized) else {
        return Err("Could not save the configuration.".to_string());
    };
    store.set_home_software(Some(&record.software));
    for category in ContentCategory::ALL {
        store.set_category_software(category, Some(&record.software));
    }

    let mut host = UnsupportedHandlerHost;
    match register_handler(&mut host, &instance) {
        Ok(()) => eprintln!("Registered the native web+ap handler for {instance}."),
        Err(HandlerError::Unsupported) => {},
        Err(e) => log::warn!("Native handler registration failed: {e}"),
    }

    Ok((instance, Some(record.software)))
}

fn describe_class(class: SoftwareClass) -> String {
    match class {
        SoftwareClass::GeneralPurpose => "General-purpose: handles every content category.".into(),
        SoftwareClass::Specialized(category) => {
            format!("Specialized: handles {category} interactions only.")
        },
        SoftwareClass::PublishOnly => {
            "Publish-only: cannot broker interactions for any category.".into()
        },
        SoftwareClass::Unknown => "Unrecognized software; assumed compatible.".into(),
    }
}

fn execute_effects(effects: &[RedirectEffect]) {
    for effect in effects {
        match effect {
            RedirectEffect::Navigate { url } => println!("{url}"),
            // The resolve loop is its own timer; countdown control needs no
            // bookkeeping here.
            RedirectEffect::StartCountdown | RedirectEffect::StopCountdown => {},
        }
    }
}

fn prompt_line(prompt: &str) -> Option<String> {
    eprint!("{prompt}");
    let _ = io::stderr().flush();
    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
    }
}
