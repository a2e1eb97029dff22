/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Persisted record types and their JSON shapes.
//!
//! The record payloads are a compatibility contract with earlier versions of
//! the service: field names, the `delay` number-or-`"never"` encoding, and
//! the nullable software map must all survive a round trip unchanged.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The six routable content kinds. The declaration order is the fallback
/// priority used when picking a general home instance: "social" is the most
/// common interaction category and acts as the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentCategory {
    Social,
    Community,
    Photo,
    Video,
    Music,
    Blog,
}

impl ContentCategory {
    pub const ALL: [ContentCategory; 6] = [
        ContentCategory::Social,
        ContentCategory::Community,
        ContentCategory::Photo,
        ContentCategory::Video,
        ContentCategory::Music,
        ContentCategory::Blog,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ContentCategory::Social => "social",
            ContentCategory::Community => "community",
            ContentCategory::Photo => "photo",
            ContentCategory::Video => "video",
            ContentCategory::Music => "music",
            ContentCategory::Blog => "blog",
        }
    }

    pub fn parse(input: &str) -> Option<ContentCategory> {
        ContentCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == input.trim().to_lowercase())
    }
}

impl fmt::Display for ContentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How long to wait before performing a web redirect.
///
/// Serialized as a bare number of seconds, or the string `"never"` for
/// never-auto-redirect (the user must trigger navigation explicitly).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectDelay {
    Seconds(u32),
    Never,
}

impl RedirectDelay {
    pub const DEFAULT: RedirectDelay = RedirectDelay::Seconds(3);
}

impl Default for RedirectDelay {
    fn default() -> Self {
        RedirectDelay::DEFAULT
    }
}

impl fmt::Display for RedirectDelay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RedirectDelay::Seconds(seconds) => write!(f, "{seconds}"),
            RedirectDelay::Never => f.write_str("never"),
        }
    }
}

impl Serialize for RedirectDelay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RedirectDelay::Seconds(seconds) => serializer.serialize_u32(*seconds),
            RedirectDelay::Never => serializer.serialize_str("never"),
        }
    }
}

impl<'de> Deserialize<'de> for RedirectDelay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DelayVisitor;

        impl Visitor<'_> for DelayVisitor {
            type Value = RedirectDelay;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a non-negative number of seconds or the string \"never\"")
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
                u32::try_from(value)
                    .map(RedirectDelay::Seconds)
                    .map_err(|_| E::custom("delay out of range"))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
                u32::try_from(value)
                    .map(RedirectDelay::Seconds)
                    .map_err(|_| E::custom("delay must be non-negative"))
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
                if value == "never" {
                    Ok(RedirectDelay::Never)
                } else {
                    Err(E::custom("unrecognized delay sentinel"))
                }
            }
        }

        deserializer.deserialize_any(DelayVisitor)
    }
}

fn default_delay() -> RedirectDelay {
    RedirectDelay::DEFAULT
}

/// The user's home-instance configuration: one (possibly empty) hostname per
/// content category plus the redirect delay preference.
///
/// A freshly-read configuration always carries all six categories; missing
/// keys in a stored record deserialize to the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HomeConfiguration {
    #[serde(default)]
    pub social: String,
    #[serde(default)]
    pub community: String,
    #[serde(default)]
    pub photo: String,
    #[serde(default)]
    pub video: String,
    #[serde(default)]
    pub music: String,
    #[serde(default)]
    pub blog: String,
    #[serde(default = "default_delay")]
    pub delay: RedirectDelay,
}

impl HomeConfiguration {
    /// A configuration with every category set to one instance, as produced
    /// by the bulk set-home flow and by legacy-record migration.
    pub fn with_all_categories(domain: &str, delay: RedirectDelay) -> Self {
        let mut config = HomeConfiguration {
            delay,
            ..HomeConfiguration::default()
        };
        for category in ContentCategory::ALL {
            config.set_instance(category, domain);
        }
        config
    }

    pub fn instance(&self, category: ContentCategory) -> Option<&str> {
        let value = self.field(category);
        if value.is_empty() { None } else { Some(value) }
    }

    pub fn set_instance(&mut self, category: ContentCategory, domain: &str) {
        *self.field_mut(category) = domain.to_string();
    }

    /// First configured instance in category priority order.
    pub fn first_instance(&self) -> Option<&str> {
        ContentCategory::ALL
            .into_iter()
            .find_map(|category| self.instance(category))
    }

    fn field(&self, category: ContentCategory) -> &str {
        match category {
            ContentCategory::Social => &self.social,
            ContentCategory::Community => &self.community,
            ContentCategory::Photo => &self.photo,
            ContentCategory::Video => &self.video,
            ContentCategory::Music => &self.music,
            ContentCategory::Blog => &self.blog,
        }
    }

    fn field_mut(&mut self, category: ContentCategory) -> &mut String {
        match category {
            ContentCategory::Social => &mut self.social,
            ContentCategory::Community => &mut self.community,
            ContentCategory::Photo => &mut self.photo,
            ContentCategory::Video => &mut self.video,
            ContentCategory::Music => &mut self.music,
            ContentCategory::Blog => &mut self.blog,
        }
    }
}

/// Detected server software, advisory only. Never consulted for routing;
/// it feeds compatibility warnings and iconography.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoftwareInfo {
    #[serde(default)]
    pub home: Option<String>,
    #[serde(default)]
    pub categories: BTreeMap<ContentCategory, Option<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_round_trips_as_number_or_sentinel() {
        assert_eq!(
            serde_json::to_string(&RedirectDelay::Seconds(5)).unwrap(),
            "5"
        );
        assert_eq!(
            serde_json::to_string(&RedirectDelay::Never).unwrap(),
            "\"never\""
        );
        assert_eq!(
            serde_json::from_str::<RedirectDelay>("0").unwrap(),
            RedirectDelay::Seconds(0)
        );
        assert_eq!(
            serde_json::from_str::<RedirectDelay>("\"never\"").unwrap(),
            RedirectDelay::Never
        );
    }

    #[test]
    fn unrecognized_delay_sentinel_is_an_error() {
        assert!(serde_json::from_str::<RedirectDelay>("\"sometimes\"").is_err());
        assert!(serde_json::from_str::<RedirectDelay>("-1").is_err());
    }

    #[test]
    fn missing_categories_deserialize_to_empty() {
        let config: HomeConfiguration =
            serde_json::from_str(r#"{"social":"mastodon.social"}"#).unwrap();
        assert_eq!(config.social, "mastodon.social");
        assert_eq!(config.photo, "");
        assert_eq!(config.delay, RedirectDelay::Seconds(3));
    }

    #[test]
    fn first_instance_follows_priority_order() {
        let mut config = HomeConfiguration::default();
        assert_eq!(config.first_instance(), None);
        config.set_instance(ContentCategory::Video, "peertube.tv");
        config.set_instance(ContentCategory::Community, "lemmy.world");
        assert_eq!(config.first_instance(), Some("lemmy.world"));
    }

    #[test]
    fn software_info_tolerates_missing_fields() {
        let info: SoftwareInfo = serde_json::from_str("{}").unwrap();
        assert_eq!(info, SoftwareInfo::default());
        let info: SoftwareInfo =
            serde_json::from_str(r#"{"home":"mastodon","categories":{"photo":null}}"#).unwrap();
        assert_eq!(info.home.as_deref(), Some("mastodon"));
        assert_eq!(info.categories.get(&ContentCategory::Photo), Some(&None));
    }
}
