/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Classification of Fediverse server software against content categories.
//!
//! Advisory only: incompatibility feeds configuration warnings and never
//! blocks a redirect.

use crate::store::types::ContentCategory;

/// Software that can interact with every content category.
const GENERAL_PURPOSE: &[&str] = &[
    "mastodon",
    "pleroma",
    "akkoma",
    "misskey",
    "firefish",
    "iceshrimp",
    "sharkey",
    "catodon",
    "hometown",
    "glitch-soc",
    "gotosocial",
    "honk",
    "takahē",
    "takahe",
    "gnusocial",
    "friendica",
    "hubzilla",
    "diaspora",
    "wafrn",
    "guppe",
];

/// Publishing engines without the interaction types this service brokers.
const PUBLISH_ONLY: &[&str] = &["writefreely", "plume", "wordpress", "owncast", "bookwyrm"];

fn specialized_category(software: &str) -> Option<ContentCategory> {
    match software {
        "pixelfed" => Some(ContentCategory::Photo),
        "lemmy" | "piefed" | "kbin" | "mbin" => Some(ContentCategory::Community),
        "peertube" => Some(ContentCategory::Video),
        "funkwhale" => Some(ContentCategory::Music),
        "mobilizon" => Some(ContentCategory::Social),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoftwareClass {
    /// Outbound publishing only; incompatible with every category.
    PublishOnly,
    /// Full interaction-capable server; compatible with every category.
    GeneralPurpose,
    /// Fixed primary category; compatible only with it.
    Specialized(ContentCategory),
    /// Unrecognized identifier. Absence of negative evidence is not
    /// evidence of incompatibility, so unknown software is compatible.
    Unknown,
}

/// Classify a software identifier. Matching is case-insensitive;
/// publish-only takes precedence over the general-purpose list, which takes
/// precedence over specialization.
pub fn classify(software: &str) -> SoftwareClass {
    let id = software.trim().to_lowercase();
    if PUBLISH_ONLY.contains(&id.as_str()) {
        return SoftwareClass::PublishOnly;
    }
    if GENERAL_PURPOSE.contains(&id.as_str()) {
        return SoftwareClass::GeneralPurpose;
    }
    if let Some(category) = specialized_category(&id) {
        return SoftwareClass::Specialized(category);
    }
    SoftwareClass::Unknown
}

/// Whether routing this category to a server running `software` would land
/// on something that cannot broker the interaction. Empty software means
/// "nothing detected" and is compatible.
pub fn is_incompatible(category: ContentCategory, software: &str) -> bool {
    match classify(software) {
        SoftwareClass::PublishOnly => true,
        SoftwareClass::GeneralPurpose | SoftwareClass::Unknown => false,
        SoftwareClass::Specialized(specialty) => specialty != category,
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn classifies_by_priority() {
        assert_eq!(classify("mastodon"), SoftwareClass::GeneralPurpose);
        assert_eq!(
            classify("pixelfed"),
            SoftwareClass::Specialized(ContentCategory::Photo)
        );
        assert_eq!(classify("writefreely"), SoftwareClass::PublishOnly);
        assert_eq!(classify("some-new-server"), SoftwareClass::Unknown);
    }

    #[test]
    fn matching_is_case_insensitive() {
        assert_eq!(classify("Mastodon"), SoftwareClass::GeneralPurpose);
        assert_eq!(
            classify("PeerTube"),
            SoftwareClass::Specialized(ContentCategory::Video)
        );
    }

    #[rstest]
    #[case(ContentCategory::Video, "pixelfed", true)]
    #[case(ContentCategory::Photo, "pixelfed", false)]
    #[case(ContentCategory::Social, "mastodon", false)]
    #[case(ContentCategory::Music, "funkwhale", false)]
    #[case(ContentCategory::Blog, "funkwhale", true)]
    #[case(ContentCategory::Social, "wordpress", true)]
    #[case(ContentCategory::Blog, "wordpress", true)]
    #[case(ContentCategory::Photo, "unheard-of", false)]
    #[case(ContentCategory::Photo, "", false)]
    fn incompatibility_matrix(
        #[case] category: ContentCategory,
        #[case] software: &str,
        #[case] expected: bool,
    ) {
        assert_eq!(is_incompatible(category, software), expected);
    }

    #[test]
    fn community_engines_specialize_to_community() {
        for software in ["lemmy", "piefed", "kbin", "mbin"] {
            assert_eq!(
                classify(software),
                SoftwareClass::Specialized(ContentCategory::Community)
            );
            assert!(!is_incompatible(ContentCategory::Community, software));
            assert!(is_incompatible(ContentCategory::Social, software));
        }
    }
}
