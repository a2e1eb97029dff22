/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Canonicalization of user-supplied instance domains.

/// Reduce free-form instance-domain text to a bare hostname.
///
/// Trims whitespace, lower-cases, strips a leading `http://` or `https://`,
/// and truncates at the first `/`. An empty result means "no value"; callers
/// never see an error. No hostname-syntax validation happens here; invalid
/// hostnames surface later, when something tries to reach them.
pub fn normalize(input: &str) -> String {
    let lowered = input.trim().to_lowercase();
    let without_scheme = lowered
        .strip_prefix("https://")
        .or_else(|| lowered.strip_prefix("http://"))
        .unwrap_or(&lowered);
    without_scheme
        .split('/')
        .next()
        .unwrap_or_default()
        .to_string()
}
