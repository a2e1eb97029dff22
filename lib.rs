/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Redirect resolution engine for `web+ap://` Fediverse links.
//!
//! Web content links to Fediverse objects (posts, profiles) with a custom
//! `web+ap://` scheme; this crate routes the clicking user to their own
//! configured home instance to complete the interaction there, instead of on
//! the content's origin instance.
//!
//! The pieces, leaf-first: [`domain`] canonicalizes instance hostnames,
//! [`store`] persists the user's per-category home configuration,
//! [`protocol`] parses incoming links into canonical targets and builds
//! authorize URLs, [`classify`] maps server software to content categories,
//! and [`redirect`] drives the resolve → decide → navigate state machine.
//! [`lookup`] resolves a domain to its server software over NodeInfo.

pub mod classify;
pub mod cli;
pub mod domain;
pub mod lookup;
pub mod prefs;
pub mod protocol;
pub mod redirect;
pub mod store;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
