/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Instance software validation over NodeInfo discovery.
//!
//! Given a domain, answer the server software running there, or fail.
//! Callers treat every failure variant identically as "could not validate";
//! the variants exist for logging.

use std::fmt;
use std::time::Duration;

use moka::sync::Cache;
use reqwest::blocking::Client;
use serde::Deserialize;

use crate::domain;

/// How long a validated answer stays good. Server software changes rarely;
/// a re-validation a month later is plenty.
const CACHE_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);
const CACHE_CAPACITY: u64 = 1024;

pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    InvalidDomain,
    Network(String),
    HttpStatus(u16),
    NoNodeInfo,
    Malformed,
}

impl fmt::Display for LookupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LookupError::InvalidDomain => f.write_str("not a usable instance domain"),
            LookupError::Network(e) => write!(f, "network error: {e}"),
            LookupError::HttpStatus(status) => write!(f, "instance answered with status {status}"),
            LookupError::NoNodeInfo => f.write_str("no nodeinfo link advertised"),
            LookupError::Malformed => f.write_str("unparseable nodeinfo document"),
        }
    }
}

/// A validated answer: the software identifier (lower-cased) and, when the
/// instance reports one, its version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoftwareRecord {
    pub software: String,
    pub version: Option<String>,
}

/// The validation contract consumed by configuration flows. Seam for fakes.
pub trait InstanceValidator {
    fn validate(&self, domain: &str) -> Result<SoftwareRecord, LookupError>;
}

#[derive(Deserialize)]
struct NodeInfoLinks {
    #[serde(default)]
    links: Vec<NodeInfoLink>,
}

#[derive(Deserialize)]
struct NodeInfoLink {
    #[serde(default)]
    rel: String,
    #[serde(default)]
    href: String,
}

#[derive(Deserialize)]
struct NodeInfoDocument {
    software: NodeInfoSoftware,
}

#[derive(Deserialize)]
struct NodeInfoSoftware {
    name: String,
    #[serde(default)]
    version: Option<String>,
}

/// Pick the nodeinfo document URL from the well-known link list: a schema
/// 2.x rel when advertised, else the first rel mentioning nodeinfo at all.
fn select_nodeinfo_url(links: &NodeInfoLinks) -> Option<String> {
    let mut fallback = None;
    for link in &links.links {
        if link.rel.contains("nodeinfo.diaspora.software/ns/schema/2") {
            return Some(link.href.clone());
        }
        if fallback.is_none() && link.rel.contains("nodeinfo") {
            fallback = Some(link.href.clone());
        }
    }
    fallback
}

fn parse_links(body: &str) -> Result<NodeInfoLinks, LookupError> {
    serde_json::from_str(body).map_err(|_| LookupError::Malformed)
}

fn parse_document(body: &str) -> Result<SoftwareRecord, LookupError> {
    let document: NodeInfoDocument =
        serde_json::from_str(body).map_err(|_| LookupError::Malformed)?;
    Ok(SoftwareRecord {
        software: document.software.name.to_lowercase(),
        version: document.software.version,
    })
}

/// NodeInfo lookup client with an in-process TTL cache.
pub struct SoftwareLookup {
    client: Client,
    cache: Cache<String, SoftwareRecord>,
}

impl SoftwareLookup {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .expect("reqwest blocking client should build"),
            cache: Cache::builder()
                .max_capacity(CACHE_CAPACITY)
                .time_to_live(CACHE_TTL)
                .build(),
        }
    }

    fn fetch(&self, domain: &str) -> Result<SoftwareRecord, LookupError> {
        let well_known = format!("https://{domain}/.well-known/nodeinfo");
        let links = parse_links(&self.get_text(&well_known)?)?;
        let node_info_url = select_nodeinfo_url(&links).ok_or(LookupError::NoNodeInfo)?;
        parse_document(&self.get_text(&node_info_url)?)
    }

    fn get_text(&self, url: &str) -> Result<String, LookupError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| LookupError::Network(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::HttpStatus(status.as_u16()));
        }
        response
            .text()
            .map_err(|e| LookupError::Network(e.to_string()))
    }
}

impl Default for SoftwareLookup {
    fn default() -> Self {
        Self::new(DEFAULT_LOOKUP_TIMEOUT)
    }
}

impl InstanceValidator for SoftwareLookup {
    fn validate(&self, domain: &str) -> Result<SoftwareRecord, LookupError> {
        let domain = domain::normalize(domain);
        if domain.is_empty() {
            return Err(LookupError::InvalidDomain);
        }
        if let Some(hit) = self.cache.get(&domain) {
            return Ok(hit);
        }
        let record = self.fetch(&domain)?;
        self.cache.insert(domain, record.clone());
        Ok(record)
    }
}
