//! Feedscout — an HTTP service that discovers RSS/Atom feeds on a target
//! site.
//!
//! A single endpoint accepts a user-supplied URL, runs it through
//! normalization and an SSRF-focused validator, then discovers feeds two
//! ways at once: scanning the fetched page for `<link rel="alternate">`
//! autodiscovery tags and probing conventional feed paths with HEAD
//! requests. Results are merged, deduplicated, and returned as JSON.
//!
//! Every outbound request — the page fetch and every probe — goes through
//! the same validation gate ([`util::validate_url`]) and the same bounded
//! client ([`fetch::FetchClient`]).

pub mod config;
pub mod discovery;
pub mod fetch;
pub mod server;
pub mod util;
