//! # zapper
//!
//! zapper is a personal-domain URL shortener: a tree of short host aliases,
//! each expanding successive path segments into a fully qualified
//! destination URL. A browser's `Host` header (or `X-Forwarded-Host`, if
//! present) selects a subtree of a user-authored YAML document; the
//! [expansion engine][engine] walks that subtree against the request path
//! and zapper replies with a `302` to the result.
//!
//! ## The configuration tree
//! [`config`] loads, validates, and represents the YAML document as a typed
//! tree. Reloading replaces this tree wholesale - see [`reload`].
//!
//! ## The expansion engine
//! [`engine`] is the core: a deterministic walk that turns
//! `["g", "z"]` plus a tree into `github.com/issmirnov/zap`, handling
//! wildcards, query-string gluing, port suffixes, and custom schemes along
//! the way.
//!
//! ## Serving requests
//! [`dispatcher`] applies the per-request policy (scheme selection, host
//! resolution) around the engine; [`server`] is the HTTP listener that calls
//! it.
//!
//! ## Keeping `/etc/hosts` in sync
//! [`hosts`] owns a sentinel-delimited block in the system hosts file so
//! configured shortcut hosts resolve locally.

#![deny(unsafe_code)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod hosts;
pub mod reload;
pub mod server;
pub mod util;
