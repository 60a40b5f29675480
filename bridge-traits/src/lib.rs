//! Seams between the wall core and the network.
//!
//! Scraping, the Spotify and Last.fm clients and the Bandcamp search all
//! take an `Arc<dyn HttpClient>`. The reqwest adapter lives in
//! `bridge-native`; tests hand in a `mockall` double with canned
//! [`HttpResponse`]s.
//!
//! A status code is never an error at this layer. [`BridgeError`] is
//! reserved for requests that got no answer at all, and
//! [`BridgeError::is_transport`] tells a dead host apart from a broken
//! client so extractors can degrade to "no preview".

pub mod error;
pub mod http;

pub use error::BridgeError;
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse, RetryPolicy};
