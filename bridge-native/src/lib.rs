//! Production adapters for the `bridge-traits` seams.
//!
//! ```ignore
//! let http: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::new()?);
//! let extractor = MetadataExtractor::new(Arc::clone(&http));
//! ```

mod http;

pub use http::ReqwestHttpClient;
