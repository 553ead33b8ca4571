//! Transport integration tests against a real HTTP server.

#[cfg(feature = "http")]
mod http;
