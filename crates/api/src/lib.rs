//! Remote API client for datasets and data files.
//!
//! [`ArcsecondApi`] is the seam the uploader talks through; [`HttpClient`]
//! implements it over HTTPS with `reqwest`. Tests substitute a mock.

pub mod client;
pub mod error;
pub mod http;

pub use client::{ApiFuture, ArcsecondApi};
pub use error::ApiError;
pub use http::HttpClient;
