#![forbid(unsafe_code)]

mod client;
mod error;
mod types;
mod wire;

pub use client::HttpClient;
pub use error::{Error, HttpTransportErrorKind, Result};
pub use types::{HttpRequest, HttpResponse};
pub use wire::request_wire_bytes;
