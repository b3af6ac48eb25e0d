//! Transport layer for the command exchange

mod http;
mod traits;

pub use http::HttpTransport;
pub use traits::{CommandTransport, HttpReply, TransportFailure};
