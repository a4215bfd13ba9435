// jamf-api: Async Rust transport for the Jamf Pro Classic API (JSSResource)

pub mod client;
pub mod error;
pub mod transport;
pub mod xml;

pub use client::{ClassicClient, encode_segment};
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
pub use xml::{XmlElement, collect_text, parse_id};
