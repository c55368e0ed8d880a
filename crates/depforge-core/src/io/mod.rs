pub mod download;
pub mod extract;

pub use download::{
    ExternalTransport, FetchError, Fetcher, HttpTransport, Transport, TransportError,
};
pub use extract::{ArchiveFormat, ExtractError, extract};
