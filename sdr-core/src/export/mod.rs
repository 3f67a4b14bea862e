//! Document assembly and the two fire-mostly-forget HTTP sinks: the
//! retrieval store and the frontend (spec §4.6).

pub mod document;
pub mod frontend_client;
pub mod retrieval_client;

pub use document::{build_document, source_uri, stream_id, DocIndexCounter, Document};
pub use frontend_client::FrontendClient;
pub use retrieval_client::RetrievalClient;
