//! Crawler supervisor (C11, §4.11): a ticker-driven poll loop over a
//! file-drop directory, feeding dropped documents into the ingestion
//! pipeline with processed-state persistence.

mod coerce;
mod decode;
mod signal;
mod state;
mod supervisor;

pub use decode::decode_file_documents;
pub use signal::install_shutdown_handler;
pub use state::{load_state, processed_key, save_state, ProcessedState};
pub use supervisor::{Supervisor, SupervisorConfig};
