pub mod error;
pub mod ports;
pub mod record;
pub mod repos;
pub mod service;
pub mod sync;

pub use error::DomainError;
pub use ports::{IndexDocument, IndexEntry, IndexError, SearchIndex};
pub use record::Record;
pub use repos::RecordRepository;
pub use service::RecordService;
