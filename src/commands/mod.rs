pub mod chunk;
pub mod ingest;
pub mod inventory;
pub mod records;
pub mod reset;
pub mod status;
