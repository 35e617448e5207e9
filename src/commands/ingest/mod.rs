mod db;
mod run;
#[cfg(test)]
mod tests;

pub use db::{configure_connection, drop_knowledge_base, knowledge_base_exists, records_per_source};
pub use run::run;
