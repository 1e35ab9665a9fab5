pub mod db;
pub mod error;

pub use db::{mirror_table_id, record_id_matches, Database, JsonStore};
pub use error::StoreError;
