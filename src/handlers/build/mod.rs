pub mod data_table;
pub mod search;

pub use data_table::{data_table_create, data_table_delete, data_table_update};
pub use search::{collab_search, staff_search};
