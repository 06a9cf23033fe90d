pub mod index_page;
pub mod static_list;

pub use index_page::{parse_index, IndexPageSource};
pub use static_list::StaticSource;
