//! AST passes run between parsing and rendering

pub mod math;
pub mod rebase;
pub mod refs;
pub mod table;

pub use math::{extract_math, join_math_block, parse_math};
pub use rebase::{rebase_url, rebase_url_in_ast};
pub use refs::replace_ref_with_def;
pub use table::parse_in_list_tables;
