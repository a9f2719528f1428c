pub mod order_index;
pub mod working_set;

pub use order_index::OrderedIndex;
pub use working_set::{ WorkingSetCache, DEFAULT_CEILING };
