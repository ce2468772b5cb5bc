mod analytics;
mod graph;
mod load;
mod refs;
mod tred;

pub use analytics::ComponentStats;
pub use graph::{MAX_CATEGORIES, Paper, PaperGraph, PaperRecord, Reference, TredMark};
pub use load::{category_code, category_name, load_papers};
pub use refs::{RECORD_WIDTH, RefRecord, decode_refs, encode_refs};
pub use tred::{TransitiveReduction, TredJob};
