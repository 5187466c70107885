//! Output generation: the three pipeline JSON files and the run report.
//!
//! # Output Structure
//!
//! ```text
//! output_dir/
//! ├── multi_source_links.json      # discovered article links
//! ├── multi_source_articles.json   # every extraction attempt, any status
//! ├── multi_source_summaries.json  # successful summaries only
//! └── multi_source_summaries.backup.json  # previous summaries, if any
//! ```

pub mod json;
pub mod report;

pub use json::{write_articles, write_links, write_summaries};
pub use report::RunReport;
