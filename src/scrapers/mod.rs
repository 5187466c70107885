//! Link discovery for the supported Nepali news sources.

pub mod links;
pub mod sources;

pub use links::LinkScraper;
pub use sources::resolve_sources;
