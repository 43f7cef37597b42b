//! Stop feed format and parsing.

pub mod format;
pub mod parser;

pub use format::FeedFormat;
pub use parser::{parse_feed, parse_line, ParsedFeed};
