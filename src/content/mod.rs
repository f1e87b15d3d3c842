//! Content module - posts, the listing flow, the detail flow and rich text

pub mod detail;
pub mod listing;
mod post;
pub mod richtext;

pub use listing::{Listing, LoadOutcome, PendingLoad};
pub use post::{
    display_date, paths_query, summary_query, Banner, PostContent, PostDetail, PostDetailData,
    PostPage, PostSummary, PostSummaryData, PostView, RawSection, Section,
};
