pub mod analyze_listing;

pub use analyze_listing::{ANALYZE_LISTING_KIND, AnalyzeListingHandler};
