pub mod compute;
pub mod links;

pub use compute::count_and_facets;
pub use links::rewrite_toggle_urls;
