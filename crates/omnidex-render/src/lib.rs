pub mod annotate;

pub use annotate::ResultAnnotator;
