pub mod html;

pub use html::HtmlChapterFetcher;
