// Adapters behind the app ports
pub mod file_page_source;
pub mod html_tables;
pub mod http_page_source;

pub use file_page_source::FilePageSource;
pub use html_tables::parse_tables;
pub use http_page_source::HttpPageSource;
