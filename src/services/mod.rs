pub mod browser;
pub mod ollama;
pub mod page_text;
pub mod search;
pub mod stealth;

pub use browser::*;
pub use ollama::*;
pub use page_text::*;
