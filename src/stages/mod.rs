pub mod create;
pub mod export;
pub mod generate_queries;
pub mod parse_pages;
pub mod run_search;
