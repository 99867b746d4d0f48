use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Basic,
    Advanced,
}

/// Engine names keep their legacy spellings in the persisted form so that
/// older project files still load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchEngine {
    Google,
    Bing,
    #[serde(rename = "Duck Duck Go")]
    DuckDuckGo,
    #[serde(rename = "random")]
    Random,
}

impl fmt::Display for SearchEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SearchEngine::Google => "Google",
            SearchEngine::Bing => "Bing",
            SearchEngine::DuckDuckGo => "Duck Duck Go",
            SearchEngine::Random => "random",
        };
        write!(f, "{}", name)
    }
}

/// One raw search-engine result, prior to extraction. `searchQuery` and
/// `position` are stamped after per-query deduplication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub search_query: Option<String>,
    #[serde(default)]
    pub position: Option<u32>,
    pub url: String,
    pub is_ad: bool,
    pub retrieved_at: DateTime<Utc>,
    #[serde(default)]
    pub accessed_at: Option<DateTime<Utc>>,
    pub search_engine: SearchEngine,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub title: String,
    pub key: String,
    #[serde(default)]
    pub description: Option<String>,
    pub is_required: bool,
}

/// One finalized extracted record. Values are keyed by column key; the
/// source URL is unique across the row list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub url: String,
    #[serde(flatten)]
    pub values: BTreeMap<String, Option<String>>,
}

/// The durable unit of pipeline state. Serialized as the legacy camelCase
/// JSON format; fields added after the first release default on load.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub mode: Mode,
    pub llm_provider: String,
    pub model: String,
    #[serde(default)]
    pub ollama_url: Option<String>,
    #[serde(default)]
    pub ollama_port: Option<u16>,
    pub created_at: DateTime<Utc>,
    pub app_version: String,
    pub search_engine: SearchEngine,
    #[serde(default)]
    pub objective: Option<String>,
    pub num_queries: usize,
    pub num_results_per_query: usize,
    #[serde(default)]
    pub current_search_query_index: Option<usize>,
    #[serde(default)]
    pub current_search_result_index: Option<usize>,
    pub search_queries: Vec<String>,
    pub search_results: Vec<SearchHit>,
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
    #[serde(default)]
    pub status_message: Option<String>,
}
