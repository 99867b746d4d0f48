use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::Project;
use crate::error::StoreError;

/// Durable store for one project file. Every save writes the full snapshot,
/// so a reader never observes a half-applied unit of work.
#[derive(Debug, Clone)]
pub struct ProjectStore {
    path: PathBuf,
}

impl ProjectStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        ProjectStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Project, StoreError> {
        let content = fs::read_to_string(&self.path).map_err(StoreError::Unreadable)?;
        serde_json::from_str(&content).map_err(StoreError::Corrupt)
    }

    pub fn save(&self, project: &Project) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(project).map_err(StoreError::Serialize)?;
        fs::write(&self.path, json).map_err(StoreError::Unwritable)
    }

    /// Best-effort live-progress note for external observers. Reads a fresh
    /// snapshot and rewrites only the status field, so a status update can
    /// never clobber results appended by an earlier unit of work.
    pub fn write_status(&self, message: &str) {
        match self.load() {
            Ok(mut project) => {
                project.status_message = Some(message.to_string());
                if let Err(e) = self.save(&project) {
                    log::error!("Failed to persist status message: {}", e);
                }
            }
            Err(e) => log::error!("Failed to load project for status update: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use tempfile::tempdir;

    use super::ProjectStore;
    use crate::domain::{Mode, Project, SearchEngine};
    use crate::error::StoreError;

    fn blank_project() -> Project {
        Project {
            mode: Mode::Basic,
            llm_provider: "ollama".to_string(),
            model: "llama3.2:3b".to_string(),
            ollama_url: None,
            ollama_port: None,
            created_at: Utc::now(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            search_engine: SearchEngine::Google,
            objective: Some("price out climbing gyms".to_string()),
            num_queries: 5,
            num_results_per_query: 10,
            current_search_query_index: None,
            current_search_result_index: None,
            search_queries: vec!["climbing gym day pass".to_string()],
            search_results: vec![],
            columns: vec![],
            rows: vec![],
            status_message: None,
        }
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let store = ProjectStore::new(dir.path().join("output.scour"));
        let project = blank_project();

        store.save(&project).unwrap();
        let loaded = store.load().unwrap();

        assert_eq!(loaded.search_queries, project.search_queries);
        assert_eq!(loaded.objective, project.objective);
        assert_eq!(loaded.search_engine, SearchEngine::Google);
    }

    #[test]
    fn load_rejects_malformed_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.scour");
        std::fs::write(&path, "{ not json").unwrap();

        let result = ProjectStore::new(&path).load();

        assert!(matches!(result, Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempdir().unwrap();
        let result = ProjectStore::new(dir.path().join("absent.scour")).load();

        assert!(matches!(result, Err(StoreError::Unreadable(_))));
    }

    #[test]
    fn write_status_keeps_other_fields_intact() {
        let dir = tempdir().unwrap();
        let store = ProjectStore::new(dir.path().join("output.scour"));
        store.save(&blank_project()).unwrap();

        store.write_status("Navigating to Bing...");

        let loaded = store.load().unwrap();
        assert_eq!(loaded.status_message.as_deref(), Some("Navigating to Bing..."));
        assert_eq!(loaded.search_queries.len(), 1);
    }
}
