use chrono::Utc;

use crate::configuration::Settings;
use crate::dal::ProjectStore;
use crate::domain::Project;
use crate::error::StageError;

/// Writes a fresh project with configured defaults and no progress. The
/// objective and column schema are filled in by the surrounding application
/// before the pipeline stages run.
pub fn create_project(store: &ProjectStore, settings: &Settings) -> Result<Project, StageError> {
    let project = Project {
        mode: settings.project.mode,
        llm_provider: settings.llm.provider.clone(),
        model: settings.llm.model.clone(),
        ollama_url: Some(settings.llm.host.clone()),
        ollama_port: Some(settings.llm.port),
        created_at: Utc::now(),
        app_version: env!("CARGO_PKG_VERSION").to_string(),
        search_engine: settings.project.search_engine,
        objective: None,
        num_queries: settings.project.num_queries,
        num_results_per_query: settings.project.num_results_per_query,
        current_search_query_index: None,
        current_search_result_index: None,
        search_queries: vec![],
        search_results: vec![],
        columns: vec![],
        rows: vec![],
        status_message: None,
    };

    store.save(&project)?;
    log::info!("Initialized project file at {}", store.path().display());

    Ok(project)
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::create_project;
    use crate::configuration::get_configuration;
    use crate::dal::ProjectStore;
    use crate::domain::SearchEngine;

    #[test]
    fn new_project_has_defaults_and_no_progress() {
        let dir = tempdir().unwrap();
        let store = ProjectStore::new(dir.path().join("output.scour"));
        let settings = get_configuration().unwrap();

        let project = create_project(&store, &settings).unwrap();

        assert_eq!(project.search_engine, SearchEngine::Bing);
        assert_eq!(project.num_queries, 10);
        assert!(project.search_queries.is_empty());
        assert!(project.current_search_query_index.is_none());
        assert!(project.objective.is_none());

        let loaded = store.load().unwrap();
        assert_eq!(loaded.model, project.model);
    }
}
