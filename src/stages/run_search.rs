use crate::configuration::Settings;
use crate::dal::ProjectStore;
use crate::domain::{Project, SearchHit};
use crate::error::StageError;
use crate::services::search::Adapter;

/// Retrieves search hits for every generated query through the configured
/// engine adapter. One query is one unit of work: its hits are appended and
/// the cursor advanced in a single save, so a crash loses at most the query
/// in flight and a re-run resumes at the persisted cursor.
pub async fn run_search(store: &ProjectStore, settings: &Settings) -> Result<(), StageError> {
    log::info!("Loading project file: {}", store.path().display());
    let mut project = store.load()?;

    let engine = project.search_engine;
    let adapter = Adapter::for_engine(engine)
        .ok_or_else(|| StageError::UnsupportedEngine(engine.to_string()))?;

    let queries = project.search_queries.clone();
    let num_results = project.num_results_per_query;
    let budget = page_budget(num_results);

    let start = resume_index(project.current_search_query_index, queries.len());
    project.current_search_query_index = Some(start);
    store.save(&project)?;

    for (index, query) in queries.iter().enumerate().skip(start) {
        log::info!("Searching for query: \"{}\", page count: {}", query, budget);

        match adapter
            .search(query, budget, num_results, store, &settings.webdriver)
            .await
        {
            Ok(hits) => {
                log::info!("Found {} results for query: \"{}\"", hits.len(), query);

                // Fresh snapshot: the adapter has been persisting status
                // fields while this query ran.
                let mut project = store.load()?;
                let kept = hits.len().min(num_results);
                log::info!("Saving {} results for query: \"{}\"", kept, query);
                apply_query_results(&mut project, hits, index);
                store.save(&project)?;
            }
            Err(e) => {
                log::error!("Failed to search query \"{}\": {}", query, e);

                let mut project = store.load()?;
                apply_query_results(&mut project, Vec::new(), index);
                store.save(&project)?;
            }
        }
    }

    log::info!("Project file updated: {}", store.path().display());

    Ok(())
}

/// Pages needed to cover the per-query result budget, with slack for
/// ad-heavy or duplicate-heavy pages.
fn page_budget(num_results_per_query: usize) -> usize {
    num_results_per_query.div_ceil(10) + 2
}

fn resume_index(cursor: Option<usize>, query_count: usize) -> usize {
    cursor.unwrap_or(0).min(query_count)
}

/// One query's unit of work: keep at most `numResultsPerQuery` hits and
/// move the cursor past the query. A failed query applies an empty hit
/// list, so the cursor still ends at the query count.
fn apply_query_results(project: &mut Project, hits: Vec<SearchHit>, query_index: usize) {
    let cap = project.num_results_per_query;
    project.search_results.extend(hits.into_iter().take(cap));
    project.current_search_query_index = Some(query_index + 1);
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{apply_query_results, page_budget, resume_index};
    use crate::domain::{Mode, Project, SearchEngine, SearchHit};

    fn hit(url: &str) -> SearchHit {
        SearchHit {
            title: "title".to_string(),
            description: "description".to_string(),
            search_query: Some("query".to_string()),
            position: None,
            url: url.to_string(),
            is_ad: false,
            retrieved_at: Utc::now(),
            accessed_at: None,
            search_engine: SearchEngine::Bing,
        }
    }

    fn project(num_results_per_query: usize, query_count: usize) -> Project {
        Project {
            mode: Mode::Basic,
            llm_provider: "ollama".to_string(),
            model: "llama3.2:3b".to_string(),
            ollama_url: None,
            ollama_port: None,
            created_at: Utc::now(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            search_engine: SearchEngine::Bing,
            objective: None,
            num_queries: query_count,
            num_results_per_query,
            current_search_query_index: None,
            current_search_result_index: None,
            search_queries: (0..query_count).map(|i| format!("query {}", i)).collect(),
            search_results: vec![],
            columns: vec![],
            rows: vec![],
            status_message: None,
        }
    }

    #[test]
    fn page_budget_covers_the_result_target_with_slack() {
        assert_eq!(page_budget(10), 3);
        assert_eq!(page_budget(11), 4);
        assert_eq!(page_budget(25), 5);
        assert_eq!(page_budget(1), 3);
    }

    #[test]
    fn fresh_project_starts_at_the_first_query() {
        assert_eq!(resume_index(None, 5), 0);
    }

    #[test]
    fn resumes_at_the_persisted_cursor() {
        assert_eq!(resume_index(Some(3), 5), 3);
    }

    #[test]
    fn completed_run_has_nothing_left_to_do() {
        // Cursor equal to the query count means a second run is a no-op,
        // so no duplicate hits can be appended.
        assert_eq!(resume_index(Some(5), 5), 5);
        assert_eq!(resume_index(Some(9), 5), 5);
    }

    #[test]
    fn query_results_are_truncated_to_the_configured_cap() {
        let mut project = project(2, 3);
        let hits = vec![hit("https://a.com"), hit("https://b.com"), hit("https://c.com")];

        apply_query_results(&mut project, hits, 0);

        assert_eq!(project.search_results.len(), 2);
        assert_eq!(project.search_results[0].url, "https://a.com");
        assert_eq!(project.search_results[1].url, "https://b.com");
        assert_eq!(project.current_search_query_index, Some(1));
    }

    #[test]
    fn a_failed_query_still_advances_the_cursor() {
        let mut project = project(10, 3);
        project.current_search_query_index = Some(1);

        apply_query_results(&mut project, Vec::new(), 1);

        assert!(project.search_results.is_empty());
        assert_eq!(project.current_search_query_index, Some(2));
    }

    #[test]
    fn applying_every_query_leaves_nothing_to_resume() {
        let mut project = project(10, 2);

        apply_query_results(&mut project, vec![hit("https://a.com")], 0);
        apply_query_results(&mut project, vec![hit("https://b.com")], 1);

        let cursor = project.current_search_query_index;
        assert_eq!(cursor, Some(2));
        assert_eq!(resume_index(cursor, project.search_queries.len()), 2);
    }
}
