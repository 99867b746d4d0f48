use serde::Deserialize;

use crate::dal::ProjectStore;
use crate::error::StageError;
use crate::services::ollama::{create_messages, Format, FormatType, OllamaClient};

const SYSTEM_PROMPT: &str = "You are a research assistant skilled at generating Google search \
    queries. Brainstorm 10 to 20 variations that will provide useful results when I give you an \
    objective. Provide only the search queries without any other information.";

// Bounds the loop against a model that keeps replying with nothing new.
const MAX_GENERATION_ROUNDS: usize = 8;

#[derive(Deserialize)]
struct QueriesReply {
    queries: Vec<String>,
}

fn queries_format() -> Format {
    Format::object().with_property("queries", FormatType::Array, true)
}

/// Grows the persisted query list to the configured target with
/// objective-conditioned model calls. Each round's additions are saved
/// before the next call, so a failed round loses nothing already appended.
pub async fn generate_queries(store: &ProjectStore) -> Result<(), StageError> {
    log::info!("Loading project file: {}", store.path().display());
    let mut project = store.load()?;

    let target = match project.num_queries {
        0 => 10,
        target => target,
    };
    let client = OllamaClient::for_project(&project);
    let format = queries_format();

    let mut rounds = 0;
    while project.search_queries.len() < target {
        if rounds >= MAX_GENERATION_ROUNDS {
            return Err(StageError::GenerationFailure(format!(
                "target not reached after {} model calls",
                MAX_GENERATION_ROUNDS
            )));
        }
        rounds += 1;

        log::info!(
            "Generating queries... Current count: {}, Target: {}",
            project.search_queries.len(),
            target
        );

        let messages = create_messages(Some(SYSTEM_PROMPT), project.objective.as_deref());
        let response = client
            .chat(&project.model, &messages, Some(&format))
            .await
            .map_err(|e| StageError::GenerationFailure(e.to_string()))?;

        let reply: QueriesReply = serde_json::from_str(&response).map_err(|e| {
            StageError::GenerationFailure(format!("reply did not include queries: {}", e))
        })?;

        merge_new_queries(&mut project.search_queries, reply.queries, target);
        store.save(&project)?;
        log::info!("Updated query count: {}", project.search_queries.len());
    }

    log::info!(
        "Project file updated with {} queries at {}",
        project.search_queries.len(),
        store.path().display()
    );

    Ok(())
}

/// Appends queries not already present, stopping exactly at the target.
fn merge_new_queries(existing: &mut Vec<String>, new_queries: Vec<String>, target: usize) {
    for query in new_queries {
        if existing.len() >= target {
            break;
        }
        if !existing.contains(&query) {
            existing.push(query);
        }
    }
}
