use std::collections::{BTreeMap, HashSet};

use serde::Deserialize;
use serde_json::Value;

use crate::configuration::Settings;
use crate::dal::ProjectStore;
use crate::domain::{Column, Row, SearchHit};
use crate::error::StageError;
use crate::services::ollama::{create_messages, Format, FormatType, OllamaClient};
use crate::services::page_text::fetch_page_text;

const SYSTEM_PROMPT: &str =
    "You are a diligent research assistant skilled at extracting structured data from text files.";

#[derive(Deserialize)]
struct RelevanceReply {
    relevant: bool,
}

/// Visits every unprocessed hit URL: fetch rendered text, gate on
/// relevance, extract a schema-conforming record, admit it if every
/// required column is filled. State is saved after every hit regardless of
/// outcome, so at most the in-flight hit is lost to a crash.
pub async fn parse_pages(store: &ProjectStore, settings: &Settings) -> Result<(), StageError> {
    log::info!("Loading project file: {}", store.path().display());
    let mut project = store.load()?;

    if project.search_results.is_empty() {
        return Err(StageError::NoSearchResults);
    }

    let format = build_format(&project.columns);
    let validator_format = Format::object().with_property("relevant", FormatType::Boolean, true);
    let client = OllamaClient::for_project(&project);

    let start = resume_index(&project.rows, &project.search_results);
    let total = project.search_results.len();
    let mut processed: HashSet<String> = project.rows.iter().map(|row| row.url.clone()).collect();

    for index in start..total {
        project.current_search_result_index = Some(index);
        let hit = project.search_results[index].clone();

        if processed.contains(&hit.url) {
            log::info!("Skipping already processed URL: {}", hit.url);
            store.save(&project)?;
            continue;
        }

        log::info!("Parsing page: {}", hit.url);
        let page_text = fetch_page_text(&settings.webdriver, &hit.url).await;
        if page_text.is_empty() {
            log::warn!("Failed to load page: {}", hit.url);
            store.save(&project)?;
            continue;
        }

        log::info!("Querying LLM to validate relevance...");
        let validator_messages = create_messages(
            Some(SYSTEM_PROMPT),
            Some(&build_relevance_prompt(project.objective.as_deref(), &page_text)),
        );
        let relevant = match client
            .chat(&project.model, &validator_messages, Some(&validator_format))
            .await
        {
            Ok(reply) => serde_json::from_str::<RelevanceReply>(&reply)
                .map(|r| r.relevant)
                .unwrap_or(false),
            Err(e) => {
                log::warn!("Relevance check failed for {}: {}", hit.url, e);
                false
            }
        };
        if !relevant {
            log::info!("Skipping page because it is not relevant: {}", hit.url);
            store.save(&project)?;
            continue;
        }

        log::info!("Querying LLM to parse data...");
        let messages = create_messages(
            Some(SYSTEM_PROMPT),
            Some(&build_extraction_prompt(&project.columns, &page_text)),
        );
        let reply = match client.chat(&project.model, &messages, Some(&format)).await {
            Ok(reply) => reply,
            Err(e) => {
                log::warn!("Failed to parse page: {}: {}", hit.url, e);
                store.save(&project)?;
                continue;
            }
        };

        let record = match serde_json::from_str::<Value>(&reply) {
            Ok(Value::Object(map)) => clean_record(map),
            _ => {
                log::warn!("Failed to parse page: {}", hit.url);
                store.save(&project)?;
                continue;
            }
        };

        if missing_required_value(&project.columns, &record) {
            log::warn!("Skipping page because a required value is null or empty.");
            store.save(&project)?;
        } else {
            let row = Row {
                url: hit.url.clone(),
                values: record,
            };
            log::info!("Result: {:?}", row);
            project.rows.push(row);
            processed.insert(hit.url.clone());
            store.save(&project)?;
        }
    }

    project.current_search_result_index = Some(total);
    store.save(&project)?;
    log::info!("Project file updated: {}", store.path().display());

    Ok(())
}

/// Frontier for resumption: the hit right after the last admitted row's
/// URL, or the beginning when no rows exist or the URL is not in hit
/// order (the processed set covers that ambiguity).
fn resume_index(rows: &[Row], hits: &[SearchHit]) -> usize {
    let Some(last_url) = rows.last().map(|row| row.url.as_str()) else {
        return 0;
    };

    match hits.iter().position(|hit| hit.url == last_url) {
        Some(index) => index + 1,
        None => 0,
    }
}

/// Every column becomes a required string property in the request schema;
/// required-ness is enforced after the reply comes back, not by the model.
fn build_format(columns: &[Column]) -> Format {
    columns.iter().fold(Format::object(), |format, column| {
        format.with_property(&column.key, FormatType::String, true)
    })
}

fn build_relevance_prompt(objective: Option<&str>, text: &str) -> String {
    format!(
        "Is the provided text relevant to the objective stated? The text came from a web \
         search while researching the objective.\n\nObjective:\n{}\n\nText:\n{}",
        objective.unwrap_or_default(),
        text
    )
}

fn build_extraction_prompt(columns: &[Column], text: &str) -> String {
    let mut prompt = String::from(
        "Please parse the following text into a JSON object. Reply with the JSON object and \
         nothing else.\n\n",
    );

    for (i, column) in columns.iter().enumerate() {
        prompt.push_str(&format!(
            "{}. {}: {}\n",
            i + 1,
            column.key,
            column.description.as_deref().unwrap_or_default()
        ));
    }

    prompt.push_str("\nIf you are not sure about a field, put a null response.\n");
    prompt.push_str("Here is the text:\n");
    prompt.push_str(text);

    prompt
}

/// The model is not trusted to emit native null: the literal string
/// "null" (and actual JSON null) both become an absent value.
fn clean_record(map: serde_json::Map<String, Value>) -> BTreeMap<String, Option<String>> {
    map.into_iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) if s == "null" => None,
                Value::String(s) => Some(s),
                Value::Null => None,
                other => Some(other.to_string()),
            };
            (key, value)
        })
        .collect()
}

fn missing_required_value(columns: &[Column], record: &BTreeMap<String, Option<String>>) -> bool {
    columns
        .iter()
        .filter(|column| column.is_required)
        .any(|column| match record.get(&column.key) {
            Some(Some(value)) => value.trim().is_empty(),
            _ => true,
        })
}
