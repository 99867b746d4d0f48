use std::collections::HashMap;
use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context};
use env_logger::Env;
use scour::configuration::get_configuration;
use scour::dal::ProjectStore;
use scour::stages;

const USAGE: &str = "Usage: scour <command> --file <project.scour> [--out <file.csv>]\n\
    Commands: create | generate-queries | run-search | parse-pages | export-csv";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let configuration = get_configuration().context("Failed to read configuration")?;

    let args: Vec<String> = env::args().skip(1).collect();
    let Some(command) = args.first() else {
        bail!("{}", USAGE);
    };
    let flags = parse_cli_args(&args[1..]);

    let file = flags
        .get("file")
        .cloned()
        .unwrap_or_else(|| "output.scour".to_string());
    let store = ProjectStore::new(&file);

    match command.as_str() {
        "create" => {
            stages::create::create_project(&store, &configuration)?;
        }
        "generate-queries" => stages::generate_queries::generate_queries(&store).await?,
        "run-search" => stages::run_search::run_search(&store, &configuration).await?,
        "parse-pages" => stages::parse_pages::parse_pages(&store, &configuration).await?,
        "export-csv" => {
            let out = flags.get("out").map(PathBuf::from);
            stages::export::export_csv(&store, out)?;
        }
        other => bail!("Unknown command: {}\n{}", other, USAGE),
    }

    Ok(())
}

/// `--key value` pairs; a flag whose next token is absent or is itself a
/// flag is ignored.
fn parse_cli_args(args: &[String]) -> HashMap<String, String> {
    let mut parsed = HashMap::new();

    for (index, arg) in args.iter().enumerate() {
        if let Some(key) = arg.strip_prefix("--") {
            match args.get(index + 1) {
                Some(value) if !value.starts_with("--") => {
                    parsed.insert(key.to_string(), value.clone());
                }
                _ => {}
            }
        }
    }

    parsed
}
