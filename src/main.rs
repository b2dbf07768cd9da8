use std::{error::Error, io, path::Path, process::exit};
use tracing::info;
use modules::config::{get_arguments, Backend, Config};
use modules::credentials::{ServiceAccountKey, TokenSource};
use modules::dynamo::Dynamo;
use modules::error::{AppError, ConfigError};
use modules::firestore::FirestoreStore;
use modules::store::DocumentStore;
use modules::uploader::Uploader;
use modules::utility::{open_csv, read_yes_or_no};

mod modules;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    init_logging();

    if let Err(err) = run().await {
        eprint!("{}", error_report(&err));
        exit(1);
    }
}

// error line followed by its causes, one per line
fn error_report(err: &dyn Error) -> String {
    let mut report = format!("Error: {}\n", err);
    let mut last = err.to_string();
    let mut source = err.source();

    while let Some(cause) = source {
        let text = cause.to_string();
        // skip causes the previous message already spells out
        if !last.ends_with(&text) {
            report.push_str(&format!("  caused by: {}\n", text));
        }
        last = text;
        source = cause.source();
    }

    report
}

async fn run() -> Result<(), AppError> {
    let (filename, config) = get_arguments()?;

    // credentials are read once, before the csv is touched
    let store = connect(&config)?;
    info!(store = store.name(), file = filename.as_str(), "document store ready");

    let mut reader = open_csv(Path::new(&filename))?;

    let mut uploader = Uploader::new(&*store, &config.collection, config.shape);
    if config.should_preview_record {
        uploader = uploader.with_preview(|_| {
            read_yes_or_no("Does the document format look correct?", true)
        });
    }

    let stdout = io::stdout();
    uploader.upload(&mut reader, &mut stdout.lock()).await?;

    Ok(())
}

fn connect(config: &Config) -> Result<Box<dyn DocumentStore>, AppError> {
    match &config.backend {
        Backend::Firestore { credentials, project, endpoint } => {
            let key = ServiceAccountKey::load(credentials)?;
            let project_id = project
                .clone()
                .or_else(|| key.project_id.clone())
                .ok_or(ConfigError::MissingProject)?;

            let http = reqwest::Client::new();
            let tokens = TokenSource::new(key, http.clone());
            let mut store = FirestoreStore::new(http, tokens, project_id);
            if let Some(endpoint) = endpoint {
                store = store.with_base_url(endpoint);
            }
            Ok(Box::new(store))
        }
        Backend::Dynamo { region } => Ok(Box::new(Dynamo::new(region)?)),
    }
}

fn init_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    // Use RUST_LOG if set, otherwise default to info level for our crate
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("csv_to_docstore=info"));

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_writer(io::stderr))
        .with(filter)
        .init();
}
