use clap::{clap_app, ArgMatches};
use std::{env, path::PathBuf};
use super::credentials::DEFAULT_CREDENTIALS_FILE;
use super::error::ConfigError;
use super::parser::DocumentShape;
use super::store::DEFAULT_COLLECTION;
use super::utility::{read_text, read_text_or, read_yes_or_no};

#[derive(Debug, Clone, PartialEq)]
pub enum Backend {
    Firestore {
        credentials: PathBuf,
        // falls back to project_id of the key file
        project: Option<String>,
        // defaults to the public firestore api
        endpoint: Option<String>,
    },
    Dynamo {
        region: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub backend: Backend,
    pub collection: String,
    pub shape: DocumentShape,
    pub should_preview_record: bool,
}

pub const BACKEND_DEFAULT: &str = "firestore";

pub fn get_arguments() -> Result<(String, Config), ConfigError> {
    let args: Vec<String> = env::args().collect();

    if args.len() == 2 && args[1] != "-h" && args[1] != "--help"
        && args[1] != "-V" && args[1] != "--version" {
        get_arguments_interactive_mode(args[1].to_string())
    } else {
        get_arguments_command_mode(args)
    }
}

fn get_arguments_command_mode(args: Vec<String>) -> Result<(String, Config), ConfigError> {
    let matches = clap_app!(x =>
        (name: "CSV_To_DocStore")
        (version: "0.2.0")
        (author: "Devin (github.com/devin-git)")
        (about: "Upload the products of a CSV file as documents, one document per row")
        (@arg FILENAME: +required "Provide CSV filename")
        (@arg BACKEND: -b --backend +takes_value "Specify document store: firestore or dynamodb. Default firestore")
        (@arg CREDENTIALS: -c --credentials +takes_value "Specify service account key file for firestore. Default firebase-key.json")
        (@arg PROJECT: --project +takes_value "Specify firestore project id. Default project_id of the key file")
        (@arg ENDPOINT: --endpoint +takes_value "Specify firestore api base url, e.g. an emulator. Default https://firestore.googleapis.com/v1")
        (@arg REGION: -r --region +takes_value "Specify AWS region for dynamodb. E.g. ap-southeast-2, us-west-1, etc.")
        (@arg COLLECTION: -t --collection +takes_value "Specify collection (or DynamoDB table) name. Default products")
        (@arg LEGACY: --legacy "Upload the older single image_url document shape")
        (@arg PREVIEW: -p --preview "Preview the first document before uploading")
    )
    .get_matches_from(args);

    let filename = matches.value_of("FILENAME").unwrap_or_default().to_string();
    Ok((filename, config_from_matches(&matches)?))
}

fn config_from_matches(matches: &ArgMatches) -> Result<Config, ConfigError> {
    let backend = build_backend(
        matches.value_of("BACKEND").unwrap_or(BACKEND_DEFAULT),
        matches.value_of("CREDENTIALS"),
        matches.value_of("PROJECT"),
        matches.value_of("ENDPOINT"),
        matches.value_of("REGION"),
    )?;

    Ok(Config {
        backend,
        collection: matches
            .value_of("COLLECTION")
            .unwrap_or(DEFAULT_COLLECTION)
            .to_string(),
        shape: if matches.is_present("LEGACY") {
            DocumentShape::Legacy
        } else {
            DocumentShape::Current
        },
        should_preview_record: matches.is_present("PREVIEW"),
    })
}

fn build_backend(
    name: &str,
    credentials: Option<&str>,
    project: Option<&str>,
    endpoint: Option<&str>,
    region: Option<&str>,
) -> Result<Backend, ConfigError> {
    match name.to_lowercase().as_str() {
        "firestore" => Ok(Backend::Firestore {
            credentials: PathBuf::from(credentials.unwrap_or(DEFAULT_CREDENTIALS_FILE)),
            project: project.filter(|p| !p.is_empty()).map(str::to_owned),
            endpoint: endpoint.filter(|e| !e.is_empty()).map(str::to_owned),
        }),
        "dynamodb" | "dynamo" => match region.filter(|r| !r.is_empty()) {
            Some(region) => Ok(Backend::Dynamo {
                region: region.to_owned(),
            }),
            None => Err(ConfigError::MissingRegion),
        },
        other => Err(ConfigError::InvalidBackend(other.to_owned())),
    }
}

fn get_arguments_interactive_mode(filename: String) -> Result<(String, Config), ConfigError> {

    // initialise parameters for the document store
    let backend_name = read_text_or("Input document store (firestore or dynamodb)", BACKEND_DEFAULT)?;
    let backend = if backend_name.to_lowercase().starts_with("dynamo") {
        let region = read_text("Input Region (eg. ap-southeast-2)")?;
        build_backend(&backend_name, None, None, None, Some(&region))?
    } else {
        let credentials = read_text_or("Input service account key file", DEFAULT_CREDENTIALS_FILE)?;
        let project = read_text("Input project id (empty to use the key file's)")?;
        build_backend(&backend_name, Some(&credentials), Some(&project), None, None)?
    };
    let collection = read_text_or("Input collection name", DEFAULT_COLLECTION)?;
    let legacy = read_yes_or_no("Would you like to upload the older image_url document shape?", false)?;
    let should_preview_record = read_yes_or_no("Would you like to preview the first document before uploading?", true)?;
    println!();

    Ok((filename, Config {
        backend,
        collection,
        shape: if legacy { DocumentShape::Legacy } else { DocumentShape::Current },
        should_preview_record,
    }))
}
