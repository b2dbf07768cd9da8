use rusoto_core::RusotoError;
use rusoto_dynamodb::PutItemError;
use std::{io, path::PathBuf};
use thiserror::Error;

// everything that can abort an upload run
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Cannot read csv file {}", path.display())]
    OpenCsv {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid csv header: missing required column `{column}`")]
    MissingColumn { column: &'static str },

    #[error("Row {row} cannot be converted to a document")]
    Row {
        row: usize,
        #[source]
        source: RowError,
    },

    #[error("Row {row}: cannot save document to `{collection}`")]
    Write {
        row: usize,
        collection: String,
        #[source]
        source: WriteError,
    },

    #[error("Cannot write console output")]
    Output(#[from] io::Error),

    #[error("Cannot read confirmation of the previewed document")]
    Prompt(#[source] io::Error),

    #[error("Upload cancelled, no documents were saved")]
    Cancelled,
}

// a single row could not be converted into a document
#[derive(Debug, Error, PartialEq)]
pub enum RowError {
    #[error("missing value for `{column}`")]
    MissingColumn { column: &'static str },

    #[error("`{column}` is not a valid number: {value:?}")]
    InvalidNumber { column: &'static str, value: String },
}

// a document store rejected or never received a write
#[derive(Debug, Error)]
pub enum WriteError {
    #[error("DynamoDB put item failed")]
    Dynamo(#[from] RusotoError<PutItemError>),

    #[error("Request to document store failed")]
    Http(#[from] reqwest::Error),

    #[error("Document store rejected the write ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Unexpected response from document store: {message}")]
    InvalidResponse { message: String },

    #[error("Cannot authenticate with document store")]
    Credentials(#[from] CredentialError),
}

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Cannot read credentials file {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid credentials file {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid private key: {message}")]
    Key { message: String },

    #[error("Cannot sign token request")]
    Sign,

    #[error("Token exchange failed: {message}")]
    Exchange { message: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unknown backend `{0}`. Expected firestore or dynamodb")]
    InvalidBackend(String),

    #[error("A region is required for the dynamodb backend")]
    MissingRegion,

    #[error("{0} is not a valid AWS region. Examples of region can be found in help")]
    InvalidRegion(String),

    #[error("No project id given and none found in the credentials file")]
    MissingProject,

    #[error("Failed to read input")]
    Prompt(#[from] io::Error),
}

// top level error reported by main
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Credentials(#[from] CredentialError),

    #[error(transparent)]
    Upload(#[from] UploadError),
}
