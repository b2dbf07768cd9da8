pub mod config;
pub mod credentials;
pub mod dynamo;
pub mod error;
pub mod firestore;
pub mod parser;
pub mod store;
pub mod uploader;
pub mod utility;

#[cfg(test)]
mod test_server;
