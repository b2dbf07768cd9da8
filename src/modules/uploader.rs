use csv::{Reader, StringRecord};
use std::io::{self, Read, Write};
use tracing::{debug, info};
use super::error::UploadError;
use super::parser::{CsvRow, DocumentShape};
use super::store::{DocumentStore, Fields};

pub const COMPLETION_MESSAGE: &str = "All products uploaded successfully!";

// asked once with the first document, false cancels the run
type Confirm<'a> = Box<dyn FnMut(&Fields) -> io::Result<bool> + 'a>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UploadSummary {
    pub uploaded: usize,
}

pub struct Uploader<'a> {
    store: &'a dyn DocumentStore,
    collection: String,
    shape: DocumentShape,
    confirm: Option<Confirm<'a>>,
}

impl<'a> Uploader<'a> {
    pub fn new(store: &'a dyn DocumentStore, collection: &str, shape: DocumentShape) -> Uploader<'a> {
        Uploader {
            store,
            collection: collection.to_owned(),
            shape,
            confirm: None,
        }
    }

    // preview the first document before anything is written
    pub fn with_preview<F>(mut self, confirm: F) -> Uploader<'a>
    where
        F: FnMut(&Fields) -> io::Result<bool> + 'a,
    {
        self.confirm = Some(Box::new(confirm));
        self
    }

    // one document and one console line per row, stops at the first error
    pub async fn upload<R: Read, W: Write>(
        &mut self,
        reader: &mut Reader<R>,
        out: &mut W,
    ) -> Result<UploadSummary, UploadError> {
        let header = reader.headers()?.clone();
        self.shape.check_header(&header)?;

        info!(
            store = self.store.name(),
            collection = self.collection.as_str(),
            shape = ?self.shape,
            "starting to upload products"
        );

        let mut record = StringRecord::new();
        let mut row = 0;

        while reader.read_record(&mut record)? {
            row += 1;

            let product = self
                .shape
                .build(&CsvRow::new(&header, &record))
                .map_err(|source| UploadError::Row { row, source })?;
            let fields = product.to_fields();

            if row == 1 {
                self.preview(&fields, out)?;
            }

            let id = self
                .store
                .create_document(&self.collection, &fields)
                .await
                .map_err(|source| UploadError::Write {
                    row,
                    collection: self.collection.clone(),
                    source,
                })?;
            debug!(row, id = id.as_str(), name = product.name(), "document created");

            writeln!(out, "{}", product.upload_message())?;
        }

        writeln!(out, "{}", COMPLETION_MESSAGE)?;
        info!(uploaded = row, "all rows processed");

        Ok(UploadSummary { uploaded: row })
    }

    fn preview<W: Write>(&mut self, fields: &Fields, out: &mut W) -> Result<(), UploadError> {
        if let Some(confirm) = self.confirm.as_mut() {
            let json = serde_json::to_string(fields).map_err(io::Error::from)?;
            writeln!(out, "Preview the first document: {}", json)?;
            out.flush()?;

            if !confirm(fields).map_err(UploadError::Prompt)? {
                return Err(UploadError::Cancelled);
            }
        }
        Ok(())
    }
}
