use csv::StringRecord;
use super::error::{RowError, UploadError};
use super::store::Fields;

pub const DEFAULT_STOCK: i64 = 10;
pub const DEFAULT_DESCRIPTION: &str = "No description available.";

const CURRENT_COLUMNS: &[&str] = &["name", "price", "category"];
const LEGACY_COLUMNS: &[&str] = &["image_url", "name", "price", "category"];

// which document layout a run produces
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DocumentShape {
    // images list + imagePath + description
    Current,
    // single image_url, fixed stock
    Legacy,
}

impl DocumentShape {
    pub fn required_columns(self) -> &'static [&'static str] {
        match self {
            DocumentShape::Current => CURRENT_COLUMNS,
            DocumentShape::Legacy => LEGACY_COLUMNS,
        }
    }

    // fail on the first required column the header lacks
    pub fn check_header(self, header: &StringRecord) -> Result<(), UploadError> {
        for &column in self.required_columns() {
            if !header.iter().any(|name| name == column) {
                return Err(UploadError::MissingColumn { column });
            }
        }
        Ok(())
    }

    pub fn build(self, row: &CsvRow) -> Result<Product, RowError> {
        match self {
            DocumentShape::Current => ProductDocument::from_row(row).map(Product::Current),
            DocumentShape::Legacy => LegacyProductDocument::from_row(row).map(Product::Legacy),
        }
    }
}

// one data line, looked up by column name
pub struct CsvRow<'a> {
    header: &'a StringRecord,
    record: &'a StringRecord,
}

impl<'a> CsvRow<'a> {
    pub fn new(header: &'a StringRecord, record: &'a StringRecord) -> CsvRow<'a> {
        CsvRow { header, record }
    }

    // on duplicated column names the last one wins
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let index = (0..self.header.len())
            .rev()
            .find(|&i| self.header.get(i) == Some(column))?;
        self.record.get(index)
    }

    fn required(&self, column: &'static str) -> Result<&'a str, RowError> {
        self.get(column).ok_or(RowError::MissingColumn { column })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductDocument {
    pub name: String,
    pub price: f64,
    pub category: String,
    pub stock: i64,
    pub images: Vec<String>,
    // always "" or images[0], kept for single-image consumers
    pub image_path: String,
    pub description: String,
}

impl ProductDocument {
    pub fn from_row(row: &CsvRow) -> Result<ProductDocument, RowError> {
        let images: Vec<String> = match row.get("images") {
            Some(text) if !text.is_empty() => text.split(',').map(str::to_owned).collect(),
            _ => Vec::new(),
        };
        let image_path = images.first().cloned().unwrap_or_default();

        let stock = match row.get("stock") {
            Some(text) => parse_integer("stock", text)?,
            None => DEFAULT_STOCK,
        };

        Ok(ProductDocument {
            name: row.required("name")?.to_owned(),
            price: parse_float("price", row.required("price")?)?,
            category: row.required("category")?.to_owned(),
            stock,
            images,
            image_path,
            description: row.get("description").unwrap_or(DEFAULT_DESCRIPTION).to_owned(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegacyProductDocument {
    pub image_url: String,
    pub name: String,
    pub price: f64,
    pub category: String,
    pub stock: i64,
}

impl LegacyProductDocument {
    pub fn from_row(row: &CsvRow) -> Result<LegacyProductDocument, RowError> {
        Ok(LegacyProductDocument {
            image_url: row.required("image_url")?.to_owned(),
            name: row.required("name")?.to_owned(),
            price: parse_float("price", row.required("price")?)?,
            category: row.required("category")?.to_owned(),
            stock: DEFAULT_STOCK,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Product {
    Current(ProductDocument),
    Legacy(LegacyProductDocument),
}

impl Product {
    pub fn name(&self) -> &str {
        match self {
            Product::Current(product) => &product.name,
            Product::Legacy(product) => &product.name,
        }
    }

    // document payload, field names as stored
    pub fn to_fields(&self) -> Fields {
        let mut fields = Fields::new();

        match self {
            Product::Current(product) => {
                fields.insert("name".to_owned(), product.name.as_str().into());
                fields.insert("price".to_owned(), product.price.into());
                fields.insert("category".to_owned(), product.category.as_str().into());
                fields.insert("stock".to_owned(), product.stock.into());
                fields.insert("images".to_owned(), product.images.clone().into());
                fields.insert("imagePath".to_owned(), product.image_path.as_str().into());
                fields.insert("description".to_owned(), product.description.as_str().into());
            }
            Product::Legacy(product) => {
                fields.insert("image_url".to_owned(), product.image_url.as_str().into());
                fields.insert("name".to_owned(), product.name.as_str().into());
                fields.insert("price".to_owned(), product.price.into());
                fields.insert("category".to_owned(), product.category.as_str().into());
                fields.insert("stock".to_owned(), product.stock.into());
            }
        }

        fields
    }

    // console confirmation printed once the document is saved
    pub fn upload_message(&self) -> String {
        match self {
            Product::Current(product) => {
                format!("Uploaded: {} with {} images", product.name, product.images.len())
            }
            Product::Legacy(product) => format!("Uploaded: {}", product.name),
        }
    }
}

fn parse_float(column: &'static str, text: &str) -> Result<f64, RowError> {
    match text.trim().parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(n),
        _ => Err(invalid_number(column, text)),
    }
}

fn parse_integer(column: &'static str, text: &str) -> Result<i64, RowError> {
    text.trim().parse::<i64>().map_err(|_| invalid_number(column, text))
}

fn invalid_number(column: &'static str, text: &str) -> RowError {
    RowError::InvalidNumber {
        column,
        value: text.to_owned(),
    }
}
