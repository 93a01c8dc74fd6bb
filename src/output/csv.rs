//! CSV layout for the product upload feed

use crate::error::{Error, Result};
use crate::types::Product;
use chrono::SecondsFormat;

/// Fixed columns written before the attribute pairs
pub const BASE_COLUMNS: [&str; 12] = [
    "Auction Title",
    "Inventory Number",
    "Item Create Date",
    "UPC",
    "Brand",
    "Condition",
    "Seller Cost",
    "Buy It Now Price",
    "Picture URLs",
    "Relationship Name",
    "Labels",
    "Classification",
];

/// Header row plus one row per product
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvLayout {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl CsvLayout {
    /// Lay out products as upload rows
    ///
    /// Each product's attributes become `AttributeNName`/`AttributeNValue`
    /// pairs; the number of pairs is the largest attribute count among the
    /// products, with shorter rows padded with empty cells.
    pub fn from_products(products: &[Product]) -> Self {
        let pairs = products
            .iter()
            .map(|p| p.attributes.len())
            .max()
            .unwrap_or(0);

        let mut headers: Vec<String> = BASE_COLUMNS.iter().map(ToString::to_string).collect();
        for n in 1..=pairs {
            headers.push(format!("Attribute{n}Name"));
            headers.push(format!("Attribute{n}Value"));
        }

        let rows = products.iter().map(|p| row(p, pairs)).collect();
        Self { headers, rows }
    }

    /// Header row
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Data rows
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of data rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether there are no data rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Serialize header and rows as CSV
    pub fn to_csv_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer
            .into_inner()
            .map_err(|e| Error::output(format!("Failed to flush CSV: {e}")))
    }
}

fn row(product: &Product, pairs: usize) -> Vec<String> {
    let mut cells = vec![
        text(&product.title),
        text(&product.sku),
        product
            .create_date_utc
            .map(|d| d.to_rfc3339_opts(SecondsFormat::Secs, true))
            .unwrap_or_default(),
        text(&product.upc),
        text(&product.brand),
        text(&product.condition),
        money(product.cost),
        money(product.buy_it_now_price),
        product.picture_urls(),
        text(&product.relationship_name),
        product.label_names(),
        text(&product.classification),
    ];

    for n in 0..pairs {
        match product.attributes.get(n) {
            Some(attr) => {
                cells.push(attr.name.clone());
                cells.push(text(&attr.value));
            }
            None => {
                cells.push(String::new());
                cells.push(String::new());
            }
        }
    }
    cells
}

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn money(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.2}")).unwrap_or_default()
}
