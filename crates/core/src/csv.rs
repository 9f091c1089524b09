//! CSV encoding and the fixed export schemas.
//!
//! Fields containing a comma, double quote, carriage return or newline are
//! wrapped in double quotes with inner quotes doubled. Missing values render
//! as empty fields. The header row is always written, even with no data rows,
//! and every row (header included) ends with `\n`.

use std::borrow::Cow;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::{LedgerEntryId, OrderId, OrderItemId, OrderStatus, Points, ProductId, UserId, VariantId};

/// Quote a single field if it needs it.
///
/// ```
/// use perkshop_core::csv::escape_field;
///
/// assert_eq!(escape_field("plain"), "plain");
/// assert_eq!(escape_field("a,b"), "\"a,b\"");
/// assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
/// ```
#[must_use]
pub fn escape_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

/// Incremental CSV builder.
#[derive(Debug, Clone)]
pub struct CsvWriter {
    buf: String,
    rows: usize,
}

impl CsvWriter {
    /// Start a document with the given header row.
    #[must_use]
    pub fn new(headers: &[&str]) -> Self {
        let mut writer = Self {
            buf: String::new(),
            rows: 0,
        };
        writer.push_line(headers.iter().map(|h| Some(*h)));
        writer
    }

    /// Append a data row. `None` fields are written empty.
    pub fn write_row<I, T>(&mut self, fields: I)
    where
        I: IntoIterator<Item = Option<T>>,
        T: AsRef<str>,
    {
        self.push_line(fields);
        self.rows += 1;
    }

    /// Append a record.
    pub fn write_record<R: CsvRecord>(&mut self, record: &R) {
        self.write_row(record.fields());
    }

    /// Number of data rows written so far.
    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Finish and return the document.
    #[must_use]
    pub fn finish(self) -> String {
        self.buf
    }

    fn push_line<I, T>(&mut self, fields: I)
    where
        I: IntoIterator<Item = Option<T>>,
        T: AsRef<str>,
    {
        for (i, field) in fields.into_iter().enumerate() {
            if i > 0 {
                self.buf.push(',');
            }
            if let Some(value) = field {
                self.buf.push_str(&escape_field(value.as_ref()));
            }
        }
        self.buf.push('\n');
    }
}

/// A row that can be written as CSV fields.
pub trait CsvRecord {
    /// Field values in header order.
    fn fields(&self) -> Vec<Option<String>>;
}

/// Encode a header row and records as a CSV document.
#[must_use]
pub fn to_csv<R: CsvRecord>(headers: &[&str], rows: &[R]) -> String {
    let mut writer = CsvWriter::new(headers);
    for row in rows {
        writer.write_record(row);
    }
    writer.finish()
}

/// The three export schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "export_type", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum ExportType {
    Orders,
    OrderItems,
    PointsLedger,
}

/// Error returned when parsing an unknown export type.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown export type: {0}")]
pub struct UnknownExportType(pub String);

impl ExportType {
    /// All export types, in the order the monthly job reports them.
    pub const ALL: [Self; 3] = [Self::Orders, Self::OrderItems, Self::PointsLedger];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Orders => "orders",
            Self::OrderItems => "order_items",
            Self::PointsLedger => "points_ledger",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Orders => "Orders",
            Self::OrderItems => "Order items",
            Self::PointsLedger => "Points ledger",
        }
    }

    /// Column headers for this schema.
    #[must_use]
    pub const fn headers(&self) -> &'static [&'static str] {
        match self {
            Self::Orders => &[
                "id",
                "user_id",
                "user_email",
                "status",
                "total_points",
                "shipping_name",
                "shipping_address",
                "tracking_number",
                "created_at",
            ],
            Self::OrderItems => &[
                "id",
                "order_id",
                "product_id",
                "variant_id",
                "product_name",
                "variant_name",
                "quantity",
                "points_per_unit",
                "total_points",
            ],
            Self::PointsLedger => &[
                "id",
                "user_id",
                "user_email",
                "delta",
                "reason",
                "order_id",
                "created_at",
            ],
        }
    }
}

impl fmt::Display for ExportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ExportType {
    type Err = UnknownExportType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownExportType(s.to_string()))
    }
}

fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// A row of the `orders` export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderExportRow {
    pub id: OrderId,
    pub user_id: UserId,
    pub user_email: Option<String>,
    pub status: OrderStatus,
    pub total_points: Points,
    pub shipping_name: Option<String>,
    pub shipping_address: Option<String>,
    pub tracking_number: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl CsvRecord for OrderExportRow {
    fn fields(&self) -> Vec<Option<String>> {
        vec![
            Some(self.id.to_string()),
            Some(self.user_id.to_string()),
            self.user_email.clone(),
            Some(self.status.to_string()),
            Some(self.total_points.value().to_string()),
            self.shipping_name.clone(),
            self.shipping_address.clone(),
            self.tracking_number.clone(),
            Some(timestamp(&self.created_at)),
        ]
    }
}

/// A row of the `order_items` export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderItemExportRow {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: Option<ProductId>,
    pub variant_id: Option<VariantId>,
    pub product_name: String,
    pub variant_name: Option<String>,
    pub quantity: i32,
    pub points_per_unit: Points,
    pub total_points: Points,
}

impl CsvRecord for OrderItemExportRow {
    fn fields(&self) -> Vec<Option<String>> {
        vec![
            Some(self.id.to_string()),
            Some(self.order_id.to_string()),
            self.product_id.map(|id| id.to_string()),
            self.variant_id.map(|id| id.to_string()),
            Some(self.product_name.clone()),
            self.variant_name.clone(),
            Some(self.quantity.to_string()),
            Some(self.points_per_unit.value().to_string()),
            Some(self.total_points.value().to_string()),
        ]
    }
}

/// A row of the `points_ledger` export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerExportRow {
    pub id: LedgerEntryId,
    pub user_id: UserId,
    pub user_email: Option<String>,
    pub delta: Points,
    pub reason: String,
    pub order_id: Option<OrderId>,
    pub created_at: DateTime<Utc>,
}

impl CsvRecord for LedgerExportRow {
    fn fields(&self) -> Vec<Option<String>> {
        vec![
            Some(self.id.to_string()),
            Some(self.user_id.to_string()),
            self.user_email.clone(),
            Some(self.delta.value().to_string()),
            Some(self.reason.clone()),
            self.order_id.map(|id| id.to_string()),
            Some(timestamp(&self.created_at)),
        ]
    }
}

/// Rows for one export type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportRows {
    Orders(Vec<OrderExportRow>),
    OrderItems(Vec<OrderItemExportRow>),
    PointsLedger(Vec<LedgerExportRow>),
}

impl ExportRows {
    /// The schema these rows belong to.
    #[must_use]
    pub const fn export_type(&self) -> ExportType {
        match self {
            Self::Orders(_) => ExportType::Orders,
            Self::OrderItems(_) => ExportType::OrderItems,
            Self::PointsLedger(_) => ExportType::PointsLedger,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Orders(rows) => rows.len(),
            Self::OrderItems(rows) => rows.len(),
            Self::PointsLedger(rows) => rows.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Encode with the schema's headers.
    #[must_use]
    pub fn to_csv(&self) -> String {
        let headers = self.export_type().headers();
        match self {
            Self::Orders(rows) => to_csv(headers, rows),
            Self::OrderItems(rows) => to_csv(headers, rows),
            Self::PointsLedger(rows) => to_csv(headers, rows),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::mock_uuid;

    fn reparse(document: &str) -> Vec<Vec<String>> {
        ::csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(document.as_bytes())
            .records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn test_escape_field_leaves_plain_values() {
        assert!(matches!(escape_field("hoodie"), Cow::Borrowed("hoodie")));
        assert_eq!(escape_field(""), "");
    }

    #[test]
    fn test_escaped_values_reparse_to_original() {
        let tricky = [
            "comma, inside",
            "quote \" inside",
            "line\nbreak",
            "\"fully quoted\"",
            "crlf\r\nvalue",
            "all, of \"it\"\n",
        ];
        let mut writer = CsvWriter::new(&["value"]);
        for value in tricky {
            writer.write_row([Some(value)]);
        }
        let records = reparse(&writer.finish());
        assert_eq!(records.len(), tricky.len() + 1);
        for (record, expected) in records[1..].iter().zip(tricky) {
            assert_eq!(record[0], expected);
        }
    }

    #[test]
    fn test_header_written_for_zero_rows() {
        let rows: Vec<LedgerExportRow> = Vec::new();
        let doc = to_csv(ExportType::PointsLedger.headers(), &rows);
        assert_eq!(doc, "id,user_id,user_email,delta,reason,order_id,created_at\n");
    }

    #[test]
    fn test_none_renders_empty() {
        let mut writer = CsvWriter::new(&["a", "b", "c"]);
        writer.write_row([Some("1"), None, Some("3")]);
        assert_eq!(writer.rows(), 1);
        assert_eq!(writer.finish(), "a,b,c\n1,,3\n");
    }

    #[test]
    fn test_ledger_row_encoding() {
        let row = LedgerExportRow {
            id: LedgerEntryId::from_uuid(mock_uuid(1)),
            user_id: UserId::from_uuid(mock_uuid(2)),
            user_email: Some("sam@corp.io".to_string()),
            delta: Points::new(-7500),
            reason: "Order, hoodie".to_string(),
            order_id: None,
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        };
        let rows = ExportRows::PointsLedger(vec![row]);
        let doc = rows.to_csv();
        let records = reparse(&doc);
        assert_eq!(records[1][3], "-7500");
        assert_eq!(records[1][4], "Order, hoodie");
        assert_eq!(records[1][5], "");
        assert_eq!(records[1][6], "2024-05-01T12:00:00Z");
    }

    #[test]
    fn test_export_type_parse() {
        assert_eq!("order_items".parse::<ExportType>().unwrap(), ExportType::OrderItems);
        assert!("users".parse::<ExportType>().is_err());
        for t in ExportType::ALL {
            assert_eq!(t.headers()[0], "id");
        }
    }
}
