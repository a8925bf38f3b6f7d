//! Table columns and cell rendering

use crate::core::query::Page;
use chrono::{DateTime, NaiveDateTime};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Cell renderer of a custom column: `(value, row)` to text
pub type CellFn = Arc<dyn Fn(&Value, &Value) -> String + Send + Sync>;

/// How a column turns its value into text
#[derive(Clone)]
pub enum Renderer {
    /// 1-based position across pages
    RowNumber,
    /// Strings as is, numbers and booleans printed, null empty
    Text,
    /// `1 200 000 UZS`
    Money { currency: String },
    /// `90 min`
    Suffix(String),
    /// `Yes` / `No`
    YesNo,
    /// `DD.MM.YYYY HH:mm`
    Date,
    Custom(CellFn),
}

impl fmt::Debug for Renderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Renderer::RowNumber => f.write_str("RowNumber"),
            Renderer::Text => f.write_str("Text"),
            Renderer::Money { currency } => write!(f, "Money({currency})"),
            Renderer::Suffix(suffix) => write!(f, "Suffix({suffix})"),
            Renderer::YesNo => f.write_str("YesNo"),
            Renderer::Date => f.write_str("Date"),
            Renderer::Custom(_) => f.write_str("Custom"),
        }
    }
}

/// One table column
#[derive(Debug, Clone)]
pub struct ColumnDescriptor {
    pub title: String,
    /// Path into the row (`"category.nameUz"` reads a related record)
    pub path: Vec<String>,
    pub renderer: Renderer,
    pub width: Option<u32>,
}

impl ColumnDescriptor {
    pub fn new(title: impl Into<String>, path: &str) -> Self {
        Self {
            title: title.into(),
            path: path
                .split('.')
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .collect(),
            renderer: Renderer::Text,
            width: None,
        }
    }

    /// The `#` column
    pub fn row_number() -> Self {
        Self {
            title: "#".to_string(),
            path: Vec::new(),
            renderer: Renderer::RowNumber,
            width: Some(50),
        }
    }

    pub fn render(mut self, renderer: Renderer) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn custom(self, render: impl Fn(&Value, &Value) -> String + Send + Sync + 'static) -> Self {
        self.render(Renderer::Custom(Arc::new(render)))
    }

    pub fn width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    /// Column key, the dotted path
    pub fn key(&self) -> String {
        self.path.join(".")
    }

    pub fn value<'a>(&self, row: &'a Value) -> &'a Value {
        self.path
            .iter()
            .try_fold(row, |value, segment| value.get(segment))
            .unwrap_or(&Value::Null)
    }

    /// Text of this column for `row`, `position` being its 1-based number
    pub fn cell(&self, row: &Value, position: u64) -> String {
        let value = self.value(row);
        match &self.renderer {
            Renderer::RowNumber => position.to_string(),
            Renderer::Text => text(value),
            Renderer::Money { currency } => match value.as_f64() {
                Some(amount) => format!("{} {currency}", group_thousands(amount)),
                None => String::new(),
            },
            Renderer::Suffix(_) if value.is_null() => String::new(),
            Renderer::Suffix(suffix) => format!("{} {suffix}", text(value)),
            Renderer::YesNo => match value.as_bool() {
                Some(true) => "Yes".to_string(),
                _ => "No".to_string(),
            },
            Renderer::Date => format_date(value),
            Renderer::Custom(render) => render(value, row),
        }
    }
}

fn text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `1200000` -> `1 200 000`, fractions kept to two digits
fn group_thousands(amount: f64) -> String {
    let negative = amount < 0.0;
    let amount = amount.abs();
    let whole = amount.trunc() as u64;
    let cents = ((amount - amount.trunc()) * 100.0).round() as u64;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(digit);
    }

    let sign = if negative { "-" } else { "" };
    if cents > 0 {
        format!("{sign}{grouped}.{cents:02}")
    } else {
        format!("{sign}{grouped}")
    }
}

fn format_date(value: &Value) -> String {
    let Some(raw) = value.as_str() else {
        return String::new();
    };

    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return date.format("%d.%m.%Y %H:%M").to_string();
    }
    match NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        Ok(date) => date.format("%d.%m.%Y %H:%M").to_string(),
        Err(_) => raw.to_string(),
    }
}

/// Rendered table page
#[derive(Debug, Clone, PartialEq)]
pub struct TableView {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Records behind each row, for edit and delete actions
    pub records: Vec<Value>,
    pub total_count: u64,
}

impl TableView {
    /// Render `page`; `offset` is the number of rows on previous pages
    pub fn render(columns: &[ColumnDescriptor], page: &Page<Value>, offset: u64) -> Self {
        let rows = page
            .data
            .iter()
            .enumerate()
            .map(|(index, record)| {
                let position = offset + index as u64 + 1;
                columns
                    .iter()
                    .map(|column| column.cell(record, position))
                    .collect()
            })
            .collect();

        Self {
            headers: columns.iter().map(|column| column.title.clone()).collect(),
            rows,
            records: page.data.clone(),
            total_count: page.total_count,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell text by row index and column title
    pub fn cell(&self, row: usize, title: &str) -> Option<&str> {
        let column = self.headers.iter().position(|header| header == title)?;
        self.rows.get(row)?.get(column).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_money_grouping() {
        let column = ColumnDescriptor::new("Price", "price").render(Renderer::Money {
            currency: "UZS".to_string(),
        });

        assert_eq!(column.cell(&json!({"price": 1200000}), 1), "1 200 000 UZS");
        assert_eq!(column.cell(&json!({"price": 950}), 1), "950 UZS");
        assert_eq!(column.cell(&json!({"price": 1500.5}), 1), "1 500.50 UZS");
        assert_eq!(column.cell(&json!({}), 1), "");
    }

    #[test]
    fn test_nested_path_and_missing_relation() {
        let column = ColumnDescriptor::new("Category", "category.nameUz");
        assert_eq!(column.key(), "category.nameUz");
        assert_eq!(column.cell(&json!({"category": {"nameUz": "IT"}}), 1), "IT");
        assert_eq!(column.cell(&json!({"category": null}), 1), "");
    }

    #[test]
    fn test_date_yes_no_and_suffix() {
        let date = ColumnDescriptor::new("Created At", "createdAt").render(Renderer::Date);
        assert_eq!(date.cell(&json!({"createdAt": "2024-05-01T09:30:00.000Z"}), 1), "01.05.2024 09:30");
        assert_eq!(date.cell(&json!({"createdAt": "garbage"}), 1), "garbage");

        let yes_no = ColumnDescriptor::new("Is Published", "isPublished").render(Renderer::YesNo);
        assert_eq!(yes_no.cell(&json!({"isPublished": true}), 1), "Yes");
        assert_eq!(yes_no.cell(&json!({}), 1), "No");

        let suffix = ColumnDescriptor::new("Duration", "duration").render(Renderer::Suffix("min".into()));
        assert_eq!(suffix.cell(&json!({"duration": 90}), 1), "90 min");
    }

    #[test]
    fn test_render_numbers_rows_across_pages() {
        let columns = vec![
            ColumnDescriptor::row_number(),
            ColumnDescriptor::new("Title", "titleUz"),
        ];
        let page = Page {
            data: vec![json!({"titleUz": "A"}), json!({"titleUz": "B"})],
            total_count: 12,
        };

        let view = TableView::render(&columns, &page, 10);
        assert_eq!(view.rows, vec![vec!["11", "A"], vec!["12", "B"]]);
        assert_eq!(view.cell(1, "Title"), Some("B"));
        assert_eq!(view.total_count, 12);
    }
}
