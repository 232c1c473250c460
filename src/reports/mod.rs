//! HTML rendering for the two hiring reports.
//!
//! Rows are rendered in the order the store returned them; ordering belongs
//! to the query.

use sqlx::types::BigDecimal;
use std::fmt::Write;

pub const QUARTERLY_COLUMNS: [&str; 6] = ["department", "job", "Q1", "Q2", "Q3", "Q4"];
pub const ABOVE_AVERAGE_COLUMNS: [&str; 3] = ["id", "department", "hired"];

#[derive(Debug, Clone, PartialEq)]
pub enum ReportValue {
    Integer(i64),
    Decimal(BigDecimal),
    Text(String),
}

impl ReportValue {
    /// Cell text before escaping. Decimals are truncated to whole numbers.
    pub fn display(&self) -> String {
        match self {
            ReportValue::Integer(value) => value.to_string(),
            ReportValue::Decimal(value) => value.with_scale(0).to_string(),
            ReportValue::Text(value) => value.clone(),
        }
    }
}

impl From<&str> for ReportValue {
    fn from(value: &str) -> Self {
        ReportValue::Text(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<ReportValue>>,
}

impl ReportTable {
    pub fn new(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|column| column.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<ReportValue>) {
        self.rows.push(row);
    }
}

/// Page layout for one report.
pub struct ReportPage<'a> {
    pub title: &'a str,
    pub table_width: &'a str,
    pub header_color: &'a str,
}

pub fn render_html(page: &ReportPage<'_>, table: &ReportTable) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        "<html>\n<head>\n<style>\n\
         table {{ width: {}; margin: auto; border-collapse: collapse; font-family: Arial, sans-serif; }}\n\
         th, td {{ border: 1px solid #ddd; padding: 8px; text-align: left; }}\n\
         th {{ background-color: {}; color: white; }}\n\
         tr:nth-child(even) {{ background-color: #f2f2f2; }}\n\
         </style>\n</head>\n<body>\n<h2 style=\"text-align:center;\">{}</h2>\n<table>\n<tr>",
        page.table_width,
        page.header_color,
        escape(page.title)
    );

    for column in &table.columns {
        let _ = write!(html, "<th>{}</th>", escape(column));
    }
    html.push_str("</tr>\n");

    for row in &table.rows {
        html.push_str("<tr>");
        for value in row {
            let _ = write!(html, "<td>{}</td>", escape(&value.display()));
        }
        html.push_str("</tr>\n");
    }

    html.push_str("</table>\n</body>\n</html>");
    html
}

pub fn render_error(message: &str) -> String {
    format!("<h3>Error: {}</h3>", escape(message))
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
