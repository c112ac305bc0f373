use std::fmt;

use serde::Deserialize;

/// Reporting window for one revenue figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricWindow {
    Today,
    Last7Days,
    Last30Days,
}

impl MetricWindow {
    pub const ALL: [MetricWindow; 3] = [
        MetricWindow::Today,
        MetricWindow::Last7Days,
        MetricWindow::Last30Days,
    ];

    /// `dateRange` value understood by the reports endpoint.
    pub fn as_api_str(self) -> &'static str {
        match self {
            MetricWindow::Today => "TODAY",
            MetricWindow::Last7Days => "LAST_7_DAYS",
            MetricWindow::Last30Days => "LAST_30_DAYS",
        }
    }
}

impl fmt::Display for MetricWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_api_str())
    }
}

/// First page of `accounts.list`; only the first account is ever used.
#[derive(Debug, Deserialize)]
pub struct AccountList {
    #[serde(default)]
    pub accounts: Vec<Account>,
}

#[derive(Debug, Deserialize)]
pub struct Account {
    /// Resource name, `accounts/pub-…`.
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct Report {
    #[serde(default)]
    pub totals: Option<Totals>,
}

/// The API has been seen returning totals both as a bare row and as a
/// one-element list of rows.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Totals {
    Rows(Vec<Row>),
    Row(Row),
}

impl Totals {
    fn first_row(&self) -> Option<&Row> {
        match self {
            Totals::Rows(rows) => rows.first(),
            Totals::Row(row) => Some(row),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct Row {
    #[serde(default)]
    pub cells: Vec<Cell>,
}

#[derive(Debug, Deserialize)]
pub struct Cell {
    pub value: Option<CellValue>,
}

/// Decimal metrics arrive as strings, but numbers are accepted too.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Number(f64),
    Text(String),
}

impl Report {
    /// First cell of the totals row, or 0.0 when the report has no totals.
    pub fn total(&self) -> Result<f64, String> {
        let Some(cell) = self
            .totals
            .as_ref()
            .and_then(Totals::first_row)
            .and_then(|row| row.cells.first())
        else {
            return Ok(0.0);
        };

        match &cell.value {
            Some(CellValue::Number(n)) => Ok(*n),
            Some(CellValue::Text(s)) => s
                .trim()
                .parse::<f64>()
                .map_err(|e| format!("{:?} is not a number: {}", s, e)),
            None => Err("totals cell has no value".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn total(json: &str) -> Result<f64, String> {
        serde_json::from_str::<Report>(json).unwrap().total()
    }

    #[test]
    fn test_object_shaped_totals() {
        let json = r#"{"totals": {"cells": [{"value": "12.50"}]}}"#;
        assert_eq!(total(json), Ok(12.5));
    }

    #[test]
    fn test_list_shaped_totals() {
        let json = r#"{"totals": [{"cells": [{"value": "301.9"}, {"value": "7"}]}]}"#;
        assert_eq!(total(json), Ok(301.9));
    }

    #[test]
    fn test_missing_totals_default_to_zero() {
        assert_eq!(total(r#"{}"#), Ok(0.0));
        assert_eq!(total(r#"{"totals": null}"#), Ok(0.0));
        assert_eq!(total(r#"{"totals": []}"#), Ok(0.0));
        assert_eq!(total(r#"{"totals": {}}"#), Ok(0.0));
        assert_eq!(total(r#"{"totals": {"cells": []}}"#), Ok(0.0));
    }

    #[test]
    fn test_numeric_cell_value() {
        assert_eq!(total(r#"{"totals": {"cells": [{"value": 80}]}}"#), Ok(80.0));
    }

    #[test]
    fn test_bad_cell_value_is_an_error() {
        assert!(total(r#"{"totals": {"cells": [{"value": "n/a"}]}}"#).is_err());
        assert!(total(r#"{"totals": {"cells": [{}]}}"#).is_err());
    }

    #[test]
    fn test_report_ignores_other_fields() {
        let json = r#"{
            "totalMatchedRows": "0",
            "headers": [{"name": "ESTIMATED_EARNINGS", "type": "METRIC_CURRENCY", "currencyCode": "USD"}],
            "totals": {"cells": [{"value": "0.42"}]},
            "startDate": {"year": 2024, "month": 5, "day": 1}
        }"#;
        assert_eq!(total(json), Ok(0.42));
    }

    #[test]
    fn test_account_list() {
        let json = r#"{"accounts": [{"name": "accounts/pub-1", "displayName": "Site"}], "nextPageToken": "p2"}"#;
        let list: AccountList = serde_json::from_str(json).unwrap();
        assert_eq!(list.accounts[0].name, "accounts/pub-1");

        let empty: AccountList = serde_json::from_str("{}").unwrap();
        assert!(empty.accounts.is_empty());
    }

    #[test]
    fn test_window_names() {
        let names: Vec<&str> = MetricWindow::ALL.iter().map(|w| w.as_api_str()).collect();
        assert_eq!(names, ["TODAY", "LAST_7_DAYS", "LAST_30_DAYS"]);
        assert_eq!(MetricWindow::Last7Days.to_string(), "LAST_7_DAYS");
    }
}
