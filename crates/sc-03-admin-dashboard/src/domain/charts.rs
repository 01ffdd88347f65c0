//! Chart series derived from student records.

use chrono::{DateTime, Datelike, NaiveDate};
use sc_01_backend_client::{text_at, Row};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::domain::format::status_label;

/// Students per status, in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatusChart {
    pub labels: Vec<String>,
    pub counts: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressPoint {
    /// `Mar 2024`
    pub label: String,
    pub average: f64,
}

/// Average progress per calendar month, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProgressChart {
    pub points: Vec<ProgressPoint>,
}

pub fn status_distribution(rows: &[Row]) -> StatusChart {
    let mut chart = StatusChart::default();
    for row in rows {
        let status = text_at(row, "status").unwrap_or_else(|| "other".to_string());
        let label = status_label(&status);
        match chart.labels.iter().position(|l| *l == label) {
            Some(i) => chart.counts[i] += 1,
            None => {
                chart.labels.push(label);
                chart.counts.push(1);
            }
        }
    }
    chart
}

fn month_of(timestamp: &str) -> Option<NaiveDate> {
    let date = match DateTime::parse_from_rfc3339(timestamp) {
        Ok(dt) => dt.date_naive(),
        Err(_) => NaiveDate::parse_from_str(timestamp.get(..10)?, "%Y-%m-%d").ok()?,
    };
    date.with_day(1)
}

/// Rows without a numeric `progress` or a parseable `updated_at` are skipped.
pub fn progress_trend(rows: &[Row]) -> ProgressChart {
    let mut months: BTreeMap<NaiveDate, (f64, u32)> = BTreeMap::new();
    for row in rows {
        let Some(progress) = row.get("progress").and_then(Value::as_f64) else {
            continue;
        };
        let Some(month) = text_at(row, "updated_at").as_deref().and_then(month_of) else {
            continue;
        };
        let entry = months.entry(month).or_insert((0.0, 0));
        entry.0 += progress;
        entry.1 += 1;
    }
    ProgressChart {
        points: months
            .into_iter()
            .map(|(month, (total, count))| ProgressPoint {
                label: month.format("%b %Y").to_string(),
                average: total / f64::from(count),
            })
            .collect(),
    }
}
