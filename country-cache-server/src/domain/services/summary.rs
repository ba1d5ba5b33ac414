//! Pure parts of the summary artifact: ranking, formatting, and layout.

use chrono::{DateTime, Utc};
use std::cmp::Ordering;

use crate::domain::models::{
    CountryRecord, SummaryEntry, SummaryLayout, TextLine, INDICATOR_UNAVAILABLE,
};

pub const TOP_N: usize = 5;
pub const CANVAS_WIDTH: u32 = 800;
pub const CANVAS_HEIGHT: u32 = 600;

/// Rank records by estimated GDP, highest first, absent estimates last.
pub fn top_by_gdp(records: &[CountryRecord], limit: usize) -> Vec<SummaryEntry> {
    let mut ranked: Vec<&CountryRecord> = records.iter().collect();
    ranked.sort_by(|a, b| compare_gdp_desc(a, b).then_with(|| a.name.cmp(&b.name)));

    ranked
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(idx, record)| SummaryEntry {
            rank: idx + 1,
            name: record.name.clone(),
            indicator: record
                .estimated_gdp
                .map(format_indicator)
                .unwrap_or_else(|| INDICATOR_UNAVAILABLE.to_string()),
        })
        .collect()
}

fn compare_gdp_desc(a: &CountryRecord, b: &CountryRecord) -> Ordering {
    match (a.estimated_gdp, b.estimated_gdp) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Two decimals with thousands separators, e.g. `1,234,567.89`.
pub fn format_indicator(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (idx, ch) in int_part.chars().enumerate() {
        if idx > 0 && (int_part.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac_part)
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Fixed summary layout: title, totals, timestamp, and the ranked list.
pub fn summary_layout(
    total_count: usize,
    generated_at: DateTime<Utc>,
    top: &[SummaryEntry],
) -> SummaryLayout {
    let mut lines = vec![
        line("Countries Summary", 20, 24, 4),
        line(&format!("Total Countries: {}", total_count), 20, 90, 2),
        line(
            &format!("Last Refresh: {}", format_timestamp(generated_at)),
            20,
            124,
            2,
        ),
        line(&format!("Top {} by Estimated GDP:", TOP_N), 20, 176, 2),
    ];

    if top.is_empty() {
        lines.push(line("No countries cached", 40, 212, 2));
    }
    for (idx, entry) in top.iter().enumerate() {
        lines.push(line(
            &format!("{}. {} - {}", entry.rank, entry.name, entry.indicator),
            40,
            212 + idx as u32 * 34,
            2,
        ));
    }

    SummaryLayout {
        width: CANVAS_WIDTH,
        height: CANVAS_HEIGHT,
        lines,
    }
}

fn line(text: &str, x: u32, y: u32, scale: u32) -> TextLine {
    TextLine {
        text: text.to_string(),
        x,
        y,
        scale,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, gdp: Option<f64>) -> CountryRecord {
        CountryRecord {
            name: name.to_string(),
            capital: None,
            region: None,
            population: 1,
            currency_code: None,
            exchange_rate: None,
            estimated_gdp: gdp,
            flag_url: None,
            last_refreshed_at: Utc::now(),
        }
    }

    #[test]
    fn test_top_ranks_absent_estimates_last() {
        let records = vec![
            record("Noland", None),
            record("Wonderland", Some(5.0e8)),
            record("Midland", Some(7.5e8)),
        ];

        let top = top_by_gdp(&records, TOP_N);
        let names: Vec<&str> = top.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["Midland", "Wonderland", "Noland"]);
        assert_eq!(top[0].rank, 1);
        assert_eq!(top[2].indicator, INDICATOR_UNAVAILABLE);
    }

    #[test]
    fn test_top_is_limited() {
        let records: Vec<_> = (0..8)
            .map(|i| record(&format!("C{i}"), Some(i as f64)))
            .collect();
        let top = top_by_gdp(&records, TOP_N);
        assert_eq!(top.len(), 5);
        assert_eq!(top[0].name, "C7");
        assert_eq!(top[4].name, "C3");
    }

    #[test]
    fn test_format_indicator() {
        assert_eq!(format_indicator(0.0), "0.00");
        assert_eq!(format_indicator(999.999), "1,000.00");
        assert_eq!(format_indicator(400_000_000.0), "400,000,000.00");
        assert_eq!(format_indicator(1234567.891), "1,234,567.89");
    }

    #[test]
    fn test_layout_contains_totals_and_entries() {
        let at = DateTime::parse_from_rfc3339("2025-03-01T08:15:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let top = top_by_gdp(&[record("Wonderland", Some(4.0e8))], TOP_N);
        let layout = summary_layout(2, at, &top);

        let texts: Vec<&str> = layout.lines.iter().map(|l| l.text.as_str()).collect();
        assert!(texts.contains(&"Total Countries: 2"));
        assert!(texts.contains(&"Last Refresh: 2025-03-01 08:15:00 UTC"));
        assert!(texts.contains(&"1. Wonderland - 400,000,000.00"));
        assert_eq!((layout.width, layout.height), (CANVAS_WIDTH, CANVAS_HEIGHT));
    }
}
