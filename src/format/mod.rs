//! Output formatting for batch results and histories (table, JSON, markdown, CSV).

use crate::amazon::models::{Field, Observation};
use crate::config::OutputFormat;
use crate::tracker::{BatchResult, TrackOutcome};

/// `asin,captured_at` followed by every tracked field.
fn csv_header() -> String {
    let fields: Vec<String> = Field::all().iter().map(Field::to_string).collect();
    format!("asin,captured_at,{}", fields.join(","))
}

/// Formats tracking results for output.
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    /// Creates a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats the outcome of a batch, one entry per submitted identifier.
    pub fn format_batch(&self, batch: &BatchResult) -> String {
        if batch.is_empty() {
            return match self.format {
                OutputFormat::Json => self.json(batch, "{}"),
                OutputFormat::Csv => format!("{},error", csv_header()),
                _ => "No ASINs submitted.".to_string(),
            };
        }

        match self.format {
            OutputFormat::Json => self.json(batch, "{}"),
            OutputFormat::Table => self.table_batch(batch),
            OutputFormat::Markdown => self.markdown_batch(batch),
            OutputFormat::Csv => self.csv_batch(batch),
        }
    }

    /// Formats the observation history of one identifier, oldest first.
    pub fn format_history(&self, history: &[Observation]) -> String {
        if history.is_empty() {
            return match self.format {
                OutputFormat::Json => "[]".to_string(),
                OutputFormat::Csv => csv_header(),
                _ => "No observations found.".to_string(),
            };
        }

        match self.format {
            OutputFormat::Json => self.json(history, "[]"),
            OutputFormat::Table => self.table_history(history),
            OutputFormat::Markdown => self.markdown_history(history),
            OutputFormat::Csv => self.csv_history(history),
        }
    }

    // JSON formatting

    fn json<T: serde::Serialize + ?Sized>(&self, value: &T, fallback: &str) -> String {
        serde_json::to_string_pretty(value).unwrap_or_else(|_| fallback.to_string())
    }

    // Table formatting

    fn table_batch(&self, batch: &BatchResult) -> String {
        let asin_width = 12;
        let status_width = 7;
        let price_width = 12;
        let rating_width = 20;

        let mut lines = Vec::new();

        lines.push(format!(
            "{:<asin_width$}  {:<status_width$}  {:<price_width$}  {:<rating_width$}  {}",
            "ASIN", "Status", "Price", "Rating", "Title / Error"
        ));
        lines.push(format!(
            "{:-<asin_width$}  {:-<status_width$}  {:-<price_width$}  {:-<rating_width$}  {:-<40}",
            "", "", "", "", ""
        ));

        for outcome in batch {
            let line = match &outcome.result {
                Ok(obs) => format!(
                    "{:<asin_width$}  {:<status_width$}  {:>price_width$}  {:<rating_width$}  {}",
                    outcome.asin,
                    "ok",
                    obs.price,
                    truncate(&obs.rating, rating_width),
                    truncate(&obs.title, 50)
                ),
                Err(e) => format!(
                    "{:<asin_width$}  {:<status_width$}  {:>price_width$}  {:<rating_width$}  {}",
                    outcome.asin, "failed", "", "", e
                ),
            };
            lines.push(line);
        }

        lines.push(String::new());
        lines.push(format!(
            "Total: {} ASINs ({} tracked, {} failed)",
            batch.len(),
            batch.succeeded(),
            batch.failed()
        ));

        lines.join("\n")
    }

    fn table_history(&self, history: &[Observation]) -> String {
        let time_width = 20;
        let price_width = 12;
        let rating_width = 20;
        let reviews_width = 16;

        let mut lines = Vec::new();

        lines.push(format!("ASIN:    {}", history[0].asin));
        lines.push(format!("Title:   {}", history[history.len() - 1].title));
        lines.push(String::new());

        lines.push(format!(
            "{:<time_width$}  {:<price_width$}  {:<rating_width$}  {}",
            "Captured", "Price", "Rating", "Reviews"
        ));
        lines.push(format!(
            "{:-<time_width$}  {:-<price_width$}  {:-<rating_width$}  {:-<reviews_width$}",
            "", "", "", ""
        ));

        for obs in history {
            lines.push(format!(
                "{:<time_width$}  {:>price_width$}  {:<rating_width$}  {}",
                obs.captured_at.format("%Y-%m-%d %H:%M:%S"),
                obs.price,
                truncate(&obs.rating, rating_width),
                obs.review_count
            ));
        }

        lines.push(String::new());
        lines.push(format!("Total: {} observations", history.len()));

        lines.join("\n")
    }

    // Markdown formatting

    fn markdown_batch(&self, batch: &BatchResult) -> String {
        let mut lines = Vec::new();

        lines.push("| ASIN | Status | Title | Price | Rating | Reviews |".to_string());
        lines.push("|------|--------|-------|-------|--------|---------|".to_string());

        for outcome in batch {
            lines.push(markdown_outcome_row(outcome));
        }

        lines.push(String::new());
        lines.push(format!(
            "*{} of {} ASINs tracked*",
            batch.succeeded(),
            batch.len()
        ));

        lines.join("\n")
    }

    fn markdown_history(&self, history: &[Observation]) -> String {
        let mut lines = Vec::new();

        lines.push(format!("## {}", history[0].asin));
        lines.push(String::new());
        lines.push("| Captured | Title | Price | Rating | Reviews |".to_string());
        lines.push("|----------|-------|-------|--------|---------|".to_string());

        for obs in history {
            lines.push(format!(
                "| {} | {} | {} | {} | {} |",
                obs.captured_at.to_rfc3339(),
                markdown_escape(&truncate(&obs.title, 40)),
                markdown_escape(&obs.price),
                markdown_escape(&obs.rating),
                markdown_escape(&obs.review_count)
            ));
        }

        lines.push(String::new());
        lines.push(format!("*{} observations*", history.len()));

        lines.join("\n")
    }

    // CSV formatting

    fn csv_batch(&self, batch: &BatchResult) -> String {
        let mut lines = Vec::new();
        lines.push(format!("{},error", csv_header()));

        for outcome in batch {
            match &outcome.result {
                Ok(obs) => lines.push(format!("{},", Self::csv_row(obs))),
                Err(e) => lines.push(format!(
                    "{}{}{}",
                    Self::csv_escape(&outcome.asin),
                    ",".repeat(Field::all().len() + 2),
                    Self::csv_escape(&e.to_string())
                )),
            }
        }

        lines.join("\n")
    }

    fn csv_history(&self, history: &[Observation]) -> String {
        let mut lines = Vec::new();
        lines.push(csv_header());
        lines.extend(history.iter().map(Self::csv_row));
        lines.join("\n")
    }

    fn csv_row(obs: &Observation) -> String {
        let mut cells = vec![Self::csv_escape(&obs.asin), obs.captured_at.to_rfc3339()];
        cells.extend(Field::all().iter().map(|&field| Self::csv_escape(obs.get(field))));
        cells.join(",")
    }

    fn csv_escape(s: &str) -> String {
        if s.contains(',') || s.contains('"') || s.contains('\n') {
            format!("\"{}\"", s.replace('"', "\"\""))
        } else {
            s.to_string()
        }
    }
}

fn markdown_outcome_row(outcome: &TrackOutcome) -> String {
    match &outcome.result {
        Ok(obs) => format!(
            "| {} | ✓ | {} | {} | {} | {} |",
            outcome.asin,
            markdown_escape(&truncate(&obs.title, 40)),
            markdown_escape(&obs.price),
            markdown_escape(&obs.rating),
            markdown_escape(&obs.review_count)
        ),
        Err(e) => format!(
            "| {} | ✗ | {} | | | |",
            outcome.asin,
            markdown_escape(&e.to_string())
        ),
    }
}

fn markdown_escape(s: &str) -> String {
    s.replace('|', "\\|")
}

/// Shortens `s` to at most `max` characters, marking the cut with "...".
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amazon::models::NOT_AVAILABLE;
    use crate::error::{FetchError, TrackError};
    use chrono::{TimeZone, Utc};

    fn make_observation(asin: &str, hour: u32) -> Observation {
        Observation {
            asin: asin.to_string(),
            title: "Echo Dot (5th Gen)".to_string(),
            price: "₹4,499.00".to_string(),
            rating: "4.5 out of 5 stars".to_string(),
            review_count: "12,345 ratings".to_string(),
            captured_at: Utc.with_ymd_and_hms(2026, 3, 1, hour, 0, 0).unwrap(),
        }
    }

    fn make_sparse_observation(asin: &str) -> Observation {
        Observation {
            asin: asin.to_string(),
            title: "Sparse Listing".to_string(),
            price: NOT_AVAILABLE.to_string(),
            rating: NOT_AVAILABLE.to_string(),
            review_count: NOT_AVAILABLE.to_string(),
            captured_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
        }
    }

    fn make_batch() -> BatchResult {
        BatchResult {
            outcomes: vec![
                TrackOutcome {
                    asin: "B0BSHF7WHW".to_string(),
                    result: Ok(make_observation("B0BSHF7WHW", 10)),
                },
                TrackOutcome {
                    asin: "B000000BAD".to_string(),
                    result: Err(TrackError::Transport(FetchError::Status(404))),
                },
                TrackOutcome {
                    asin: "B0SPARSE01".to_string(),
                    result: Ok(make_sparse_observation("B0SPARSE01")),
                },
            ],
        }
    }

    // JSON format tests

    #[test]
    fn test_json_batch() {
        let output = Formatter::new(OutputFormat::Json).format_batch(&make_batch());
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["requested"], 3);
        assert_eq!(value["succeeded"], 2);
        assert_eq!(value["failed"], 1);
        assert_eq!(value["results"][0]["asin"], "B0BSHF7WHW");
        assert_eq!(value["results"][1]["error"]["kind"], "transport");
        assert_eq!(value["results"][2]["observation"]["price"], NOT_AVAILABLE);
    }

    #[test]
    fn test_json_history() {
        let history = vec![make_observation("B0BSHF7WHW", 9), make_observation("B0BSHF7WHW", 10)];
        let output = Formatter::new(OutputFormat::Json).format_history(&history);

        assert!(output.starts_with('['));
        assert!(output.ends_with(']'));
        assert!(output.contains("2026-03-01T09:00:00Z"));
    }

    #[test]
    fn test_json_empty_history() {
        assert_eq!(Formatter::new(OutputFormat::Json).format_history(&[]), "[]");
    }

    // Table format tests

    #[test]
    fn test_table_batch() {
        let output = Formatter::new(OutputFormat::Table).format_batch(&make_batch());

        assert!(output.contains("ASIN"));
        assert!(output.contains("Title / Error"));
        assert!(output.contains("------------"));
        assert!(output.contains("Echo Dot (5th Gen)"));
        assert!(output.contains("failed"));
        assert!(output.contains("Request failed with status: 404"));
        assert!(output.contains("Total: 3 ASINs (2 tracked, 1 failed)"));
    }

    #[test]
    fn test_table_batch_keeps_submission_order() {
        let output = Formatter::new(OutputFormat::Table).format_batch(&make_batch());
        let first = output.find("B0BSHF7WHW").unwrap();
        let second = output.find("B000000BAD").unwrap();
        let third = output.find("B0SPARSE01").unwrap();
        assert!(first < second && second < third);
    }

    #[test]
    fn test_table_history() {
        let history = vec![make_observation("B0BSHF7WHW", 9), make_observation("B0BSHF7WHW", 10)];
        let output = Formatter::new(OutputFormat::Table).format_history(&history);

        assert!(output.contains("ASIN:    B0BSHF7WHW"));
        assert!(output.contains("Title:   Echo Dot (5th Gen)"));
        assert!(output.contains("2026-03-01 09:00:00"));
        assert!(output.contains("2026-03-01 10:00:00"));
        assert!(output.contains("12,345 ratings"));
        assert!(output.contains("Total: 2 observations"));
    }

    #[test]
    fn test_table_empty() {
        let formatter = Formatter::new(OutputFormat::Table);
        assert_eq!(formatter.format_batch(&BatchResult::default()), "No ASINs submitted.");
        assert_eq!(formatter.format_history(&[]), "No observations found.");
    }

    #[test]
    fn test_table_long_title_truncation() {
        let mut obs = make_observation("B0BSHF7WHW", 9);
        obs.title = "Très long titre de produit qui dépasse largement cinquante caractères".to_string();
        let batch = BatchResult {
            outcomes: vec![TrackOutcome { asin: obs.asin.clone(), result: Ok(obs) }],
        };

        let output = Formatter::new(OutputFormat::Table).format_batch(&batch);
        assert!(output.contains("Très long titre"));
        assert!(output.contains("..."));
    }

    // Markdown format tests

    #[test]
    fn test_markdown_batch() {
        let output = Formatter::new(OutputFormat::Markdown).format_batch(&make_batch());

        assert!(output.contains("| ASIN | Status | Title | Price | Rating | Reviews |"));
        assert!(output.contains("| B0BSHF7WHW | ✓ | Echo Dot (5th Gen) |"));
        assert!(output.contains("| B000000BAD | ✗ | Request failed with status: 404 |"));
        assert!(output.contains("| B0SPARSE01 | ✓ | Sparse Listing | N/A | N/A | N/A |"));
        assert!(output.contains("*2 of 3 ASINs tracked*"));
    }

    #[test]
    fn test_markdown_history_escapes_pipes() {
        let mut obs = make_observation("B0BSHF7WHW", 9);
        obs.title = "Cable | 2m".to_string();
        let output = Formatter::new(OutputFormat::Markdown).format_history(&[obs]);

        assert!(output.contains("## B0BSHF7WHW"));
        assert!(output.contains("Cable \\| 2m"));
        assert!(output.contains("*1 observations*"));
    }

    // CSV format tests

    #[test]
    fn test_csv_batch() {
        let output = Formatter::new(OutputFormat::Csv).format_batch(&make_batch());
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "asin,captured_at,title,price,rating,review_count,error");
        assert!(lines[1].starts_with("B0BSHF7WHW,2026-03-01T10:00:00+00:00,Echo Dot (5th Gen),"));
        assert!(lines[1].contains("\"₹4,499.00\""));
        assert!(lines[1].ends_with(','));
        assert_eq!(lines[2], "B000000BAD,,,,,,Request failed with status: 404");
        assert!(lines[3].contains("Sparse Listing,N/A,N/A,N/A,"));
    }

    #[test]
    fn test_csv_history() {
        let history = vec![make_observation("B0BSHF7WHW", 9), make_observation("B0BSHF7WHW", 10)];
        let output = Formatter::new(OutputFormat::Csv).format_history(&history);
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "asin,captured_at,title,price,rating,review_count");
        assert!(lines[1].contains("2026-03-01T09:00:00+00:00"));
        assert!(lines[2].contains("2026-03-01T10:00:00+00:00"));
    }

    #[test]
    fn test_csv_empty() {
        let formatter = Formatter::new(OutputFormat::Csv);
        assert_eq!(formatter.format_history(&[]), "asin,captured_at,title,price,rating,review_count");
        assert_eq!(
            formatter.format_batch(&BatchResult::default()),
            "asin,captured_at,title,price,rating,review_count,error"
        );
    }

    #[test]
    fn test_csv_escape() {
        assert_eq!(Formatter::csv_escape("simple"), "simple");
        assert_eq!(Formatter::csv_escape("with,comma"), "\"with,comma\"");
        assert_eq!(Formatter::csv_escape("with\"quote"), "\"with\"\"quote\"");
        assert_eq!(Formatter::csv_escape("with\nnewline"), "\"with\nnewline\"");
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("ééééééééééé", 6), "ééé...");
    }
}
