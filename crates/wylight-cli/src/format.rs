//! Output formatting for endpoint lists and selections.

use anyhow::Result;
use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::{Table, Tabled};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use wylight_core::{CompletionReason, Endpoint, ScanSummary};

use crate::cli::StyleMode;
use crate::style;

/// Formatting options for output.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatOptions {
    /// Disable colored output.
    pub no_color: bool,
    /// Omit header row in CSV output.
    pub no_header: bool,
    /// Use compact JSON output (no pretty-printing).
    pub compact: bool,
    /// Visual styling mode.
    pub style: StyleMode,
}

impl FormatOptions {
    pub fn new(no_color: bool, style: StyleMode) -> Self {
        // Plain mode automatically disables colors for pipe-friendliness
        Self {
            no_color: no_color || style == StyleMode::Plain,
            no_header: false,
            compact: false,
            style,
        }
    }

    /// Check if plain styling is enabled (no decorations).
    pub fn is_plain(&self) -> bool {
        self.style == StyleMode::Plain
    }

    /// Create with no_header option for CSV output.
    pub fn with_no_header(mut self, no_header: bool) -> Self {
        self.no_header = no_header;
        self
    }

    /// Create with compact JSON option.
    pub fn with_compact(mut self, compact: bool) -> Self {
        self.compact = compact;
        self
    }

    /// Serialize value to JSON string, respecting compact option.
    pub fn as_json<T: Serialize>(&self, value: &T) -> Result<String> {
        let json = if self.compact {
            serde_json::to_string(value)?
        } else {
            serde_json::to_string_pretty(value)?
        };
        Ok(json + "\n")
    }

    fn highlight(&self, s: &str) -> String {
        if self.no_color {
            s.to_string()
        } else {
            format!("{}", s.cyan())
        }
    }
}

/// Escape a CSV field.
#[must_use]
pub fn csv_escape(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn format_timestamp(ts: Option<OffsetDateTime>) -> String {
    ts.and_then(|t| t.format(&Rfc3339).ok())
        .unwrap_or_default()
}

fn name_or_placeholder(endpoint: &Endpoint) -> &str {
    if endpoint.name.is_empty() {
        "-"
    } else {
        &endpoint.name
    }
}

#[derive(Serialize)]
struct IndexedEndpoint<'a> {
    index: usize,
    #[serde(flatten)]
    endpoint: &'a Endpoint,
}

fn indexed(endpoints: &[Endpoint]) -> Vec<IndexedEndpoint<'_>> {
    endpoints
        .iter()
        .enumerate()
        .map(|(index, endpoint)| IndexedEndpoint { index, endpoint })
        .collect()
}

// ============================================================================
// Scan results
// ============================================================================

#[must_use]
pub fn format_scan_text(
    endpoints: &[Endpoint],
    summary: Option<&ScanSummary>,
    opts: &FormatOptions,
) -> String {
    if endpoints.is_empty() {
        let mut output = "No WyLight controllers found.\n".to_string();
        if summary.is_some_and(|s| s.reason == CompletionReason::Unavailable) {
            output.push_str("Discovery was unavailable; see the log for details.\n");
        }
        return output;
    }

    #[derive(Tabled)]
    struct EndpointRow {
        #[tabled(rename = "#")]
        index: usize,
        #[tabled(rename = "State")]
        state: String,
        #[tabled(rename = "Address")]
        address: String,
        #[tabled(rename = "Name")]
        name: String,
    }

    let online = endpoints.iter().filter(|e| e.online).count();
    let header = if opts.no_color {
        format!("{} of {} controller(s) online\n\n", online, endpoints.len())
    } else {
        format!(
            "{} of {} controller(s) online\n\n",
            online.to_string().green().bold(),
            endpoints.len()
        )
    };

    let rows: Vec<EndpointRow> = endpoints
        .iter()
        .enumerate()
        .map(|(index, e)| EndpointRow {
            index,
            state: style::format_state(e.online, opts.no_color),
            address: e.address.to_string(),
            name: opts.highlight(name_or_placeholder(e)),
        })
        .collect();

    let mut table = Table::new(rows);
    style::apply_table_style(&mut table, opts.style);
    let mut output = format!("{}{}\n", header, table);
    if !opts.is_plain() {
        output.push_str("\nUse 'wylight select <#>' to pick a controller\n");
    }
    output
}

pub fn format_scan_json(
    endpoints: &[Endpoint],
    summary: Option<&ScanSummary>,
    opts: &FormatOptions,
) -> Result<String> {
    #[derive(Serialize)]
    struct SummaryJson {
        found: usize,
        reason: CompletionReason,
        elapsed_ms: u128,
    }

    #[derive(Serialize)]
    struct ScanResult<'a> {
        count: usize,
        online: usize,
        summary: Option<SummaryJson>,
        endpoints: Vec<IndexedEndpoint<'a>>,
    }

    let result = ScanResult {
        count: endpoints.len(),
        online: endpoints.iter().filter(|e| e.online).count(),
        summary: summary.map(|s| SummaryJson {
            found: s.found,
            reason: s.reason,
            elapsed_ms: s.elapsed.as_millis(),
        }),
        endpoints: indexed(endpoints),
    };

    opts.as_json(&result)
}

#[must_use]
pub fn format_scan_csv(endpoints: &[Endpoint], opts: &FormatOptions) -> String {
    let mut output = if opts.no_header {
        String::new()
    } else {
        "index,address,name,online,score,last_seen\n".to_string()
    };
    for (index, e) in endpoints.iter().enumerate() {
        output.push_str(&format!(
            "{},{},{},{},{},{}\n",
            index,
            e.address,
            csv_escape(&e.name),
            e.online,
            e.score,
            format_timestamp(e.last_seen)
        ));
    }
    output
}

// ============================================================================
// Recent controllers
// ============================================================================

#[must_use]
pub fn format_recent_text(endpoints: &[Endpoint], opts: &FormatOptions) -> String {
    if endpoints.is_empty() {
        return "No recently used controllers.\n".to_string();
    }

    #[derive(Tabled)]
    struct RecentRow {
        #[tabled(rename = "#")]
        index: usize,
        #[tabled(rename = "Address")]
        address: String,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Used")]
        score: u32,
        #[tabled(rename = "Last seen")]
        last_seen: String,
    }

    let rows: Vec<RecentRow> = endpoints
        .iter()
        .enumerate()
        .map(|(index, e)| RecentRow {
            index,
            address: e.address.to_string(),
            name: opts.highlight(name_or_placeholder(e)),
            score: e.score,
            last_seen: e
                .last_seen
                .map(|t| format_timestamp(Some(t)))
                .unwrap_or_else(|| "never".to_string()),
        })
        .collect();

    let mut table = Table::new(rows);
    style::apply_table_style(&mut table, opts.style);
    format!(
        "{} recently used controller(s)\n\n{}\n",
        endpoints.len(),
        table
    )
}

pub fn format_recent_json(endpoints: &[Endpoint], opts: &FormatOptions) -> Result<String> {
    #[derive(Serialize)]
    struct RecentResult<'a> {
        count: usize,
        endpoints: Vec<IndexedEndpoint<'a>>,
    }

    opts.as_json(&RecentResult {
        count: endpoints.len(),
        endpoints: indexed(endpoints),
    })
}

// ============================================================================
// Selection
// ============================================================================

#[must_use]
pub fn format_selection_text(endpoint: &Endpoint, opts: &FormatOptions) -> String {
    if opts.is_plain() {
        return format!("{}\n", endpoint.address);
    }
    let mut output = format!("Selected {}\n", opts.highlight(&endpoint.display_name()));
    output.push_str(&format!("  Address: {}\n", endpoint.ip()));
    output.push_str(&format!("  Port:    {}\n", endpoint.port()));
    output.push_str(&format!(
        "  State:   {}\n",
        style::format_state(endpoint.online, opts.no_color)
    ));
    output
}

pub fn format_selection_json(endpoint: &Endpoint, opts: &FormatOptions) -> Result<String> {
    opts.as_json(endpoint)
}

#[must_use]
pub fn format_selection_csv(endpoint: &Endpoint, opts: &FormatOptions) -> String {
    let mut output = if opts.no_header {
        String::new()
    } else {
        "address,name,online,score\n".to_string()
    };
    output.push_str(&format!(
        "{},{},{},{}\n",
        endpoint.address,
        csv_escape(&endpoint.name),
        endpoint.online,
        endpoint.score
    ));
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn plain() -> FormatOptions {
        FormatOptions::new(true, StyleMode::Plain)
    }

    fn sample() -> Vec<Endpoint> {
        vec![
            Endpoint::new("192.168.0.14:2000".parse().unwrap(), "WiFly-EZX").with_score(2),
            Endpoint::discovered("192.168.0.15:2000".parse().unwrap(), "Kitchen, left"),
        ]
    }

    #[test]
    fn test_csv_escape() {
        assert_eq!(csv_escape("plain"), "plain");
        assert_eq!(csv_escape("a,b"), "\"a,b\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_scan_text_lists_state() {
        let text = format_scan_text(&sample(), None, &plain());
        assert!(text.contains("1 of 2 controller(s) online"));
        assert!(text.contains("192.168.0.14:2000"));
        assert!(text.contains("offline"));
        assert!(text.contains("online"));
    }

    #[test]
    fn test_scan_text_empty() {
        let summary = ScanSummary {
            found: 0,
            reason: CompletionReason::Unavailable,
            elapsed: Duration::ZERO,
        };
        let text = format_scan_text(&[], Some(&summary), &plain());
        assert!(text.starts_with("No WyLight controllers found."));
        assert!(text.contains("unavailable"));
    }

    #[test]
    fn test_scan_json() {
        let summary = ScanSummary {
            found: 1,
            reason: CompletionReason::Timeout,
            elapsed: Duration::from_millis(3001),
        };
        let json = format_scan_json(&sample(), Some(&summary), &plain()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["count"], 2);
        assert_eq!(value["online"], 1);
        assert_eq!(value["summary"]["reason"], "timeout");
        assert_eq!(value["summary"]["elapsed_ms"], 3001);
        assert_eq!(value["endpoints"][1]["index"], 1);
        assert_eq!(value["endpoints"][1]["address"], "192.168.0.15:2000");
        assert_eq!(value["endpoints"][0]["score"], 2);
    }

    #[test]
    fn test_scan_csv() {
        let csv = format_scan_csv(&sample(), &plain());
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "index,address,name,online,score,last_seen");
        assert_eq!(lines[1], "0,192.168.0.14:2000,WiFly-EZX,false,2,");
        assert!(lines[2].starts_with("1,192.168.0.15:2000,\"Kitchen, left\",true,0,"));

        let no_header = format_scan_csv(&sample(), &plain().with_no_header(true));
        assert_eq!(no_header.lines().count(), 2);
    }

    #[test]
    fn test_recent_text() {
        let text = format_recent_text(&sample(), &plain());
        assert!(text.contains("2 recently used controller(s)"));
        assert!(text.contains("never"));
        assert_eq!(format_recent_text(&[], &plain()), "No recently used controllers.\n");
    }

    #[test]
    fn test_selection_outputs() {
        let endpoint = &sample()[0];
        assert_eq!(format_selection_text(endpoint, &plain()), "192.168.0.14:2000\n");

        let rich = FormatOptions::new(true, StyleMode::Rich);
        let text = format_selection_text(endpoint, &rich);
        assert!(text.contains("Selected WiFly-EZX"));
        assert!(text.contains("Port:    2000"));

        let json = format_selection_json(endpoint, &plain().with_compact(true)).unwrap();
        assert!(json.starts_with("{\"address\":\"192.168.0.14:2000\""));

        let csv = format_selection_csv(endpoint, &plain());
        assert_eq!(csv, "address,name,online,score\n192.168.0.14:2000,WiFly-EZX,false,2\n");
    }
}
