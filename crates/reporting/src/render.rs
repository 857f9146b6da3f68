//! Report rendering — HTML (primary), CSV, and JSON exports.

use crate::report::LtvReport;
use ltv_core::config::FormatConfig;
use ltv_core::ReportResult;

/// Locale-aware number formatting for the rendered document. The default
/// matches the source system's locale: comma decimals, dot thousands.
#[derive(Debug, Clone)]
pub struct NumberFormat {
    pub decimal_separator: String,
    pub thousands_separator: String,
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self {
            decimal_separator: ",".to_string(),
            thousands_separator: ".".to_string(),
        }
    }
}

impl From<&FormatConfig> for NumberFormat {
    fn from(config: &FormatConfig) -> Self {
        Self {
            decimal_separator: config.decimal_separator.clone(),
            thousands_separator: config.thousands_separator.clone(),
        }
    }
}

impl NumberFormat {
    /// Format with the given precision, rounding half away from zero and
    /// grouping integer digits in threes.
    pub fn format(&self, value: f64, decimals: usize) -> String {
        let factor = 10f64.powi(decimals as i32);
        let rounded = (value * factor).round() / factor;

        let plain = format!("{:.*}", decimals, rounded.abs());
        let (int_part, frac_part) = match plain.split_once('.') {
            Some((int_part, frac_part)) => (int_part, Some(frac_part)),
            None => (plain.as_str(), None),
        };

        let mut out = String::new();
        if rounded < 0.0 {
            out.push('-');
        }
        for (idx, digit) in int_part.chars().enumerate() {
            if idx > 0 && (int_part.len() - idx) % 3 == 0 {
                out.push_str(&self.thousands_separator);
            }
            out.push(digit);
        }
        if let Some(frac) = frac_part {
            out.push_str(&self.decimal_separator);
            out.push_str(frac);
        }
        out
    }
}

/// Render the report as a standalone HTML document.
pub fn render_html(report: &LtvReport, fmt: &NumberFormat) -> String {
    let mut html = String::from(
        "<!doctype html>\n<html>\n<head>\n<title>LTV Report</title>\n\
         <meta charset=\"utf-8\"/>\n<style>\n\
         .report-table { width: 100%; border: 1px solid #000000; border-collapse: collapse; }\n\
         .report-table td, .report-table th { text-align: left; border: 1px solid #000000; padding: 5px; }\n\
         .report-table .right { text-align: right; }\n\
         </style>\n</head>\n<body>\n",
    );

    html.push_str("<h1>Report:</h1>\n");
    html.push_str(&format!("<h2>Period: {}</h2>\n", report.period_months));
    html.push_str("<table class=\"report-table\">\n<thead>\n<tr>");
    for header in [
        "Start",
        "Bookers",
        "# of bookings",
        "# of bookings (avg)",
        "Turnover",
        "Turnover (avg)",
        "LTV",
    ] {
        html.push_str(&format!("<th>{header}</th>"));
    }
    html.push_str("</tr>\n</thead>\n<tbody>\n");

    for row in &report.rows {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            row.cohort,
            row.bookers,
            fmt.format(row.booking_count as f64, 0),
            fmt.format(row.avg_booking_count, 2),
            fmt.format(row.turnover, 2),
            fmt.format(row.avg_turnover, 2),
            fmt.format(row.ltv, 2),
        ));
    }

    html.push_str("</tbody>\n<tfoot>\n");
    html.push_str(&format!(
        "<tr><td colspan=\"6\" class=\"right\"><strong>Total rows:</strong></td><td>{}</td></tr>\n",
        report.total_rows
    ));
    html.push_str("</tfoot>\n</table>\n</body>\n</html>\n");
    html
}

/// Render the report as machine-readable CSV (dot decimals, no grouping).
pub fn render_csv(report: &LtvReport) -> String {
    let mut csv =
        String::from("start,bookers,booking_count,avg_booking_count,turnover,avg_turnover,ltv\n");
    for row in &report.rows {
        csv.push_str(&format!(
            "{},{},{},{:.2},{:.2},{:.2},{:.2}\n",
            row.cohort,
            row.bookers,
            row.booking_count,
            row.avg_booking_count,
            row.turnover,
            row.avg_turnover,
            row.ltv,
        ));
    }
    csv
}

/// Render the report as pretty-printed JSON.
pub fn render_json(report: &LtvReport) -> ReportResult<String> {
    Ok(serde_json::to_string_pretty(report)?)
}
