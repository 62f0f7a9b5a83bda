//! Text rendering of log listings.

use std::collections::HashMap;

use chrono::NaiveDate;
use wl_core::{ChargeItem, IssueTotal, format_minutes};

const HEADER_RULE: &str = "------------------------------------";
const SUM_WIDTH: usize = 54;

/// One listed line, built from either a charge item or an issue total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub date: NaiveDate,
    /// `HH:MM-HH:MM` for single slices.
    pub span: Option<String>,
    /// Alias, or `None` for a break.
    pub label: Option<String>,
    pub issue: Option<String>,
    pub minutes: i64,
    pub total: i64,
    /// Comments of the uncommitted part.
    pub comment: String,
    pub all_comments: String,
    pub transient: bool,
}

impl From<&ChargeItem> for Row {
    fn from(item: &ChargeItem) -> Self {
        Self {
            date: item.date,
            span: Some(format!(
                "{}-{}",
                item.start.format("%H:%M"),
                item.end.format("%H:%M")
            )),
            label: item.alias.clone(),
            issue: item.issue.clone(),
            minutes: item.minutes,
            total: item.total,
            comment: item.comment.clone(),
            all_comments: item.comment.clone(),
            transient: item.transient,
        }
    }
}

impl From<&IssueTotal> for Row {
    fn from(total: &IssueTotal) -> Self {
        Self {
            date: total.date,
            span: None,
            label: Some(total.alias.clone()),
            issue: Some(total.issue.clone()),
            minutes: total.minutes,
            total: total.total,
            comment: total.comment.clone(),
            all_comments: total.all_comments.clone(),
            transient: total.transient,
        }
    }
}

/// Renders rows grouped by day with a sum line after each day.
///
/// Breaks are skipped unless `breaks` is set. `summaries` maps issue keys to
/// text shown in front of their comments.
pub fn render(rows: &[Row], breaks: bool, summaries: &HashMap<String, String>) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut current: Option<NaiveDate> = None;
    let mut day_total = 0;

    for row in rows.iter().filter(|row| breaks || row.label.is_some()) {
        if current != Some(row.date) {
            if current.is_some() {
                lines.push(sum_line(day_total));
                lines.push(String::new());
                day_total = 0;
            }
            lines.push(format!(
                "{HEADER_RULE} {} {HEADER_RULE}",
                row.date.format("%d.%m.%y")
            ));
            current = Some(row.date);
        }
        let summary = row.issue.as_ref().and_then(|issue| summaries.get(issue));
        lines.push(render_row(row, summary.map(String::as_str)));
        if row.label.is_some() {
            day_total += row.total;
        }
    }
    if current.is_some() {
        lines.push(sum_line(day_total));
    }
    lines.join("\n")
}

/// A single row: state marker, label, duration and comments.
///
/// The marker is `*` for fully uncommitted work, `~` for partly committed
/// work (followed by the uncommitted part) and blank otherwise.
pub fn render_row(row: &Row, summary: Option<&str>) -> String {
    let state = match (row.minutes, row.transient) {
        (m, _) if m > 0 && m != row.total => "~ ",
        (m, _) if m > 0 => "* ",
        (_, true) => "> ",
        _ => "  ",
    };
    let label = row
        .label
        .as_deref()
        .map_or("(break)", |label| label.trim_matches('_'));

    let mut line = String::from(state);
    if let Some(span) = &row.span {
        line.push_str(span);
        line.push(' ');
    }
    let comments = summary.map_or_else(
        || row.all_comments.clone(),
        |summary| format!("[{summary}] {}", row.all_comments),
    );
    line.push_str(&format!(
        "{label:<10} {:<7} {comments:<80}",
        format_minutes(row.total)
    ));
    if row.minutes > 0 && row.minutes != row.total {
        line.push_str(&format!(
            "* +{} {}",
            format_minutes(row.minutes),
            row.comment
        ));
    }
    line.trim_end().to_string()
}

fn sum_line(total: i64) -> String {
    format!(
        "{HEADER_RULE}-- {:-<SUM_WIDTH$}",
        format!("{} ", format_minutes(total))
    )
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;
    use insta::assert_snapshot;
    use wl_core::{DocumentConfig, aggregate_all, chargeable_items, interpret, parse};

    use super::*;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2022, 11, 26)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn items(text: &str) -> Vec<ChargeItem> {
        let config = DocumentConfig::default();
        let mut doc = parse(text, &config).unwrap();
        let logs = interpret(&mut doc, &config, now()).unwrap();
        chargeable_items(&doc, &logs, false).unwrap()
    }

    const FIRST_DAY: &str = "TEST-1 as Login\n\
                             25.11.2022\n\
                             09:00\n\
                             Login review x\n\
                             10:00\n\
                             Login testing\n\
                             10:30\n\
                             \n\
                             11:00\n\
                             TEST-2 docs\n\
                             11:15";

    #[test]
    fn plain_listing_with_breaks() {
        let rows: Vec<Row> = items(FIRST_DAY).iter().map(Row::from).collect();
        let out = render(&rows, true, &HashMap::new());
        assert_snapshot!(out, @r"
        ------------------------------------ 25.11.22 ------------------------------------
          09:00-10:00 Login      1h      review
        * 10:00-10:30 Login      30m     testing
          10:30-11:00 (break)    30m
        * 11:00-11:15 TEST-2     15m     docs
        -------------------------------------- 1h 45m -----------------------------------------------
        ");
    }

    #[test]
    fn combined_listing_marks_partly_committed_work() {
        let text = format!("{FIRST_DAY}\n26.11.2022\n09:00\nTEST-2 more docs");
        let totals = aggregate_all(&items(&text));
        let rows: Vec<Row> = totals.iter().map(Row::from).collect();
        let summaries = HashMap::from([("TEST-2".to_string(), "Write docs".to_string())]);
        let out = render(&rows, false, &summaries);
        assert_snapshot!(out, @r"
        ------------------------------------ 25.11.22 ------------------------------------
        ~ Login      1h 30m  review; testing                                                                 * +30m testing
        * TEST-2     15m     [Write docs] docs
        -------------------------------------- 1h 45m -----------------------------------------------

        ------------------------------------ 26.11.22 ------------------------------------
        * TEST-2     3h      [Write docs] more docs
        -------------------------------------- 3h ---------------------------------------------------
        ");
    }

    #[test]
    fn breaks_can_be_hidden() {
        let rows: Vec<Row> = items(FIRST_DAY).iter().map(Row::from).collect();
        let out = render(&rows, false, &HashMap::new());
        assert!(!out.contains("(break)"));
        assert_eq!(out.lines().count(), 5);
    }

    #[test]
    fn empty_listing() {
        assert_eq!(render(&[], true, &HashMap::new()), "");
    }
}
