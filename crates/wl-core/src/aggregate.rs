//! Work intervals to billable records.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::error::SyntaxError;
use crate::interpreter::Log;
use crate::tree::{Document, NodeId};

/// One contiguous slice of time attributed to at most one issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChargeItem {
    pub date: NaiveDate,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    /// Resolved key of the first issue; `None` for breaks.
    pub issue: Option<String>,
    pub alias: Option<String>,
    /// Chargeable minutes: `total` unless committed (or a break).
    pub minutes: i64,
    pub total: i64,
    pub comment: String,
    /// Every issue of the slice is already committed.
    pub done: bool,
    pub transient: bool,
    #[serde(skip)]
    pub issues: Vec<NodeId>,
}

/// All work on one issue during one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueTotal {
    pub date: NaiveDate,
    /// Start of the first uncommitted slice, else of the first slice.
    pub start: NaiveDateTime,
    pub issue: String,
    pub alias: String,
    /// Uncommitted minutes.
    pub minutes: i64,
    /// All minutes, committed or not.
    pub total: i64,
    /// Comments of uncommitted slices.
    pub comment: String,
    /// Comments of every slice.
    pub all_comments: String,
    pub transient: bool,
    /// Issue nodes of the uncommitted slices; marked done after submission.
    #[serde(skip)]
    pub issues: Vec<NodeId>,
}

/// Splits logs with quick entries into contiguous leaves.
pub fn flatten(logs: &[Log]) -> Result<Vec<Log>, SyntaxError> {
    let mut leaves = Vec::new();
    for log in logs {
        if log.children.is_empty() {
            leaves.push(log.clone());
            continue;
        }
        let end = log.end.unwrap_or(log.start);
        let mut cursor = log.start;
        for child in &log.children {
            if child.start < cursor {
                return Err(SyntaxError::OverlappingEntry { start: child.start });
            }
            if child.start > cursor {
                leaves.push(slice(log, cursor, child.start, false));
            }
            leaves.extend(flatten(std::slice::from_ref(child))?);
            cursor = child.end.unwrap_or(child.start);
        }
        if cursor < end {
            leaves.push(slice(log, cursor, end, log.transient));
        }
    }
    Ok(leaves)
}

fn slice(parent: &Log, start: NaiveDateTime, end: NaiveDateTime, transient: bool) -> Log {
    Log {
        start,
        end: Some(end),
        issues: parent.issues.clone(),
        children: Vec::new(),
        transient,
    }
}

/// Flattens logs into charge items ordered chronologically.
///
/// With `all` set, committed slices keep their minutes.
pub fn chargeable_items(
    document: &Document,
    logs: &[Log],
    all: bool,
) -> Result<Vec<ChargeItem>, SyntaxError> {
    let mut items: Vec<ChargeItem> = flatten(logs)?
        .into_iter()
        .map(|leaf| charge_item(document, leaf, all))
        .collect();
    items.sort_by_key(|item| item.start);
    Ok(items)
}

fn charge_item(document: &Document, leaf: Log, all: bool) -> ChargeItem {
    let issues: Vec<_> = leaf
        .issues
        .iter()
        .filter_map(|&id| document.issue(id))
        .collect();
    let first = issues.first();
    let done = !issues.is_empty() && issues.iter().all(|issue| issue.is_done);
    let total = leaf.duration_minutes();
    let minutes = if !issues.is_empty() && (all || !done) {
        total
    } else {
        0
    };

    ChargeItem {
        date: leaf.start.date(),
        start: leaf.start,
        end: leaf.end.unwrap_or(leaf.start),
        issue: first.map(|issue| issue.key().to_string()),
        alias: first.map(|issue| issue.alias().to_string()),
        minutes,
        total,
        comment: dedupe_comments(issues.iter().map(|issue| issue.comment())),
        done,
        transient: leaf.transient,
        issues: leaf.issues,
    }
}

/// Per day and issue records with uncommitted work (or running).
pub fn aggregate_uncommitted(items: &[ChargeItem]) -> Vec<IssueTotal> {
    aggregate(items)
        .into_iter()
        .filter(|total| total.minutes > 0 || total.transient)
        .collect()
}

/// Per day and issue records with any work.
pub fn aggregate_all(items: &[ChargeItem]) -> Vec<IssueTotal> {
    aggregate(items)
        .into_iter()
        .filter(|total| total.total > 0 || total.transient)
        .collect()
}

fn aggregate(items: &[ChargeItem]) -> Vec<IssueTotal> {
    // (date, issue) groups in first appearance order
    let mut groups: Vec<((NaiveDate, &str), Vec<&ChargeItem>)> = Vec::new();
    for item in items {
        let Some(issue) = item.issue.as_deref() else {
            continue;
        };
        let key = (item.date, issue);
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, members)) => members.push(item),
            None => groups.push((key, vec![item])),
        }
    }

    groups
        .into_iter()
        .map(|((date, issue), members)| {
            let open: Vec<&ChargeItem> = members.iter().copied().filter(|i| !i.done).collect();
            let first = open.first().unwrap_or(&members[0]);
            IssueTotal {
                date,
                start: first.start,
                issue: issue.to_string(),
                alias: members
                    .last()
                    .and_then(|i| i.alias.clone())
                    .unwrap_or_else(|| issue.to_string()),
                minutes: open.iter().map(|i| i.total).sum(),
                total: members.iter().map(|i| i.total).sum(),
                comment: dedupe_comments(open.iter().map(|i| i.comment.as_str())),
                all_comments: dedupe_comments(members.iter().map(|i| i.comment.as_str())),
                transient: members.iter().any(|i| i.transient),
                issues: open.iter().flat_map(|i| i.issues.iter().copied()).collect(),
            }
        })
        .collect()
}

/// Joins comments with `"; "`, dropping blanks and repeated parts.
pub fn dedupe_comments<'a>(comments: impl IntoIterator<Item = &'a str>) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for comment in comments {
        for part in comment.split("; ").map(str::trim) {
            if !part.is_empty() && !parts.contains(&part) {
                parts.push(part);
            }
        }
    }
    parts.join("; ")
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;

    use super::*;
    use crate::config::DocumentConfig;
    use crate::interpreter::interpret;
    use crate::parser::parse;

    fn dt(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2022, 11, 25)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn items(text: &str, all: bool) -> Vec<ChargeItem> {
        let config = DocumentConfig::default();
        let mut doc = parse(text, &config).unwrap();
        let logs = interpret(&mut doc, &config, dt(18, 0)).unwrap();
        chargeable_items(&doc, &logs, all).unwrap()
    }

    // ========== Comment Tests ==========

    #[test]
    fn dedupe_keeps_first_occurrence() {
        assert_eq!(dedupe_comments(["Review", "Review; Testing"]), "Review; Testing");
        assert_eq!(dedupe_comments(["", " a ", "b; a;  "]), "a; b; a;");
        assert_eq!(dedupe_comments(["review", "Review"]), "review; Review");
        assert_eq!(dedupe_comments(Vec::<&str>::new()), "");
    }

    // ========== Charge Item Tests ==========

    #[test]
    fn breaks_have_no_issue_and_no_minutes() {
        let items = items("25.11.2022\n09:00\nTEST-1 a\n09:30\n\n10:00\nTEST-2\n10:15", false);
        assert_eq!(items.len(), 3);
        assert_eq!(items[1].issue, None);
        assert_eq!(items[1].minutes, 0);
        assert_eq!(items[1].total, 30);
        assert_eq!(items[0].comment, "a");
    }

    #[test]
    fn committed_items_only_count_with_all() {
        let text = "25.11.2022\n09:00\nTEST-1 a x\n09:30";
        assert_eq!(items(text, false)[0].minutes, 0);
        assert!(items(text, false)[0].done);
        assert_eq!(items(text, true)[0].minutes, 30);
    }

    #[test]
    fn quick_entries_slice_their_parent() {
        let items = items(
            "25.11.2022\n08:15\nTEST-1\n09:00 10m TEST-2 call\n10:00",
            false,
        );
        let spans: Vec<_> = items
            .iter()
            .map(|i| (i.start, i.end, i.issue.clone().unwrap(), i.minutes))
            .collect();
        assert_eq!(
            spans,
            vec![
                (dt(8, 15), dt(9, 0), "TEST-1".to_string(), 45),
                (dt(9, 0), dt(9, 10), "TEST-2".to_string(), 10),
                (dt(9, 10), dt(10, 0), "TEST-1".to_string(), 50),
            ]
        );
    }

    #[test]
    fn embedded_entry_is_charged_separately() {
        let items = items(
            "25.11.2022\n08:15\nTEST-1 setup\n08:30 10m TEST-2 call\n10:00",
            false,
        );
        let totals = aggregate_all(&items);
        let rows: Vec<String> = totals
            .iter()
            .map(|t| format!("{} {} {}", t.issue, t.minutes, t.comment))
            .collect();
        assert_snapshot!(rows.join("\n"), @r"
        TEST-1 95 setup
        TEST-2 10 call
        ");
    }

    #[test]
    fn trailing_slice_inherits_transient() {
        let items = items("25.11.2022\n17:00\nTEST-1\n17:10 5m TEST-2", false);
        assert_eq!(items.len(), 3);
        assert!(!items[0].transient);
        assert!(!items[1].transient);
        assert!(items[2].transient);
        assert_eq!(items[2].end, dt(18, 0));
    }

    #[test]
    fn overlapping_quick_entries_are_rejected() {
        let config = DocumentConfig::default();
        let mut doc = parse(
            "25.11.2022\n08:00\nTEST-1\n09:00 30m TEST-2\n09:15 5m TEST-3\n10:00",
            &config,
        )
        .unwrap();
        let logs = interpret(&mut doc, &config, dt(18, 0)).unwrap();
        assert_eq!(
            chargeable_items(&doc, &logs, false),
            Err(SyntaxError::OverlappingEntry { start: dt(9, 15) })
        );
    }

    // ========== Aggregation Tests ==========

    #[test]
    fn aggregation_sums_per_issue() {
        let items = items(
            "25.11.2022\n08:00\nTEST-1 Review\n08:15\nTEST-1 Review\n08:30",
            false,
        );
        let totals = aggregate_uncommitted(&items);
        assert_eq!(totals.len(), 1);
        assert_eq!(totals[0].minutes, 30);
        assert_eq!(totals[0].total, 30);
        assert_eq!(totals[0].comment, "Review");
        assert_eq!(totals[0].start, dt(8, 0));
        assert_eq!(totals[0].issues.len(), 2);
    }

    #[test]
    fn uncommitted_skips_done_work() {
        let items = items(
            "25.11.2022\n08:00\nTEST-1 old x\n09:00\nTEST-1 new\n09:30\nTEST-2 x\n10:00",
            false,
        );
        let open = aggregate_uncommitted(&items);
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].issue, "TEST-1");
        assert_eq!(open[0].minutes, 30);
        assert_eq!(open[0].total, 90);
        assert_eq!(open[0].start, dt(9, 0));
        assert_eq!(open[0].comment, "new");
        assert_eq!(open[0].all_comments, "old; new");

        let all = aggregate_all(&items);
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].issue, "TEST-2");
        assert_eq!(all[1].minutes, 0);
        assert_eq!(all[1].total, 30);
    }

    #[test]
    fn running_records_are_kept() {
        let items = items("25.11.2022\n18:00\nTEST-1", false);
        let open = aggregate_uncommitted(&items);
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].minutes, 0);
        assert!(open[0].transient);
    }

    #[test]
    fn days_are_grouped_separately() {
        let items = items(
            "24.11.2022\n09:00\nTEST-1\n10:00\n25.11.2022\n09:00\nTEST-1\n09:45",
            false,
        );
        let totals = aggregate_uncommitted(&items);
        let per_day: Vec<_> = totals.iter().map(|t| (t.date.to_string(), t.minutes)).collect();
        assert_eq!(
            per_day,
            vec![("2022-11-24".to_string(), 60), ("2022-11-25".to_string(), 45)]
        );
    }
}
