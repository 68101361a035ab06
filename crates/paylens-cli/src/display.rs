//! Terminal rendering for laws, rules, report history and manual entries.
//!
//! Lists print one line per record; a single rule prints as a vertical card
//! grouped into sections.

use chrono::{DateTime, NaiveDateTime};
use paylens_core::{HistoryEntry, Law, ManualEntry, Rule, RuleIssue};

const MAX_TEXT_WIDTH: usize = 72;

// ── Lists ──

pub fn print_laws(laws: &[Law]) {
    let id_width = column_width(laws.iter().map(|l| l.id.as_str()), "ID");
    println!("{:<id_width$}  TEXT", "ID");
    for law in laws {
        println!("{:<id_width$}  {}", law.id, truncate(&law.text, MAX_TEXT_WIDTH));
    }
    println!();
    println!("{} law(s)", laws.len());
}

pub fn print_rules(rules: &[Rule]) {
    let id_width = column_width(rules.iter().map(|r| r.rule_id.as_str()), "ID");
    println!("{:<id_width$}  {:<24}  {:<23}  NAME", "ID", "LAW", "IN EFFECT");
    for rule in rules {
        println!(
            "{:<id_width$}  {:<24}  {:<23}  {}",
            rule.rule_id,
            truncate(&rule.law_reference, 24),
            effective_range(rule),
            rule.name
        );
    }
    println!();
    println!("{} rule(s)", rules.len());
}

pub fn print_history(entries: &[HistoryEntry]) {
    let id_width = column_width(entries.iter().map(|e| e.id.as_str()), "ID");
    println!("{:<id_width$}  {:<16}  {:<16}  PREVIEW", "ID", "CREATED", "TYPE");
    for entry in entries {
        let text = entry.analysis_text();
        let preview = text.lines().next().unwrap_or_default();
        println!(
            "{:<id_width$}  {:<16}  {:<16}  {}",
            entry.id,
            format_timestamp(&entry.created_at),
            entry.analysis_type,
            truncate(preview, 48)
        );
    }
}

// ── Rule card ──

/// Print a single rule as a vertical card.
pub fn print_rule_card(rule: &Rule) {
    println!("=== {} ===", rule.name);
    if !rule.description.is_empty() {
        println!("{}", rule.description);
    }
    println!();

    println!("Identity");
    field("rule_id", &rule.rule_id);
    field("law_reference", &rule.law_reference);
    println!();

    println!("Dates");
    field("effective_from", &rule.effective_from);
    field(
        "effective_to",
        rule.effective_to.as_deref().unwrap_or("(ongoing)"),
    );
    if let Some(created) = &rule.created_date {
        field("created_date", &format_timestamp(created));
    }
    if let Some(updated) = &rule.updated_date {
        field("updated_date", &format_timestamp(updated));
    }
    println!();

    if !rule.checks.is_empty() {
        println!("Checks ({})", rule.checks.len());
        for (i, check) in rule.checks.iter().enumerate() {
            println!("  {}. if {}", i + 1, check.condition);
            if !check.amount_owed.is_empty() {
                println!("     owed: {}", check.amount_owed);
            }
            println!("     message: {}", check.violation_message);
        }
        println!();
    }

    if !rule.penalty.is_empty() {
        println!("Penalty");
        for line in &rule.penalty {
            println!("  {line}");
        }
        println!();
    }
}

/// Blocking errors and warnings from the last submit or test.
pub fn print_issues(errors: &[RuleIssue], warnings: &[RuleIssue]) {
    for issue in errors {
        eprintln!("error: {issue}");
    }
    for issue in warnings {
        eprintln!("warning: {issue}");
    }
}

// ── Manual entry ──

pub fn print_entry(entry: &ManualEntry) {
    println!("=== Employee {} ===", entry.employee_id);
    println!();

    println!("Payslips ({})", entry.payslips.len());
    for slip in &entry.payslips {
        println!(
            "  {:<10} gross {:>10}  net {:>10}  hours {:>6}  overtime {:>6}",
            slip.month,
            number(slip.gross_salary),
            number(slip.net_salary),
            number(slip.hours_worked),
            number(slip.overtime_hours),
        );
    }
    println!();

    println!("Attendance ({})", entry.attendance.len());
    for day in &entry.attendance {
        println!(
            "  {:<10} {:>5} - {:<5}  hours {:>6}",
            day.date,
            day.start_time.as_deref().unwrap_or("--:--"),
            day.end_time.as_deref().unwrap_or("--:--"),
            number(day.hours_worked),
        );
    }
    println!();

    let contract = &entry.contract;
    println!("Contract");
    if let Some(position) = &contract.position {
        field("position", position);
    }
    if let Some(start) = &contract.start_date {
        field("start_date", start);
    }
    if contract.hourly_rate.is_some() {
        field("hourly_rate", &number(contract.hourly_rate));
    }
    if contract.monthly_salary.is_some() {
        field("monthly_salary", &number(contract.monthly_salary));
    }
    println!();
}

// ── Formatting helpers ──

fn field(name: &str, value: &str) {
    if !value.is_empty() {
        println!("  {:<26} {}", name, value);
    }
}

fn column_width<'a>(values: impl Iterator<Item = &'a str>, header: &str) -> usize {
    values
        .map(|v| v.chars().count())
        .max()
        .unwrap_or(0)
        .max(header.len())
}

fn effective_range(rule: &Rule) -> String {
    match rule.effective_to.as_deref() {
        Some(to) if !to.is_empty() => format!("{} .. {}", rule.effective_from, to),
        _ => format!("{} ..", rule.effective_from),
    }
}

fn number(value: Option<f64>) -> String {
    match value {
        Some(v) if v.fract() == 0.0 => format!("{v:.0}"),
        Some(v) => format!("{v:.2}"),
        None => "-".to_string(),
    }
}

/// Shorten to `max` characters, marking the cut with `...`.
fn truncate(text: &str, max: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max {
        return text.to_string();
    }
    let cut: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", cut.trim_end())
}

/// `YYYY-MM-DD HH:MM` for RFC 3339 or naive ISO timestamps; anything else
/// is shown as-is.
fn format_timestamp(raw: &str) -> String {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return ts.format("%Y-%m-%d %H:%M").to_string();
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return ts.format("%Y-%m-%d %H:%M").to_string();
    }
    raw.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_short_text() {
        assert_eq!(truncate("  Minimum wage  ", 20), "Minimum wage");
    }

    #[test]
    fn truncate_marks_cut() {
        let out = truncate("Employees shall receive overtime pay", 16);
        assert_eq!(out, "Employees sha...");
        assert_eq!(out.chars().count(), 16);
    }

    #[test]
    fn timestamps() {
        assert_eq!(format_timestamp("2024-05-01T10:15:30Z"), "2024-05-01 10:15");
        assert_eq!(
            format_timestamp("2024-05-01T10:15:30.123456"),
            "2024-05-01 10:15"
        );
        assert_eq!(format_timestamp("yesterday"), "yesterday");
    }

    #[test]
    fn numbers() {
        assert_eq!(number(Some(1800.0)), "1800");
        assert_eq!(number(Some(12.5)), "12.50");
        assert_eq!(number(None), "-");
    }

    #[test]
    fn open_ended_range() {
        let rule: Rule = serde_json::from_value(serde_json::json!({
            "rule_id": "r1",
            "name": "Overtime",
            "effective_from": "2024-01-01",
            "effective_to": null
        }))
        .unwrap();
        assert_eq!(effective_range(&rule), "2024-01-01 ..");
    }

    #[test]
    fn column_width_covers_header() {
        assert_eq!(column_width(["1", "22"].into_iter(), "ID"), 2);
        assert_eq!(column_width(["12345"].into_iter(), "ID"), 5);
    }
}
