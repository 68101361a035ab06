//! Subcommand bodies. Each one drives a manager or the HTTP client and
//! prints the result; a failed action exits with the banner text.

use std::io::{self, BufRead, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::Subcommand;
use paylens_client::{
    BackendClient, ClientError, LawManager, Outcome, RuleForm, RuleManager, RuleSamples, banner,
};
use paylens_core::{
    AnalysisStore, Dictionary, HistoryEntry, ManualEntry, ManualEntryStore, MessageKey, RuleDraft,
};
use serde::de::DeserializeOwned;
use tracing::info;

use crate::display;

// ── Laws ──

#[derive(Subcommand)]
pub enum LawCommand {
    /// List all laws
    List,
    /// Add a law
    Add {
        /// Full text of the law
        text: String,
    },
    /// Replace the text of a law
    Edit { id: String, text: String },
    /// Delete a law
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
}

pub async fn laws(
    client: BackendClient,
    dict: Dictionary,
    command: LawCommand,
) -> anyhow::Result<()> {
    let mut manager = LawManager::new(client, dict);

    match command {
        LawCommand::List => {
            applied(manager.load().await, manager.error())?;
            match manager.empty_message() {
                Some(message) => println!("{message}"),
                None => display::print_laws(manager.laws()),
            }
        }
        LawCommand::Add { text } => {
            manager.set_input(text);
            match manager.add().await {
                Outcome::Skipped => bail!("law text is empty"),
                outcome => applied(outcome, manager.error())?,
            }
            if let Some(law) = manager.laws().last() {
                println!("Added law {}", law.id);
            }
        }
        LawCommand::Edit { id, text } => {
            applied(manager.load().await, manager.error())?;
            if !manager.start_edit_by_id(&id) {
                bail!("no law with id {id}");
            }
            manager.set_edit_text(text);
            match manager.save_edit().await {
                Outcome::Skipped => bail!("law text is empty"),
                outcome => applied(outcome, manager.error())?,
            }
            println!("Updated law {id}");
        }
        LawCommand::Delete { id, yes } => {
            let outcome = if yes {
                manager.delete(&id, &true).await
            } else {
                manager.delete(&id, &prompt_yes_no).await
            };
            match outcome {
                Outcome::Skipped => println!("Cancelled."),
                outcome => {
                    applied(outcome, manager.error())?;
                    println!("Deleted law {id}");
                }
            }
        }
    }
    Ok(())
}

// ── Rules ──

#[derive(Subcommand)]
pub enum RuleCommand {
    /// List all rules
    List,
    /// Show one rule in full
    Show { rule_id: String },
    /// Create a rule from a JSON draft
    Create {
        #[arg(long, short)]
        file: PathBuf,
    },
    /// Replace a rule with a JSON draft
    Update {
        rule_id: String,
        #[arg(long, short)]
        file: PathBuf,
    },
    /// Delete a rule
    Delete {
        rule_id: String,
        #[arg(long, short)]
        yes: bool,
    },
    /// Evaluate a draft against sample documents without saving it
    Test {
        /// Rule draft; defaults to the stored rule given by --rule
        #[arg(long, short, conflicts_with = "rule")]
        file: Option<PathBuf>,
        /// Test a stored rule as-is
        #[arg(long)]
        rule: Option<String>,
        #[arg(long)]
        payslip: Option<PathBuf>,
        #[arg(long)]
        contract: Option<PathBuf>,
        #[arg(long)]
        attendance: Option<PathBuf>,
    },
}

pub async fn rules(
    client: BackendClient,
    dict: Dictionary,
    command: RuleCommand,
) -> anyhow::Result<()> {
    let mut manager = RuleManager::new(client, dict);

    match command {
        RuleCommand::List => {
            applied(manager.load().await, manager.error())?;
            match manager.empty_message() {
                Some(message) => println!("{message}"),
                None => display::print_rules(manager.rules()),
            }
        }
        RuleCommand::Show { rule_id } => {
            applied(manager.load().await, manager.error())?;
            match manager.select(&rule_id) {
                Some(rule) => display::print_rule_card(rule),
                None => bail!("no rule with id {rule_id}"),
            }
        }
        RuleCommand::Create { file } => {
            let draft: RuleDraft = read_json(&file)?;
            *manager.start_create() = RuleForm::from_draft(draft);
            submit(&mut manager).await?;
        }
        RuleCommand::Update { rule_id, file } => {
            let draft: RuleDraft = read_json(&file)?;
            applied(manager.load().await, manager.error())?;
            let Some(form) = manager.start_edit(&rule_id) else {
                bail!("no rule with id {rule_id}");
            };
            *form = RuleForm::from_draft(draft);
            submit(&mut manager).await?;
        }
        RuleCommand::Delete { rule_id, yes } => {
            let outcome = if yes {
                manager.delete(&rule_id, &true).await
            } else {
                manager.delete(&rule_id, &prompt_yes_no).await
            };
            match outcome {
                Outcome::Skipped => println!("Cancelled."),
                outcome => {
                    applied(outcome, manager.error())?;
                    println!("Deleted rule {rule_id}");
                }
            }
        }
        RuleCommand::Test {
            file,
            rule,
            payslip,
            contract,
            attendance,
        } => {
            match (file, rule) {
                (Some(file), _) => {
                    let draft: RuleDraft = read_json(&file)?;
                    *manager.start_create() = RuleForm::from_draft(draft);
                }
                (None, Some(rule_id)) => {
                    applied(manager.load().await, manager.error())?;
                    if manager.start_edit(&rule_id).is_none() {
                        bail!("no rule with id {rule_id}");
                    }
                }
                (None, None) => bail!("pass --file or --rule"),
            }
            let samples = RuleSamples {
                payslip_data: read_sample(payslip.as_deref())?,
                contract_data: read_sample(contract.as_deref())?,
                attendance_data: read_sample(attendance.as_deref())?,
            };

            let outcome = manager.test(samples).await;
            display::print_issues(manager.validation_errors(), manager.warnings());
            match outcome {
                Outcome::Skipped => bail!("rule draft has errors"),
                outcome => applied(outcome, manager.error())?,
            }
            if let Some(result) = manager.test_result() {
                println!("{}", serde_json::to_string_pretty(result)?);
            }
        }
    }
    Ok(())
}

async fn submit(manager: &mut RuleManager<BackendClient>) -> anyhow::Result<()> {
    let outcome = manager.submit().await;
    display::print_issues(manager.validation_errors(), manager.warnings());
    match outcome {
        Outcome::Skipped => bail!("rule draft has errors"),
        outcome => applied(outcome, manager.error())?,
    }
    if let Some(rule) = manager.selected() {
        println!("Saved rule {}", rule.rule_id);
    }
    Ok(())
}

// ── Reports ──

pub async fn history(client: &BackendClient, dict: &Dictionary) -> anyhow::Result<()> {
    let entries = client
        .history()
        .await
        .map_err(|e| failure(dict, MessageKey::HistoryFetchError, e))?;
    if entries.is_empty() {
        println!("{}", dict.text(MessageKey::HistoryEmpty));
    } else {
        display::print_history(&entries);
    }
    Ok(())
}

pub async fn summarise(
    client: &BackendClient,
    dict: &Dictionary,
    report_id: &str,
) -> anyhow::Result<()> {
    let store = load_analysis(client, dict, report_id).await?;
    let Some(content) = store.current() else {
        println!("{}", dict.text(MessageKey::NothingToAnalyze));
        return Ok(());
    };

    let summary = client
        .summarise(content)
        .await
        .map_err(|e| failure(dict, MessageKey::SummaryError, e))?;
    println!("{}", summary.summary);
    Ok(())
}

pub async fn ask(
    client: &BackendClient,
    dict: &Dictionary,
    report_id: &str,
    question: &str,
) -> anyhow::Result<()> {
    let store = load_analysis(client, dict, report_id).await?;
    let Some(report) = store.current() else {
        println!("{}", dict.text(MessageKey::NothingToAnalyze));
        return Ok(());
    };

    let answer = client
        .ask(question, report)
        .await
        .map_err(|e| failure(dict, MessageKey::QuestionError, e))?;
    println!("{}", answer.answer);
    Ok(())
}

pub async fn suggest(
    client: &BackendClient,
    dict: &Dictionary,
    description: &str,
) -> anyhow::Result<()> {
    if description.trim().is_empty() {
        bail!("law description is empty");
    }
    let suggestions = client
        .suggest_params(description)
        .await
        .map_err(|e| failure(dict, MessageKey::SuggestError, e))?;
    println!("{}", serde_json::to_string_pretty(&suggestions.suggestions)?);
    Ok(())
}

pub async fn sections(client: &BackendClient, dict: &Dictionary) -> anyhow::Result<()> {
    let list = client
        .dynamic_sections()
        .await
        .map_err(|e| failure(dict, MessageKey::Unexpected, e))?;
    for section in &list.sections {
        println!("{section}");
    }
    Ok(())
}

pub async fn export(
    client: &BackendClient,
    dict: &Dictionary,
    selection: &Path,
    out: Option<&Path>,
) -> anyhow::Result<()> {
    let selection: serde_json::Value = read_json(selection)?;
    let export = client
        .export_excel(&selection)
        .await
        .map_err(|e| failure(dict, MessageKey::ExportError, e))?;

    let path = out
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(&export.filename));
    std::fs::write(&path, &export.bytes)
        .with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), size = export.bytes.len(), "export saved");
    println!("Saved {} ({} bytes)", path.display(), export.bytes.len());
    Ok(())
}

/// Fetch the report's analysis into a fresh store.
async fn load_analysis(
    client: &BackendClient,
    dict: &Dictionary,
    report_id: &str,
) -> anyhow::Result<AnalysisStore> {
    let entries = client
        .history()
        .await
        .map_err(|e| failure(dict, MessageKey::HistoryFetchError, e))?;
    let entry = find_report(&entries, report_id)
        .with_context(|| format!("no report with id {report_id}"))?;

    let mut store = AnalysisStore::new();
    store.set(entry.analysis_text());
    Ok(store)
}

fn find_report<'a>(entries: &'a [HistoryEntry], report_id: &str) -> Option<&'a HistoryEntry> {
    entries.iter().find(|e| e.id == report_id)
}

// ── Manual entry ──

pub fn entry(file: &Path) -> anyhow::Result<()> {
    let mut store = ManualEntryStore::new();
    store.open();
    store.set_payload(read_json::<ManualEntry>(file)?);

    let Some(entry) = store.take_payload() else {
        bail!("no entry loaded");
    };
    store.reset();

    display::print_entry(&entry);
    if !entry.is_submittable() {
        bail!("entry needs an employee id and at least one payslip");
    }
    println!("Ready to submit.");
    Ok(())
}

// ── Helpers ──

/// Turn a manager outcome into a CLI result, using the manager's banner.
fn applied(outcome: Outcome, banner: Option<&str>) -> anyhow::Result<()> {
    match outcome {
        Outcome::Applied | Outcome::Skipped => Ok(()),
        Outcome::Failed => bail!("{}", banner.unwrap_or("request failed")),
    }
}

fn failure(dict: &Dictionary, fallback: MessageKey, err: ClientError) -> anyhow::Error {
    tracing::warn!(error = %err, "request failed");
    anyhow::anyhow!(banner(dict, fallback, &err))
}

fn prompt_yes_no(prompt: &str) -> bool {
    eprint!("{prompt} [y/N] ");
    let _ = io::stderr().flush();
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line).is_err() {
        return false;
    }
    is_yes(&line)
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Parse a JSON file, or stdin when `path` is `-`.
fn read_json<T: DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let text = if path == Path::new("-") {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf).context("reading stdin")?;
        buf
    } else {
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?
    };
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn read_sample(path: Option<&Path>) -> anyhow::Result<serde_json::Value> {
    match path {
        Some(path) => read_json(path),
        None => Ok(serde_json::Value::Object(Default::default())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn yes_answers() {
        assert!(is_yes("y\n"));
        assert!(is_yes("  YES "));
        assert!(!is_yes("\n"));
        assert!(!is_yes("no"));
    }

    #[test]
    fn failed_outcome_carries_banner() {
        let err = applied(Outcome::Failed, Some("Law not found")).unwrap_err();
        assert_eq!(err.to_string(), "Law not found");
        assert!(applied(Outcome::Applied, None).is_ok());
    }

    #[test]
    fn failure_prefers_backend_detail() {
        let dict = Dictionary::english();
        let err = ClientError::backend(500, r#"{"error":"model offline"}"#.into());
        assert_eq!(
            failure(&dict, MessageKey::SummaryError, err).to_string(),
            "model offline"
        );

        let err = ClientError::backend(502, String::new());
        assert_eq!(
            failure(&dict, MessageKey::SummaryError, err).to_string(),
            dict.text(MessageKey::SummaryError)
        );
    }

    #[test]
    fn read_json_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rule.json");
        std::fs::write(
            &path,
            json!({
                "name": "Overtime premium",
                "law_reference": "Art. 12",
                "description": "",
                "effective_from": "2024-01-01",
                "checks": [{"condition": "overtime_hours > 0", "violation_message": "Unpaid overtime"}],
                "penalty": []
            })
            .to_string(),
        )
        .unwrap();

        let draft: RuleDraft = read_json(&path).unwrap();
        assert_eq!(draft.name, "Overtime premium");
        assert_eq!(draft.checks.len(), 1);
        assert!(draft.errors().is_empty());
    }

    #[test]
    fn read_json_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{").unwrap();
        let err = read_json::<serde_json::Value>(&path).unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn missing_sample_is_empty_object() {
        assert_eq!(read_sample(None).unwrap(), json!({}));
    }

    #[test]
    fn finds_report_by_id() {
        let entries: Vec<HistoryEntry> = serde_json::from_value(json!([
            {"id": 1, "analysis_type": "payslip", "analysis_result": "ok", "created_at": "2024-05-01T10:00:00"},
            {"id": "2", "analysis_type": "payslip", "analysis_result": {"violations": []}, "created_at": "2024-05-02T10:00:00"}
        ]))
        .unwrap();
        assert_eq!(find_report(&entries, "1").unwrap().analysis_text(), "ok");
        assert!(find_report(&entries, "3").is_none());
    }
}
