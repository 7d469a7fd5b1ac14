use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use laundry::model::{HistoryAction, HistoryFilter};
use laundry::LaundryService;

/// Print to `out`, or stdout when none is given.
fn emit(out: Option<&Path>, content: &str) -> Result<()> {
    match out {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Wrote {}", path.display());
        }
        None => print!("{}", content),
    }
    Ok(())
}

pub fn init(svc: &LaundryService) -> Result<()> {
    svc.initialize_defaults()?;
    println!(
        "{} branches, {} users",
        svc.get_branches().len(),
        svc.get_users().len()
    );
    Ok(())
}

pub fn verify(svc: &LaundryService) -> Result<()> {
    let problems = svc.verify_integrity();
    if problems.is_empty() {
        println!("OK");
        return Ok(());
    }
    for p in &problems {
        println!("{}", p);
    }
    anyhow::bail!("{} integrity problems found", problems.len());
}

pub fn fix_counters(svc: &LaundryService) -> Result<()> {
    let counters = svc.fix_counters()?;
    println!("{}", serde_json::to_string_pretty(&counters)?);
    Ok(())
}

pub fn export(svc: &LaundryService, out: Option<&Path>) -> Result<()> {
    let mut json = svc.export_backup_json()?;
    json.push('\n');
    emit(out, &json)
}

pub fn import(svc: &LaundryService, file: &Path, fix_counters: bool) -> Result<()> {
    let json = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let imported = svc.import_backup(&json)?;
    let names: Vec<&str> = imported.iter().map(|c| c.name()).collect();
    println!("Imported: {}", names.join(", "));
    if fix_counters {
        svc.fix_counters()?;
        println!("Counters recomputed.");
    }
    Ok(())
}

pub fn history_filter(
    client_id: Option<u64>,
    action: Option<&str>,
    operator: Option<String>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<HistoryFilter> {
    let action = match action {
        Some(label) => Some(
            serde_json::from_value::<HistoryAction>(serde_json::Value::String(label.to_string()))
                .map_err(|_| anyhow::anyhow!("Unknown history action \"{}\".", label))?,
        ),
        None => None,
    };
    Ok(HistoryFilter {
        client_id,
        action,
        operator,
        from,
        to,
    })
}

pub fn history(svc: &LaundryService, filter: &HistoryFilter, out: Option<&Path>) -> Result<()> {
    let csv = svc.export_history_csv(filter)?;
    emit(out, &csv)
}

pub fn stats(svc: &LaundryService) -> Result<()> {
    let stats = svc.dashboard_stats();
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}
