use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use std::env;
use std::path::{Path, PathBuf};

use expense_intake::{
    export_csv, init_tracing, ExpenseForm, ExpenseRecord, ExpenseStatus, ReceiptFile, Settings,
    SubmissionController,
};

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();

    let mut config_path: Option<PathBuf> = None;
    let mut positional = Vec::new();
    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        if arg == "--config" {
            let path = iter.next().context("--config needs a file path")?;
            config_path = Some(PathBuf::from(path));
        } else {
            positional.push(arg);
        }
    }

    let settings = load_settings(config_path.as_deref())?;
    init_tracing(settings.flags.enable_debug_logs);

    match positional.first().map(String::as_str) {
        None | Some("demo") => run_demo(&settings).await,
        Some("export") => {
            let path = positional
                .get(1)
                .context("usage: expense-intake export <path.csv>")?;
            run_export(&settings, Path::new(path)).await
        }
        Some(other) => bail!("unknown command '{}'. Use: demo | export <path>", other),
    }
}

fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let settings = match path {
        Some(p) => Settings::from_json_file(p)
            .with_context(|| format!("Failed to load settings from {}", p.display()))?,
        None => Settings {
            seed_sample_data: true,
            ..Settings::default()
        },
    };
    Ok(settings.with_env_overrides()?)
}

async fn run_demo(settings: &Settings) -> Result<()> {
    println!("🧾 Expense Intake - Demo Submission");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!(
        "Mode: {}",
        if settings.flags.use_mock_data { "simulated" } else { "remote" }
    );

    let controller = SubmissionController::from_settings(settings);

    let form = ExpenseForm {
        employee_name: "Grace Hopper".to_string(),
        employee_email: "grace@example.com".to_string(),
        expense_date: NaiveDate::from_ymd_opt(2025, 3, 14),
        amount: "128.40".to_string(),
        category: "travel".to_string(),
        receipt: Some(ReceiptFile::new("taxi.png", 2 * 1024, "image/png")),
    };

    println!("\n📤 Submitting expense...");
    let outcome = controller.submit(&form).await;
    if !outcome.success {
        println!("❌ {}", outcome.message);
        if let Some(detail) = &outcome.error {
            println!("   {}", detail);
        }
        return Ok(());
    }
    println!("✅ {}", outcome.message);
    if let Some(id) = &outcome.expense_id {
        println!("   Expense ID: {}", id);
    }

    if controller
        .store()
        .update_status("EXP-001", ExpenseStatus::Approved)
        .await?
    {
        println!("\n🔄 EXP-001 approved");
    }

    let records = controller.store().list().await?;
    println!("\n📊 Expense table ({} rows)", records.len());
    print_table(&records);

    Ok(())
}

async fn run_export(settings: &Settings, path: &Path) -> Result<()> {
    let controller = SubmissionController::from_settings(settings);
    let records = controller.store().list().await?;

    export_csv(path, &records)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("✓ Exported {} expenses to {}", records.len(), path.display());

    Ok(())
}

fn print_table(records: &[ExpenseRecord]) {
    for r in records {
        println!(
            "  {:<28} {:<14} {:>10.2}  {:<10} {:<8}  {}",
            r.id, r.employee_name, r.amount, r.category, r.status.as_str(), r.expense_date
        );
    }
}
