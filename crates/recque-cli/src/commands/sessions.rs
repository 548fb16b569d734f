//! The `recque sessions` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use comfy_table::{Cell, Table};
use uuid::Uuid;

use recque_core::traits::SessionStore;
use recque_providers::load_config_from;
use recque_store::JsonFileStore;

pub async fn execute(
    data_dir: Option<PathBuf>,
    config_path: Option<PathBuf>,
    delete: Option<Uuid>,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let store = JsonFileStore::new(data_dir.unwrap_or(config.data_dir));

    if let Some(session_id) = delete {
        store
            .delete(session_id)
            .await
            .with_context(|| format!("failed to delete session {session_id}"))?;
        println!("Deleted session {session_id}");
        return Ok(());
    }

    let summaries = store.list().await?;
    if summaries.is_empty() {
        println!("No sessions found. Start one with: recque learn \"<topic>\"");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec![
        "ID", "Topic", "Status", "Skills", "Answers", "Accuracy", "Updated",
    ]);
    for summary in &summaries {
        let accuracy = if summary.questions_answered == 0 {
            "-".to_string()
        } else {
            format!(
                "{:.0}%",
                summary.questions_correct as f64 / summary.questions_answered as f64 * 100.0
            )
        };
        table.add_row(vec![
            Cell::new(summary.id),
            Cell::new(&summary.topic),
            Cell::new(summary.status),
            Cell::new(format!(
                "{}/{}",
                summary.skills_complete, summary.skills_total
            )),
            Cell::new(summary.questions_answered),
            Cell::new(accuracy),
            Cell::new(summary.updated_at.format("%Y-%m-%d %H:%M")),
        ]);
    }
    println!("{table}");
    println!("\nResume with: recque learn --resume <id>");

    Ok(())
}
