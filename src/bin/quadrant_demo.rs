//! Offline demo: drives the reconciling store against the local JSON-backed
//! boundary and prints the resulting four quadrants.

use std::sync::Arc;

use anyhow::Result;

use quadrant_core::{
    AccessCredential, Energy, LocalTaskBoundary, Quadrant, QuadrantConfig, ReconcilingTaskStore,
    SessionController, SessionHandle, TaskStatus, TaskUpdates,
};

#[tokio::main]
async fn main() -> Result<()> {
    quadrant_core::logging::init_logging();

    let config = QuadrantConfig::from_env();
    let boundary = Arc::new(LocalTaskBoundary::open(
        &config.demo.data_dir,
        config.demo.latency_ms,
    )?);

    let session = SessionHandle::new(SessionController::new());
    session.log_in(AccessCredential::demo())?;

    let mut store = ReconcilingTaskStore::new(boundary, session);
    store.load_lists().await?;

    if store.tasks().is_empty() {
        seed(&mut store).await?;
    }

    for quadrant in Quadrant::ALL {
        println!("== {quadrant} ==");
        for task in store.tasks_in(quadrant) {
            let marker = if task.status() == TaskStatus::Completed {
                "x"
            } else {
                " "
            };
            let energy = task
                .energy
                .map(|e| format!(" ({e})"))
                .unwrap_or_default();
            println!("  [{marker}] {}{energy}", task.title());
            if !task.display_notes.is_empty() {
                println!("        {}", task.display_notes);
            }
        }
        println!();
    }

    if let Some(error) = store.last_error() {
        eprintln!("last error: {error}");
    }

    Ok(())
}

async fn seed(store: &mut ReconcilingTaskStore) -> Result<()> {
    let report = store
        .add_task(
            "File expense report",
            "due before end of month",
            Quadrant::DoFirst,
            None,
            None,
        )
        .await?;
    store
        .add_task("Plan team offsite", "", Quadrant::Schedule, None, None)
        .await?;
    let groceries = store
        .add_task("Buy groceries", "milk, eggs", Quadrant::Delegate, None, None)
        .await?;

    // A subtask of the expense report.
    let report_id = report.id().to_string();
    store
        .add_task(
            "Collect receipts",
            "",
            Quadrant::DoFirst,
            None,
            Some(&report_id),
        )
        .await?;

    // Tag the grocery run as a quick win and mark it done.
    let groceries_id = groceries.id().to_string();
    store
        .update_task(
            &groceries_id,
            TaskUpdates::default()
                .with_energy(Some(Energy::Quick))
                .with_status(TaskStatus::Completed),
        )
        .await?;

    Ok(())
}
