//! Board consistency sweep.
//!
//! Order lists and task documents are written in separate steps, so a crash
//! mid-operation can strand an id in no list, leave a deleted task behind, or
//! (after manual data surgery) duplicate an entry. The sweep recomputes each
//! column's list from the task documents, which are the source of truth for
//! placement.

use std::collections::HashSet;

use serde::Serialize;
use stride_store::collections::{columns, tasks};
use stride_store::{DocumentStore, StrideResult};
use tracing::{debug, info, warn};

/// Tally of what a reconciliation pass found and fixed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    pub columns_checked: usize,
    pub columns_repaired: usize,
    /// List entries whose task no longer exists or lives elsewhere.
    pub dangling_removed: usize,
    pub duplicates_removed: usize,
    /// Live tasks that were missing from their column's list.
    pub missing_appended: usize,
    /// Tasks pointing at a column that does not exist. These cannot be
    /// placed; they are reported, not touched.
    pub orphan_tasks: usize,
}

impl ReconcileReport {
    pub fn is_clean(&self) -> bool {
        self.columns_repaired == 0 && self.orphan_tasks == 0
    }
}

/// Rebuilds every column order list in a sprint from the task documents.
/// Surviving entries keep their relative order; missing tasks are appended
/// in creation order. Columns that were already consistent are not written.
pub async fn reconcile_sprint(
    store: &dyn DocumentStore,
    sprint_id: &str,
) -> StrideResult<ReconcileReport> {
    let sprint_columns = columns::list_for_sprint(store, sprint_id).await?;
    let sprint_tasks = tasks::list_for_sprint(store, sprint_id).await?;

    let known: HashSet<&str> = sprint_columns.iter().map(|c| c.id.as_str()).collect();
    let mut report = ReconcileReport {
        columns_checked: sprint_columns.len(),
        ..ReconcileReport::default()
    };
    report.orphan_tasks = sprint_tasks
        .iter()
        .filter(|t| !known.contains(t.board_column_id.as_str()))
        .count();

    for column in &sprint_columns {
        // Sprint listing is in creation order, so appended strays land
        // deterministically.
        let resident: Vec<&str> = sprint_tasks
            .iter()
            .filter(|t| t.board_column_id == column.id)
            .map(|t| t.id.as_str())
            .collect();
        let resident_set: HashSet<&str> = resident.iter().copied().collect();

        let mut seen: HashSet<&str> = HashSet::new();
        let mut repaired: Vec<String> = Vec::with_capacity(resident.len());
        for id in &column.task_order_ids {
            if !resident_set.contains(id.as_str()) {
                report.dangling_removed += 1;
            } else if !seen.insert(id.as_str()) {
                report.duplicates_removed += 1;
            } else {
                repaired.push(id.clone());
            }
        }
        for id in &resident {
            if !seen.contains(id) {
                repaired.push((*id).to_string());
                report.missing_appended += 1;
            }
        }

        if repaired != column.task_order_ids {
            columns::set_task_order(store, &column.id, &repaired).await?;
            report.columns_repaired += 1;
            warn!(column_id = %column.id, sprint_id, "column order list repaired");
        }
    }

    if report.is_clean() {
        debug!(
            sprint_id,
            columns = report.columns_checked,
            "board already consistent"
        );
    } else {
        info!(
            sprint_id,
            repaired = report.columns_repaired,
            dangling = report.dangling_removed,
            duplicates = report.duplicates_removed,
            appended = report.missing_appended,
            orphans = report.orphan_tasks,
            "board reconciled"
        );
    }
    Ok(report)
}
