//! Epoch progress line

use super::log::MetricMap;
use std::collections::{BTreeMap, BTreeSet};

/// Field name → displayed value
pub type ProgressItems = BTreeMap<String, String>;

/// Build the progress items for one epoch
///
/// Takes the current value of every metric that was logged with `prog_bar`,
/// plus the logger's run version as `v_num`.
pub fn progress_items(
    callback_metrics: &MetricMap,
    prog_bar: &BTreeSet<String>,
    version: &str,
) -> ProgressItems {
    let mut items: ProgressItems = prog_bar
        .iter()
        .filter_map(|name| {
            callback_metrics
                .get(name)
                .map(|v| (name.clone(), format!("{v:.4}")))
        })
        .collect();
    items.insert("v_num".to_string(), version.to_string());
    items
}

/// `Epoch 2/10: loss_epoch=0.3120, v_num=0 (1.3s)`
pub fn format_progress(
    epoch: usize,
    max_epochs: usize,
    items: &ProgressItems,
    elapsed_secs: f64,
) -> String {
    let fields = items
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(", ");

    if fields.is_empty() {
        format!("Epoch {}/{} ({elapsed_secs:.1}s)", epoch + 1, max_epochs)
    } else {
        format!("Epoch {}/{}: {fields} ({elapsed_secs:.1}s)", epoch + 1, max_epochs)
    }
}
