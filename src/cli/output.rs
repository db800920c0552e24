//! Output formatting for CLI

use clap::ValueEnum;
use data_alchemy_sdk::{DatasetSnapshot, TaskState, TaskStatus, ViewState};
use serde_json::json;

use crate::error::CliError;

/// How results are printed on stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Widest a rendered cell may get before it is cut
const MAX_CELL_WIDTH: usize = 32;

/// Format the column types of a snapshot, marking overrides `view` holds
pub fn format_columns(snapshot: &DatasetSnapshot, view: &ViewState) -> String {
    let headers = ["#", "Column", "Inferred", "Type"];
    let rows: Vec<Vec<String>> = snapshot
        .columns
        .iter()
        .map(|column| {
            let effective = column.effective_type();
            let mut current = effective.label().to_string();
            if column.is_overridden() {
                current.push_str(" (override)");
            }
            let shown = view.displayed_type(column);
            if shown != effective {
                current = format!("{} -> {} (pending)", current, shown.label());
            }
            vec![
                (column.column_index + 1).to_string(),
                column.name.clone(),
                column.inferred_type.label().to_string(),
                current,
            ]
        })
        .collect();

    let mut output = format!("Dataset {}\n\n", snapshot.dataset_id);
    output.push_str(&render_table(&headers, &rows));
    output
}

/// Format the rows of the current page with a pagination footer
pub fn format_rows(snapshot: &DatasetSnapshot) -> String {
    let headers: Vec<&str> = snapshot.columns.iter().map(|c| c.name.as_str()).collect();
    let rows: Vec<Vec<String>> = snapshot
        .rows
        .iter()
        .map(|row| {
            snapshot
                .columns
                .iter()
                .map(|c| row.get(&c.name).map(|v| v.display()).unwrap_or_default())
                .collect()
        })
        .collect();

    let mut output = if rows.is_empty() {
        "No rows\n".to_string()
    } else {
        render_table(&headers, &rows)
    };
    let page = &snapshot.pagination;
    output.push_str(&format!(
        "\nPage {} of {} ({} rows, {} per page)\n",
        page.current_page,
        page.last_page(),
        page.total_items,
        page.page_size
    ));
    output
}

/// Format a snapshot in the requested format
pub fn format_snapshot(
    snapshot: &DatasetSnapshot,
    view: &ViewState,
    format: OutputFormat,
) -> Result<String, CliError> {
    match format {
        OutputFormat::Table => Ok(format!(
            "{}\n{}",
            format_columns(snapshot, view),
            format_rows(snapshot)
        )),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(snapshot)?),
    }
}

/// Format a single task status reading
pub fn format_status(
    task_id: &str,
    status: &TaskStatus,
    format: OutputFormat,
) -> Result<String, CliError> {
    match format {
        OutputFormat::Table => {
            let state = match status.state {
                TaskState::InProgress => "in progress",
                TaskState::Succeeded => "succeeded",
                TaskState::Failed => "failed",
            };
            let mut output = format!("Task {}: {} ({}%)", task_id, state, status.progress);
            if let Some(message) = &status.message {
                output.push_str(&format!("\n  {}", message));
            }
            Ok(output)
        }
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&json!({
            "taskId": task_id,
            "status": status.state,
            "progress": status.progress,
            "message": status.message,
        }))?),
    }
}

fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.iter().map(|cell| truncate(cell)).collect())
        .collect();
    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, header)| {
            cells
                .iter()
                .filter_map(|row| row.get(i))
                .map(|cell| cell.chars().count())
                .chain(std::iter::once(header.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let line = |values: &[&str]| -> String {
        let padded: Vec<String> = values
            .iter()
            .zip(&widths)
            .map(|(value, width)| format!("{:<width$}", value, width = width))
            .collect();
        format!("{}\n", padded.join("  ").trim_end())
    };

    let rules: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let rule: Vec<&str> = rules.iter().map(String::as_str).collect();

    let mut output = line(headers);
    output.push_str(&line(&rule));
    for row in &cells {
        let row: Vec<&str> = row.iter().map(String::as_str).collect();
        output.push_str(&line(&row));
    }
    output
}

fn truncate(value: &str) -> String {
    if value.chars().count() <= MAX_CELL_WIDTH {
        return value.to_string();
    }
    let cut: String = value.chars().take(MAX_CELL_WIDTH - 3).collect();
    format!("{}...", cut)
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_alchemy_sdk::{CellValue, ColumnMeta, DataType, PageInfo, PendingOverride, Row};

    fn snapshot() -> DatasetSnapshot {
        DatasetSnapshot {
            dataset_id: "d1".to_string(),
            columns: vec![
                ColumnMeta::new("1", "id", 0, DataType::Integer),
                ColumnMeta::new("3", "age", 1, DataType::Integer).with_user_type(DataType::Text),
            ],
            rows: vec![Row::from([
                ("id".to_string(), CellValue::Number(1.into())),
                ("age".to_string(), CellValue::Null),
            ])],
            pagination: PageInfo {
                current_page: 1,
                total_pages: 2,
                page_size: 1,
                total_items: 2,
            },
        }
    }

    #[test]
    fn test_format_columns() {
        let output = format_columns(&snapshot(), &ViewState::default());
        assert!(output.starts_with("Dataset d1\n"));
        assert!(output.contains("id      Integer   Integer"));
        assert!(output.contains("Text (override)"));
    }

    #[test]
    fn test_format_columns_with_pending() {
        let snapshot = snapshot();
        let pending = PendingOverride {
            column: snapshot.columns[0].clone(),
            new_type: DataType::Decimal,
        };
        let view = ViewState {
            pending_override: Some(pending),
            ..ViewState::default()
        };
        let output = format_columns(&snapshot, &view);
        assert!(output.contains("Integer -> Float (pending)"));
    }

    #[test]
    fn test_format_rows() {
        let output = format_rows(&snapshot());
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "id  age");
        assert_eq!(lines[1], "--  ---");
        assert_eq!(lines[2], "1");
        assert!(output.contains("Page 1 of 2 (2 rows, 1 per page)"));
    }

    #[test]
    fn test_format_status_json() {
        let status = TaskStatus::in_progress(40).with_message("Inferring types");
        let output = format_status("t1", &status, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["status"], "in-progress");
        assert_eq!(value["progress"], 40);
    }

    #[test]
    fn test_format_status_table() {
        let status = TaskStatus::failed("Could not parse file");
        let output = format_status("t1", &status, OutputFormat::Table).unwrap();
        assert_eq!(output, "Task t1: failed (0%)\n  Could not parse file");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short"), "short");
        let long = "x".repeat(40);
        assert_eq!(truncate(&long).chars().count(), MAX_CELL_WIDTH);
    }
}
