//! Row selection

use crate::error::{RunnerError, RunnerResult};
use crate::types::{InputRow, RowMode, SelectedRow};

/// Spreadsheet row number of the first data row (row 1 is the header)
pub const FIRST_DATA_ROW: usize = 2;

/// Pick the rows to run, paired with their visual row index
///
/// Fails with `EmptyInput` when there are no data rows at all.
pub fn select_rows(rows: &[InputRow], mode: RowMode) -> RunnerResult<Vec<SelectedRow<'_>>> {
    if rows.is_empty() {
        return Err(RunnerError::EmptyInput);
    }

    let selected = match mode {
        RowMode::First => vec![SelectedRow {
            visual_index: FIRST_DATA_ROW,
            row: &rows[0],
        }],
        RowMode::All => rows
            .iter()
            .enumerate()
            .map(|(i, row)| SelectedRow {
                visual_index: i + FIRST_DATA_ROW,
                row,
            })
            .collect(),
    };

    Ok(selected)
}
