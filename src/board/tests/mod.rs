//! Unit tests for the board module.


use crate::board::domain::BoardSnapshot;

fn column_titles(board: &BoardSnapshot) -> Vec<&str> {
    board
        .columns
        .iter()
        .map(|column| column.column.title())
        .collect()
}

fn task_titles(board: &BoardSnapshot, column: usize) -> Vec<&str> {
    board
        .columns
        .get(column)
        .map(|snapshot| snapshot.tasks.iter().map(|task| task.title()).collect())
        .unwrap_or_default()
}
