//! Then steps for board reordering BDD scenarios.

use super::world::{ReorderingWorld, titles};
use kanban::board::{domain::Position, services::ReorderErrorKind};
use rstest_bdd_macros::then;

fn expect_failure(world: &ReorderingWorld, expected: ReorderErrorKind) -> Result<(), eyre::Report> {
    let result = world
        .last_result
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing reorder result"))?;
    match result {
        Err(err) if err.kind() == expected => Ok(()),
        other => Err(eyre::eyre!("expected {expected:?} failure, got {other:?}")),
    }
}

#[then(r#"the columns read "{columns}""#)]
fn columns_read(world: &ReorderingWorld, columns: String) -> Result<(), eyre::Report> {
    let actual: Vec<String> = world
        .board()?
        .columns
        .iter()
        .map(|column| column.column.title().to_owned())
        .collect();
    eyre::ensure!(
        actual == titles(&columns),
        "expected columns {columns}, found {actual:?}"
    );
    Ok(())
}

#[then(r#"column "{column}" reads "{tasks}""#)]
fn column_reads(
    world: &ReorderingWorld,
    column: String,
    tasks: String,
) -> Result<(), eyre::Report> {
    let column_id = world.column_id(&column)?;
    let snapshot = world
        .board()?
        .column(column_id)
        .ok_or_else(|| eyre::eyre!("column {column} missing from snapshot"))?;
    let actual: Vec<String> = snapshot
        .tasks
        .iter()
        .map(|task| task.title().to_owned())
        .collect();
    eyre::ensure!(
        actual == titles(&tasks),
        "expected {column} to read {tasks}, found {actual:?}"
    );
    Ok(())
}

#[then("every list on the board is dense")]
fn every_list_is_dense(world: &ReorderingWorld) -> Result<(), eyre::Report> {
    let board = world.board()?;
    for (index, column) in board.columns.iter().enumerate() {
        eyre::ensure!(
            Position::from_index(index) == Some(column.column.position()),
            "column {} is at {}, expected {index}",
            column.column.title(),
            column.column.position()
        );
        for (task_index, task) in column.tasks.iter().enumerate() {
            eyre::ensure!(
                Position::from_index(task_index) == Some(task.position()),
                "task {} is at {}, expected {task_index}",
                task.title(),
                task.position()
            );
        }
    }
    Ok(())
}

#[then("the reorder fails with an invalid index error")]
fn fails_with_invalid_index(world: &ReorderingWorld) -> Result<(), eyre::Report> {
    expect_failure(world, ReorderErrorKind::InvalidIndex)
}

#[then("the reorder fails with a transaction failure")]
fn fails_with_transaction_failure(world: &ReorderingWorld) -> Result<(), eyre::Report> {
    expect_failure(world, ReorderErrorKind::TransactionFailure)
}
