//! Ordering operations against `PostgreSQL`.

use std::sync::Arc;

use super::helpers::{BoxError, PgBackend, ensure_dense, pg_backend, task_titles};
use kanban::board::{
    domain::{BoardSnapshot, ColumnId, OrderUpdate, Position, Task, TaskId},
    ports::{BoardRepository, BoardRepositoryError},
    services::{CreateTaskRequest, ReorderErrorKind, ReorderOutcome},
};
use rstest::rstest;

fn ids_in(board: &BoardSnapshot, column: usize) -> Vec<TaskId> {
    board
        .columns
        .get(column)
        .map(|snapshot| snapshot.tasks.iter().map(Task::id).collect())
        .unwrap_or_default()
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn column_reorder_passes_deferred_uniqueness(
    pg_backend: Result<Option<PgBackend>, BoxError>,
) -> Result<(), BoxError> {
    let Some(backend) = pg_backend? else {
        return Ok(());
    };
    let board = backend.seed(&[]).await?;
    let board_id = board.board.id();
    let done = board.columns.get(2).map(|c| c.column.id()).ok_or("missing column")?;

    let outcome = backend.reorder.reorder_columns(board_id, done, 0).await?;
    assert_eq!(outcome, ReorderOutcome::Applied { updated: 3 });

    let after = backend.boards.load_board(board_id).await?;
    ensure_dense(&after)?;
    let titles: Vec<&str> = after.columns.iter().map(|c| c.column.title()).collect();
    assert_eq!(titles, ["Done", "To Do", "In Progress"]);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn cross_column_move_conserves_tasks(
    pg_backend: Result<Option<PgBackend>, BoxError>,
) -> Result<(), BoxError> {
    let Some(backend) = pg_backend? else {
        return Ok(());
    };
    let board = backend.seed(&[&["X0", "T", "X2"], &["Y0", "Y1"]]).await?;
    let source = board.columns.first().map(|c| c.column.id()).ok_or("missing column")?;
    let destination = board.columns.get(1).map(|c| c.column.id()).ok_or("missing column")?;
    let task = ids_in(&board, 0).get(1).copied().ok_or("missing task")?;

    backend.reorder.move_task(task, source, destination, 1).await?;

    let after = backend.boards.load_board(board.board.id()).await?;
    ensure_dense(&after)?;
    assert_eq!(task_titles(&after, 0), ["X0", "X2"]);
    assert_eq!(task_titles(&after, 1), ["Y0", "T", "Y1"]);
    assert_eq!(after.task_count(), board.task_count());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn out_of_range_index_writes_nothing(
    pg_backend: Result<Option<PgBackend>, BoxError>,
) -> Result<(), BoxError> {
    let Some(backend) = pg_backend? else {
        return Ok(());
    };
    let board = backend.seed(&[&["T1", "T2", "T3"]]).await?;
    let column = board.columns.first().map(|c| c.column.id()).ok_or("missing column")?;
    let task = ids_in(&board, 0).first().copied().ok_or("missing task")?;

    let err = backend
        .reorder
        .reorder_tasks(column, task, 3)
        .await
        .err()
        .ok_or("reorder to the task count should fail")?;
    assert_eq!(err.kind(), ReorderErrorKind::InvalidIndex);

    let after = backend.boards.load_board(board.board.id()).await?;
    assert_eq!(after, board);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failed_work_rolls_back_partial_renumbering(
    pg_backend: Result<Option<PgBackend>, BoxError>,
) -> Result<(), BoxError> {
    let Some(backend) = pg_backend? else {
        return Ok(());
    };
    let board = backend.seed(&[&["T1", "T2", "T3"]]).await?;
    let column = board.columns.first().map(|c| c.column.id()).ok_or("missing column")?;
    let ids = ids_in(&board, 0);
    let (first, last) = (
        ids.first().copied().ok_or("missing task")?,
        ids.last().copied().ok_or("missing task")?,
    );

    let result = backend
        .repository
        .transaction(move |tx| -> Result<(), BoardRepositoryError> {
            let updates = [
                OrderUpdate::new(last, Position::FIRST),
                OrderUpdate::new(first, Position::new(1)),
            ];
            tx.update_task_orders(column, &updates)?;
            Err(BoardRepositoryError::TaskNotFound(last))
        })
        .await;
    assert!(matches!(result, Err(BoardRepositoryError::TaskNotFound(_))));

    let after = backend.boards.load_board(board.board.id()).await?;
    assert_eq!(task_titles(&after, 0), ["T1", "T2", "T3"]);
    ensure_dense(&after)?;
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deleting_a_column_closes_the_gap(
    pg_backend: Result<Option<PgBackend>, BoxError>,
) -> Result<(), BoxError> {
    let Some(backend) = pg_backend? else {
        return Ok(());
    };
    let board = backend.seed(&[&["A"], &["B"], &["C"]]).await?;
    let middle = board.columns.get(1).map(|c| c.column.id()).ok_or("missing column")?;

    backend.boards.delete_column(middle).await?;

    let after = backend.boards.load_board(board.board.id()).await?;
    ensure_dense(&after)?;
    assert_eq!(after.columns.len(), 2);
    assert_eq!(after.task_count(), 2);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_reorders_serialize_on_row_locks(
    pg_backend: Result<Option<PgBackend>, BoxError>,
) -> Result<(), BoxError> {
    let Some(backend) = pg_backend? else {
        return Ok(());
    };
    let board = backend.seed(&[&["A", "B", "C", "D"]]).await?;
    let column = board.columns.first().map(|c| c.column.id()).ok_or("missing column")?;
    let targets = [3, 0, 2, 1];

    let mut handles = Vec::new();
    for (task, target) in ids_in(&board, 0).into_iter().zip(targets) {
        let reorder = Arc::clone(&backend.reorder);
        handles.push(tokio::spawn(async move {
            reorder.reorder_tasks(column, task, target).await
        }));
    }
    for handle in handles {
        handle.await??;
    }

    let after = backend.boards.load_board(board.board.id()).await?;
    ensure_dense(&after)?;
    assert_eq!(after.task_count(), 4);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn listed_board_reports_counts(
    pg_backend: Result<Option<PgBackend>, BoxError>,
) -> Result<(), BoxError> {
    let Some(backend) = pg_backend? else {
        return Ok(());
    };
    let board = backend.seed(&[&["A", "B"], &["C"]]).await?;

    let summaries = backend.boards.list_boards().await?;
    let summary = summaries
        .iter()
        .find(|summary| summary.board.id() == board.board.id())
        .ok_or("seeded board missing from listing")?;
    assert_eq!(summary.column_count, 3);
    assert_eq!(summary.task_count, 3);

    backend.boards.delete_board(board.board.id()).await?;
    let err = backend
        .boards
        .load_board(board.board.id())
        .await
        .err()
        .ok_or("deleted board should not load")?;
    assert!(err.is_not_found());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn column_and_task_operations_on_one_board_run_concurrently(
    pg_backend: Result<Option<PgBackend>, BoxError>,
) -> Result<(), BoxError> {
    const ROUNDS: usize = 40;
    let Some(backend) = pg_backend? else {
        return Ok(());
    };
    let board = backend.seed(&[&["A", "B", "C", "D"], &["E"]]).await?;
    let board_id = board.board.id();
    let columns: Vec<ColumnId> = board.columns.iter().map(|c| c.column.id()).collect();
    let (todo, doing) = match columns.as_slice() {
        [first, second, ..] => (*first, *second),
        _ => return Err("seeded board needs two columns".into()),
    };
    let column_moves = columns.iter().copied().zip([2, 0, 1]).cycle();
    let task_moves = ids_in(&board, 0).into_iter().zip([3, 0, 2, 1]).cycle();

    for (round, ((column, column_target), (task, task_target))) in
        column_moves.zip(task_moves).take(ROUNDS).enumerate()
    {
        let columns_service = Arc::clone(&backend.reorder);
        let tasks_service = Arc::clone(&backend.reorder);
        let boards = Arc::clone(&backend.boards);
        let column_reorder = tokio::spawn(async move {
            columns_service
                .reorder_columns(board_id, column, column_target)
                .await
        });
        let task_reorder = tokio::spawn(async move {
            tasks_service
                .reorder_tasks(todo, task, task_target)
                .await
        });
        let task_add = tokio::spawn(async move {
            boards
                .add_task(CreateTaskRequest::new(doing, format!("round {round}")))
                .await
        });
        column_reorder.await??;
        task_reorder.await??;
        task_add.await??;
    }

    let after = backend.boards.load_board(board_id).await?;
    ensure_dense(&after)?;
    assert_eq!(after.task_count(), 5 + ROUNDS);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn delete_then_add_keeps_every_scope_dense(
    pg_backend: Result<Option<PgBackend>, BoxError>,
) -> Result<(), BoxError> {
    let Some(backend) = pg_backend? else {
        return Ok(());
    };
    let board = backend.seed(&[&["A", "B", "C"], &["D"], &["E"]]).await?;
    let board_id = board.board.id();
    let first = board.columns.first().map(|c| c.column.id()).ok_or("missing column")?;
    let middle = board.columns.get(1).map(|c| c.column.id()).ok_or("missing column")?;
    let doomed_task = ids_in(&board, 0).into_iter().next().ok_or("missing task")?;

    backend.boards.delete_column(middle).await?;
    let added_column = backend.boards.add_column(board_id, "Review").await?;
    backend.boards.delete_task(doomed_task).await?;
    let added_task = backend
        .boards
        .add_task(CreateTaskRequest::new(first, "F"))
        .await?;

    assert_eq!(added_column.position(), Position::new(2));
    assert_eq!(added_task.position(), Position::new(2));
    let after = backend.boards.load_board(board_id).await?;
    ensure_dense(&after)?;
    let titles: Vec<&str> = after.columns.iter().map(|c| c.column.title()).collect();
    assert_eq!(titles, ["To Do", "Done", "Review"]);
    assert_eq!(task_titles(&after, 0), ["B", "C", "F"]);
    Ok(())
}
