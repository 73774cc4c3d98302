//! End-to-end tests of the optimistic controller against in-process services.

use super::helpers::{Backend, backend, column_at, ensure_dense, task_at, task_titles};
use kanban::client::{
    domain::{
        BoardView, DragResult, DraggedItem, DropLocation, DropOutcome, GesturePhase, ScopeKey,
        Settlement,
    },
    ports::BoardApi,
    services::{BoardController, FAILURE_NOTICE, dispatch, share},
};
use rstest::rstest;
use std::sync::Arc;

fn task_drag(
    task: kanban::board::domain::TaskId,
    source: DropLocation,
    destination: DropLocation,
) -> DragResult {
    DragResult {
        moved_item: DraggedItem::Task(task),
        source,
        destination: Some(destination),
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn confirmed_move_leaves_view_matching_server(backend: Backend) -> Result<(), eyre::Report> {
    let board = backend.seed(&[&["A", "B", "C"], &["D"]]).await?;
    let board_id = board.board.id();
    let todo = column_at(&board, 0)?;
    let doing = column_at(&board, 1)?;
    let task = task_at(&board, 0, 0)?;

    let mut controller = BoardController::open(backend.api(), board_id).await?;
    controller.begin_drag(DraggedItem::Task(task))?;
    let outcome = controller.apply_drag_result(task_drag(
        task,
        DropLocation::new(ScopeKey::Column(todo), 0),
        DropLocation::new(ScopeKey::Column(doing), 1),
    ))?;
    let DropOutcome::Applied(id) = outcome else {
        return Err(eyre::eyre!("expected an applied drop, got {outcome:?}"));
    };

    let settlement = controller.settle(id).await?;
    assert_eq!(settlement, Settlement::Confirmed);
    assert_eq!(controller.phase(), GesturePhase::Idle);
    assert_eq!(controller.notice(), None);

    let server = backend.boards.load_board(board_id).await?;
    ensure_dense(&server)?;
    assert_eq!(task_titles(&server, 0), ["B", "C"]);
    assert_eq!(task_titles(&server, 1), ["D", "A"]);
    assert_eq!(controller.view(), &BoardView::from_snapshot(&server));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn column_reorder_round_trips_through_wire(backend: Backend) -> Result<(), eyre::Report> {
    let board = backend.seed(&[]).await?;
    let board_id = board.board.id();
    let done = column_at(&board, 2)?;

    let mut controller = BoardController::open(backend.api(), board_id).await?;
    controller.begin_drag(DraggedItem::Column(done))?;
    let outcome = controller.apply_drag_result(DragResult {
        moved_item: DraggedItem::Column(done),
        source: DropLocation::new(ScopeKey::Board(board_id), 2),
        destination: Some(DropLocation::new(ScopeKey::Board(board_id), 0)),
    })?;
    let DropOutcome::Applied(id) = outcome else {
        return Err(eyre::eyre!("expected an applied drop, got {outcome:?}"));
    };
    assert_eq!(controller.settle(id).await?, Settlement::Confirmed);

    let server = backend.boards.load_board(board_id).await?;
    ensure_dense(&server)?;
    assert_eq!(server.columns.first().map(|c| c.column.id()), Some(done));
    assert_eq!(controller.view(), &BoardView::from_snapshot(&server));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stale_drop_is_rolled_back_by_reload(backend: Backend) -> Result<(), eyre::Report> {
    let board = backend.seed(&[&["A", "B", "C"]]).await?;
    let board_id = board.board.id();
    let todo = column_at(&board, 0)?;
    let removed = task_at(&board, 0, 1)?;

    let mut controller = BoardController::open(backend.api(), board_id).await?;
    backend.boards.delete_task(removed).await?;

    controller.begin_drag(DraggedItem::Task(removed))?;
    let outcome = controller.apply_drag_result(task_drag(
        removed,
        DropLocation::new(ScopeKey::Column(todo), 1),
        DropLocation::new(ScopeKey::Column(todo), 0),
    ))?;
    let DropOutcome::Applied(id) = outcome else {
        return Err(eyre::eyre!("expected an applied drop, got {outcome:?}"));
    };
    assert_eq!(
        controller
            .view()
            .column(todo)
            .map(|column| column.tasks.len()),
        Some(3)
    );

    assert_eq!(controller.settle(id).await?, Settlement::ReloadRequired);
    assert_eq!(controller.notice(), Some(FAILURE_NOTICE));
    assert_eq!(controller.phase(), GesturePhase::Idle);

    let server = backend.boards.load_board(board_id).await?;
    assert_eq!(task_titles(&server, 0), ["A", "C"]);
    assert_eq!(controller.view(), &BoardView::from_snapshot(&server));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn storage_fault_restores_pre_drag_order(backend: Backend) -> Result<(), eyre::Report> {
    let board = backend.seed(&[&["A", "B", "C"], &["D"]]).await?;
    let board_id = board.board.id();
    let todo = column_at(&board, 0)?;
    let doing = column_at(&board, 1)?;
    let task = task_at(&board, 0, 2)?;
    let before = BoardView::from_snapshot(&board);

    let mut controller = BoardController::open(backend.api(), board_id).await?;
    controller.begin_drag(DraggedItem::Task(task))?;
    let outcome = controller.apply_drag_result(task_drag(
        task,
        DropLocation::new(ScopeKey::Column(todo), 2),
        DropLocation::new(ScopeKey::Column(doing), 0),
    ))?;
    let DropOutcome::Applied(id) = outcome else {
        return Err(eyre::eyre!("expected an applied drop, got {outcome:?}"));
    };
    assert_ne!(controller.view(), &before);

    backend.repository.inject_fault_after(1);
    assert_eq!(controller.settle(id).await?, Settlement::ReloadRequired);

    let server = backend.boards.load_board(board_id).await?;
    ensure_dense(&server)?;
    assert_eq!(task_titles(&server, 0), ["A", "B", "C"]);
    assert_eq!(task_titles(&server, 1), ["D"]);
    assert_eq!(controller.view(), &before);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn dispatched_operation_settles_in_background(backend: Backend) -> Result<(), eyre::Report> {
    let board = backend.seed(&[&["A", "B"]]).await?;
    let board_id = board.board.id();
    let todo = column_at(&board, 0)?;
    let task = task_at(&board, 0, 0)?;

    let controller = share(BoardController::open(backend.api(), board_id).await?);
    let id = {
        let mut guard = controller
            .lock()
            .map_err(|_| eyre::eyre!("controller lock poisoned"))?;
        guard.begin_drag(DraggedItem::Task(task))?;
        match guard.apply_drag_result(task_drag(
            task,
            DropLocation::new(ScopeKey::Column(todo), 0),
            DropLocation::new(ScopeKey::Column(todo), 1),
        ))? {
            DropOutcome::Applied(id) => id,
            DropOutcome::Ignored => return Err(eyre::eyre!("drop was ignored")),
        }
    };

    let settlement = dispatch(&controller, id)?.await??;
    assert_eq!(settlement, Settlement::Confirmed);

    let server = backend.boards.load_board(board_id).await?;
    assert_eq!(task_titles(&server, 0), ["B", "A"]);
    let guard = controller
        .lock()
        .map_err(|_| eyre::eyre!("controller lock poisoned"))?;
    assert_eq!(guard.view(), &BoardView::from_snapshot(&server));
    assert_eq!(guard.phase(), GesturePhase::Idle);
    Ok(())
}

#[rstest]
#[case::committed_after_reload(false)]
#[case::committed_before_reload(true)]
#[tokio::test(flavor = "multi_thread")]
async fn reload_keeps_other_in_flight_drop(
    backend: Backend,
    #[case] commit_before_reload: bool,
) -> Result<(), eyre::Report> {
    let board = backend.seed(&[&["A", "B"], &["C", "D"]]).await?;
    let board_id = board.board.id();
    let todo = ScopeKey::Column(column_at(&board, 0)?);
    let doing = ScopeKey::Column(column_at(&board, 1)?);
    let (first_task, second_task) = (task_at(&board, 0, 0)?, task_at(&board, 1, 0)?);
    let api = backend.api();
    let mut controller = BoardController::open(Arc::clone(&api), board_id).await?;

    controller.begin_drag(DraggedItem::Task(first_task))?;
    let DropOutcome::Applied(failing) = controller.apply_drag_result(task_drag(
        first_task,
        DropLocation::new(todo, 0),
        DropLocation::new(todo, 1),
    ))?
    else {
        return Err(eyre::eyre!("first drop was ignored"));
    };
    controller.begin_drag(DraggedItem::Task(second_task))?;
    let DropOutcome::Applied(succeeding) = controller.apply_drag_result(task_drag(
        second_task,
        DropLocation::new(doing, 0),
        DropLocation::new(doing, 1),
    ))?
    else {
        return Err(eyre::eyre!("second drop was ignored"));
    };

    backend.repository.inject_fault_after(0);
    let failed = api.reorder(controller.pending_request(failing)?).await;
    assert_eq!(
        controller.complete(failing, failed)?,
        Settlement::ReloadRequired
    );
    let second_request = controller.pending_request(succeeding)?;
    let early = if commit_before_reload {
        Some(api.reorder(second_request).await)
    } else {
        None
    };
    controller.finish_reload(api.fetch_board(board_id).await)?;
    let answer = match early {
        Some(answer) => answer,
        None => api.reorder(second_request).await,
    };
    assert_eq!(
        controller.complete(succeeding, answer)?,
        Settlement::Confirmed
    );

    let server = backend.boards.load_board(board_id).await?;
    ensure_dense(&server)?;
    assert_eq!(task_titles(&server, 0), ["A", "B"]);
    assert_eq!(task_titles(&server, 1), ["D", "C"]);
    assert_eq!(controller.view(), &BoardView::from_snapshot(&server));
    assert_eq!(controller.phase(), GesturePhase::Idle);
    Ok(())
}
