//! Shared world state for board reordering BDD scenarios.

use std::sync::Arc;

use kanban::board::{
    adapters::memory::InMemoryBoardRepository,
    domain::{BoardSnapshot, ColumnId, TaskId},
    services::{BoardService, ReorderOutcome, ReorderResult, ReorderService},
};
use kanban::config::KanbanConfig;
use mockable::DefaultClock;
use rstest::fixture;

/// Board service type used by the BDD world.
pub type TestBoardService = BoardService<InMemoryBoardRepository, DefaultClock>;
/// Reorder service type used by the BDD world.
pub type TestReorderService = ReorderService<InMemoryBoardRepository, DefaultClock>;

/// Services created once the scenario names its columns.
pub struct ScenarioServices {
    pub repository: Arc<InMemoryBoardRepository>,
    pub boards: TestBoardService,
    pub reorder: TestReorderService,
}

/// Scenario world for board reordering behaviour tests.
#[derive(Default)]
pub struct ReorderingWorld {
    pub services: Option<ScenarioServices>,
    pub board: Option<BoardSnapshot>,
    pub last_result: Option<ReorderResult<ReorderOutcome>>,
}

impl ReorderingWorld {
    /// Builds services whose new boards receive `columns`.
    pub fn start(&mut self, columns: Vec<String>) -> &ScenarioServices {
        let repository = Arc::new(InMemoryBoardRepository::new());
        let clock = Arc::new(DefaultClock);
        let config = KanbanConfig::new().with_default_columns(columns);
        self.services.insert(ScenarioServices {
            boards: BoardService::new(
                Arc::clone(&repository),
                Arc::clone(&clock),
                Arc::new(config),
            ),
            reorder: ReorderService::new(Arc::clone(&repository), clock),
            repository,
        })
    }

    /// Returns the scenario services.
    ///
    /// # Errors
    ///
    /// Returns an error if no board has been set up yet.
    pub fn services(&self) -> Result<&ScenarioServices, eyre::Report> {
        self.services
            .as_ref()
            .ok_or_else(|| eyre::eyre!("missing board setup in scenario world"))
    }

    /// Returns the latest loaded snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if no board has been loaded yet.
    pub fn board(&self) -> Result<&BoardSnapshot, eyre::Report> {
        self.board
            .as_ref()
            .ok_or_else(|| eyre::eyre!("missing board in scenario world"))
    }

    /// Reloads the board from storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the board cannot be loaded.
    pub fn refresh(&mut self) -> Result<&BoardSnapshot, eyre::Report> {
        let board_id = self.board()?.board.id();
        let loaded = run_async(self.services()?.boards.load_board(board_id))?;
        let board: &BoardSnapshot = self.board.insert(loaded);
        Ok(board)
    }

    /// Finds a column by title in the latest snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if no column has this title.
    pub fn column_id(&self, title: &str) -> Result<ColumnId, eyre::Report> {
        self.board()?
            .columns
            .iter()
            .find(|column| column.column.title() == title)
            .map(|column| column.column.id())
            .ok_or_else(|| eyre::eyre!("no column titled {title}"))
    }

    /// Finds a task by title, returning it with its column.
    ///
    /// # Errors
    ///
    /// Returns an error if no task has this title.
    pub fn task(&self, title: &str) -> Result<(ColumnId, TaskId), eyre::Report> {
        self.board()?
            .columns
            .iter()
            .flat_map(|column| column.tasks.iter())
            .find(|task| task.title() == title)
            .map(|task| (task.column_id(), task.id()))
            .ok_or_else(|| eyre::eyre!("no task titled {title}"))
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> ReorderingWorld {
    ReorderingWorld::default()
}

/// Splits a comma-separated step argument into trimmed titles.
pub fn titles(list: &str) -> Vec<String> {
    list.split(',')
        .map(|title| title.trim().to_owned())
        .filter(|title| !title.is_empty())
        .collect()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
