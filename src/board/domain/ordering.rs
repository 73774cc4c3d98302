//! Dense sibling ordering shared by column and task scopes.
//!
//! Every planner works on a snapshot of `(id, position)` pairs for one
//! scope and returns the writes needed to reach the requested arrangement.
//! Planning splices the item in list order and then emits an update only for
//! siblings whose position actually changes. For a dense scope this touches
//! exactly the half-open range between the old and new index plus the moved
//! item, so the write set grows with drag distance rather than scope size. A
//! scope that arrives with gaps or duplicates is renumbered as a side effect.

use super::{OrderingError, Position};
use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;

/// Current position of one sibling within its scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Sibling<I> {
    /// Sibling identifier.
    pub id: I,
    /// Persisted position.
    pub position: Position,
}

impl<I> Sibling<I> {
    /// Creates a sibling snapshot entry.
    #[must_use]
    pub const fn new(id: I, position: Position) -> Self {
        Self { id, position }
    }
}

/// New position to persist for one sibling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OrderUpdate<I> {
    /// Sibling identifier.
    pub id: I,
    /// Position to write.
    pub position: Position,
}

impl<I> OrderUpdate<I> {
    /// Creates an order update.
    #[must_use]
    pub const fn new(id: I, position: Position) -> Self {
        Self { id, position }
    }
}

/// Writes required to move an item from one scope into another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovePlan<I> {
    /// Renumbering that closes the gap left in the source scope.
    pub source_updates: Vec<OrderUpdate<I>>,
    /// Renumbering that opens the slot in the destination scope.
    pub destination_updates: Vec<OrderUpdate<I>>,
    /// Position the moved item takes in the destination scope.
    pub position: Position,
}

impl<I> MovePlan<I> {
    /// Returns the number of rows the plan writes, the moved item included.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.source_updates
            .len()
            .saturating_add(self.destination_updates.len())
            .saturating_add(1)
    }
}

/// Plans a reorder of `item` to `target_index` within a single scope.
///
/// The returned updates include the moved item itself. An empty result means
/// the item already sits at `target_index` in a dense scope.
///
/// # Errors
///
/// Returns [`OrderingError::ItemNotFound`] when `item` is not among
/// `siblings` and [`OrderingError::InvalidIndex`] when `target_index` is not
/// below the sibling count.
pub fn plan_reorder<I>(
    siblings: &[Sibling<I>],
    item: I,
    target_index: usize,
) -> Result<Vec<OrderUpdate<I>>, OrderingError>
where
    I: Copy + Ord + Hash + Display,
{
    let mut arrangement = arrangement(siblings);
    let source_index = index_of(&arrangement, item)?;
    let max = arrangement.len().saturating_sub(1);
    if target_index > max {
        return Err(OrderingError::InvalidIndex {
            index: target_index,
            max,
        });
    }

    let moved = arrangement.remove(source_index);
    arrangement.insert(target_index, moved);
    diff(&arrangement, siblings)
}

/// Plans moving `item` out of `source` and into `destination` at
/// `destination_index`.
///
/// `destination_index` may equal the destination count, which appends.
///
/// # Errors
///
/// Returns [`OrderingError::ItemNotFound`] when `item` is not among the
/// source siblings and [`OrderingError::InvalidIndex`] when
/// `destination_index` exceeds the destination count.
pub fn plan_move<I>(
    source: &[Sibling<I>],
    destination: &[Sibling<I>],
    item: I,
    destination_index: usize,
) -> Result<MovePlan<I>, OrderingError>
where
    I: Copy + Ord + Hash + Display,
{
    let mut source_arrangement = arrangement(source);
    let source_index = index_of(&source_arrangement, item)?;

    let mut destination_arrangement = arrangement(destination);
    destination_arrangement.retain(|id| *id != item);
    if destination_index > destination_arrangement.len() {
        return Err(OrderingError::InvalidIndex {
            index: destination_index,
            max: destination_arrangement.len(),
        });
    }
    let position = Position::from_index(destination_index).ok_or(OrderingError::ScopeOverflow)?;

    source_arrangement.remove(source_index);
    destination_arrangement.insert(destination_index, item);

    let source_updates = diff(&source_arrangement, source)?;
    let mut destination_updates = diff(&destination_arrangement, destination)?;
    destination_updates.retain(|update| update.id != item);

    Ok(MovePlan {
        source_updates,
        destination_updates,
        position,
    })
}

/// Plans the renumbering needed after `item` is removed from its scope.
///
/// # Errors
///
/// Returns [`OrderingError::ItemNotFound`] when `item` is not among
/// `siblings`.
pub fn plan_removal<I>(
    siblings: &[Sibling<I>],
    item: I,
) -> Result<Vec<OrderUpdate<I>>, OrderingError>
where
    I: Copy + Ord + Hash + Display,
{
    let mut arrangement = arrangement(siblings);
    let index = index_of(&arrangement, item)?;
    arrangement.remove(index);
    diff(&arrangement, siblings)
}

/// Returns the position for a new item appended to the scope.
///
/// This is one past the current maximum, which equals the sibling count for
/// a dense scope and never collides with an existing position otherwise.
///
/// # Errors
///
/// Returns [`OrderingError::ScopeOverflow`] when the scope already occupies
/// the last representable position.
pub fn next_position<I>(siblings: &[Sibling<I>]) -> Result<Position, OrderingError> {
    match siblings.iter().map(|sibling| sibling.position).max() {
        None => Ok(Position::FIRST),
        Some(max) if max.value() == u32::MAX => Err(OrderingError::ScopeOverflow),
        Some(max) => Ok(max.next()),
    }
}

/// Verifies that sibling positions form the contiguous range `0..count`.
///
/// # Errors
///
/// Returns [`OrderingError::DensityViolation`] describing the expected and
/// observed positions when the scope has gaps or duplicates.
pub fn check_density<I>(siblings: &[Sibling<I>]) -> Result<(), OrderingError> {
    let mut found: Vec<u32> = siblings.iter().map(|s| s.position.value()).collect();
    found.sort_unstable();
    let expected: Vec<u32> = (0..siblings.len())
        .map(|index| u32::try_from(index).map_err(|_| OrderingError::ScopeOverflow))
        .collect::<Result<_, _>>()?;

    if found == expected {
        Ok(())
    } else {
        Err(OrderingError::DensityViolation { expected, found })
    }
}

/// Applies order updates to a sibling snapshot, returning the new snapshot.
///
/// Useful for checking a plan against the density invariant before writing.
#[must_use]
pub fn apply_updates<I>(siblings: &[Sibling<I>], updates: &[OrderUpdate<I>]) -> Vec<Sibling<I>>
where
    I: Copy + Eq + Hash,
{
    let changes: HashMap<I, Position> = updates.iter().map(|u| (u.id, u.position)).collect();
    siblings
        .iter()
        .map(|sibling| Sibling {
            id: sibling.id,
            position: changes.get(&sibling.id).copied().unwrap_or(sibling.position),
        })
        .collect()
}

/// Returns sibling identifiers in display order.
fn arrangement<I>(siblings: &[Sibling<I>]) -> Vec<I>
where
    I: Copy + Ord,
{
    let mut sorted = siblings.to_vec();
    sorted.sort_by_key(|sibling| (sibling.position, sibling.id));
    sorted.into_iter().map(|sibling| sibling.id).collect()
}

fn index_of<I>(arrangement: &[I], item: I) -> Result<usize, OrderingError>
where
    I: Copy + Eq + Display,
{
    arrangement
        .iter()
        .position(|id| *id == item)
        .ok_or_else(|| OrderingError::item_not_found(item))
}

/// Emits an update for every identifier whose list index differs from its
/// persisted position.
fn diff<I>(arrangement: &[I], current: &[Sibling<I>]) -> Result<Vec<OrderUpdate<I>>, OrderingError>
where
    I: Copy + Eq + Hash,
{
    let persisted: HashMap<I, Position> = current.iter().map(|s| (s.id, s.position)).collect();
    let mut updates = Vec::new();
    for (index, id) in arrangement.iter().copied().enumerate() {
        let position = Position::from_index(index).ok_or(OrderingError::ScopeOverflow)?;
        if persisted.get(&id) != Some(&position) {
            updates.push(OrderUpdate { id, position });
        }
    }
    Ok(updates)
}
