//! Partitioning a grid into numbered regions from per-cell open-border data.

use std::collections::{HashMap, HashSet, VecDeque};

use im::OrdSet;
use tracing::debug;

use crate::{
    error::{Error, Result},
    topology::{Direction, Grid, Position},
};

/// The set of directions a cell opens toward its neighbors.
///
/// An opening only creates an edge if the neighbor reciprocates it (opens the
/// opposite direction back); a one-way or out-of-grid opening is treated as
/// closed.
pub type OpenBorders = im::HashSet<Direction>;

/// Bound on region-discovery attempts before malformed border data is
/// reported as an error rather than retried again.
const MAX_DISCOVERY_ATTEMPTS: usize = 3;

/// An immutable partition of a grid into 1-based numbered regions, computed
/// once from open-border adjacency data.
///
/// Every position belongs to exactly one region; [`RegionsGrid::region_of`]
/// and [`RegionsGrid::positions_of`] are mutual inverses.
#[derive(Debug, Clone)]
pub struct RegionsGrid {
    assignment: Grid<u32>,
    members: Vec<OrdSet<Position>>,
}

impl RegionsGrid {
    /// Builds the partition from per-cell open-border sets.
    ///
    /// Fails fast with `MalformedTopology` if any border set contains
    /// [`Direction::None`] (an opening must name a real connection), and with
    /// `RegionModel` if discovery cannot produce a total partition within a
    /// bounded number of attempts.
    pub fn from_borders(borders: &Grid<OpenBorders>) -> Result<Self> {
        for (position, open) in borders.iter() {
            if open.contains(&Direction::None) {
                return Err(Error::malformed_topology(format!(
                    "open-border set at {position} contains Direction::None"
                )));
            }
        }

        let mut attempt = 0;
        loop {
            attempt += 1;
            let candidate = Self::discover(borders);
            match candidate.validate(borders) {
                Ok(()) => return Ok(candidate),
                Err(reason) if attempt < MAX_DISCOVERY_ATTEMPTS => {
                    debug!(attempt, %reason, "region discovery produced a non-total partition, retrying");
                }
                Err(reason) => {
                    return Err(Error::region_model(format!(
                        "no total partition after {attempt} attempts: {reason}"
                    )));
                }
            }
        }
    }

    /// One discovery pass: flood-fill over reciprocated-opening edges, with
    /// seeds consumed in row-major order so ids are deterministic.
    fn discover(borders: &Grid<OpenBorders>) -> Self {
        let mut assignment = Grid::filled(borders.rows_number(), borders.columns_number(), 0u32);
        let mut members: Vec<OrdSet<Position>> = Vec::new();
        let mut visited: HashSet<Position> = HashSet::new();

        for seed in borders.positions() {
            if visited.contains(&seed) {
                continue;
            }
            let id = members.len() as u32 + 1;
            let mut component = OrdSet::new();
            let mut frontier = VecDeque::from([seed]);
            visited.insert(seed);
            while let Some(current) = frontier.pop_front() {
                component.insert(current);
                // Zero ids never escape discovery; validate() rejects them.
                let _ = assignment.set_value(current, id);
                for neighbor in open_neighbors(borders, current) {
                    if visited.insert(neighbor) {
                        frontier.push_back(neighbor);
                    }
                }
            }
            members.push(component);
        }

        Self { assignment, members }
    }

    fn validate(&self, borders: &Grid<OpenBorders>) -> std::result::Result<(), String> {
        let mut seen: HashMap<Position, u32> = HashMap::new();
        for (id, component) in self.members.iter().enumerate() {
            for &position in component {
                if seen.insert(position, id as u32 + 1).is_some() {
                    return Err(format!("position {position} assigned to two regions"));
                }
            }
        }
        for position in borders.positions() {
            match seen.get(&position) {
                Option::None => return Err(format!("position {position} not covered")),
                Some(&id) if self.assignment.get(position) != Some(&id) => {
                    return Err(format!("assignment at {position} disagrees with membership"));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// The 1-based id of the region containing `position`.
    pub fn region_of(&self, position: Position) -> Result<u32> {
        self.assignment.value(position).copied()
    }

    /// All positions of region `region_id`.
    pub fn positions_of(&self, region_id: u32) -> Result<&OrdSet<Position>> {
        let index = region_id
            .checked_sub(1)
            .map(|i| i as usize)
            .filter(|&i| i < self.members.len());
        index.map(|i| &self.members[i]).ok_or_else(|| {
            Error::region_model(format!("no region with id {region_id}"))
        })
    }

    pub fn regions_number(&self) -> usize {
        self.members.len()
    }

    /// Iterates region ids in ascending order.
    pub fn region_ids(&self) -> impl Iterator<Item = u32> {
        1..=self.members.len() as u32
    }
}

/// Neighbors joined to `position` by a reciprocated opening. Wall and wrap
/// handling follows the border grid's own topology.
fn open_neighbors(borders: &Grid<OpenBorders>, position: Position) -> Vec<Position> {
    Direction::ORTHOGONAL
        .into_iter()
        .filter_map(|direction| {
            let open = borders.get(position)?;
            if !open.contains(&direction) {
                return Option::None;
            }
            let neighbor = borders.neighbor_toward(position, direction).ok()??;
            let reciprocated = borders
                .get(neighbor)
                .is_some_and(|theirs| theirs.contains(&direction.opposite()));
            reciprocated.then_some(neighbor)
        })
        .collect()
}
