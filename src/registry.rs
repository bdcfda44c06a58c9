//! Tile and cell tables
//!
//! The [`World`] owns both tables. Lookups never fail: a missing key reads
//! as an empty record so callers do not branch on absence.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

use crate::fragment::{Cell, Tile};
use crate::types::{CellPos, TileId};

/// Which table a record or row belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableKind {
    Tile,
    Cell,
}

impl TableKind {
    /// Table-type tag used by the table store
    pub fn tag(self) -> &'static str {
        match self {
            TableKind::Tile => "tile",
            TableKind::Cell => "cell",
        }
    }
}

/// A keyed record table with a defaulting lookup
#[derive(Debug, Clone)]
pub struct Registry<K, R> {
    records: HashMap<K, R>,
    empty: R,
}

impl<K: Eq + Hash, R: Default> Default for Registry<K, R> {
    fn default() -> Self {
        Self {
            records: HashMap::new(),
            empty: R::default(),
        }
    }
}

impl<K: Eq + Hash, R: Default> Registry<K, R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record
    pub fn put(&mut self, key: K, record: R) {
        self.records.insert(key, record);
    }

    /// The record for `key`, or an empty record
    pub fn get<Q>(&self, key: &Q) -> &R
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.records.get(key).unwrap_or(&self.empty)
    }

    pub fn lookup<Q>(&self, key: &Q) -> Option<&R>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.records.get(key)
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.records.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Replace the whole table. The fresh map is built first and swapped in
    /// with a single assignment, so readers never see a half-loaded table.
    pub fn reload(&mut self, records: impl IntoIterator<Item = (K, R)>) {
        let fresh: HashMap<K, R> = records.into_iter().collect();
        self.records = fresh;
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &R)> {
        self.records.iter()
    }
}

/// A record for either table
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Tile(Tile),
    Cell(Cell),
}

/// Both tables of a map
#[derive(Debug, Clone, Default)]
pub struct World {
    pub tiles: Registry<TileId, Tile>,
    pub cells: Registry<CellPos, Cell>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a record in the table matching its kind
    pub fn put(&mut self, record: Record) {
        match record {
            Record::Tile(tile) => self.tiles.put(tile.id.clone(), tile),
            Record::Cell(cell) => self.cells.put(cell.pos, cell),
        }
    }

    pub fn put_tile(&mut self, tile: Tile) {
        self.put(Record::Tile(tile));
    }

    pub fn put_cell(&mut self, cell: Cell) {
        self.put(Record::Cell(cell));
    }

    pub fn tile(&self, id: &str) -> &Tile {
        self.tiles.get(id)
    }

    pub fn cell(&self, pos: CellPos) -> &Cell {
        self.cells.get(&pos)
    }

    /// Replace the `kind` table with `records`. Records of the other kind are ignored.
    pub fn reload(&mut self, kind: TableKind, records: Vec<Record>) {
        match kind {
            TableKind::Tile => self.tiles.reload(records.into_iter().filter_map(|r| match r {
                Record::Tile(t) => Some((t.id.clone(), t)),
                Record::Cell(_) => None,
            })),
            TableKind::Cell => self.cells.reload(records.into_iter().filter_map(|r| match r {
                Record::Cell(c) => Some((c.pos, c)),
                Record::Tile(_) => None,
            })),
        }
    }

    /// All cell positions, sorted row by row (y, then x)
    pub fn cell_positions(&self) -> Vec<CellPos> {
        let mut positions: Vec<CellPos> = self.cells.iter().map(|(pos, _)| *pos).collect();
        positions.sort_by_key(|p| (p.y, p.x));
        positions
    }
}
