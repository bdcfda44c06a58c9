//! Reference resolution: expands tile and cell references into flat
//! sequences of literal ops and raw markup.
//!
//! Expansion is depth-first and pre-order. Every tile visited while resolving
//! a cell is recorded once in the [`TouchedTileSet`] so its overlay can be
//! placed afterwards. The resolution stack doubles as a cycle guard.

use std::collections::HashSet;
use std::fmt;

use crate::errors::ResolveError;
use crate::fragment::{Fragment, Resolved};
use crate::registry::World;
use crate::types::{CellPos, TileId};

use super::defaults;
use super::tags::{ActiveTags, select};

/// Deepest reference chain the resolver follows
pub const MAX_DEPTH: usize = 64;

/// Switches for a single resolution
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Do not follow cell references
    pub no_follow: bool,
    /// Skip tag variants
    pub inhibit_tags: bool,
    /// Do not record visited tiles
    pub inhibit_collection: bool,
}

/// Tiles visited while resolving one cell, in first-visit order
#[derive(Debug, Clone, Default)]
pub struct TouchedTileSet {
    order: Vec<TileId>,
    seen: HashSet<TileId>,
}

impl TouchedTileSet {
    /// Record `id`. Returns false if it was already recorded.
    pub fn insert(&mut self, id: &TileId) -> bool {
        if self.seen.insert(id.clone()) {
            self.order.push(id.clone());
            true
        } else {
            false
        }
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.seen.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &TileId> {
        self.order.iter()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// A record on the resolution stack
#[derive(Debug, Clone, PartialEq, Eq)]
enum Frame {
    Tile(TileId),
    Cell(CellPos),
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frame::Tile(id) => write!(f, "tile {}", id),
            Frame::Cell(pos) => write!(f, "cell {}", pos),
        }
    }
}

/// Expands references against a [`World`]
pub struct Resolver<'w> {
    world: &'w World,
    active_tags: &'w ActiveTags,
    /// Category that literal tag variants draw into
    primary_category: String,
    touched: TouchedTileSet,
    stack: Vec<Frame>,
}

impl<'w> Resolver<'w> {
    pub fn new(world: &'w World, active_tags: &'w ActiveTags) -> Self {
        Self {
            world,
            active_tags,
            primary_category: defaults::PRIMARY_CATEGORY.to_string(),
            touched: TouchedTileSet::default(),
            stack: Vec::new(),
        }
    }

    pub fn with_primary_category(mut self, category: impl Into<String>) -> Self {
        self.primary_category = category.into();
        self
    }

    /// Start collecting touched tiles for a new cell
    pub fn begin_cell(&mut self) {
        self.touched.clear();
    }

    pub fn touched(&self) -> &TouchedTileSet {
        &self.touched
    }

    /// Expand tile `id` for `category`
    pub fn resolve_tile(
        &mut self,
        id: &TileId,
        category: &str,
        opts: ResolveOptions,
    ) -> Result<Vec<Resolved>, ResolveError> {
        let mut out = Vec::new();
        self.stack.clear();
        self.expand_tile(id, category, opts, &mut out)?;
        Ok(out)
    }

    /// Expand the cell at `pos` for `category`
    pub fn resolve_cell(
        &mut self,
        pos: CellPos,
        category: &str,
        opts: ResolveOptions,
    ) -> Result<Vec<Resolved>, ResolveError> {
        let mut out = Vec::new();
        self.stack.clear();
        self.expand_cell(pos, category, opts, &mut out)?;
        Ok(out)
    }

    /// Push `frame`. A frame already on the stack is a cycle unless `bounded`,
    /// i.e. the expansion below it cannot recurse any further into cells.
    fn enter(&mut self, frame: Frame, bounded: bool) -> Result<(), ResolveError> {
        if let Some(start) = self.stack.iter().position(|f| *f == frame).filter(|_| !bounded) {
            let mut cycle: Vec<String> = self.stack[start..].iter().map(Frame::to_string).collect();
            cycle.push(frame.to_string());
            return Err(ResolveError::CyclicReference {
                cycle: cycle.join(" -> "),
            });
        }
        if self.stack.len() >= MAX_DEPTH {
            let root = self.stack.first().unwrap_or(&frame).to_string();
            return Err(ResolveError::DepthExceeded {
                root,
                limit: MAX_DEPTH,
            });
        }
        self.stack.push(frame);
        Ok(())
    }

    fn leave(&mut self) {
        self.stack.pop();
    }

    fn expand_tile(
        &mut self,
        id: &TileId,
        category: &str,
        opts: ResolveOptions,
        out: &mut Vec<Resolved>,
    ) -> Result<(), ResolveError> {
        self.enter(Frame::Tile(id.clone()), false)?;
        let world = self.world;

        let Some(tile) = world.tiles.lookup(id.as_str()) else {
            crate::log::debug!(tile = %id, "dangling tile reference");
            self.leave();
            return Ok(());
        };

        if !opts.inhibit_collection {
            self.touched.insert(&tile.id);
        }

        let mut result = self.expand_fragments(tile.draw.category(category), None, category, opts, out);

        if result.is_ok() && !opts.inhibit_tags {
            for entry in &tile.tags {
                let Some(variant) = select(entry, self.active_tags) else {
                    continue;
                };
                result = match variant {
                    Fragment::Tile(tag_tile) => self.expand_tile(tag_tile, category, opts, out),
                    Fragment::Op(op) if category == self.primary_category => {
                        out.push(Resolved::Op(op.clone()));
                        Ok(())
                    }
                    Fragment::Markup(m) if category == self.primary_category => {
                        out.push(Resolved::Markup(m.clone()));
                        Ok(())
                    }
                    _ => Ok(()),
                };
                if result.is_err() {
                    break;
                }
            }
        }

        self.leave();
        result
    }

    fn expand_cell(
        &mut self,
        pos: CellPos,
        category: &str,
        opts: ResolveOptions,
        out: &mut Vec<Resolved>,
    ) -> Result<(), ResolveError> {
        self.enter(Frame::Cell(pos), opts.no_follow)?;
        let world = self.world;

        if !world.cells.contains(&pos) {
            crate::log::debug!(cell = %pos, "dangling cell reference");
        }
        let cell = world.cell(pos);
        let result = self.expand_fragments(cell.draw.category(category), Some(pos), category, opts, out);

        self.leave();
        result
    }

    fn expand_fragments(
        &mut self,
        fragments: &'w [crate::fragment::Fragment],
        from_cell: Option<CellPos>,
        category: &str,
        opts: ResolveOptions,
        out: &mut Vec<Resolved>,
    ) -> Result<(), ResolveError> {
        for fragment in fragments {
            match fragment {
                Fragment::Op(op) => out.push(Resolved::Op(op.clone())),
                Fragment::Markup(m) => out.push(Resolved::Markup(m.clone())),
                Fragment::Tile(id) => self.expand_tile(id, category, opts, out)?,
                Fragment::Cell(cell_ref) => match from_cell {
                    Some(pos) if !opts.no_follow => {
                        let nested = ResolveOptions {
                            no_follow: true,
                            ..opts
                        };
                        match cell_ref.target(pos) {
                            Some(target) => self.expand_cell(target, category, nested, out)?,
                            None => {
                                crate::log::debug!(cell = %pos, ?cell_ref, "cell reference off the grid");
                            }
                        }
                    }
                    _ => {
                        crate::log::trace!(?cell_ref, "cell reference not followed");
                    }
                },
            }
        }
        Ok(())
    }
}
