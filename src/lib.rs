//! dungeondraw - render tile-and-cell dungeon maps to SVG
//!
//! A map is two tables: reusable **tiles** (named bundles of path draw code,
//! tag variants and overlay markup) and **cells** (grid positions that draw
//! tiles, literal ops or other cells). Rendering resolves every cell's
//! references, scales map units to pixels, and merges the result into one
//! main path plus one path per secondary category.

pub mod canvas;
pub mod errors;
pub mod fragment;
pub mod log;
pub mod parse;
pub mod registry;
pub mod render;
pub mod table;
pub mod types;

use pest_derive::Parser;

pub use errors::{DrawCodeError, MarkupError, RenderError, RenderWarning, ResolveError, TableError};
pub use fragment::{Cell, CellRef, DrawCode, Fragment, LiteralOp, Opcode, Tile};
pub use registry::{Record, TableKind, World};
pub use render::{ActiveTags, Composition, RenderOptions, compose, generate_svg};
pub use table::TableStore;
pub use types::{CellPos, Scale, TileId};

#[derive(Parser)]
#[grammar = "grammar.pest"]
pub struct DrawParser;

/// Render `cells` of `world` to an SVG document.
///
/// Scaling warnings do not fail the render; use [`compose`] to inspect them.
pub fn render(
    world: &World,
    cells: &[CellPos],
    options: &RenderOptions,
) -> Result<String, miette::Report> {
    let composition = compose(world, cells, options)?;
    Ok(generate_svg(&composition, options))
}

/// Render every cell of `world`, row by row.
pub fn render_world(world: &World, options: &RenderOptions) -> Result<String, miette::Report> {
    render(world, &world.cell_positions(), options)
}
