//! Records and path fragments for tiles and cells
//!
//! A tile or cell carries its draw code as ordered fragment lists, one per
//! draw category. Fragments are either literal path instructions, raw markup,
//! or references that the resolver expands.

use std::collections::BTreeMap;
use std::fmt;

use crate::canvas::Element;
use crate::types::{CellPos, TileId};

/// Path instruction letter
#[derive(Debug, Clone, PartialEq)]
pub enum Opcode {
    /// `m`
    Move,
    /// `l`
    Line,
    /// `h`
    Horizontal,
    /// `v`
    Vertical,
    /// `a`
    Arc,
    /// `z`
    Close,
    /// Any upper-case letter; coordinates are already in pixels
    Absolute(char),
    /// Anything else. Passed through with a warning.
    Unknown(String),
}

impl Opcode {
    pub fn from_letter(letter: char) -> Opcode {
        match letter {
            'm' => Opcode::Move,
            'l' => Opcode::Line,
            'h' => Opcode::Horizontal,
            'v' => Opcode::Vertical,
            'a' => Opcode::Arc,
            'z' => Opcode::Close,
            c if c.is_ascii_uppercase() => Opcode::Absolute(c),
            c => Opcode::Unknown(c.to_string()),
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Opcode::Move => f.write_str("m"),
            Opcode::Line => f.write_str("l"),
            Opcode::Horizontal => f.write_str("h"),
            Opcode::Vertical => f.write_str("v"),
            Opcode::Arc => f.write_str("a"),
            Opcode::Close => f.write_str("z"),
            Opcode::Absolute(c) => write!(f, "{}", c),
            Opcode::Unknown(s) => f.write_str(s),
        }
    }
}

/// A literal draw instruction with its numeric arguments
#[derive(Debug, Clone, PartialEq)]
pub struct LiteralOp {
    pub opcode: Opcode,
    pub args: Vec<f64>,
}

impl LiteralOp {
    pub fn new(opcode: Opcode, args: impl Into<Vec<f64>>) -> Self {
        Self {
            opcode,
            args: args.into(),
        }
    }

    pub fn move_to(x: f64, y: f64) -> Self {
        Self::new(Opcode::Move, [x, y])
    }

    pub fn line(x: f64, y: f64) -> Self {
        Self::new(Opcode::Line, [x, y])
    }

    /// Absolute `M`, used for cell origins
    pub fn absolute_move(x: f64, y: f64) -> Self {
        Self::new(Opcode::Absolute('M'), [x, y])
    }
}

/// Reference to another cell's draw code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRef {
    pub dx: i32,
    pub dy: i32,
    /// `dx`/`dy` name an absolute position instead of an offset
    pub absolute: bool,
}

impl CellRef {
    pub fn relative(dx: i32, dy: i32) -> Self {
        Self {
            dx,
            dy,
            absolute: false,
        }
    }

    pub fn absolute(x: i32, y: i32) -> Self {
        Self {
            dx: x,
            dy: y,
            absolute: true,
        }
    }

    /// The position this reference points at, seen from `from`.
    /// `None` when a relative offset runs off the grid.
    pub fn target(self, from: CellPos) -> Option<CellPos> {
        if self.absolute {
            Some(CellPos::new(self.dx, self.dy))
        } else {
            from.checked_offset(self.dx, self.dy)
        }
    }
}

/// Pre-authored markup, kept as source text until it is placed on the canvas
#[derive(Debug, Clone, PartialEq)]
pub struct RawMarkup {
    pub source: String,
}

impl RawMarkup {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

/// One entry of a draw-code list
#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    Op(LiteralOp),
    Tile(TileId),
    Cell(CellRef),
    Markup(RawMarkup),
}

impl From<LiteralOp> for Fragment {
    fn from(op: LiteralOp) -> Self {
        Fragment::Op(op)
    }
}

/// A tag-conditioned variant on a tile.
///
/// `normal` is emitted while the tag is active, `inverted` while it is not.
#[derive(Debug, Clone, PartialEq)]
pub struct TagEntry {
    pub tag: String,
    pub normal: Option<Fragment>,
    pub inverted: Option<Fragment>,
}

/// Draw code per category. Absent categories read as empty.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DrawCode {
    categories: BTreeMap<String, Vec<Fragment>>,
}

impl DrawCode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn category(&self, name: &str) -> &[Fragment] {
        self.categories.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn set(&mut self, name: impl Into<String>, fragments: Vec<Fragment>) {
        self.categories.insert(name.into(), fragments);
    }

    /// Append to a category, creating it if needed
    pub fn extend(&mut self, name: &str, fragments: impl IntoIterator<Item = Fragment>) {
        self.categories
            .entry(name.to_string())
            .or_default()
            .extend(fragments);
    }

    pub fn with(mut self, name: impl Into<String>, fragments: Vec<Fragment>) -> Self {
        self.set(name, fragments);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.categories.values().all(Vec::is_empty)
    }
}

/// Reusable drawing fragment
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Tile {
    pub id: TileId,
    pub draw: DrawCode,
    pub tags: Vec<TagEntry>,
    /// Markup attached to the tile, placed once per cell that touches the tile
    pub overlay: Vec<Element>,
}

impl Tile {
    pub fn new(id: impl Into<TileId>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }
}

/// A map position's own draw code
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cell {
    pub pos: CellPos,
    pub draw: DrawCode,
}

impl Cell {
    pub fn new(pos: impl Into<CellPos>) -> Self {
        Self {
            pos: pos.into(),
            draw: DrawCode::default(),
        }
    }
}

/// Resolver output: references are gone, only drawable content remains
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved {
    Op(LiteralOp),
    Markup(RawMarkup),
}

/// Scaled output: ops in pixel units, markup parsed and positioned
#[derive(Debug, Clone, PartialEq)]
pub enum Drawn {
    Op(LiteralOp),
    Markup(Element),
}
