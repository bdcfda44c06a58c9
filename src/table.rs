//! Row transforms: the contract between the table store and the registries
//!
//! The table store hands over rows of positional strings. Each row is bound to
//! the declared column names in a [`TransformContext`], and the transform
//! registered for the table type folds it into a record. A row whose key
//! columns are blank continues the previous record.
//!
//! A batch is built into a fresh table and swapped into the [`World`] only
//! when every row transformed cleanly.

use std::collections::HashMap;
use std::fmt;

use enum_dispatch::enum_dispatch;

use crate::errors::TableError;
use crate::fragment::{Cell, Tile};
use crate::parse::{parse_draw_code, parse_markup_list, parse_tag_list};
use crate::registry::{Record, TableKind, World};
use crate::types::{CellPos, TileId};

/// Default draw-category columns shared by both tables
pub const CATEGORY_COLUMNS: [&str; 4] = ["path", "water", "stairs", "decorations"];

/// Key of the record a row belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordKey {
    Tile(TileId),
    Cell(CellPos),
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKey::Tile(id) => write!(f, "tile {}", id),
            RecordKey::Cell(pos) => write!(f, "cell {}", pos),
        }
    }
}

/// Per-row state threaded through a transform
#[derive(Debug, Clone, Default)]
pub struct TransformContext {
    /// Table-type tag
    pub table: String,
    /// 1-based number of the current row
    pub row: usize,
    /// Current row's values bound to the declared column names
    pub bindings: Vec<(String, String)>,
    /// Key of the most recent keyed row
    pub last_key: Option<RecordKey>,
    /// Record being assembled, flushed when the next key appears
    pub record: Option<Record>,
}

impl TransformContext {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            ..Default::default()
        }
    }

    /// Bind a row's positional values to `columns`
    pub fn bind_row(
        &mut self,
        row: usize,
        columns: &[String],
        values: Vec<String>,
    ) -> Result<(), TableError> {
        if values.len() != columns.len() {
            return Err(TableError::ColumnCount {
                table: self.table.clone(),
                row,
                expected: columns.len(),
                got: values.len(),
            });
        }
        self.row = row;
        self.bindings = columns.iter().cloned().zip(values).collect();
        Ok(())
    }

    /// The trimmed value of `column`, or `None` when it is blank or undeclared
    pub fn value(&self, column: &str) -> Option<&str> {
        self.bindings
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, v)| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Non-blank bindings, in column order
    pub fn filled(&self) -> impl Iterator<Item = (&str, &str)> {
        self.bindings
            .iter()
            .map(|(k, v)| (k.as_str(), v.trim()))
            .filter(|(_, v)| !v.is_empty())
    }

    fn parse_int(&self, column: &str, value: &str) -> Result<i32, TableError> {
        value.parse::<i32>().map_err(|_| TableError::InvalidInteger {
            table: self.table.clone(),
            row: self.row,
            column: column.to_string(),
            value: value.to_string(),
        })
    }
}

/// Turns bound rows into records for one table type
#[enum_dispatch]
pub trait RowTransform {
    fn kind(&self) -> TableKind;

    /// Declared column names, in row order
    fn columns(&self) -> &[String];

    /// The key named by the current row, `None` for a continuation row
    fn row_key(&self, ctx: &TransformContext) -> Result<Option<RecordKey>, TableError>;

    fn new_record(&self, key: &RecordKey) -> Record;

    /// Merge the current row's non-key columns into `record`
    fn apply_row(&self, ctx: &TransformContext, record: &mut Record) -> Result<(), TableError>;

    /// Process one bound row. Returns the previous record once a new key starts.
    fn transform_row(&self, ctx: &mut TransformContext) -> Result<Option<Record>, TableError> {
        let flushed = match self.row_key(ctx)? {
            Some(key) => {
                let done = ctx.record.replace(self.new_record(&key));
                ctx.last_key = Some(key);
                done
            }
            None if ctx.last_key.is_none() => {
                return Err(TableError::OrphanRow {
                    table: ctx.table.clone(),
                    row: ctx.row,
                });
            }
            None => {
                crate::log::trace!(row = ctx.row, key = ?ctx.last_key, "continuation row");
                None
            }
        };

        if let Some(mut record) = ctx.record.take() {
            let applied = self.apply_row(ctx, &mut record);
            ctx.record = Some(record);
            applied?;
        }
        Ok(flushed)
    }
}

/// Transform for the `tile` table: `id`, `tags`, `overlay`, plus one column per draw category
#[derive(Debug, Clone)]
pub struct TileRows {
    columns: Vec<String>,
}

impl TileRows {
    pub fn new(columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for TileRows {
    fn default() -> Self {
        let mut columns = vec!["id"];
        columns.extend(CATEGORY_COLUMNS);
        columns.extend(["tags", "overlay"]);
        Self::new(columns)
    }
}

impl RowTransform for TileRows {
    fn kind(&self) -> TableKind {
        TableKind::Tile
    }

    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn row_key(&self, ctx: &TransformContext) -> Result<Option<RecordKey>, TableError> {
        Ok(ctx.value("id").map(|id| RecordKey::Tile(TileId::from(id))))
    }

    fn new_record(&self, key: &RecordKey) -> Record {
        match key {
            RecordKey::Tile(id) => Record::Tile(Tile::new(id.clone())),
            RecordKey::Cell(pos) => Record::Cell(Cell::new(*pos)),
        }
    }

    fn apply_row(&self, ctx: &TransformContext, record: &mut Record) -> Result<(), TableError> {
        let Record::Tile(tile) = record else {
            return Ok(());
        };
        for (column, value) in ctx.filled() {
            let label = format!("tile {} / {}", tile.id, column);
            match column {
                "id" => {}
                "tags" => tile.tags.extend(parse_tag_list(&label, value)?),
                "overlay" => tile.overlay.extend(parse_markup_list(&label, value)?),
                category => tile.draw.extend(category, parse_draw_code(&label, value)?),
            }
        }
        Ok(())
    }
}

/// Transform for the `cell` table: `x`, `y`, plus one column per draw category
#[derive(Debug, Clone)]
pub struct CellRows {
    columns: Vec<String>,
}

impl CellRows {
    pub fn new(columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for CellRows {
    fn default() -> Self {
        let mut columns = vec!["x", "y"];
        columns.extend(CATEGORY_COLUMNS);
        Self::new(columns)
    }
}

impl RowTransform for CellRows {
    fn kind(&self) -> TableKind {
        TableKind::Cell
    }

    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn row_key(&self, ctx: &TransformContext) -> Result<Option<RecordKey>, TableError> {
        match (ctx.value("x"), ctx.value("y")) {
            (Some(x), Some(y)) => {
                let pos = CellPos::new(ctx.parse_int("x", x)?, ctx.parse_int("y", y)?);
                Ok(Some(RecordKey::Cell(pos)))
            }
            (None, None) => Ok(None),
            _ => Err(TableError::PartialKey {
                table: ctx.table.clone(),
                row: ctx.row,
            }),
        }
    }

    fn new_record(&self, key: &RecordKey) -> Record {
        match key {
            RecordKey::Cell(pos) => Record::Cell(Cell::new(*pos)),
            RecordKey::Tile(id) => Record::Tile(Tile::new(id.clone())),
        }
    }

    fn apply_row(&self, ctx: &TransformContext, record: &mut Record) -> Result<(), TableError> {
        let Record::Cell(cell) = record else {
            return Ok(());
        };
        for (column, value) in ctx.filled() {
            match column {
                "x" | "y" => {}
                category => {
                    let label = format!("cell {} / {}", cell.pos, category);
                    cell.draw.extend(category, parse_draw_code(&label, value)?);
                }
            }
        }
        Ok(())
    }
}

/// A registered row transform
#[enum_dispatch(RowTransform)]
#[derive(Debug, Clone)]
pub enum TableTransform {
    TileRows,
    CellRows,
}

/// Registration point for row transforms, keyed by table-type tag
#[derive(Debug, Clone, Default)]
pub struct TableStore {
    transforms: HashMap<String, TableTransform>,
}

impl TableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store with the default `tile` and `cell` transforms registered
    pub fn with_defaults() -> Self {
        let mut store = Self::new();
        store.register(TableKind::Tile.tag(), TileRows::default());
        store.register(TableKind::Cell.tag(), CellRows::default());
        store
    }

    pub fn register(&mut self, table: impl Into<String>, transform: impl Into<TableTransform>) {
        self.transforms.insert(table.into(), transform.into());
    }

    /// Transform a batch of rows for `table` and replace the matching world table.
    ///
    /// On error the world is left untouched. Returns the number of records loaded.
    pub fn load<I, R, S>(&self, world: &mut World, table: &str, rows: I) -> Result<usize, TableError>
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let transform = self
            .transforms
            .get(table)
            .ok_or_else(|| TableError::UnknownTable {
                table: table.to_string(),
            })?;

        let mut ctx = TransformContext::new(table);
        let mut records = Vec::new();
        for (i, row) in rows.into_iter().enumerate() {
            let values = row.into_iter().map(Into::into).collect();
            ctx.bind_row(i + 1, transform.columns(), values)?;
            if let Some(done) = transform.transform_row(&mut ctx)? {
                records.push(done);
            }
        }
        records.extend(ctx.record.take());

        crate::log::debug!(table, records = records.len(), "table loaded");
        let count = records.len();
        world.reload(transform.kind(), records);
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::{Fragment, LiteralOp};

    fn tile_row(id: &str, path: &str, tags: &str, overlay: &str) -> Vec<String> {
        vec![
            id.into(),
            path.into(),
            String::new(),
            String::new(),
            String::new(),
            tags.into(),
            overlay.into(),
        ]
    }

    #[test]
    fn loads_tiles_with_tags_and_overlay() {
        let store = TableStore::with_defaults();
        let mut world = World::new();
        let rows = vec![
            tile_row("wall", "m 0 0 h 1", "lit: torch / -", r#"<text x="0.5">W</text>"#),
            tile_row("torch", "m 0.5 0.5 l 0 0.1", "", ""),
        ];
        let count = store.load(&mut world, "tile", rows).unwrap();
        assert_eq!(count, 2);

        let wall = world.tile("wall");
        assert_eq!(wall.draw.category("path").len(), 2);
        assert_eq!(wall.tags.len(), 1);
        assert_eq!(wall.overlay.len(), 1);
        assert_eq!(wall.overlay[0].attr("x"), Some("0.5"));
    }

    #[test]
    fn continuation_rows_extend_the_previous_record() {
        let store = TableStore::with_defaults();
        let mut world = World::new();
        let rows = vec![
            vec!["1", "2", "wall", "", "", ""],
            vec!["", "", "door-n", "", "", ""],
            vec!["2", "2", "", "m 0 0 h 1", "", ""],
        ];
        store.load(&mut world, "cell", rows).unwrap();

        let cell = world.cell(CellPos::new(1, 2));
        assert_eq!(
            cell.draw.category("path"),
            &[
                Fragment::Tile(TileId::from("wall")),
                Fragment::Tile(TileId::from("door-n"))
            ]
        );
        assert_eq!(
            world.cell(CellPos::new(2, 2)).draw.category("water")[1],
            Fragment::Op(LiteralOp::new(crate::fragment::Opcode::Horizontal, [1.0]))
        );
    }

    #[test]
    fn failed_batch_leaves_world_untouched() {
        let store = TableStore::with_defaults();
        let mut world = World::new();
        store
            .load(&mut world, "tile", vec![tile_row("keep", "h 1", "", "")])
            .unwrap();

        let bad = vec![
            tile_row("new", "h 1", "", ""),
            tile_row("broken", "h 1", "", "<text>"),
        ];
        let err = store.load(&mut world, "tile", bad).unwrap_err();
        assert!(matches!(err, TableError::Markup(_)));
        assert!(world.tiles.contains("keep"));
        assert!(!world.tiles.contains("new"));
    }

    #[test]
    fn row_errors() {
        let store = TableStore::with_defaults();
        let mut world = World::new();

        let err = store.load(&mut world, "room", vec![vec!["x"]]).unwrap_err();
        assert!(matches!(err, TableError::UnknownTable { .. }));

        let err = store.load(&mut world, "cell", vec![vec!["1", "2"]]).unwrap_err();
        assert!(matches!(err, TableError::ColumnCount { expected: 6, got: 2, .. }));

        let err = store
            .load(&mut world, "cell", vec![vec!["one", "2", "", "", "", ""]])
            .unwrap_err();
        assert!(matches!(err, TableError::InvalidInteger { .. }));

        let err = store
            .load(&mut world, "cell", vec![vec!["", "", "wall", "", "", ""]])
            .unwrap_err();
        assert!(matches!(err, TableError::OrphanRow { row: 1, .. }));

        let err = store
            .load(&mut world, "cell", vec![vec!["3", "", "wall", "", "", ""]])
            .unwrap_err();
        assert!(matches!(err, TableError::PartialKey { .. }));
    }

    #[test]
    fn continuation_rows_keep_the_last_key() {
        let transform = CellRows::default();
        let mut ctx = TransformContext::new("cell");
        let row = |x: &str, y: &str, path: &str| {
            vec![x.to_string(), y.to_string(), path.to_string(), String::new(), String::new(), String::new()]
        };

        ctx.bind_row(1, transform.columns(), row("", "", "wall")).unwrap();
        assert!(matches!(transform.transform_row(&mut ctx), Err(TableError::OrphanRow { row: 1, .. })));
        assert_eq!(ctx.last_key, None);

        ctx.bind_row(2, transform.columns(), row("4", "5", "wall")).unwrap();
        assert_eq!(transform.transform_row(&mut ctx).unwrap(), None);
        ctx.bind_row(3, transform.columns(), row("", "", "door")).unwrap();
        assert_eq!(transform.transform_row(&mut ctx).unwrap(), None);
        assert_eq!(ctx.last_key, Some(RecordKey::Cell(CellPos::new(4, 5))));

        ctx.bind_row(4, transform.columns(), row("6", "5", "")).unwrap();
        let Some(Record::Cell(flushed)) = transform.transform_row(&mut ctx).unwrap() else {
            panic!("expected the first cell to be flushed");
        };
        assert_eq!(flushed.pos, CellPos::new(4, 5));
        assert_eq!(flushed.draw.category("path").len(), 2);
        assert_eq!(ctx.last_key, Some(RecordKey::Cell(CellPos::new(6, 5))));
    }

    #[test]
    fn custom_columns_become_categories() {
        let mut store = TableStore::new();
        store.register("tile", TileRows::new(["id", "path", "lava"]));
        let mut world = World::new();
        store
            .load(&mut world, "tile", vec![vec!["pit", "h 1", "v 1"]])
            .unwrap();
        assert_eq!(world.tile("pit").draw.category("lava").len(), 1);
    }
}
