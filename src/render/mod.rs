//! Map rendering
//!
//! This module is organized into submodules:
//! - `defaults`: Default scale, categories and path styles
//! - `tags`: Tag-variant selection
//! - `resolve`: Reference expansion and touched-tile collection
//! - `scale`: Map-unit to pixel conversion
//! - `path`: Instruction-string serialization
//! - `svg`: Document assembly on the canvas

pub mod defaults;
pub mod path;
pub mod resolve;
pub mod scale;
pub mod svg;
pub mod tags;

use std::collections::BTreeMap;

use glam::{DVec2, dvec2};

use crate::canvas::Element;
use crate::errors::{RenderError, RenderWarning};
use crate::fragment::{Drawn, LiteralOp};
use crate::registry::World;
use crate::types::{CellPos, Scale};

pub use path::{SerializedPath, serialize};
pub use resolve::{ResolveOptions, Resolver, TouchedTileSet};
pub use svg::generate_svg;
pub use tags::ActiveTags;

/// Render configuration
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Pixels per dungeon unit, per axis
    pub scale: DVec2,
    /// Pixel offset applied to everything on the canvas
    pub nudge: DVec2,
    /// Category merged across cells into the main path
    pub primary_category: String,
    /// Categories drawn as separate paths, in output order
    pub secondary_categories: Vec<String>,
    /// Style attributes per category
    pub path_attributes: BTreeMap<String, Vec<(String, String)>>,
    pub active_tags: ActiveTags,
    /// Explicit canvas size in pixels; derived from the cells when `None`
    pub canvas_size: Option<DVec2>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        let path_attributes = defaults::PATH_ATTRIBUTES
            .iter()
            .map(|(category, attrs)| {
                let attrs = attrs
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect();
                (category.to_string(), attrs)
            })
            .collect();
        Self {
            scale: dvec2(defaults::SCALE, defaults::SCALE),
            nudge: DVec2::ZERO,
            primary_category: defaults::PRIMARY_CATEGORY.to_string(),
            secondary_categories: defaults::SECONDARY_CATEGORIES
                .iter()
                .map(|c| c.to_string())
                .collect(),
            path_attributes,
            active_tags: ActiveTags::All,
            canvas_size: None,
        }
    }
}

impl RenderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Same pixels-per-unit on both axes
    pub fn with_scale(mut self, pixels_per_unit: f64) -> Self {
        self.scale = dvec2(pixels_per_unit, pixels_per_unit);
        self
    }

    pub fn with_scale_xy(mut self, x: f64, y: f64) -> Self {
        self.scale = dvec2(x, y);
        self
    }

    pub fn with_nudge(mut self, x: f64, y: f64) -> Self {
        self.nudge = dvec2(x, y);
        self
    }

    pub fn with_active_tags(mut self, tags: ActiveTags) -> Self {
        self.active_tags = tags;
        self
    }

    pub fn with_primary_category(mut self, category: impl Into<String>) -> Self {
        self.primary_category = category.into();
        self
    }

    pub fn with_secondary_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.secondary_categories = categories.into_iter().map(Into::into).collect();
        self
    }

    /// Set one style attribute for a category's path
    pub fn with_path_attribute(
        mut self,
        category: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        let attrs = self.path_attributes.entry(category.into()).or_default();
        let name = name.into();
        let value = value.into();
        match attrs.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => attrs.push((name, value)),
        }
        self
    }

    pub fn with_canvas_size(mut self, width: f64, height: f64) -> Self {
        self.canvas_size = Some(dvec2(width, height));
        self
    }

    /// The scale, validated
    pub fn validated_scale(&self) -> Result<Scale, RenderError> {
        Scale::try_new(self.scale.x, self.scale.y)
            .map_err(|source| RenderError::InvalidScale { source })
    }

    /// The nudge, validated
    pub fn validated_nudge(&self) -> Result<DVec2, RenderError> {
        if self.nudge.is_finite() {
            Ok(self.nudge)
        } else {
            Err(RenderError::InvalidNudge {
                x: self.nudge.x,
                y: self.nudge.y,
            })
        }
    }

    /// Style attributes for `category`, falling back to a plain black stroke
    pub fn attributes_for(&self, category: &str) -> Vec<(&str, &str)> {
        match self.path_attributes.get(category) {
            Some(attrs) => attrs.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect(),
            None => defaults::FALLBACK_PATH_ATTRIBUTES.to_vec(),
        }
    }
}

/// Everything a render produces, before it is put on the canvas
#[derive(Debug, Clone, Default)]
pub struct Composition {
    /// Primary category of every cell, merged
    pub main: SerializedPath,
    /// One path per secondary category, in configured order
    pub secondary: Vec<(String, SerializedPath)>,
    /// Overlay markup of touched tiles, positioned, in cell order
    pub overlays: Vec<Element>,
    /// Non-fatal problems met while scaling
    pub warnings: Vec<RenderWarning>,
    /// Top-left corner of the view box in pixels; negative when cells lie left of or above the origin
    pub view_origin: DVec2,
    /// Canvas size in pixels
    pub size: DVec2,
}

/// Resolve, scale and merge `cells` into a [`Composition`].
///
/// Each cell's content starts with an absolute move to its pixel origin.
/// Cells with nothing to draw in a category add nothing to that category.
pub fn compose(
    world: &World,
    cells: &[CellPos],
    options: &RenderOptions,
) -> Result<Composition, RenderError> {
    let scale = options.validated_scale()?;
    let nudge = options.validated_nudge()?;
    let mut resolver = Resolver::new(world, &options.active_tags)
        .with_primary_category(options.primary_category.clone());

    let mut warnings = Vec::new();
    let mut main: Vec<Drawn> = Vec::new();
    let mut secondary: Vec<(String, Vec<Drawn>)> = options
        .secondary_categories
        .iter()
        .map(|c| (c.clone(), Vec::new()))
        .collect();
    let mut overlays = Vec::new();

    for &pos in cells {
        let origin = pos.pixel_origin(scale, nudge);

        resolver.begin_cell();
        let primary =
            resolver.resolve_cell(pos, &options.primary_category, ResolveOptions::default())?;
        crate::log::trace!(cell = %pos, fragments = primary.len(), touched = resolver.touched().len(), "cell resolved");
        if !primary.is_empty() {
            main.push(Drawn::Op(LiteralOp::absolute_move(origin.x, origin.y)));
            main.extend(scale::scale(&primary, scale, origin, &mut warnings)?);
        }

        for id in resolver.touched().iter() {
            for overlay in &world.tile(id.as_str()).overlay {
                let mut placed = overlay.clone();
                scale::place_markup(&mut placed, scale, origin);
                overlays.push(placed);
            }
        }

        let no_follow = ResolveOptions {
            no_follow: true,
            inhibit_collection: true,
            ..Default::default()
        };
        for (category, sequence) in secondary.iter_mut() {
            let resolved = resolver.resolve_cell(pos, category, no_follow)?;
            if !resolved.is_empty() {
                sequence.push(Drawn::Op(LiteralOp::absolute_move(origin.x, origin.y)));
                sequence.extend(scale::scale(&resolved, scale, origin, &mut warnings)?);
            }
        }
    }

    crate::log::debug!(
        cells = cells.len(),
        main = main.len(),
        overlays = overlays.len(),
        warnings = warnings.len(),
        "composition done"
    );

    let (view_origin, size) = canvas_bounds(cells, scale, nudge, options.canvas_size);
    Ok(Composition {
        main: serialize(&main),
        secondary: secondary
            .into_iter()
            .map(|(category, sequence)| (category, serialize(&sequence)))
            .collect(),
        overlays,
        warnings,
        view_origin,
        size,
    })
}

/// View box covering `cells` and the grid origin, with the nudge as margin on
/// both sides. An explicit size replaces the derived one.
fn canvas_bounds(
    cells: &[CellPos],
    scale: Scale,
    nudge: DVec2,
    explicit: Option<DVec2>,
) -> (DVec2, DVec2) {
    let (lo, hi) = cells
        .iter()
        .map(|pos| pos.as_units())
        .fold((DVec2::ZERO, DVec2::ZERO), |(lo, hi), units| {
            (lo.min(units), hi.max(units + DVec2::ONE))
        });
    let origin = lo * scale.factors();
    let size = explicit.unwrap_or_else(|| ((hi - lo) * scale.factors() + nudge * 2.0).max(DVec2::ZERO));
    (origin, size)
}
