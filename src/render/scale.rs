//! Map-unit to pixel conversion for resolved fragments
//!
//! | opcode        | rule                                             |
//! |---------------|--------------------------------------------------|
//! | `m` `l`       | each `(x, y)` pair scaled and rounded            |
//! | `h` / `v`     | each value scaled by the x / y factor            |
//! | `a`           | only the endpoint pair of each 7-arg group       |
//! | upper-case    | unchanged, already in pixels                     |
//! | `z`           | no arguments                                     |
//! | missing args  | unchanged, with a warning                        |
//! | anything else | unchanged, with a warning                        |
//!
//! Markup is scaled through an attribute whitelist and only where the value
//! is a fraction of a cell (inside `[0, 1]`), then translated to the cell's
//! pixel origin.

use glam::DVec2;

use crate::canvas::Element;
use crate::errors::{MarkupError, RenderWarning};
use crate::fragment::{Drawn, LiteralOp, Opcode, Resolved};
use crate::parse::parse_markup;
use crate::types::Scale;

/// Attributes scaled by the x factor
const SCALED_BY_X: [&str; 2] = ["x", "font-size"];
/// Attributes scaled by the y factor
const SCALED_BY_Y: [&str; 1] = ["y"];

/// Scale one literal op. Ops that cannot be scaled are returned unchanged
/// and reported through `warnings`.
pub fn scale_op(op: &LiteralOp, scale: Scale, warnings: &mut Vec<RenderWarning>) -> LiteralOp {
    let group = match &op.opcode {
        Opcode::Move | Opcode::Line => 2,
        Opcode::Horizontal | Opcode::Vertical => 1,
        Opcode::Arc => 7,
        Opcode::Close | Opcode::Absolute(_) => return op.clone(),
        Opcode::Unknown(name) => {
            crate::log::warn!(opcode = %name, "unrecognized path opcode");
            warnings.push(RenderWarning::UnknownOpcode {
                opcode: name.clone(),
            });
            return op.clone();
        }
    };

    if op.args.is_empty() || op.args.len() % group != 0 {
        crate::log::warn!(opcode = %op.opcode, count = op.args.len(), "malformed path arguments");
        warnings.push(RenderWarning::MalformedArgs {
            opcode: op.opcode.to_string(),
            group,
            count: op.args.len(),
        });
        return op.clone();
    }

    let mut args = op.args.clone();
    for chunk in args.chunks_mut(group) {
        match op.opcode {
            Opcode::Move | Opcode::Line => {
                chunk[0] = scale.px_x(chunk[0]);
                chunk[1] = scale.px_y(chunk[1]);
            }
            Opcode::Horizontal => chunk[0] = scale.px_x(chunk[0]),
            Opcode::Vertical => chunk[0] = scale.px_y(chunk[0]),
            Opcode::Arc => {
                // rx ry rotation large-arc sweep stay as authored
                chunk[5] = scale.px_x(chunk[5]);
                chunk[6] = scale.px_y(chunk[6]);
            }
            _ => {}
        }
    }
    LiteralOp {
        opcode: op.opcode.clone(),
        args,
    }
}

/// Scale whitelisted attributes whose value lies in `[0, 1]`, throughout the tree
pub fn scale_markup(element: &mut Element, scale: Scale) {
    element.visit_mut(&mut |e: &mut Element| {
        for (names, factor) in [(&SCALED_BY_X[..], scale.x()), (&SCALED_BY_Y[..], scale.y())] {
            for name in names {
                if let Some(value) = e.numeric_attr(name) {
                    if (0.0..=1.0).contains(&value) {
                        e.set_numeric_attr(name, value * factor);
                    }
                }
            }
        }
    });
}

/// Translate `x`/`y` attributes throughout the tree. `font-size` is left alone.
pub fn nudge_markup(element: &mut Element, offset: DVec2) {
    if offset == DVec2::ZERO {
        return;
    }
    element.visit_mut(&mut |e: &mut Element| {
        if let Some(x) = e.numeric_attr("x") {
            e.set_numeric_attr("x", x + offset.x);
        }
        if let Some(y) = e.numeric_attr("y") {
            e.set_numeric_attr("y", y + offset.y);
        }
    });
}

/// Scale markup to pixels, then move it to `origin` (a cell's nudged pixel origin)
pub fn place_markup(element: &mut Element, scale: Scale, origin: DVec2) {
    scale_markup(element, scale);
    nudge_markup(element, origin);
}

/// Scale a resolved sequence for a cell whose pixel origin is `origin`.
///
/// Raw markup is parsed here; malformed markup aborts the render.
pub fn scale(
    fragments: &[Resolved],
    scale: Scale,
    origin: DVec2,
    warnings: &mut Vec<RenderWarning>,
) -> Result<Vec<Drawn>, MarkupError> {
    fragments
        .iter()
        .map(|fragment| match fragment {
            Resolved::Op(op) => Ok(Drawn::Op(scale_op(op, scale, warnings))),
            Resolved::Markup(raw) => {
                let mut element = parse_markup(&raw.source)?;
                place_markup(&mut element, scale, origin);
                Ok(Drawn::Markup(element))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::RawMarkup;
    use glam::dvec2;

    fn scaled(op: LiteralOp, sx: f64, sy: f64) -> (LiteralOp, Vec<RenderWarning>) {
        let mut warnings = Vec::new();
        let out = scale_op(&op, Scale::try_new(sx, sy).unwrap(), &mut warnings);
        (out, warnings)
    }

    #[test]
    fn move_scales_both_args() {
        let (out, warnings) = scaled(LiteralOp::move_to(3.0, 4.0), 10.0, 10.0);
        assert_eq!(out, LiteralOp::move_to(30.0, 40.0));
        assert!(warnings.is_empty());
    }

    #[test]
    fn horizontal_and_vertical_use_their_axis() {
        let (h, _) = scaled(LiteralOp::new(Opcode::Horizontal, [5.0]), 10.0, 2.0);
        assert_eq!(h.args, vec![50.0]);
        let (v, _) = scaled(LiteralOp::new(Opcode::Vertical, [5.0]), 10.0, 2.0);
        assert_eq!(v.args, vec![10.0]);
    }

    #[test]
    fn arc_scales_only_the_endpoint() {
        let arc = LiteralOp::new(Opcode::Arc, [0.5, 0.5, 30.0, 0.0, 1.0, 3.0, 4.0]);
        let (out, _) = scaled(arc, 10.0, 10.0);
        assert_eq!(out.args, vec![0.5, 0.5, 30.0, 0.0, 1.0, 30.0, 40.0]);
    }

    #[test]
    fn results_are_rounded() {
        let (out, _) = scaled(LiteralOp::line(0.333, -0.25), 10.0, 10.0);
        assert_eq!(out, LiteralOp::line(3.0, -3.0));
    }

    #[test]
    fn repeated_pairs_are_all_scaled() {
        let (out, _) = scaled(LiteralOp::new(Opcode::Line, [1.0, 0.0, 0.0, 1.0]), 5.0, 5.0);
        assert_eq!(out.args, vec![5.0, 0.0, 0.0, 5.0]);
    }

    #[test]
    fn absolute_ops_pass_through() {
        let abs = LiteralOp::new(Opcode::Absolute('L'), [3.0, 4.0]);
        let (out, warnings) = scaled(abs.clone(), 10.0, 10.0);
        assert_eq!(out, abs);
        assert!(warnings.is_empty());
    }

    #[test]
    fn unknown_opcode_warns_and_passes_through() {
        let curve = LiteralOp::new(Opcode::Unknown("c".into()), [1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let (out, warnings) = scaled(curve.clone(), 10.0, 10.0);
        assert_eq!(out, curve);
        assert_eq!(
            warnings,
            vec![RenderWarning::UnknownOpcode { opcode: "c".into() }]
        );
    }

    #[test]
    fn odd_argument_count_warns() {
        let (out, warnings) = scaled(LiteralOp::new(Opcode::Move, [1.0, 2.0, 3.0]), 10.0, 10.0);
        assert_eq!(out.args, vec![1.0, 2.0, 3.0]);
        assert!(matches!(
            warnings[0],
            RenderWarning::MalformedArgs { group: 2, count: 3, .. }
        ));
    }

    #[test]
    fn bare_opcode_warns() {
        for opcode in [Opcode::Move, Opcode::Horizontal, Opcode::Arc] {
            let (out, warnings) = scaled(LiteralOp::new(opcode.clone(), Vec::new()), 10.0, 10.0);
            assert!(out.args.is_empty());
            assert!(
                matches!(warnings[..], [RenderWarning::MalformedArgs { count: 0, .. }]),
                "{opcode}: {warnings:?}"
            );
        }
        let (_, warnings) = scaled(LiteralOp::new(Opcode::Close, Vec::new()), 10.0, 10.0);
        assert!(warnings.is_empty());
    }

    #[test]
    fn markup_scales_only_fractions() {
        let mut text = Element::new("text")
            .with_attr("x", "0.5")
            .with_attr("y", "1")
            .with_attr("font-size", "0.25")
            .with_attr("width", "0.5");
        let mut abs = Element::new("text").with_attr("x", "12").with_attr("y", "-3");
        let scale = Scale::try_new(100.0, 40.0).unwrap();

        scale_markup(&mut text, scale);
        scale_markup(&mut abs, scale);

        assert_eq!(text.attr("x"), Some("50"));
        assert_eq!(text.attr("y"), Some("40"));
        assert_eq!(text.attr("font-size"), Some("25"));
        assert_eq!(text.attr("width"), Some("0.5"));
        assert_eq!(abs.attr("x"), Some("12"));
        assert_eq!(abs.attr("y"), Some("-3"));
    }

    #[test]
    fn nudge_moves_position_not_size() {
        let mut text = Element::new("text")
            .with_attr("x", "50")
            .with_attr("y", "40")
            .with_attr("font-size", "25");
        nudge_markup(&mut text, dvec2(10.0, 5.0));
        assert_eq!(text.attr("x"), Some("60"));
        assert_eq!(text.attr("y"), Some("45"));
        assert_eq!(text.attr("font-size"), Some("25"));
    }

    #[test]
    fn scale_places_markup_at_cell_origin() {
        let fragments = vec![
            Resolved::Op(LiteralOp::line(1.0, 0.0)),
            Resolved::Markup(RawMarkup::new(r#"<text x="0.5" y="0.5">A</text>"#)),
        ];
        let mut warnings = Vec::new();
        let out = scale(&fragments, Scale::uniform(100.0).unwrap(), dvec2(200.0, 100.0), &mut warnings).unwrap();
        assert_eq!(out[0], Drawn::Op(LiteralOp::line(100.0, 0.0)));
        let Drawn::Markup(text) = &out[1] else {
            panic!("expected markup");
        };
        assert_eq!(text.attr("x"), Some("250"));
        assert_eq!(text.attr("y"), Some("150"));
    }

    #[test]
    fn malformed_markup_is_fatal() {
        let fragments = vec![Resolved::Markup(RawMarkup::new("<text>A</tex>"))];
        let mut warnings = Vec::new();
        assert!(scale(&fragments, Scale::default(), DVec2::ZERO, &mut warnings).is_err());
    }
}
