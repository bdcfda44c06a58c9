//! Parse table column text into fragments, tag entries and markup trees

use pest::Parser;
use pest::iterators::Pair;

use crate::canvas::{Element, Node};
use crate::errors::{DrawCodeError, MarkupError, SourceContext, pest_span};
use crate::fragment::{CellRef, Fragment, LiteralOp, Opcode, RawMarkup, TagEntry};
use crate::types::TileId;
use crate::{DrawParser, Rule};

/// Parse a draw-code column into fragments.
///
/// `name` labels the source in diagnostics (e.g. `tile wall / path`).
pub fn parse_draw_code(name: &str, source: &str) -> Result<Vec<Fragment>, DrawCodeError> {
    let ctx = SourceContext::new(name, source);
    let pairs = DrawParser::parse(Rule::draw_code, source).map_err(|e| DrawCodeError {
        message: e.variant.message().to_string(),
        src: ctx.named_source(),
        span: pest_span(&e),
    })?;

    let mut fragments = Vec::new();
    for pair in pairs {
        if pair.as_rule() == Rule::draw_code {
            for inner in pair.into_inner() {
                if inner.as_rule() != Rule::EOI {
                    fragments.push(parse_fragment(&ctx, inner)?);
                }
            }
        }
    }
    Ok(fragments)
}

/// Parse a tag-list column: `lit: torch / dark; wet: - / dry-floor`
pub fn parse_tag_list(name: &str, source: &str) -> Result<Vec<TagEntry>, DrawCodeError> {
    let ctx = SourceContext::new(name, source);
    let pairs = DrawParser::parse(Rule::tag_list, source).map_err(|e| DrawCodeError {
        message: e.variant.message().to_string(),
        src: ctx.named_source(),
        span: pest_span(&e),
    })?;

    let mut entries = Vec::new();
    for pair in pairs {
        if pair.as_rule() == Rule::tag_list {
            for inner in pair.into_inner() {
                if inner.as_rule() == Rule::tag_entry {
                    entries.push(parse_tag_entry(&ctx, inner)?);
                }
            }
        }
    }
    Ok(entries)
}

fn parse_tag_entry(ctx: &SourceContext, pair: Pair<Rule>) -> Result<TagEntry, DrawCodeError> {
    let mut inner = pair.into_inner();
    let tag = inner
        .next()
        .map(|p| p.as_str().to_string())
        .unwrap_or_default();
    let normal = match inner.next() {
        Some(choice) => parse_tag_choice(ctx, choice)?,
        None => None,
    };
    let inverted = match inner.next() {
        Some(choice) => parse_tag_choice(ctx, choice)?,
        None => None,
    };
    Ok(TagEntry {
        tag,
        normal,
        inverted,
    })
}

fn parse_tag_choice(
    ctx: &SourceContext,
    pair: Pair<Rule>,
) -> Result<Option<Fragment>, DrawCodeError> {
    let span = pair.as_span();
    let Some(inner) = pair.into_inner().next() else {
        return Err(error_at(ctx, span, "empty tag choice"));
    };
    if inner.as_rule() == Rule::absent {
        return Ok(None);
    }
    parse_fragment(ctx, inner).map(Some)
}

fn parse_fragment(ctx: &SourceContext, pair: Pair<Rule>) -> Result<Fragment, DrawCodeError> {
    match pair.as_rule() {
        Rule::literal_op => parse_literal_op(ctx, pair).map(Fragment::Op),
        Rule::tile_ref => Ok(Fragment::Tile(TileId::from(pair.as_str()))),
        Rule::cell_ref => parse_cell_ref(ctx, pair).map(Fragment::Cell),
        Rule::markup_element => Ok(Fragment::Markup(RawMarkup::new(pair.as_str()))),
        other => Err(error_at(
            ctx,
            pair.as_span(),
            format!("unexpected {:?} in draw code", other),
        )),
    }
}

fn parse_literal_op(ctx: &SourceContext, pair: Pair<Rule>) -> Result<LiteralOp, DrawCodeError> {
    let mut opcode = None;
    let mut args = Vec::new();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::opcode => {
                let letter = inner.as_str().chars().next().unwrap_or('?');
                opcode = Some(Opcode::from_letter(letter));
            }
            Rule::number => {
                let value = inner
                    .as_str()
                    .parse::<f64>()
                    .map_err(|e| error_at(ctx, inner.as_span(), e.to_string()))?;
                args.push(value);
            }
            _ => {}
        }
    }
    let opcode = opcode.unwrap_or_else(|| Opcode::Unknown(String::new()));
    Ok(LiteralOp { opcode, args })
}

fn parse_cell_ref(ctx: &SourceContext, pair: Pair<Rule>) -> Result<CellRef, DrawCodeError> {
    let span = pair.as_span();
    let mut absolute = false;
    let mut coords = Vec::with_capacity(2);
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::absolute_marker => absolute = true,
            Rule::int => {
                let value = inner
                    .as_str()
                    .parse::<i32>()
                    .map_err(|e| error_at(ctx, inner.as_span(), e.to_string()))?;
                coords.push(value);
            }
            _ => {}
        }
    }
    match coords.as_slice() {
        [dx, dy] => Ok(CellRef {
            dx: *dx,
            dy: *dy,
            absolute,
        }),
        _ => Err(error_at(ctx, span, "cell reference needs two coordinates")),
    }
}

fn error_at(ctx: &SourceContext, span: pest::Span, message: impl Into<String>) -> DrawCodeError {
    DrawCodeError {
        message: message.into(),
        src: ctx.named_source(),
        span: (span.start(), span.end() - span.start()).into(),
    }
}

// ============================================================================
// Markup
// ============================================================================

/// Parse a single markup element
pub fn parse_markup(source: &str) -> Result<Element, MarkupError> {
    let ctx = SourceContext::new("<markup>", source);
    let pairs = DrawParser::parse(Rule::markup_document, source)
        .map_err(|e| markup_error(&ctx, &e))?;

    for pair in pairs {
        if pair.as_rule() == Rule::markup_document {
            for inner in pair.into_inner() {
                if inner.as_rule() == Rule::markup_element {
                    return Ok(build_element(inner));
                }
            }
        }
    }
    Err(MarkupError {
        message: "no element found".to_string(),
        src: ctx.named_source(),
        span: (0, source.len()).into(),
    })
}

/// Parse zero or more consecutive markup elements (an overlay column)
pub fn parse_markup_list(name: &str, source: &str) -> Result<Vec<Element>, MarkupError> {
    let ctx = SourceContext::new(name, source);
    let pairs =
        DrawParser::parse(Rule::markup_list, source).map_err(|e| markup_error(&ctx, &e))?;

    let mut elements = Vec::new();
    for pair in pairs {
        if pair.as_rule() == Rule::markup_list {
            for inner in pair.into_inner() {
                if inner.as_rule() == Rule::markup_element {
                    elements.push(build_element(inner));
                }
            }
        }
    }
    Ok(elements)
}

fn markup_error(ctx: &SourceContext, err: &pest::error::Error<Rule>) -> MarkupError {
    MarkupError {
        message: err.variant.message().to_string(),
        src: ctx.named_source(),
        span: pest_span(err),
    }
}

fn build_element(pair: Pair<Rule>) -> Element {
    let mut element = Element::default();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::tag_name => element.name = inner.as_str().to_string(),
            Rule::attribute => {
                let mut parts = inner.into_inner();
                let name = parts.next().map(|p| p.as_str()).unwrap_or_default();
                let value = parts.next().map(|p| p.as_str()).unwrap_or_default();
                element.attributes.push((name.to_string(), value.to_string()));
            }
            Rule::markup_element => element.children.push(Node::Element(build_element(inner))),
            Rule::markup_text => element.children.push(Node::Text(inner.as_str().to_string())),
            Rule::markup_comment => {
                let raw = inner.as_str();
                let body = raw
                    .strip_prefix("<!--")
                    .and_then(|s| s.strip_suffix("-->"))
                    .unwrap_or(raw);
                element.children.push(Node::Comment(body.to_string()));
            }
            _ => {}
        }
    }
    element
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ops(source: &str) -> Vec<Fragment> {
        parse_draw_code("test", source).unwrap()
    }

    #[test]
    fn literal_ops_and_refs() {
        let fragments = ops("m 1 0 l 0,1 wall (1, 0) =(3 -4) z");
        assert_eq!(
            fragments,
            vec![
                Fragment::Op(LiteralOp::move_to(1.0, 0.0)),
                Fragment::Op(LiteralOp::line(0.0, 1.0)),
                Fragment::Tile(TileId::from("wall")),
                Fragment::Cell(CellRef::relative(1, 0)),
                Fragment::Cell(CellRef::absolute(3, -4)),
                Fragment::Op(LiteralOp::new(Opcode::Close, Vec::new())),
            ]
        );
    }

    #[test]
    fn arc_and_absolute_ops() {
        let fragments = ops("a 0.5 0.5 0 0 1 .5 -.5 M 10 20");
        assert_eq!(
            fragments,
            vec![
                Fragment::Op(LiteralOp::new(
                    Opcode::Arc,
                    [0.5, 0.5, 0.0, 0.0, 1.0, 0.5, -0.5]
                )),
                Fragment::Op(LiteralOp::new(Opcode::Absolute('M'), [10.0, 20.0])),
            ]
        );
    }

    #[test]
    fn hyphenated_tile_ids() {
        assert_eq!(ops("door-n"), vec![Fragment::Tile(TileId::from("door-n"))]);
    }

    #[test]
    fn unknown_single_letter_is_an_opcode() {
        assert_eq!(
            ops("q 1 2 3 4"),
            vec![Fragment::Op(LiteralOp::new(
                Opcode::Unknown("q".into()),
                [1.0, 2.0, 3.0, 4.0]
            ))]
        );
    }

    #[test]
    fn markup_in_draw_code_keeps_source() {
        let fragments = ops(r#"h 1 <text x="0.5" y="0.5">A</text> v 1"#);
        assert_eq!(
            fragments[1],
            Fragment::Markup(RawMarkup::new(r#"<text x="0.5" y="0.5">A</text>"#))
        );
        assert_eq!(fragments.len(), 3);
    }

    #[test]
    fn empty_draw_code() {
        assert!(ops("   ").is_empty());
    }

    #[test]
    fn bad_draw_code_reports_span() {
        let err = parse_draw_code("tile x / path", "m 1 0 %").unwrap_err();
        assert_eq!(err.span.offset(), 6);
    }

    #[test]
    fn tag_lists() {
        let entries = parse_tag_list("tags", "lit: torch / m 1 1; wet: - / puddle; bare: rubble").unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].tag, "lit");
        assert_eq!(entries[0].normal, Some(Fragment::Tile(TileId::from("torch"))));
        assert_eq!(
            entries[0].inverted,
            Some(Fragment::Op(LiteralOp::move_to(1.0, 1.0)))
        );
        assert_eq!(entries[1].normal, None);
        assert_eq!(entries[1].inverted, Some(Fragment::Tile(TileId::from("puddle"))));
        assert_eq!(entries[2].inverted, None);
    }

    #[test]
    fn markup_tree() {
        let element = parse_markup(
            r#"<g class='x'><text x="0.5" font-size="0.3">A &amp; B</text><!--c--><rect/></g>"#,
        )
        .unwrap();
        assert_eq!(element.name, "g");
        assert_eq!(element.attr("class"), Some("x"));
        assert_eq!(element.children.len(), 3);
        let Node::Element(text) = &element.children[0] else {
            panic!("expected text element");
        };
        assert_eq!(text.numeric_attr("font-size"), Some(0.3));
        assert_eq!(text.children, vec![Node::Text("A &amp; B".into())]);
        assert_eq!(element.children[1], Node::Comment("c".into()));
    }

    #[test]
    fn mismatched_close_tag_fails() {
        assert!(parse_markup("<g><text>A</g></text>").is_err());
        assert!(parse_markup("<g>").is_err());
    }

    #[test]
    fn markup_lists() {
        let elements = parse_markup_list("overlay", r#"<text>A</text> <circle r="1"/>"#).unwrap();
        assert_eq!(elements.len(), 2);
        assert_eq!(elements[1].name, "circle");
        assert!(parse_markup_list("overlay", "").unwrap().is_empty());
    }
}
