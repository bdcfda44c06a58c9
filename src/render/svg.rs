//! SVG generation

use crate::canvas::Canvas;

use super::path::SerializedPath;
use super::{Composition, RenderOptions};

/// Put a composition on a canvas and serialize it.
///
/// Order: the main path and its markup, each non-empty secondary path with
/// its markup, then tile overlays.
pub fn generate_svg(composition: &Composition, options: &RenderOptions) -> String {
    let mut canvas = Canvas::with_view_box(composition.view_origin, composition.size);

    draw_path(
        &mut canvas,
        &composition.main,
        options,
        &options.primary_category,
    );

    for (category, path) in &composition.secondary {
        if path.is_empty() {
            continue;
        }
        draw_path(&mut canvas, path, options, category);
    }

    for overlay in &composition.overlays {
        canvas.append(overlay.clone());
    }

    crate::log::debug!(
        width = composition.size.x,
        height = composition.size.y,
        "svg generated"
    );
    canvas.to_svg_string()
}

fn draw_path(canvas: &mut Canvas, path: &SerializedPath, options: &RenderOptions, category: &str) {
    if !path.d.is_empty() {
        let class = format!("dungeon-{category}");
        let attributes = options.attributes_for(category);
        canvas.add_path(
            &path.d,
            std::iter::once(("class", class.as_str())).chain(attributes),
        );
    }
    for element in &path.markup {
        canvas.append(element.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Element;
    use glam::{DVec2, dvec2};

    fn composition() -> Composition {
        Composition {
            main: SerializedPath {
                d: "M 0 0 h 100".into(),
                markup: vec![Element::new("circle").with_attr("r", "3")],
            },
            secondary: vec![
                (
                    "water".into(),
                    SerializedPath {
                        d: "M 0 0 l 50 50".into(),
                        markup: Vec::new(),
                    },
                ),
                ("stairs".into(), SerializedPath::default()),
            ],
            overlays: vec![Element::new("text").with_attr("x", "50")],
            warnings: Vec::new(),
            view_origin: DVec2::ZERO,
            size: dvec2(100.0, 100.0),
        }
    }

    #[test]
    fn document_order() {
        let svg = generate_svg(&composition(), &RenderOptions::new());
        let main = svg.find(r#"d="M 0 0 h 100""#).unwrap();
        let circle = svg.find("<circle").unwrap();
        let water = svg.find(r#"d="M 0 0 l 50 50""#).unwrap();
        let text = svg.find("<text").unwrap();
        assert!(main < circle && circle < water && water < text);
        assert!(!svg.contains("dungeon-stairs"));
    }

    #[test]
    fn view_box_starts_at_the_composition_origin() {
        let mut composition = composition();
        composition.view_origin = dvec2(-200.0, -100.0);
        let svg = generate_svg(&composition, &RenderOptions::new());
        assert!(svg.contains(r#"viewBox="-200 -100 100 100""#), "{svg}");
    }

    #[test]
    fn paths_carry_category_style() {
        let options = RenderOptions::new().with_path_attribute("water", "fill", "teal");
        let svg = generate_svg(&composition(), &options);
        assert!(svg.contains(r#"class="dungeon-water""#));
        assert!(svg.contains(r#"fill="teal""#));
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(r#"viewBox="0 0 100 100""#));
    }
}
