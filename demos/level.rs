//! Render a small room with a pool, a torch and a doorway.
//!
//! Run with `RUST_LOG=dungeondraw=trace cargo run --example level --features tracing`
//! to see each cell being resolved.

use dungeondraw::{ActiveTags, CellPos, RenderOptions, TableStore, World, compose, generate_svg};

const TILES: &[[&str; 7]] = &[
    // id, path, water, stairs, decorations, tags, overlay
    ["wall-n", "h 1", "", "", "", "", ""],
    ["wall-s", "m 0 1 h 1", "", "", "", "", ""],
    ["wall-w", "v 1", "", "", "", "", ""],
    ["wall-e", "m 1 0 v 1", "", "", "", "", ""],
    ["door-n", "h 0.3 m 0.4 0 h 0.3", "", "", "", "", ""],
    [
        "pool",
        "",
        "m 0.2 0.3 l 0.6 0 l 0 0.4 l -0.6 0 z",
        "",
        "",
        "",
        "",
    ],
    [
        "sconce",
        "",
        "",
        "",
        "m 0.45 0.1 l 0.1 0",
        "lit: flame / -",
        r#"<text x="0.5" y="0.3" font-size="0.2" text-anchor="middle">T</text>"#,
    ],
    ["flame", "", "", "", "m 0.5 0.1 l 0 -0.08", "", ""],
    ["steps", "", "", "m 0.1 0.2 h 0.8 m -0.8 0.3 h 0.8 m -0.8 0.3 h 0.8", "", "", ""],
];

const CELLS: &[[&str; 6]] = &[
    // x, y, path, water, stairs, decorations
    ["0", "0", "wall-n wall-w", "", "", ""],
    ["1", "0", "door-n sconce", "", "", "sconce"],
    ["2", "0", "wall-n wall-e", "", "", ""],
    ["0", "1", "wall-w", "", "", ""],
    ["1", "1", "", "pool", "", ""],
    ["2", "1", "wall-e", "", "steps", ""],
    ["0", "2", "wall-s wall-w", "", "", ""],
    ["1", "2", "wall-s", "", "", ""],
    ["2", "2", "(0, -1) wall-s", "", "", ""],
];

fn main() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let store = TableStore::with_defaults();
    let mut world = World::new();
    store.load(&mut world, "tile", TILES.iter().map(|row| row.iter().copied()))?;
    store.load(&mut world, "cell", CELLS.iter().map(|row| row.iter().copied()))?;

    let dark = std::env::args().any(|arg| arg == "--dark");
    let options = RenderOptions::new()
        .with_scale(64.0)
        .with_nudge(8.0, 8.0)
        .with_active_tags(if dark {
            ActiveTags::none()
        } else {
            ActiveTags::All
        });

    let cells: Vec<CellPos> = world.cell_positions();
    let composition = compose(&world, &cells, &options)?;
    for warning in &composition.warnings {
        eprintln!("{:?}", miette::Report::new(warning.clone()));
    }
    println!("{}", generate_svg(&composition, &options));
    Ok(())
}
