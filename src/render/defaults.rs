//! Default render settings

/// Pixels per dungeon unit
pub const SCALE: f64 = 100.0;

/// Category merged into the main path
pub const PRIMARY_CATEGORY: &str = "path";

/// Categories drawn as their own paths, in output order
pub const SECONDARY_CATEGORIES: [&str; 3] = ["water", "stairs", "decorations"];

/// Style for any category without configured attributes
pub const FALLBACK_PATH_ATTRIBUTES: &[(&str, &str)] = &[
    ("fill", "none"),
    ("stroke", "black"),
    ("stroke-width", "1"),
];

/// Built-in style per category
pub const PATH_ATTRIBUTES: &[(&str, &[(&str, &str)])] = &[
    (
        "path",
        &[
            ("fill", "none"),
            ("stroke", "black"),
            ("stroke-width", "2"),
            ("stroke-linecap", "round"),
            ("stroke-linejoin", "round"),
        ],
    ),
    (
        "water",
        &[("fill", "#9ec9e8"), ("stroke", "#4a7fa8"), ("stroke-width", "1")],
    ),
    ("stairs", &[("fill", "none"), ("stroke", "black"), ("stroke-width", "1")]),
    (
        "decorations",
        &[("fill", "none"), ("stroke", "#555555"), ("stroke-width", "1")],
    ),
];
