//! Path serialization: scaled fragments to instruction strings

use crate::canvas::Element;
use crate::fragment::{Drawn, LiteralOp};

/// A path ready for the canvas
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SerializedPath {
    /// Instruction string for the `d` attribute
    pub d: String,
    /// Markup met along the way, attached next to the path rather than inside it
    pub markup: Vec<Element>,
}

impl SerializedPath {
    pub fn is_empty(&self) -> bool {
        self.d.is_empty() && self.markup.is_empty()
    }
}

/// Serialize a sequence: ops become `opcode arg arg ...` joined by single
/// spaces, markup is split off in order.
pub fn serialize(sequence: &[Drawn]) -> SerializedPath {
    let mut commands = Vec::new();
    let mut markup = Vec::new();
    for item in sequence {
        match item {
            Drawn::Op(op) => commands.push(format_op(op)),
            Drawn::Markup(element) => markup.push(element.clone()),
        }
    }
    SerializedPath {
        d: commands.join(" "),
        markup,
    }
}

/// One command: `m 100 0`
pub fn format_op(op: &LiteralOp) -> String {
    let mut s = op.opcode.to_string();
    for arg in &op.args {
        s.push(' ');
        s.push_str(&fmt_num(*arg));
    }
    s
}

/// Format a number: whole numbers exactly, anything else with 6 significant
/// figures and trailing zeros trimmed.
pub fn fmt_num(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < MAX_EXACT_INTEGER {
        // `as i64` also folds -0.0 into 0
        return (value as i64).to_string();
    }
    fmt_num_precision(value, 6)
}

/// Largest magnitude below which every whole f64 is exact
const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Format a number with specified significant figures, trailing zeros trimmed.
fn fmt_num_precision(value: f64, sig_figs: i32) -> String {
    if value == 0.0 || !value.is_finite() {
        return if value.is_finite() {
            "0".to_string()
        } else {
            value.to_string()
        };
    }

    // Round to specified significant figures
    let abs_val = value.abs();
    let magnitude = abs_val.log10().floor() as i32;
    let scale = 10_f64.powi(sig_figs - 1 - magnitude);
    let rounded = (value * scale).round() / scale;

    // Format with enough decimal places, then trim
    let decimals = (sig_figs - 1 - magnitude).max(0) as usize;
    let s = format!("{:.prec$}", rounded, prec = decimals);
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s
    }
}
