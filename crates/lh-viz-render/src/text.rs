use crate::primitives::{FontWeight, TextStyle};

#[derive(Debug, Clone, Copy)]
pub struct TextMetrics {
    pub width: f64,
    pub height: f64,
    pub ascent: f64,
}

/// Average advance of a sans-serif glyph, in ems.
const MEAN_ADVANCE_EM: f64 = 0.55;
const BOLD_FACTOR: f64 = 1.07;

/// Estimate text extents in points.
///
/// No font files are embedded, so widths come from a mean glyph advance;
/// narrow and wide glyphs are weighted to keep labels from overlapping.
pub fn measure_text(text: &str, style: &TextStyle) -> TextMetrics {
    let ems: f64 = text
        .chars()
        .map(|c| match c {
            'i' | 'j' | 'l' | 'I' | '.' | ',' | ':' | ';' | '|' | '\'' | '!' | '(' | ')' | ' ' => 0.3,
            'm' | 'w' | 'M' | 'W' => 0.85,
            c if c.is_ascii_uppercase() => 0.68,
            _ => MEAN_ADVANCE_EM,
        })
        .sum();
    let weight = if style.weight == FontWeight::Bold { BOLD_FACTOR } else { 1.0 };
    TextMetrics {
        width: ems * style.size * weight,
        height: style.size * 1.2,
        ascent: style.size * 0.93,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wider_for_longer_and_bolder_text() {
        let regular = TextStyle { size: 12.0, ..Default::default() };
        let bold = TextStyle { weight: FontWeight::Bold, ..regular.clone() };
        let short = measure_text("Q1", &regular);
        let long = measure_text("Q4: High Spending", &regular);
        assert!(long.width > short.width * 3.0);
        assert!(measure_text("Control", &bold).width > measure_text("Control", &regular).width);
        assert!(short.height > 12.0 && short.ascent > 0.0);
    }
}
