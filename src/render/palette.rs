//! Topic color palette for the chart.

/// Fill alpha for chart bars.
pub const FILL_ALPHA: f64 = 0.6;

/// Border alpha for chart bars.
pub const BORDER_ALPHA: f64 = 0.8;

/// Ten RGB colors, cycled by topic index.
const COLORS: [(u8, u8, u8); 10] = [
    (239, 68, 68),   // red
    (34, 197, 94),   // green
    (59, 130, 246),  // blue
    (245, 158, 11),  // orange
    (168, 85, 247),  // purple
    (236, 72, 153),  // pink
    (14, 165, 233),  // sky
    (132, 204, 22),  // lime
    (251, 113, 133), // rose
    (156, 163, 175), // gray
];

/// CSS `rgba()` color for a topic index.
pub fn topic_color(index: usize, alpha: f64) -> String {
    let (r, g, b) = COLORS[index % COLORS.len()];
    format!("rgba({r}, {g}, {b}, {alpha})")
}
