use ratatui::style::Color;
use serde::{Serialize, Serializer};
use std::fmt;

/// An `rgba(r, g, b, a)` colour; channels may be fractional after interpolation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Rgba {
    pub const fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

impl Serialize for Rgba {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl From<Rgba> for Color {
    fn from(c: Rgba) -> Self {
        let channel = |v: f64| v.round().clamp(0.0, 255.0) as u8;
        Color::Rgb(channel(c.r), channel(c.g), channel(c.b))
    }
}

pub const PRIMARY: Rgba = Rgba::new(255.0, 107.0, 53.0, 0.8);
pub const PRIMARY_SOLID: Rgba = Rgba::new(255.0, 107.0, 53.0, 1.0);
pub const PRIMARY_FILL: Rgba = Rgba::new(255.0, 107.0, 53.0, 0.2);
pub const OUTLINE: Rgba = Rgba::new(255.0, 255.0, 255.0, 0.8);
pub const TRANSPARENT: Rgba = Rgba::new(0.0, 0.0, 0.0, 0.0);
pub const PLOT_BACKGROUND: Rgba = Rgba::new(255.0, 255.0, 255.0, 0.3);

/// Series colours for multi-line charts, cycled by series index
pub const SERIES_PALETTE: [Rgba; 6] = [
    Rgba::new(255.0, 107.0, 53.0, 1.0),
    Rgba::new(78.0, 205.0, 196.0, 1.0),
    Rgba::new(142.0, 68.0, 173.0, 1.0),
    Rgba::new(52.0, 152.0, 219.0, 1.0),
    Rgba::new(46.0, 204.0, 113.0, 1.0),
    Rgba::new(241.0, 196.0, 15.0, 1.0),
];

pub fn series_color(index: usize) -> Rgba {
    SERIES_PALETTE[index % SERIES_PALETTE.len()]
}

/// Orange gradient across `count` items, from the primary colour towards amber
pub fn gradient(count: usize) -> Vec<Rgba> {
    let span = count.saturating_sub(1).max(1) as f64;
    (0..count)
        .map(|i| {
            let ratio = i as f64 / span;
            Rgba::new(255.0, 107.0 + ratio * 40.0, 53.0 - ratio * 23.0, 0.8)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_like_css() {
        assert_eq!(PRIMARY.to_string(), "rgba(255, 107, 53, 0.8)");
        assert_eq!(SERIES_PALETTE[1].to_string(), "rgba(78, 205, 196, 1)");
    }

    #[test]
    fn gradient_runs_end_to_end() {
        let colors = gradient(3);
        assert_eq!(colors[0], PRIMARY);
        assert_eq!(colors[1], Rgba::new(255.0, 127.0, 41.5, 0.8));
        assert_eq!(colors[2], Rgba::new(255.0, 147.0, 30.0, 0.8));
    }

    #[test]
    fn single_item_gradient_uses_start_colour() {
        assert_eq!(gradient(1), vec![PRIMARY]);
        assert!(gradient(0).is_empty());
    }

    #[test]
    fn palette_wraps() {
        assert_eq!(series_color(6), series_color(0));
        assert_ne!(series_color(0), series_color(1));
    }

    #[test]
    fn converts_to_terminal_colour() {
        assert_eq!(Color::from(Rgba::new(255.0, 127.4, 41.5, 0.8)), Color::Rgb(255, 127, 42));
    }
}
