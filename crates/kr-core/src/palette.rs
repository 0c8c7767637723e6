//! Stable tag-to-color assignment.
//!
//! Tags are sorted lexically and handed colors from a named palette in order.
//! Once the palette runs out, each further tag gets an overflow color that is
//! a pure function of its sorted index. Overflow colors aim for visual
//! distinctness but may repeat for very large tag sets; that is accepted.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use anstyle::{Ansi256Color, Color, Style};
use serde::Serialize;

use crate::error::CoreError;
use crate::model::Project;

/// Name of the palette used when none is configured.
pub const DEFAULT_PALETTE: &str = "tableau10";

/// 256-color code ranges used once the palette is exhausted, one hue band each.
const OVERFLOW_RANGES: [(u16, u16); 8] = [
    (52, 88),   // reds/magentas
    (22, 58),   // greens
    (17, 53),   // blues
    (130, 166), // oranges/browns
    (89, 125),  // purples
    (59, 95),   // cyans/teals
    (160, 196), // more reds
    (70, 106),  // more greens
];

/// Darkest overflow code; anything below is folded back above it.
const OVERFLOW_MIN: u16 = 52;
/// Brightest overflow code before the grayscale ramp.
const OVERFLOW_MAX: u16 = 231;

/// A 256-color terminal color code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ColorCode(pub u8);

impl ColorCode {
    /// Foreground style for this color.
    pub fn style(self) -> Style {
        Style::new().fg_color(Some(Color::Ansi256(Ansi256Color(self.0))))
    }
}

impl fmt::Display for ColorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A named, ordered sequence of colors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    name: String,
    colors: Vec<ColorCode>,
}

impl Palette {
    pub fn new(name: impl Into<String>, colors: Vec<ColorCode>) -> Self {
        Self {
            name: name.into(),
            colors,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn colors(&self) -> &[ColorCode] {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

/// All configured palettes, looked up by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaletteSet {
    palettes: BTreeMap<String, Palette>,
}

impl PaletteSet {
    /// The built-in `colorbrewer` and `tableau10` palettes.
    pub fn builtin() -> Self {
        Self::from_codes(builtin_codes())
    }

    /// Builds a set from raw color codes keyed by palette name.
    pub fn from_codes(codes: BTreeMap<String, Vec<u8>>) -> Self {
        let palettes = codes
            .into_iter()
            .map(|(name, codes)| {
                let palette = Palette::new(name.clone(), codes.into_iter().map(ColorCode).collect());
                (name, palette)
            })
            .collect();
        Self { palettes }
    }

    /// Looks up a palette by name.
    pub fn get(&self, name: &str) -> Result<&Palette, CoreError> {
        self.palettes
            .get(name)
            .ok_or_else(|| CoreError::UnknownPalette {
                name: name.to_string(),
                available: self.names().collect::<Vec<_>>().join(", "),
            })
    }

    /// Palette names in lexical order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.palettes.keys().map(String::as_str)
    }

    /// Palettes in lexical name order.
    pub fn iter(&self) -> impl Iterator<Item = &Palette> {
        self.palettes.values()
    }
}

impl Default for PaletteSet {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Raw codes for the built-in palettes, suitable as configuration defaults.
pub fn builtin_codes() -> BTreeMap<String, Vec<u8>> {
    BTreeMap::from([
        (
            "colorbrewer".to_string(),
            vec![115, 230, 146, 210, 110, 216, 150, 218, 188, 139, 194, 228],
        ),
        (
            "tableau10".to_string(),
            vec![68, 215, 71, 210, 140, 137, 212, 248, 186, 116],
        ),
    ])
}

/// Tag-to-color mapping for one report run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ColorAssignment {
    colors: BTreeMap<String, ColorCode>,
}

impl ColorAssignment {
    pub fn get(&self, tag: &str) -> Option<ColorCode> {
        self.colors.get(tag).copied()
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Assignments in lexical tag order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, ColorCode)> {
        self.colors.iter().map(|(tag, color)| (tag.as_str(), *color))
    }
}

/// Assigns a color to every distinct tag.
///
/// The result depends only on the set of tags, never on input order.
pub fn assign<I, S>(tags: I, palette: &Palette) -> ColorAssignment
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let sorted: BTreeSet<String> = tags.into_iter().map(Into::into).collect();
    let palette_size = palette.len();

    if sorted.len() > palette_size {
        tracing::debug!(
            palette = palette.name(),
            palette_size,
            tag_count = sorted.len(),
            "palette exhausted, using overflow colors"
        );
    }

    let colors = sorted
        .into_iter()
        .enumerate()
        .map(|(index, tag)| {
            let color = palette
                .colors()
                .get(index)
                .copied()
                .unwrap_or_else(|| overflow_color(index, palette_size));
            (tag, color)
        })
        .collect();

    ColorAssignment { colors }
}

/// Assigns colors over every tag that appears on any entry of any project.
pub fn assign_tag_colors(projects: &[Project], palette: &Palette) -> ColorAssignment {
    let tags = projects
        .iter()
        .flat_map(Project::entries)
        .flat_map(|entry| entry.tags().iter().cloned());
    assign(tags, palette)
}

/// Color for the tag at sorted position `index`, past the end of the palette.
#[allow(clippy::cast_possible_truncation)]
pub fn overflow_color(index: usize, palette_size: usize) -> ColorCode {
    let overflow = index.saturating_sub(palette_size);
    let (start, end) = OVERFLOW_RANGES[overflow % OVERFLOW_RANGES.len()];
    let span = usize::from(end - start);
    let offset = (overflow / OVERFLOW_RANGES.len()) % span;

    // offset < span, so the sum stays inside u16
    let mut code = start + offset as u16;
    if code < OVERFLOW_MIN {
        code = OVERFLOW_MIN + code % 20;
    }
    if code > OVERFLOW_MAX {
        code = OVERFLOW_MIN + (code - OVERFLOW_MAX) % 20;
    }

    // clamped into 52..=231 above
    ColorCode(code as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Day, TimeEntry};

    fn tableau() -> Palette {
        PaletteSet::builtin().get(DEFAULT_PALETTE).unwrap().clone()
    }

    fn small_palette() -> Palette {
        Palette::new("small", vec![ColorCode(1), ColorCode(2), ColorCode(3)])
    }

    #[test]
    fn test_builtin_palettes() {
        let set = PaletteSet::builtin();
        assert_eq!(set.names().collect::<Vec<_>>(), ["colorbrewer", "tableau10"]);
        assert_eq!(set.get("tableau10").unwrap().len(), 10);
        assert_eq!(set.get("colorbrewer").unwrap().len(), 12);
        assert_eq!(set.get("tableau10").unwrap().colors()[0], ColorCode(68));
    }

    #[test]
    fn test_unknown_palette_is_error() {
        let err = PaletteSet::builtin().get("nope").unwrap_err();
        assert!(matches!(err, CoreError::UnknownPalette { ref name, .. } if name == "nope"));
    }

    #[test]
    fn test_assign_empty_set() {
        let colors = assign(Vec::<String>::new(), &tableau());
        assert!(colors.is_empty());
    }

    #[test]
    fn test_assign_uses_lexical_order() {
        let colors = assign(["zeta", "alpha", "mid"], &small_palette());
        assert_eq!(colors.get("alpha"), Some(ColorCode(1)));
        assert_eq!(colors.get("mid"), Some(ColorCode(2)));
        assert_eq!(colors.get("zeta"), Some(ColorCode(3)));
    }

    #[test]
    fn test_assign_is_input_order_independent() {
        let a = assign(["c", "a", "b", "e", "d"], &small_palette());
        let b = assign(["e", "d", "c", "b", "a", "a"], &small_palette());
        assert_eq!(a, b);
    }

    #[test]
    fn test_assign_is_injective_within_palette() {
        let tags: Vec<String> = (0..10).map(|i| format!("tag{i}")).collect();
        let colors = assign(tags, &tableau());
        let distinct: BTreeSet<_> = colors.iter().map(|(_, c)| c).collect();
        assert_eq!(distinct.len(), 10);
    }

    #[test]
    fn test_assign_depends_only_on_sorted_rank() {
        let before = assign(["b", "c"], &small_palette());
        let after = assign(["b", "c", "d"], &small_palette());
        assert_eq!(before.get("b"), after.get("b"));
        assert_eq!(before.get("c"), after.get("c"));

        // a new tag sorting first shifts everyone after it
        let shifted = assign(["a", "b", "c"], &small_palette());
        assert_eq!(shifted.get("b"), Some(ColorCode(2)));
    }

    #[test]
    fn test_overflow_tags_get_overflow_colors() {
        let colors = assign(["a", "b", "c", "d", "e"], &small_palette());
        assert_eq!(colors.get("d"), Some(overflow_color(3, 3)));
        assert_eq!(colors.get("e"), Some(overflow_color(4, 3)));
    }

    #[test]
    fn test_overflow_first_pass_walks_range_starts() {
        // first eight overflow tags take the start of each band, folded up when too dark
        let codes: Vec<u8> = (0..8).map(|i| overflow_color(10 + i, 10).0).collect();
        assert_eq!(codes, [52, 54, 69, 130, 89, 59, 160, 70]);
    }

    #[test]
    fn test_overflow_second_pass_steps_within_band() {
        assert_eq!(overflow_color(18, 10), ColorCode(53));
        assert_eq!(overflow_color(19, 10), ColorCode(55));
        assert_eq!(overflow_color(21, 10), ColorCode(131));
    }

    #[test]
    fn test_overflow_wraps_within_band() {
        // 36 passes through a band wraps back to its start
        assert_eq!(overflow_color(10 + 8 * 36, 10), overflow_color(10, 10));
    }

    #[test]
    fn test_overflow_stays_in_bounds_for_large_indices() {
        for index in 0..5_000 {
            let code = overflow_color(index, 0).0;
            assert!((52..=231).contains(&code), "index {index} gave {code}");
        }
    }

    #[test]
    fn test_empty_palette_overflows_everything() {
        let colors = assign(["a", "b"], &Palette::new("none", vec![]));
        assert_eq!(colors.get("a"), Some(overflow_color(0, 0)));
        assert_eq!(colors.get("b"), Some(overflow_color(1, 0)));
    }

    #[test]
    fn test_assign_tag_colors_collects_all_projects() {
        let projects = vec![
            Project::new(
                "alpha",
                vec![Day::new("2025-01-29", vec![TimeEntry::new("a", 10, ["y", "x"])])],
            ),
            Project::new(
                "beta",
                vec![Day::new("2025-01-29", vec![TimeEntry::new("b", 0, ["w"])])],
            ),
        ];
        let colors = assign_tag_colors(&projects, &small_palette());
        let tags: Vec<_> = colors.iter().map(|(tag, _)| tag).collect();
        assert_eq!(tags, ["w", "x", "y"]);
        assert_eq!(colors.get("w"), Some(ColorCode(1)));
    }

    #[test]
    fn test_color_style_uses_256_color() {
        let style = ColorCode(68).style();
        assert_eq!(
            style.get_fg_color(),
            Some(Color::Ansi256(Ansi256Color(68)))
        );
    }
}
