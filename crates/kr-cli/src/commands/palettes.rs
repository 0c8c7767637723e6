//! Palettes command: lists the configured tag palettes with swatches.

use std::io::{self, Write};

use anyhow::Result;
use kr_core::{BarRenderer, Palette, PaletteSet};

use crate::Config;
use crate::commands::report::color_enabled;

/// Cells drawn per palette color.
const SWATCH_WIDTH: usize = 2;

/// Writes one line per palette, marking the active one.
pub fn write_palettes<W: Write>(
    writer: &mut W,
    palettes: &PaletteSet,
    active: &str,
    renderer: &BarRenderer,
) -> io::Result<()> {
    let name_width = palettes.names().map(|n| n.chars().count()).max().unwrap_or(0);

    for palette in palettes.iter() {
        let marker = if palette.name() == active { "*" } else { " " };
        writeln!(
            writer,
            "{marker} {:<name_width$} {} {}",
            palette.name(),
            swatches(palette, renderer),
            codes(palette),
        )?;
    }
    Ok(())
}

fn swatches(palette: &Palette, renderer: &BarRenderer) -> String {
    palette
        .colors()
        .iter()
        .map(|&color| renderer.paint_bar(Some(color), SWATCH_WIDTH))
        .collect()
}

fn codes(palette: &Palette) -> String {
    let codes: Vec<String> = palette.colors().iter().map(ToString::to_string).collect();
    format!("[{}]", codes.join(", "))
}

/// Runs the palettes command.
pub fn run(config: &Config, no_color: bool) -> Result<()> {
    let palettes = config.palette_set();
    let renderer = BarRenderer::new(config.bar_width, color_enabled(no_color));

    if palettes.get(&config.palette).is_err() {
        tracing::warn!(palette = %config.palette, "configured palette does not exist");
    }

    let mut stdout = io::stdout().lock();
    write_palettes(&mut stdout, &palettes, &config.palette, &renderer)?;
    Ok(())
}
