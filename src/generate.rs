//! Placeholder cover generation.
//!
//! Terminal fallback of the source resolution chain: a fixed-size square
//! cover with the artist title as large centered text and a small
//! "Generated cover" caption. Text is rendered from an embedded 5x7 block
//! glyph face scaled up to fit, so generation never depends on system fonts.

use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

pub const COVER_EDGE: u32 = 1500;

const BACKGROUND: Rgb<u8> = Rgb([17, 22, 35]);
const TITLE_COLOR: Rgb<u8> = Rgb([106, 216, 255]);
const CAPTION_COLOR: Rgb<u8> = Rgb([200, 200, 220]);

const MARGIN: u32 = 80;
const CAPTION_SCALE: u32 = 5;

/// Renders and saves the placeholder cover, returning its path
/// (`{tmp_dir}/artist_{id}_generated.jpg`).
///
/// Directory creation is idempotent; the filename embeds the artist id so
/// repeated or concurrent runs never collide on different artists.
pub fn generate_cover(tmp_dir: &Path, artist_id: &str, title: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(tmp_dir)
        .with_context(|| format!("creating tmp dir {} failed", tmp_dir.display()))?;
    let out_path = tmp_dir.join(format!("artist_{artist_id}_generated.jpg"));

    let mut canvas = RgbImage::from_pixel(COVER_EDGE, COVER_EDGE, BACKGROUND);

    // Long titles wrap at " - ", same split the server uses for multi-part
    // artist names.
    let lines: Vec<&str> = title.split(" - ").collect();
    draw_centered_block(&mut canvas, &lines, TITLE_COLOR);
    draw_text(
        &mut canvas,
        "Generated cover",
        120,
        COVER_EDGE - 120,
        CAPTION_SCALE,
        CAPTION_COLOR,
    );

    let file = File::create(&out_path)
        .with_context(|| format!("creating {} failed", out_path.display()))?;
    let encoder = JpegEncoder::new_with_quality(BufWriter::new(file), 95);
    canvas
        .write_with_encoder(encoder)
        .with_context(|| format!("encoding {} failed", out_path.display()))?;
    Ok(out_path)
}

// ============================================================================
// Block Text Rendering
// ============================================================================

/// Advance per glyph in font cells (5 pixels + 1 spacing).
const CELL_ADVANCE: u32 = 6;
const GLYPH_ROWS: u32 = 7;
/// Vertical pitch between lines in font cells.
const LINE_PITCH: u32 = 9;

fn line_width_cells(line: &str) -> u32 {
    let glyphs = line.chars().count() as u32;
    if glyphs == 0 {
        0
    } else {
        glyphs * CELL_ADVANCE - 1
    }
}

/// Draws `lines` centered on the canvas, picking the largest scale at which
/// the longest line still fits inside the margins.
fn draw_centered_block(canvas: &mut RgbImage, lines: &[&str], color: Rgb<u8>) {
    let widest = lines.iter().map(|l| line_width_cells(l)).max().unwrap_or(0);
    if widest == 0 {
        return;
    }
    let scale = ((COVER_EDGE - 2 * MARGIN) / widest).clamp(4, 18);

    let block_height = (lines.len() as u32 * LINE_PITCH - (LINE_PITCH - GLYPH_ROWS)) * scale;
    let mut y = (COVER_EDGE.saturating_sub(block_height)) / 2;

    for line in lines {
        let width = line_width_cells(line) * scale;
        let x = (COVER_EDGE.saturating_sub(width)) / 2;
        draw_text(canvas, line, x, y, scale, color);
        y += LINE_PITCH * scale;
    }
}

fn draw_text(canvas: &mut RgbImage, text: &str, x: u32, y: u32, scale: u32, color: Rgb<u8>) {
    let mut cursor = x;
    for ch in text.chars() {
        draw_glyph(canvas, ch, cursor, y, scale, color);
        cursor += CELL_ADVANCE * scale;
    }
}

fn draw_glyph(canvas: &mut RgbImage, ch: char, x: u32, y: u32, scale: u32, color: Rgb<u8>) {
    let rows = glyph(ch);
    for (row, bits) in rows.iter().enumerate() {
        for col in 0..5u32 {
            if bits & (0x10 >> col) == 0 {
                continue;
            }
            let px = x + col * scale;
            let py = y + row as u32 * scale;
            for dy in 0..scale {
                for dx in 0..scale {
                    let (cx, cy) = (px + dx, py + dy);
                    if cx < canvas.width() && cy < canvas.height() {
                        canvas.put_pixel(cx, cy, color);
                    }
                }
            }
        }
    }
}

/// 5x7 glyph rows, bit 4 = leftmost column. Lowercase maps to uppercase;
/// anything outside the face renders as a hollow box.
fn glyph(ch: char) -> [u8; 7] {
    match ch.to_ascii_uppercase() {
        'A' => [0x0E, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'B' => [0x1E, 0x11, 0x11, 0x1E, 0x11, 0x11, 0x1E],
        'C' => [0x0E, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0E],
        'D' => [0x1E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1E],
        'E' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x1F],
        'F' => [0x1F, 0x10, 0x10, 0x1E, 0x10, 0x10, 0x10],
        'G' => [0x0E, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0E],
        'H' => [0x11, 0x11, 0x11, 0x1F, 0x11, 0x11, 0x11],
        'I' => [0x0E, 0x04, 0x04, 0x04, 0x04, 0x04, 0x0E],
        'J' => [0x07, 0x02, 0x02, 0x02, 0x02, 0x12, 0x0C],
        'K' => [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11],
        'L' => [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1F],
        'M' => [0x11, 0x1B, 0x15, 0x15, 0x11, 0x11, 0x11],
        'N' => [0x11, 0x19, 0x15, 0x13, 0x11, 0x11, 0x11],
        'O' => [0x0E, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'P' => [0x1E, 0x11, 0x11, 0x1E, 0x10, 0x10, 0x10],
        'Q' => [0x0E, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0D],
        'R' => [0x1E, 0x11, 0x11, 0x1E, 0x14, 0x12, 0x11],
        'S' => [0x0F, 0x10, 0x10, 0x0E, 0x01, 0x01, 0x1E],
        'T' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04],
        'U' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0E],
        'V' => [0x11, 0x11, 0x11, 0x11, 0x11, 0x0A, 0x04],
        'W' => [0x11, 0x11, 0x11, 0x15, 0x15, 0x15, 0x0A],
        'X' => [0x11, 0x11, 0x0A, 0x04, 0x0A, 0x11, 0x11],
        'Y' => [0x11, 0x11, 0x0A, 0x04, 0x04, 0x04, 0x04],
        'Z' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1F],
        '0' => [0x0E, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0E],
        '1' => [0x04, 0x0C, 0x04, 0x04, 0x04, 0x04, 0x0E],
        '2' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1F],
        '3' => [0x1F, 0x02, 0x04, 0x02, 0x01, 0x11, 0x0E],
        '4' => [0x02, 0x06, 0x0A, 0x12, 0x1F, 0x02, 0x02],
        '5' => [0x1F, 0x10, 0x1E, 0x01, 0x01, 0x11, 0x0E],
        '6' => [0x06, 0x08, 0x10, 0x1E, 0x11, 0x11, 0x0E],
        '7' => [0x1F, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08],
        '8' => [0x0E, 0x11, 0x11, 0x0E, 0x11, 0x11, 0x0E],
        '9' => [0x0E, 0x11, 0x11, 0x0F, 0x01, 0x02, 0x0C],
        ' ' => [0x00; 7],
        '-' => [0x00, 0x00, 0x00, 0x0E, 0x00, 0x00, 0x00],
        '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x0C, 0x0C],
        ',' => [0x00, 0x00, 0x00, 0x00, 0x0C, 0x04, 0x08],
        '\'' => [0x06, 0x04, 0x08, 0x00, 0x00, 0x00, 0x00],
        '&' => [0x08, 0x14, 0x14, 0x08, 0x15, 0x12, 0x0D],
        '!' => [0x04, 0x04, 0x04, 0x04, 0x04, 0x00, 0x04],
        '?' => [0x0E, 0x11, 0x01, 0x02, 0x04, 0x00, 0x04],
        _ => [0x1F, 0x11, 0x11, 0x11, 0x11, 0x11, 0x1F],
    }
}
