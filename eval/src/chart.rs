// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2024 Hyperpolymath

//! Bar chart rendering for the correct/incorrect counts
//!
//! Draws straight into an RGB buffer with a small built-in bitmap font, so
//! the chart needs no system fonts.

use crate::metrics::Tally;
use crate::pipeline::ensure_parent_dir;
use anyhow::{Context, Result};
use image::{Rgb, RgbImage};
use std::path::Path;

pub const CHART_WIDTH: u32 = 640;
pub const CHART_HEIGHT: u32 = 480;

const MARGIN_TOP: u32 = 70;
const MARGIN_BOTTOM: u32 = 60;
const MARGIN_SIDE: u32 = 60;
const FONT_SCALE: u32 = 3;
const GLYPH_WIDTH: u32 = 5;
const GLYPH_HEIGHT: u32 = 7;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const AXIS: Rgb<u8> = Rgb([40, 40, 40]);
const TEXT: Rgb<u8> = Rgb([20, 20, 20]);
pub const CORRECT_COLOR: Rgb<u8> = Rgb([46, 139, 87]);
pub const INCORRECT_COLOR: Rgb<u8> = Rgb([205, 55, 55]);

/// One bar of the chart
#[derive(Debug, Clone)]
pub struct Bar {
    pub label: String,
    pub value: usize,
    pub color: Rgb<u8>,
}

/// Bars for the correct and incorrect counts, in that order
pub fn tally_bars(tally: &Tally) -> Vec<Bar> {
    vec![
        Bar {
            label: "CORRECT".to_string(),
            value: tally.correct,
            color: CORRECT_COLOR,
        },
        Bar {
            label: "INCORRECT".to_string(),
            value: tally.incorrect,
            color: INCORRECT_COLOR,
        },
    ]
}

/// Horizontal extent of each bar slot: (left, right) pixel columns
pub fn bar_columns(count: usize) -> Vec<(u32, u32)> {
    if count == 0 {
        return Vec::new();
    }
    let plot_width = CHART_WIDTH - 2 * MARGIN_SIDE;
    let slot = plot_width / count as u32;
    let bar_width = slot * 3 / 5;
    (0..count as u32)
        .map(|i| {
            let left = MARGIN_SIDE + i * slot + (slot - bar_width) / 2;
            (left, left + bar_width)
        })
        .collect()
}

/// Y coordinate of the plot baseline
pub fn baseline_y() -> u32 {
    CHART_HEIGHT - MARGIN_BOTTOM
}

/// Render a titled bar chart
pub fn render_bar_chart(title: &str, bars: &[Bar]) -> RgbImage {
    let mut img = RgbImage::from_pixel(CHART_WIDTH, CHART_HEIGHT, BACKGROUND);

    let baseline = baseline_y();
    // room above the tallest bar for its value label
    let plot_height = baseline - MARGIN_TOP - GLYPH_HEIGHT * FONT_SCALE - 10;
    let max_value = bars.iter().map(|b| b.value).max().unwrap_or(0);

    draw_text_centered(&mut img, title, CHART_WIDTH / 2, 20);

    for (bar, (left, right)) in bars.iter().zip(bar_columns(bars.len())) {
        let height = if max_value == 0 {
            0
        } else {
            (bar.value as u64 * plot_height as u64 / max_value as u64) as u32
        };
        let top = baseline - height;
        fill_rect(&mut img, left, top, right, baseline, bar.color);

        let center = (left + right) / 2;
        let value_y = top.saturating_sub(GLYPH_HEIGHT * FONT_SCALE + 6);
        draw_text_centered(&mut img, &bar.value.to_string(), center, value_y);
        draw_text_centered(&mut img, &bar.label, center, baseline + 14);
    }

    // axes
    let axis_right = CHART_WIDTH - MARGIN_SIDE + 10;
    fill_rect(&mut img, MARGIN_SIDE - 10, baseline, axis_right, baseline + 2, AXIS);
    fill_rect(&mut img, MARGIN_SIDE - 10, MARGIN_TOP, MARGIN_SIDE - 8, baseline + 2, AXIS);

    img
}

/// Render the correct/incorrect chart and save it as PNG
pub fn save_tally_chart(tally: &Tally, path: &Path) -> Result<()> {
    ensure_parent_dir(path)?;

    let img = render_bar_chart("CLASSIFICATION RESULTS", &tally_bars(tally));
    img.save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("Failed to write chart: {}", path.display()))?;

    tracing::info!("Chart saved to {}", path.display());
    Ok(())
}

/// Fill the half-open rectangle [x0, x1) x [y0, y1), clipped to the image
fn fill_rect(img: &mut RgbImage, x0: u32, y0: u32, x1: u32, y1: u32, color: Rgb<u8>) {
    for y in y0..y1.min(img.height()) {
        for x in x0..x1.min(img.width()) {
            img.put_pixel(x, y, color);
        }
    }
}

fn text_width(text: &str) -> u32 {
    let n = text.chars().count() as u32;
    if n == 0 {
        return 0;
    }
    (n * (GLYPH_WIDTH + 1) - 1) * FONT_SCALE
}

fn draw_text_centered(img: &mut RgbImage, text: &str, center_x: u32, top: u32) {
    let left = center_x.saturating_sub(text_width(text) / 2);
    draw_text(img, text, left, top);
}

fn draw_text(img: &mut RgbImage, text: &str, left: u32, top: u32) {
    let mut x = left;
    for ch in text.chars() {
        if let Some(rows) = glyph(ch.to_ascii_uppercase()) {
            for (row, bits) in rows.iter().enumerate() {
                for col in 0..GLYPH_WIDTH {
                    if bits & (1 << (GLYPH_WIDTH - 1 - col)) != 0 {
                        let px = x + col * FONT_SCALE;
                        let py = top + row as u32 * FONT_SCALE;
                        fill_rect(img, px, py, px + FONT_SCALE, py + FONT_SCALE, TEXT);
                    }
                }
            }
        }
        x += (GLYPH_WIDTH + 1) * FONT_SCALE;
    }
}

/// 5x7 glyphs, one byte per row, most significant of the low five bits leftmost
fn glyph(ch: char) -> Option<[u8; 7]> {
    let rows = match ch {
        'A' => [0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0b10001],
        'C' => [0b01110, 0b10001, 0b10000, 0b10000, 0b10000, 0b10001, 0b01110],
        'E' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b11111],
        'F' => [0b11111, 0b10000, 0b10000, 0b11110, 0b10000, 0b10000, 0b10000],
        'I' => [0b01110, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        'L' => [0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b10000, 0b11111],
        'N' => [0b10001, 0b11001, 0b10101, 0b10011, 0b10001, 0b10001, 0b10001],
        'O' => [0b01110, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        'R' => [0b11110, 0b10001, 0b10001, 0b11110, 0b10100, 0b10010, 0b10001],
        'S' => [0b01111, 0b10000, 0b10000, 0b01110, 0b00001, 0b00001, 0b11110],
        'T' => [0b11111, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100, 0b00100],
        'U' => [0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b10001, 0b01110],
        '0' => [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
        '1' => [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
        '2' => [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111],
        '3' => [0b11110, 0b00001, 0b00001, 0b01110, 0b00001, 0b00001, 0b11110],
        '4' => [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
        '5' => [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
        '6' => [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
        '7' => [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
        '8' => [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
        '9' => [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
        _ => return None,
    };
    Some(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column_has_color(img: &RgbImage, x: u32, color: Rgb<u8>) -> bool {
        (0..img.height()).any(|y| *img.get_pixel(x, y) == color)
    }

    fn bar_height(img: &RgbImage, x: u32, color: Rgb<u8>) -> u32 {
        (0..img.height()).filter(|&y| *img.get_pixel(x, y) == color).count() as u32
    }

    #[test]
    fn test_chart_dimensions() {
        let img = render_bar_chart("CLASSIFICATION RESULTS", &tally_bars(&Tally::default()));
        assert_eq!(img.width(), CHART_WIDTH);
        assert_eq!(img.height(), CHART_HEIGHT);
    }

    #[test]
    fn test_bars_drawn_in_their_columns() {
        let tally = Tally { correct: 3, incorrect: 1, failed: 0 };
        let img = render_bar_chart("CLASSIFICATION RESULTS", &tally_bars(&tally));
        let columns = bar_columns(2);

        let correct_x = (columns[0].0 + columns[0].1) / 2;
        let incorrect_x = (columns[1].0 + columns[1].1) / 2;

        assert!(column_has_color(&img, correct_x, CORRECT_COLOR));
        assert!(column_has_color(&img, incorrect_x, INCORRECT_COLOR));
        assert!(!column_has_color(&img, correct_x, INCORRECT_COLOR));
    }

    #[test]
    fn test_bar_heights_are_proportional() {
        let tally = Tally { correct: 4, incorrect: 2, failed: 0 };
        let img = render_bar_chart("T", &tally_bars(&tally));
        let columns = bar_columns(2);

        // sample near the left edge of each bar, clear of the value label
        let correct = bar_height(&img, columns[0].0 + 1, CORRECT_COLOR);
        let incorrect = bar_height(&img, columns[1].0 + 1, INCORRECT_COLOR);

        assert!(correct > 0);
        assert!((correct as i64 - 2 * incorrect as i64).abs() <= 1);
    }

    #[test]
    fn test_zero_count_draws_no_bar() {
        let tally = Tally { correct: 0, incorrect: 5, failed: 0 };
        let img = render_bar_chart("T", &tally_bars(&tally));
        let columns = bar_columns(2);

        assert_eq!(bar_height(&img, columns[0].0 + 1, CORRECT_COLOR), 0);
        assert!(bar_height(&img, columns[1].0 + 1, INCORRECT_COLOR) > 0);
    }

    #[test]
    fn test_bar_columns_do_not_overlap() {
        let columns = bar_columns(2);
        assert_eq!(columns.len(), 2);
        assert!(columns[0].1 < columns[1].0);
        assert!(columns[1].1 <= CHART_WIDTH - MARGIN_SIDE);
        assert!(bar_columns(0).is_empty());
    }

    #[test]
    fn test_glyph_coverage() {
        for ch in "CLASSIFICATION RESULTS CORRECT INCORRECT 0123456789".chars() {
            if ch != ' ' {
                assert!(glyph(ch).is_some(), "missing glyph for {:?}", ch);
            }
        }
    }

    #[test]
    fn test_save_chart_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("charts").join("results.png");
        let tally = Tally { correct: 7, incorrect: 3, failed: 0 };

        save_tally_chart(&tally, &path).unwrap();

        let loaded = image::open(&path).unwrap();
        assert_eq!(loaded.width(), CHART_WIDTH);
        assert_eq!(loaded.height(), CHART_HEIGHT);
    }
}
