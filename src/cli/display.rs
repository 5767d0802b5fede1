// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Terminal output for the shortlist CLI: boxed reports and colored values.
//!
//! Colors come from a handful of [`Tone`]s rather than named hues, so a
//! light terminal gets the same roles with darker ink. The background is read
//! from `SHORTLIST_THEME` ("dark" or "light"), then the `COLORFGBG` hint, and
//! is otherwise assumed dark.
//!
//! Colors are off when stdout is not a terminal, when `NO_COLOR` is set, or
//! after [`disable_colors`] (`--no-color`).

use std::io::IsTerminal;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

/// Inner width of every box, between the two border characters.
const WIDTH: usize = 80;

pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

static LIGHT_BACKGROUND: OnceLock<bool> = OnceLock::new();
static COLORS_DISABLED: AtomicBool = AtomicBool::new(false);

// ═══════════════════════════════════════════════════════════════════════════
// TONES
// ═══════════════════════════════════════════════════════════════════════════

/// What a colored span means. Each tone has one ink per background.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    /// Borders and far-off values.
    Muted,
    /// Section labels, titles and test type tags.
    Accent,
    Best,
    Good,
    Fair,
    Poor,
}

impl Tone {
    /// (dark background, light background), OneDark and One Light inks.
    const fn inks(self) -> [(u8, u8, u8); 2] {
        match self {
            Tone::Muted => [(92, 99, 112), (160, 161, 167)],
            Tone::Accent => [(86, 182, 194), (1, 132, 188)],
            Tone::Best => [(166, 226, 46), (68, 140, 39)],
            Tone::Good => [(152, 195, 121), (80, 161, 79)],
            Tone::Fair => [(229, 192, 123), (193, 132, 1)],
            Tone::Poor => [(224, 108, 117), (228, 86, 73)],
        }
    }

    fn escape(self, light: bool) -> String {
        let (r, g, b) = self.inks()[usize::from(light)];
        format!("\x1b[38;2;{r};{g};{b}m")
    }
}

/// `true` for a light background. An explicit choice beats the terminal hint.
fn is_light(explicit: Option<&str>, colorfgbg: Option<&str>) -> bool {
    match explicit.map(str::to_ascii_lowercase).as_deref() {
        Some("light" | "l") => return true,
        Some("dark" | "d") => return false,
        _ => {}
    }
    // "fg;bg" (sometimes "fg;default;bg"); 7 and 9..=15 are light, 8 is dark gray
    colorfgbg
        .and_then(|v| v.rsplit(';').next())
        .and_then(|bg| bg.parse::<u8>().ok())
        .is_some_and(|bg| bg == 7 || (9..=15).contains(&bg))
}

fn light_background() -> bool {
    *LIGHT_BACKGROUND.get_or_init(|| {
        is_light(
            std::env::var("SHORTLIST_THEME").ok().as_deref(),
            std::env::var("COLORFGBG").ok().as_deref(),
        )
    })
}

// ═══════════════════════════════════════════════════════════════════════════
// STYLING
// ═══════════════════════════════════════════════════════════════════════════

/// Turn colors off for the rest of the process.
pub fn disable_colors() {
    COLORS_DISABLED.store(true, Ordering::Relaxed);
}

fn use_colors() -> bool {
    !COLORS_DISABLED.load(Ordering::Relaxed)
        && std::env::var_os("NO_COLOR").is_none()
        && std::io::stdout().is_terminal()
}

/// `text` in `tone`, with extra modifiers such as [`BOLD`].
pub fn paint(tone: Tone, modifiers: &[&str], text: &str) -> String {
    if use_colors() {
        format!("{}{}{text}{RESET}", modifiers.concat(), tone.escape(light_background()))
    } else {
        text.to_string()
    }
}

/// `text` with modifiers only, no color.
pub fn styled(modifiers: &[&str], text: &str) -> String {
    if use_colors() {
        format!("{}{text}{RESET}", modifiers.concat())
    } else {
        text.to_string()
    }
}

/// Characters a terminal will draw, skipping `ESC ... m` sequences.
fn visible_len(s: &str) -> usize {
    let mut in_escape = false;
    s.chars()
        .filter(|&c| match (in_escape, c) {
            (_, '\x1b') => {
                in_escape = true;
                false
            }
            (true, 'm') => {
                in_escape = false;
                false
            }
            (escaping, _) => !escaping,
        })
        .count()
}

// ═══════════════════════════════════════════════════════════════════════════
// BOXES
// ═══════════════════════════════════════════════════════════════════════════

/// One full-width frame line: `left`, `middle` padded with `fill`, `right`.
/// Only the border characters are colored; `middle` brings its own styling.
fn frame(tone: Tone, left: char, middle: &str, fill: &str, right: char) {
    let pad = fill.repeat(WIDTH.saturating_sub(visible_len(middle)));
    let (on, off) = if use_colors() {
        (tone.escape(light_background()), RESET)
    } else {
        (String::new(), "")
    };
    if fill == " " {
        println!("{on}{left}{off}{middle}{pad}{on}{right}{off}");
    } else {
        println!("{on}{left}{off}{middle}{on}{pad}{right}{off}");
    }
}

fn label(text: &str) -> String {
    format!("─ {} ", paint(Tone::Accent, &[BOLD], text))
}

/// `│ content │`
pub fn row(content: &str) {
    frame(Tone::Muted, '│', content, " ", '│');
}

/// `┌─ LABEL ───┐`
pub fn section_top(text: &str) {
    frame(Tone::Muted, '┌', &label(text), "─", '┐');
}

/// `├─ LABEL ───┤`
pub fn section_mid(text: &str) {
    frame(Tone::Muted, '├', &label(text), "─", '┤');
}

/// `└──────────┘`
pub fn section_bot() {
    frame(Tone::Muted, '└', "", "─", '┘');
}

/// `╔══════════╗`
pub fn double_header() {
    frame(Tone::Accent, '╔', "", "═", '╗');
}

/// `╚══════════╝`
pub fn double_footer() {
    frame(Tone::Accent, '╚', "", "═", '╝');
}

/// `║   TITLE   ║`, centered.
pub fn title(text: &str) {
    let text = paint(Tone::Accent, &[BOLD], text);
    let left = WIDTH.saturating_sub(visible_len(&text)) / 2;
    frame(Tone::Accent, '║', &format!("{}{text}", " ".repeat(left)), " ", '║');
}

// ═══════════════════════════════════════════════════════════════════════════
// VALUES
// ═══════════════════════════════════════════════════════════════════════════

/// Right-align to `width` visible columns.
pub fn pad_left(s: &str, width: usize) -> String {
    let pad = width.saturating_sub(visible_len(s));
    format!("{}{s}", " ".repeat(pad))
}

/// Left-align to `width` visible columns.
pub fn pad_right(s: &str, width: usize) -> String {
    let pad = width.saturating_sub(visible_len(s));
    format!("{s}{}", " ".repeat(pad))
}

pub fn format_size(bytes: usize) -> String {
    const KB: f64 = 1024.0;
    let b = bytes as f64;
    if b >= KB * KB {
        format!("{:.1} MB", b / (KB * KB))
    } else if b >= KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{bytes} B")
    }
}

/// Cut `text` to at most `max_chars` characters, ending in `…` when cut.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// Squared L2 distance, colored by closeness. Unit vectors keep it in [0, 4].
pub fn distance_value(distance: f32) -> String {
    let tone = match distance {
        d if d < 0.5 => Tone::Best,
        d if d < 1.0 => Tone::Good,
        d if d < 1.5 => Tone::Fair,
        _ => Tone::Muted,
    };
    paint(tone, &[], &format!("{distance:>6.3}"))
}

/// Milliseconds, colored against a per-query budget of a few ms.
pub fn timing_ms(value: f64) -> String {
    let tone = match value {
        v if v < 5.0 => Tone::Good,
        v if v < 20.0 => Tone::Fair,
        _ => Tone::Poor,
    };
    paint(tone, &[], &format!("{value:.3}"))
}

/// MATCH / MISS for one evaluated query.
pub fn outcome_badge(hit: bool) -> String {
    if hit {
        paint(Tone::Good, &[BOLD], "MATCH")
    } else {
        paint(Tone::Poor, &[BOLD], "MISS ")
    }
}

/// Recall as a percentage.
pub fn recall_value(recall: f64) -> String {
    let tone = if recall >= 0.7 {
        Tone::Best
    } else if recall >= 0.4 {
        Tone::Fair
    } else {
        Tone::Poor
    };
    paint(tone, &[BOLD], &format!("{:.1}%", recall * 100.0))
}

pub fn check_mark(ok: bool) -> String {
    match ok {
        true => paint(Tone::Good, &[], "✓"),
        false => paint(Tone::Poor, &[], "✗"),
    }
}
