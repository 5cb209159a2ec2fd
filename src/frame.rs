//! This module draws the game on the terminal.
//!
//! A frame is first laid out as plain lines by `layout`, which only depends on the game state and
//! the terminal size, and then written over the previous frame by `draw`.

use std::borrow::Borrow as _;

use anyhow::Result;
use console::{pad_str, style, Alignment, Term};
use fastrand::Rng;

use crate::engine::{GameState, Phase, Physics};

/// The picture of a cloud.
const CLOUD: &str = "(~~~~)";
/// How many clouds the sky holds, one per row from the top.
const CLOUDS: usize = 3;
/// Lines above the play area: title, instructions, scores and a gap.
const HEADER_ROWS: usize = 4;
/// Lines below the ground: a gap and the controls hint.
const FOOTER_ROWS: usize = 2;
/// The play area never shrinks below this many rows, even on tiny terminals.
const MIN_SKY_ROWS: usize = 6;
/// The picture of the unicorn.
const SPRITE: &str = "\u{1f984}";

/// A cloud in the sky.
#[derive(Debug)]
struct Cloud {
    /// Horizontal placement, as a fraction of the free width.
    offset: f64,
    /// Row of the play area the cloud sits on.
    row: usize,
}

/// This struct holds the decoration of the play area, which is picked once per run.
#[derive(Debug)]
pub(crate) struct Scenery {
    /// This field contains the clouds, at most one per row.
    clouds: Vec<Cloud>,
}

impl Scenery {
    /// This function scatters the clouds across the top rows of the sky.
    pub(crate) fn new(rng: &mut Rng) -> Self {
        Self {
            clouds: (0..CLOUDS)
                .map(|row| Cloud {
                    offset: rng.f64(),
                    row,
                })
                .collect(),
        }
    }

    /// This function returns the cloud sitting on `row`, already shifted into place for a
    /// terminal `cols` wide.
    fn line(&self, row: usize, cols: usize) -> Option<String> {
        self.clouds.iter().find(|cloud| cloud.row == row).map(|cloud| {
            let free = cols.saturating_sub(CLOUD.len());
            let shift = (cloud.offset * free as f64).floor() as usize;
            format!(
                "{}{}",
                " ".repeat(shift.min(free)),
                style(CLOUD).white().dim()
            )
        })
    }
}

/// This function maps a position in the play area to the row of the sky the sprite is drawn on.
pub(crate) fn sprite_row(position: f64, ground_level: f64, sky_rows: usize) -> usize {
    let Some(last) = sky_rows.checked_sub(1) else {
        return 0;
    };

    if ground_level <= 0.0 {
        return last;
    }

    let ratio = (position / ground_level).clamp(0.0, 1.0);
    ((ratio * last as f64).round() as usize).min(last)
}

/// This function returns the lines of the game over overlay, or nothing outside of that phase.
fn overlay(state: &GameState) -> Vec<String> {
    if state.phase != Phase::Over {
        return Vec::new();
    }

    let mut lines = vec![
        format!("{}", style("Game Over!").red().bold()),
        format!("{}", style(format!("Final Score: {}", state.score)).bold()),
    ];

    if state.is_new_high_score() {
        lines.push(format!("{}", style("New High Score!").magenta().bold()));
    }

    lines.push(format!(
        "{}",
        style("   Play Again   ").bold().on_cyan()
    ));
    lines
}

/// This function centers `text` on a line `cols` wide.
fn center(text: &str, cols: usize) -> String {
    pad_str(text, cols, Alignment::Center, None).into_owned()
}

/// This function lays out a whole frame for a terminal of `size` rows and columns. It returns one
/// line fewer than there are rows so that writing the frame never scrolls the terminal.
pub(crate) fn layout(
    state: &GameState,
    physics: &Physics,
    scenery: &Scenery,
    size: (u16, u16),
) -> Vec<String> {
    let (rows, cols) = (usize::from(size.0), usize::from(size.1));
    let sky_rows = rows
        .saturating_sub(HEADER_ROWS + FOOTER_ROWS + 2)
        .max(MIN_SKY_ROWS);
    let mut lines = Vec::with_capacity(HEADER_ROWS + sky_rows + 1 + FOOTER_ROWS);

    // header
    lines.push(center(
        &format!("{}", style("Unicorn Jump").magenta().bold()),
        cols,
    ));
    lines.push(center(
        &format!(
            "{}",
            style("Hit the unicorn to make it jump! Get as many jumps as possible before it hits the ground!").dim()
        ),
        cols,
    ));
    let scores = match state.phase {
        Phase::Idle => format!("High Score {}", style(state.high_score).magenta().bold()),
        Phase::Active | Phase::Over => format!(
            "Score {}    High Score {}",
            style(state.score).blue().bold(),
            style(state.high_score).magenta().bold()
        ),
    };
    lines.push(center(&scores, cols));
    lines.push(String::new());

    // sky, with the overlay drawn on top of the sprite and clouds
    let sprite = sprite_row(state.position, physics.ground_level, sky_rows);
    let overlay = overlay(state);
    let overlay_start = sky_rows.saturating_sub(overlay.len()) / 2;

    for row in 0..sky_rows {
        let line = match row.checked_sub(overlay_start).and_then(|idx| overlay.get(idx)) {
            Some(text) => center(text, cols),
            None if row == sprite => {
                let picture = if state.is_airborne() {
                    format!("{}", style(SPRITE).bold())
                } else {
                    SPRITE.to_owned()
                };
                center(&picture, cols)
            }
            None => scenery.line(row, cols).unwrap_or_default(),
        };
        lines.push(line);
    }

    // ground
    lines.push(format!("{}", style("=".repeat(cols)).green()));

    // footer
    lines.push(String::new());
    let hint = match state.phase {
        Phase::Idle => "Press Enter to start, q to quit",
        Phase::Active => "Press Space to jump! Each jump in the air gives you a point.",
        Phase::Over => "Press Enter to play again, q to quit",
    };
    lines.push(center(&format!("{}", style(hint).dim()), cols));

    lines.truncate(rows.saturating_sub(1).max(1));
    lines
}

/// This function writes `lines` over whatever the terminal currently shows, starting from the top
/// left corner and blanking the rest of every line.
pub(crate) fn draw(term: &Term, lines: &[String]) -> Result<()> {
    let (_, cols) = term.size();
    term.move_cursor_to(0, 0)?;

    for line in lines {
        let line = pad_str(line, usize::from(cols), Alignment::Left, Some(""));
        term.write_line(line.borrow())?;
    }

    Ok(())
}
