//! Display collaborators for `TorusLife::run`.
//!
//! The engine only sequences calls into a `Renderer`; what a frame looks like
//! is chosen at runtime by picking an implementation.

use std::io::{self, Write};
use std::sync::Mutex;

use super::block::{ALIVE, Block};
use super::config::Partition;
use super::grid::Grid;
use super::topology::UnitId;

const CURSOR_HOME: &str = "\x1b[H";
const RESET: &str = "\x1b[0;39m";
const BG_BLACK: &str = "\x1b[0;40m";
const BG_WHITE: &str = "\x1b[0;47m";

/// Background tints for each unit's region, cycled by unit id.
const UNIT_TINTS: [&str; 9] = [
    "\x1b[48;5;1m",   // red
    "\x1b[48;5;2m",   // green
    "\x1b[48;5;3m",   // yellow
    "\x1b[48;5;4m",   // blue
    "\x1b[48;5;5m",   // pink
    "\x1b[48;5;6m",   // turquoise
    "\x1b[48;5;9m",   // orange
    "\x1b[48;5;87m",  // cyan
    "\x1b[48;5;218m", // rose
];

/// Consumer of per-generation state.
///
/// `show_grid` is called on the orchestrating thread with the gathered grid.
/// `show_block` may be called from unit threads concurrently, hence `Sync`.
pub trait Renderer: Sync {
    fn show_grid(&self, generation: u64, grid: &Grid, partition: &Partition) -> io::Result<()> {
        let _ = (generation, grid, partition);
        Ok(())
    }

    fn show_block(&self, generation: u64, unit: UnitId, block: &Block) -> io::Result<()> {
        let _ = (generation, unit, block);
        Ok(())
    }
}

/// Renders nothing.
pub struct NullRenderer;

impl Renderer for NullRenderer {}

/// Color scheme for `AnsiRenderer`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Palette {
    /// Live cells black, dead cells white.
    Mono,
    /// Live cells black, dead cells tinted by the unit that owns them.
    UnitTint,
}

/// Full-grid terminal renderer: redraws in place with two columns per cell.
pub struct AnsiRenderer<W> {
    out: Mutex<W>,
    palette: Palette,
    last_generation: Option<u64>,
}

impl<W: Write + Send> AnsiRenderer<W> {
    pub fn new(out: W, palette: Palette) -> Self {
        Self {
            out: Mutex::new(out),
            palette,
            last_generation: None,
        }
    }

    /// Show progress as `Generation: g|last` instead of just `g`.
    pub fn with_last_generation(mut self, last: u64) -> Self {
        self.last_generation = Some(last);
        self
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<W: Write + Send> Renderer for AnsiRenderer<W> {
    fn show_grid(&self, generation: u64, grid: &Grid, partition: &Partition) -> io::Result<()> {
        let mut out = self.out.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let side = grid.side();
        let cells = grid.cells();

        let mut frame = String::with_capacity(side * side * 16);
        frame.push_str(CURSOR_HOME);
        for row in 0..side {
            for col in 0..side {
                let background = match self.palette {
                    Palette::Mono => BG_WHITE,
                    Palette::UnitTint => {
                        UNIT_TINTS[partition.owner(row, col) % UNIT_TINTS.len()]
                    }
                };
                let cell = if cells[row * side + col] == ALIVE {
                    BG_BLACK
                } else {
                    background
                };
                frame.push_str(cell);
                frame.push_str("  ");
                frame.push_str(background);
            }
            frame.push('\n');
        }
        frame.push_str(RESET);

        out.write_all(frame.as_bytes())?;
        match self.last_generation {
            Some(last) => writeln!(out, "Generation: {generation}|{last}")?,
            None => writeln!(out, "Generation: {generation}")?,
        }
        out.flush()
    }
}

/// Per-unit dump for an 8×8 LED matrix: one line of digits per block.
/// Blocks of any other size are skipped.
pub struct LedPrinter<W> {
    out: Mutex<W>,
}

/// Edge length of the LED matrix a unit drives.
pub const LED_EDGE: usize = 8;

impl<W: Write + Send> LedPrinter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl<W: Write + Send> Renderer for LedPrinter<W> {
    fn show_block(&self, generation: u64, unit: UnitId, block: &Block) -> io::Result<()> {
        if block.edge() != LED_EDGE {
            return Ok(());
        }
        let digits: String = block
            .cells()
            .iter()
            .map(|&c| if c == ALIVE { '1' } else { '0' })
            .collect();
        let mut out = self.out.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        writeln!(out, "[{generation}:{unit}] {digits}")
    }
}
