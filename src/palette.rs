// Terminal colours for the board
// Classic minesweeper number colours, degraded to what the terminal supports

use ratatui::style::Color;
use term_color_support::ColorSupport;

/// Colour depth detected once at startup
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    truecolor: bool,
    indexed: bool,
}

// (rgb, 256-colour index, 16-colour fallback) for adjacency counts 1..=8
const NUMBERS: [((u8, u8, u8), u8, Color); 8] = [
    ((0, 0, 255), 21, Color::LightBlue),
    ((0, 130, 0), 28, Color::Green),
    ((254, 1, 0), 196, Color::LightRed),
    ((0, 0, 132), 18, Color::Blue),
    ((132, 0, 0), 88, Color::Red),
    ((0, 130, 132), 30, Color::Cyan),
    ((132, 0, 133), 90, Color::Magenta),
    ((117, 117, 117), 243, Color::Gray),
];

impl Palette {
    pub fn detect() -> Self {
        let support = ColorSupport::stdout();
        Palette {
            truecolor: support.has_16m,
            indexed: support.has_256,
        }
    }

    fn pick(&self, (r, g, b): (u8, u8, u8), index256: u8, basic: Color) -> Color {
        if self.truecolor {
            Color::Rgb(r, g, b)
        } else if self.indexed {
            Color::Indexed(index256)
        } else {
            basic
        }
    }

    /// Foreground for a revealed cell with `n` mined neighbours
    pub fn number(&self, n: u8) -> Color {
        match n {
            1..=8 => {
                let (rgb, idx, basic) = NUMBERS[n as usize - 1];
                self.pick(rgb, idx, basic)
            }
            _ => Color::Reset,
        }
    }

    pub fn board_bg(&self) -> Color {
        self.pick((192, 192, 192), 250, Color::Gray)
    }

    pub fn hidden_bg(&self) -> Color {
        self.pick((118, 118, 118), 243, Color::DarkGray)
    }

    pub fn cursor_bg(&self) -> Color {
        self.pick((59, 120, 255), 63, Color::LightBlue)
    }

    /// Background of the mine that ended the round
    pub fn target_bg(&self) -> Color {
        self.pick((197, 15, 31), 160, Color::Red)
    }
}
