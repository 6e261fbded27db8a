use anyhow::Result;
use crossterm::{
    style::{style, Attribute, Color, PrintStyledContent},
    QueueableCommand,
};

use std::io::{stdout, Write};

use kinarow_ai::{Board, Cell, Marker};

/// Draws a board with coloured markers, column numbers on top and row numbers on the left
pub fn draw_board(board: &Board) -> Result<()> {
    let mut stdout = stdout();

    let header: String = (0..board.cols()).map(|col| format!("{:>2}", col % 100)).collect();
    stdout.queue(PrintStyledContent(style(format!("   {}\n", header))))?;

    for row in 0..board.rows() {
        stdout.queue(PrintStyledContent(style(format!("{:>2} ", row))))?;
        for col in 0..board.cols() {
            let cell = board.get(row, col);
            let (glyph, colour) = match cell {
                Cell::Taken(Marker::X) => ("X", Color::Red),
                Cell::Taken(Marker::O) => ("O", Color::Yellow),
                Cell::Forbidden => ("#", Color::DarkGrey),
                Cell::Empty => ("·", Color::DarkBlue),
            };
            stdout.queue(PrintStyledContent(
                style(format!(" {}", glyph))
                    .attribute(Attribute::Bold)
                    .on(Color::Black)
                    .with(colour),
            ))?;
        }
        stdout.queue(PrintStyledContent(style("\n".to_string())))?;
    }
    stdout.flush()?;
    Ok(())
}
