//! Program pane rendering
//!
//! Shows the disassembled program with the next instruction highlighted. The
//! highlighted row stays at a fixed visual position while stepping, the same
//! way a source view keeps the current line in place; scrolling the pane
//! moves that position.
//!
//! When the run ended in a fault, the faulting instruction is highlighted in
//! the error colour instead.

use super::utils::{pane_block, visible_rows};
use crate::bytecode::disasm::{Instruction, Listing, Operand};
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// Scroll state for the program pane
pub struct ProgramScrollState {
    pub offset: usize,
    pub target_row: Option<usize>,
}

/// Data needed to render the program pane
pub struct ProgramRenderData<'a> {
    pub listing: &'a Listing,
    /// Offset of the next instruction
    pub pc: usize,
    /// Offset of the instruction that faulted, if the run ended in a fault
    pub error_offset: Option<usize>,
}

fn operand_span(operand: &Operand) -> Span<'static> {
    let style = match operand {
        Operand::Width(_) => Style::default().fg(DEFAULT_THEME.comment),
        Operand::Register(_) => Style::default().fg(DEFAULT_THEME.register),
        Operand::Value(_) | Operand::Elements(_) => Style::default().fg(DEFAULT_THEME.number),
        Operand::Byte(_) => Style::default().fg(DEFAULT_THEME.secondary),
    };
    Span::styled(format!(" {}", operand), style)
}

fn instruction_line(instruction: &Instruction) -> Vec<Span<'static>> {
    let mut spans = vec![
        Span::styled(
            format!("{:04X}  ", instruction.offset),
            Style::default().fg(DEFAULT_THEME.comment),
        ),
        Span::styled(
            format!("{:<7}", instruction.opcode.mnemonic()),
            Style::default()
                .fg(DEFAULT_THEME.keyword)
                .add_modifier(Modifier::BOLD),
        ),
    ];
    spans.extend(instruction.operands.iter().map(operand_span));
    spans
}

/// Render the program pane
pub fn render_program_pane(
    frame: &mut Frame,
    area: Rect,
    data: ProgramRenderData,
    is_focused: bool,
    scroll_state: &mut ProgramScrollState,
) {
    let block = pane_block(" Program ", is_focused);
    let listing = data.listing;

    let highlighted = data.error_offset.unwrap_or(data.pc);
    let current_row = listing.row_of(highlighted);

    let mut total_rows = listing.len();
    if listing.error.is_some() {
        total_rows += 1;
    }
    let visible_height = visible_rows(area.height);

    // Keep the current row at the target visual row
    let target_row = scroll_state
        .target_row
        .unwrap_or(visible_height / 2)
        .min(visible_height.saturating_sub(1));
    scroll_state.target_row = Some(target_row);

    if let Some(row) = current_row {
        scroll_state.offset = row.saturating_sub(target_row);
        if total_rows > visible_height {
            scroll_state.offset = scroll_state.offset.min(total_rows - visible_height);
        } else {
            scroll_state.offset = 0;
        }
    }

    let mut lines: Vec<Line> = listing
        .instructions
        .iter()
        .enumerate()
        .skip(scroll_state.offset)
        .take(visible_height)
        .map(|(row, instruction)| {
            let is_current = Some(row) == current_row;
            let mut spans = instruction_line(instruction);

            let marker = if is_current && data.error_offset.is_some() {
                for span in &mut spans {
                    span.style = Style::default()
                        .bg(DEFAULT_THEME.error)
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD);
                }
                Span::styled("✗ ", Style::default().fg(DEFAULT_THEME.error))
            } else if is_current {
                for span in &mut spans {
                    span.style = span.style.bg(DEFAULT_THEME.current_line_bg);
                }
                Span::styled(
                    "▶ ",
                    Style::default()
                        .fg(DEFAULT_THEME.secondary)
                        .add_modifier(Modifier::BOLD),
                )
            } else {
                Span::raw("  ")
            };

            let mut line = vec![marker];
            line.extend(spans);
            Line::from(line)
        })
        .collect();

    if let Some(error) = &listing.error {
        if lines.len() < visible_height {
            lines.push(Line::from(Span::styled(
                format!("  {}", error),
                Style::default().fg(DEFAULT_THEME.error),
            )));
        }
    }

    if listing.is_empty() && listing.error.is_none() {
        let paragraph = Paragraph::new("(empty program)")
            .block(block)
            .style(Style::default().fg(DEFAULT_THEME.comment));
        frame.render_widget(paragraph, area);
        return;
    }

    let paragraph = Paragraph::new(lines).block(block);
    frame.render_widget(paragraph, area);
}
