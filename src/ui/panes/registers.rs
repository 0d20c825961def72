//! Register file pane rendering

use super::utils::{clamp_scroll, hex_spans, pane_block, visible_rows};
use crate::bytecode::flags::Flag;
use crate::memory::registers::{register_window, FLAGS, REGISTERS};
use crate::memory::value::to_int;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem},
    Frame,
};

/// Data needed to render the registers pane
pub struct RegistersRenderData<'a> {
    pub registers: &'a [u8],
    /// Register bytes one step earlier, for change highlighting
    pub previous: Option<&'a [u8]>,
}

/// Value column for a register's bytes
fn register_value(address: u8, bytes: &[u8]) -> String {
    if address == FLAGS {
        return match bytes.first().copied().and_then(Flag::from_byte) {
            Some(flag) => flag.to_string(),
            None => "-".to_string(),
        };
    }
    match *bytes {
        [b0, b1, b2, b3, b4, b5, b6, b7] => {
            i64::from_le_bytes([b0, b1, b2, b3, b4, b5, b6, b7]).to_string()
        }
        _ => to_int(bytes).map_or_else(|_| "?".to_string(), |v| v.to_string()),
    }
}

/// Render the registers pane
pub fn render_registers_pane(
    frame: &mut Frame,
    area: Rect,
    data: RegistersRenderData,
    is_focused: bool,
    scroll_offset: &mut usize,
) {
    let block = pane_block(" Registers ", is_focused);

    let items: Vec<ListItem> = REGISTERS
        .iter()
        .filter_map(|(address, name)| {
            let (low, high) = register_window(*address)?;
            let bytes = data.registers.get(low..high)?;
            let previous = data.previous.and_then(|p| p.get(low..high));
            let changed = |i: usize| previous.is_some_and(|p| p[i] != bytes[i]);

            let mut spans = vec![
                Span::styled(
                    format!("{:<6}", name),
                    Style::default()
                        .fg(DEFAULT_THEME.register)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(
                    format!("@{:<3} ", address),
                    Style::default().fg(DEFAULT_THEME.comment),
                ),
            ];
            spans.extend(hex_spans(bytes, changed));
            spans.push(Span::styled(
                format!(" {}", register_value(*address, bytes)),
                Style::default().fg(DEFAULT_THEME.number),
            ));
            Some(ListItem::new(Line::from(spans)))
        })
        .collect();

    let visible_height = visible_rows(area.height);
    clamp_scroll(scroll_offset, items.len(), visible_height);

    let visible_items: Vec<ListItem> = items
        .into_iter()
        .skip(*scroll_offset)
        .take(visible_height)
        .collect();

    frame.render_widget(List::new(visible_items).block(block), area);
}
