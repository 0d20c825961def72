//! Stack pane rendering
//!
//! The live stack (`STACK_LOW_ADDRESS..sp`) as a hex dump, eight bytes per
//! row with absolute addresses and an ASCII column. Bytes that differ from
//! the previous step, or did not exist then, are highlighted.

use super::utils::{ascii_column, hex_spans, pane_block, visible_rows};
use crate::memory::registers::STACK_LOW_ADDRESS;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{List, ListItem, Paragraph},
    Frame,
};

/// Bytes per hex dump row
pub const ROW_WIDTH: usize = 8;

/// Scroll state for the stack pane
pub struct StackScrollState {
    pub offset: usize,
    pub prev_item_count: usize,
}

/// Data needed to render the stack pane
pub struct StackRenderData<'a> {
    pub stack: &'a [u8],
    /// Stack bytes one step earlier, for change highlighting
    pub previous: Option<&'a [u8]>,
    pub sp: usize,
}

/// Render the stack pane
pub fn render_stack_pane(
    frame: &mut Frame,
    area: Rect,
    data: StackRenderData,
    is_focused: bool,
    scroll_state: &mut StackScrollState,
) {
    let title = format!(" Stack (sp = {}) ", data.sp);
    let block = pane_block(&title, is_focused);

    if data.stack.is_empty() {
        let paragraph = Paragraph::new("(empty)")
            .block(block)
            .style(Style::default().fg(DEFAULT_THEME.comment));
        frame.render_widget(paragraph, area);
        scroll_state.prev_item_count = 0;
        return;
    }

    let all_items: Vec<ListItem> = data
        .stack
        .chunks(ROW_WIDTH)
        .enumerate()
        .map(|(row, bytes)| {
            let base = row * ROW_WIDTH;
            let changed = |i: usize| {
                data.previous
                    .map_or(true, |p| p.get(base + i) != Some(&bytes[i]))
            };

            let mut spans = vec![Span::styled(
                format!("{:06X}  ", STACK_LOW_ADDRESS + base),
                Style::default().fg(DEFAULT_THEME.comment),
            )];
            spans.extend(hex_spans(bytes, changed));
            // Pad short rows so the ASCII column lines up
            spans.push(Span::raw(" ".repeat((ROW_WIDTH - bytes.len()) * 3)));
            spans.push(Span::styled(
                format!(" {}", ascii_column(bytes)),
                Style::default().fg(DEFAULT_THEME.secondary),
            ));
            ListItem::new(Line::from(spans))
        })
        .collect();

    let total_items = all_items.len();
    let visible_height = visible_rows(area.height);

    // Scroll to bottom only when the stack grows
    if total_items > scroll_state.prev_item_count {
        scroll_state.offset = total_items.saturating_sub(visible_height);
    } else if total_items > visible_height {
        scroll_state.offset = scroll_state.offset.min(total_items - visible_height);
    } else {
        scroll_state.offset = 0;
    }
    scroll_state.prev_item_count = total_items;

    let visible_items: Vec<ListItem> = all_items
        .into_iter()
        .skip(scroll_state.offset)
        .take(visible_height)
        .collect();

    frame.render_widget(List::new(visible_items).block(block), area);
}
