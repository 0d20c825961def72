use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    style::{Modifier, Style},
    text::Span,
    widgets::{Block, Borders},
};

/// Bordered pane block, highlighted when focused
pub(crate) fn pane_block(title: &str, is_focused: bool) -> Block<'_> {
    let border_style = if is_focused {
        Style::default()
            .fg(DEFAULT_THEME.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.border_normal)
    };

    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style)
}

/// Rows available inside a bordered pane of `height`, at least 1
pub(crate) fn visible_rows(height: u16) -> usize {
    height.saturating_sub(2).max(1) as usize
}

/// Clamp `offset` so the last page stays full
pub(crate) fn clamp_scroll(offset: &mut usize, total: usize, visible: usize) {
    if total > visible {
        *offset = (*offset).min(total - visible);
    } else {
        *offset = 0;
    }
}

/// One span per byte, `changed` bytes highlighted
pub(crate) fn hex_spans(bytes: &[u8], changed: impl Fn(usize) -> bool) -> Vec<Span<'static>> {
    bytes
        .iter()
        .enumerate()
        .map(|(i, byte)| {
            let style = if changed(i) {
                Style::default()
                    .fg(DEFAULT_THEME.changed)
                    .add_modifier(Modifier::BOLD)
            } else if *byte == 0 {
                Style::default().fg(DEFAULT_THEME.comment)
            } else {
                Style::default().fg(DEFAULT_THEME.fg)
            };
            Span::styled(format!("{:02X} ", byte), style)
        })
        .collect()
}

/// Printable ASCII, `.` for everything else
pub(crate) fn ascii_column(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| {
            if b.is_ascii_graphic() || *b == b' ' {
                *b as char
            } else {
                '.'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_scroll() {
        let mut offset = 50;
        clamp_scroll(&mut offset, 20, 5);
        assert_eq!(offset, 15);

        clamp_scroll(&mut offset, 3, 5);
        assert_eq!(offset, 0);
    }

    #[test]
    fn test_ascii_column() {
        assert_eq!(ascii_column(b"hi\x00\xFF "), "hi.. ");
    }

    #[test]
    fn test_hex_spans() {
        let spans = hex_spans(&[0x0A, 0xFF], |_| false);
        assert_eq!(spans[0].content, "0A ");
        assert_eq!(spans[1].content, "FF ");
    }
}
