//! Main TUI application state and logic

use crate::bytecode::disasm::{disassemble, Listing};
use crate::interpreter::errors::HistoryError;
use crate::interpreter::history::Recording;
use crate::ui::panes::{
    render_program_pane, render_registers_pane, render_stack_pane, render_status_bar,
    render_terminal_pane, ProgramRenderData, ProgramScrollState, RegistersRenderData,
    StackRenderData, StackScrollState, StatusRenderData,
};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};
use std::io;
use std::time::{Duration, Instant};

/// Register pane height: one row per register plus borders
const REGISTERS_HEIGHT: u16 = 19;

/// Which pane is currently focused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusedPane {
    Program,
    Terminal,
    Registers,
    Stack,
}

impl FocusedPane {
    /// Move focus to the next pane (clockwise: program -> output -> registers -> stack)
    pub fn next(self) -> Self {
        match self {
            FocusedPane::Program => FocusedPane::Terminal,
            FocusedPane::Terminal => FocusedPane::Registers,
            FocusedPane::Registers => FocusedPane::Stack,
            FocusedPane::Stack => FocusedPane::Program,
        }
    }

    /// Move focus to the previous pane (counter-clockwise)
    pub fn prev(self) -> Self {
        match self {
            FocusedPane::Program => FocusedPane::Stack,
            FocusedPane::Terminal => FocusedPane::Program,
            FocusedPane::Registers => FocusedPane::Terminal,
            FocusedPane::Stack => FocusedPane::Registers,
        }
    }
}

/// The main application state
pub struct App {
    /// The recorded run being browsed
    pub recording: Recording,

    /// Disassembly of the recorded program
    pub listing: Listing,

    /// Currently focused pane
    pub focused_pane: FocusedPane,

    /// Per-pane scroll state
    pub program_scroll: ProgramScrollState,
    pub registers_scroll: usize,
    pub stack_scroll: StackScrollState,
    pub terminal_scroll: usize,

    /// Whether the app should quit
    pub should_quit: bool,

    /// Status message to display
    pub status_message: String,

    /// Whether auto-play mode is active
    pub is_playing: bool,

    /// Last time a step was taken in play mode
    pub last_play_time: Instant,

    /// Last time space was pressed (for debouncing)
    pub last_space_press: Instant,
}

impl App {
    /// Create a new app browsing `recording`
    pub fn new(recording: Recording) -> Self {
        let listing = disassemble(recording.program());
        let status_message = match recording.truncated() {
            Some(e) => format!("History truncated: {}", e),
            None => String::from("Ready!"),
        };

        App {
            recording,
            listing,
            focused_pane: FocusedPane::Program,
            program_scroll: ProgramScrollState {
                offset: 0,
                target_row: None,
            },
            registers_scroll: 0,
            stack_scroll: StackScrollState {
                offset: 0,
                prev_item_count: 0,
            },
            terminal_scroll: 0,
            should_quit: false,
            status_message,
            is_playing: false,
            last_play_time: Instant::now(),
            last_space_press: Instant::now()
                .checked_sub(Duration::from_secs(1))
                .unwrap_or(Instant::now()),
        }
    }

    /// Run the TUI application
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.should_quit {
                break;
            }

            // Handle auto-play mode
            if self.is_playing && self.last_play_time.elapsed() >= Duration::from_millis(500) {
                if self.recording.step_forward().is_ok() {
                    self.status_message = "Playing...".to_string();
                    self.terminal_scroll = usize::MAX;
                } else {
                    self.is_playing = false;
                    self.status_message = "Playback complete".to_string();
                }
                self.last_play_time = Instant::now();
            }

            // Poll with a timeout so auto-play keeps ticking
            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key_event(key);
                    }
                }
            }
        }

        Ok(())
    }

    /// Render the UI
    fn render(&mut self, frame: &mut Frame) {
        let size = frame.area();

        // Panes in 2 columns, plus status bar at bottom
        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(size);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(main_chunks[0]);

        // Left column: Program (top) | Output (bottom)
        let left_rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
            .split(columns[0]);

        // Right column: Registers (top) | Stack (bottom)
        let right_rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(REGISTERS_HEIGHT), Constraint::Min(0)])
            .split(columns[1]);

        let Some(snapshot) = self.recording.current() else {
            return;
        };
        let previous = self.recording.previous();
        let error_offset = snapshot
            .exit_code
            .filter(|code| !code.is_ok())
            .and(snapshot.opcode_offset);

        render_program_pane(
            frame,
            left_rows[0],
            ProgramRenderData {
                listing: &self.listing,
                pc: snapshot.pc,
                error_offset,
            },
            self.focused_pane == FocusedPane::Program,
            &mut self.program_scroll,
        );

        render_terminal_pane(
            frame,
            left_rows[1],
            self.recording.output(),
            self.focused_pane == FocusedPane::Terminal,
            &mut self.terminal_scroll,
        );

        render_registers_pane(
            frame,
            right_rows[0],
            RegistersRenderData {
                registers: &snapshot.registers,
                previous: previous.map(|p| p.registers.as_slice()),
            },
            self.focused_pane == FocusedPane::Registers,
            &mut self.registers_scroll,
        );

        render_stack_pane(
            frame,
            right_rows[1],
            StackRenderData {
                stack: &snapshot.stack,
                previous: previous.map(|p| p.stack.as_slice()),
                sp: snapshot.sp,
            },
            self.focused_pane == FocusedPane::Stack,
            &mut self.stack_scroll,
        );

        render_status_bar(
            frame,
            main_chunks[1],
            StatusRenderData {
                message: &self.status_message,
                current_step: self.recording.history_position(),
                total_steps: self.recording.total_snapshots(),
                exit_code: snapshot.exit_code,
                truncated: self.recording.truncated().is_some(),
                is_playing: self.is_playing,
            },
        );
    }

    /// Handle keyboard events
    fn handle_key_event(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.should_quit = true;
            }
            // Number keys step forward N times directly
            KeyCode::Char(c @ '1'..='9') => {
                self.is_playing = false;
                let n = c.to_digit(10).unwrap_or(1) as usize;
                let mut stepped = 0;
                for _ in 0..n {
                    if self.recording.step_forward().is_err() {
                        break;
                    }
                    stepped += 1;
                }
                self.status_message = format!("Stepped forward {} step(s)", stepped);
                self.terminal_scroll = usize::MAX;
            }
            KeyCode::Tab => {
                self.focused_pane = self.focused_pane.next();
            }
            KeyCode::BackTab => {
                self.focused_pane = self.focused_pane.prev();
            }
            KeyCode::Left => {
                self.is_playing = false;
                self.step_backward();
            }
            KeyCode::Right => {
                self.is_playing = false;
                self.step_forward();
            }
            KeyCode::Up => match self.focused_pane {
                FocusedPane::Program => {
                    // Scrolling up makes the current instruction move down visually
                    if let Some(row) = self.program_scroll.target_row {
                        self.program_scroll.target_row = Some(row.saturating_add(1));
                    }
                }
                FocusedPane::Registers => {
                    self.registers_scroll = self.registers_scroll.saturating_sub(1);
                }
                FocusedPane::Stack => {
                    self.stack_scroll.offset = self.stack_scroll.offset.saturating_sub(1);
                }
                FocusedPane::Terminal => {
                    self.terminal_scroll = self.terminal_scroll.saturating_sub(1);
                }
            },
            KeyCode::Down => match self.focused_pane {
                FocusedPane::Program => {
                    if let Some(row) = self.program_scroll.target_row {
                        self.program_scroll.target_row = Some(row.saturating_sub(1));
                    }
                }
                FocusedPane::Registers => {
                    self.registers_scroll = self.registers_scroll.saturating_add(1);
                }
                FocusedPane::Stack => {
                    self.stack_scroll.offset = self.stack_scroll.offset.saturating_add(1);
                }
                FocusedPane::Terminal => {
                    self.terminal_scroll = self.terminal_scroll.saturating_add(1);
                }
            },
            KeyCode::Char(' ') => {
                // Toggle auto-play (200ms debounce against key repeat)
                if self.last_space_press.elapsed() >= Duration::from_millis(200) {
                    self.last_space_press = Instant::now();
                    self.is_playing = !self.is_playing;
                    if self.is_playing {
                        self.last_play_time = Instant::now()
                            .checked_sub(Duration::from_secs(1))
                            .unwrap_or(Instant::now());
                        self.status_message = "Playing...".to_string();
                    } else {
                        self.status_message = "Paused".to_string();
                    }
                }
            }
            KeyCode::Enter => {
                self.is_playing = false;
                let result = self.recording.jump_to_end();
                self.report(result, "Jumped to end");
            }
            KeyCode::Backspace => {
                self.is_playing = false;
                let result = self.recording.rewind_to_start();
                self.report(result, "Jumped to start");
            }
            _ => {}
        }
    }

    /// Step forward in history
    fn step_forward(&mut self) {
        let result = self.recording.step_forward();
        self.report(result, "Stepped forward");
    }

    /// Step backward in history
    fn step_backward(&mut self) {
        let result = self.recording.step_backward();
        self.report(result, "Stepped backward");
    }

    fn report(&mut self, result: Result<(), HistoryError>, success: &str) {
        match result {
            Ok(()) => {
                self.status_message = success.to_string();
                // Auto-scroll output to bottom
                self.terminal_scroll = usize::MAX;
            }
            Err(e) => {
                self.status_message = e.to_string();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bytecode::builder::ProgramBuilder;
    use crate::interpreter::constants::{MachineConfig, DEFAULT_SNAPSHOT_LIMIT};
    use crate::memory::value::WordSize::HWord;
    use crossterm::event::KeyModifiers;

    fn app() -> App {
        let program = ProgramBuilder::new()
            .push(HWord, 1)
            .push(HWord, 2)
            .push(HWord, 3)
            .build();
        App::new(Recording::capture(
            MachineConfig::default(),
            &program,
            DEFAULT_SNAPSHOT_LIMIT,
        ))
    }

    fn press(app: &mut App, code: KeyCode) {
        app.handle_key_event(KeyEvent::new(code, KeyModifiers::NONE));
    }

    #[test]
    fn test_focus_cycles() {
        let mut pane = FocusedPane::Program;
        for _ in 0..4 {
            pane = pane.next();
        }
        assert_eq!(pane, FocusedPane::Program);
        assert_eq!(FocusedPane::Program.next().prev(), FocusedPane::Program);
    }

    #[test]
    fn test_navigation_keys() {
        let mut app = app();
        assert_eq!(app.listing.len(), 3);

        press(&mut app, KeyCode::Right);
        assert_eq!(app.recording.history_position(), 1);

        press(&mut app, KeyCode::Char('9'));
        assert_eq!(app.recording.history_position(), 3);
        assert_eq!(app.status_message, "Stepped forward 2 step(s)");

        press(&mut app, KeyCode::Right);
        assert_eq!(app.status_message, HistoryError::AtEnd.to_string());

        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.recording.history_position(), 0);

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.recording.history_position(), 3);

        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }
}
