//! Recorded execution for time-travel debugging
//!
//! [`Recording::capture`] runs a program one instruction at a time and keeps a
//! [`Snapshot`] of the machine after every step, starting with the freshly
//! loaded state. The recording can then be walked forward and backward
//! without re-executing anything.
//!
//! Snapshots are bounded by a memory budget. When the budget runs out the
//! recording stops there; the partial history stays navigable and
//! [`Recording::truncated`] reports why it ended early.

use crate::interpreter::constants::MachineConfig;
use crate::interpreter::engine::Machine;
use crate::interpreter::errors::{HistoryError, ReturnCode};
use crate::snapshot::{Snapshot, SnapshotManager, Terminal};
use tracing::{debug, warn};

impl Machine<Terminal> {
    /// Capture the current machine state
    pub fn snapshot(&self) -> Snapshot {
        let instruction = self.last_instruction();
        Snapshot {
            pc: self.pc(),
            sp: self.sp(),
            opcode: instruction.map(|(_, opcode)| opcode),
            opcode_offset: instruction.map(|(offset, _)| offset),
            registers: self.dump_registers(),
            stack: self.dump_stack(),
            output_len: self.sink().len(),
            exit_code: self.exit_code(),
        }
    }
}

/// A fully executed program and its navigable history
#[derive(Debug)]
pub struct Recording {
    program: Vec<u8>,
    snapshots: SnapshotManager,
    terminal: Terminal,
    position: usize,
    exit_code: Option<ReturnCode>,
    truncated: Option<HistoryError>,
}

impl Recording {
    /// Run `program` to completion, recording every step
    pub fn capture(config: MachineConfig, program: &[u8], snapshot_limit: usize) -> Self {
        let mut machine = Machine::new(config);
        machine.load(program);

        let mut snapshots = SnapshotManager::new(snapshot_limit);
        let mut truncated = snapshots.push(machine.snapshot()).err();

        while truncated.is_none() && machine.is_running() {
            machine.step();
            if let Err(e) = snapshots.push(machine.snapshot()) {
                warn!(error = %e, steps = snapshots.len(), "recording truncated");
                truncated = Some(e);
            }
        }

        debug!(
            snapshots = snapshots.len(),
            memory = snapshots.memory_usage(),
            "recording finished"
        );

        let exit_code = if machine.is_running() {
            None
        } else {
            machine.exit_code()
        };

        Recording {
            program: program.to_vec(),
            snapshots,
            terminal: machine.into_sink(),
            position: 0,
            exit_code,
            truncated,
        }
    }

    /// Snapshot at the current history position
    pub fn current(&self) -> Option<&Snapshot> {
        self.snapshots.get(self.position)
    }

    /// Snapshot one step before the current position
    pub fn previous(&self) -> Option<&Snapshot> {
        self.position
            .checked_sub(1)
            .and_then(|index| self.snapshots.get(index))
    }

    /// Step forward in history
    pub fn step_forward(&mut self) -> Result<(), HistoryError> {
        if self.snapshots.is_empty() {
            return Err(HistoryError::Empty);
        }
        if self.position + 1 >= self.snapshots.len() {
            return Err(HistoryError::AtEnd);
        }
        self.position += 1;
        Ok(())
    }

    /// Step backward in history
    pub fn step_backward(&mut self) -> Result<(), HistoryError> {
        if self.snapshots.is_empty() {
            return Err(HistoryError::Empty);
        }
        if self.position == 0 {
            return Err(HistoryError::AtStart);
        }
        self.position -= 1;
        Ok(())
    }

    /// Rewind to the beginning of execution history
    pub fn rewind_to_start(&mut self) -> Result<(), HistoryError> {
        if self.snapshots.is_empty() {
            return Err(HistoryError::Empty);
        }
        self.position = 0;
        Ok(())
    }

    /// Jump to the last recorded state
    pub fn jump_to_end(&mut self) -> Result<(), HistoryError> {
        if self.snapshots.is_empty() {
            return Err(HistoryError::Empty);
        }
        self.position = self.snapshots.len() - 1;
        Ok(())
    }

    // ========== Getter methods for UI ==========

    pub fn program(&self) -> &[u8] {
        &self.program
    }

    /// Output printed up to the current history position
    pub fn output(&self) -> &[String] {
        let lines = self.terminal.get_output();
        let len = self.current().map_or(0, |s| s.output_len).min(lines.len());
        &lines[..len]
    }

    /// Everything the program printed
    pub fn terminal(&self) -> &Terminal {
        &self.terminal
    }

    pub fn history_position(&self) -> usize {
        self.position
    }

    pub fn total_snapshots(&self) -> usize {
        self.snapshots.len()
    }

    pub fn memory_usage(&self) -> usize {
        self.snapshots.memory_usage()
    }

    pub fn memory_limit(&self) -> usize {
        self.snapshots.memory_limit()
    }

    /// Final return code; `None` if recording stopped before the program halted
    pub fn exit_code(&self) -> Option<ReturnCode> {
        self.exit_code
    }

    /// Why recording stopped early, if it did
    pub fn truncated(&self) -> Option<&HistoryError> {
        self.truncated.as_ref()
    }
}
