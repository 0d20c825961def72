// Output sinks and snapshot management for reverse execution

use crate::bytecode::opcode::Opcode;
use crate::interpreter::errors::{HistoryError, ReturnCode};

/// Destination for `Print` output
pub trait OutputSink {
    fn write_line(&mut self, line: &str);
}

/// Terminal that captures printed lines in memory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Terminal {
    pub lines: Vec<String>,
}

impl Terminal {
    pub fn new() -> Self {
        Terminal { lines: Vec::new() }
    }

    /// All captured lines
    pub fn get_output(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }
}

impl OutputSink for Terminal {
    fn write_line(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }
}

/// Sink that prints straight to stdout
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn write_line(&mut self, line: &str) {
        println!("{}", line);
    }
}

/// Machine state after one executed instruction
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    /// Offset of the instruction that executes next
    pub pc: usize,
    pub sp: usize,
    /// Instruction that produced this state; `None` for the initial state
    pub opcode: Option<Opcode>,
    /// Offset of that instruction
    pub opcode_offset: Option<usize>,
    /// Register file bytes
    pub registers: Vec<u8>,
    /// Stack bytes from the stack low address up to `sp`
    pub stack: Vec<u8>,
    /// Number of output lines written so far
    pub output_len: usize,
    /// Set once the machine has halted
    pub exit_code: Option<ReturnCode>,
}

impl Snapshot {
    /// Estimate the memory usage of this snapshot in bytes
    pub fn estimated_size(&self) -> usize {
        std::mem::size_of::<Snapshot>() + self.registers.len() + self.stack.len()
    }
}

/// Manages execution history for reverse execution
#[derive(Debug)]
pub struct SnapshotManager {
    snapshots: Vec<Snapshot>,
    max_memory: usize,
    current_memory: usize,
}

impl SnapshotManager {
    pub fn new(max_memory: usize) -> Self {
        SnapshotManager {
            snapshots: Vec::new(),
            max_memory,
            current_memory: 0,
        }
    }

    /// Add a snapshot to history
    pub fn push(&mut self, snapshot: Snapshot) -> Result<(), HistoryError> {
        let snapshot_size = snapshot.estimated_size();

        if self.current_memory + snapshot_size > self.max_memory {
            return Err(HistoryError::SnapshotLimitExceeded {
                current: self.current_memory,
                limit: self.max_memory,
            });
        }

        self.current_memory += snapshot_size;
        self.snapshots.push(snapshot);
        Ok(())
    }

    /// Get a snapshot by index
    pub fn get(&self, index: usize) -> Option<&Snapshot> {
        self.snapshots.get(index)
    }

    pub fn last(&self) -> Option<&Snapshot> {
        self.snapshots.last()
    }

    /// Get the number of snapshots
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Get current memory usage
    pub fn memory_usage(&self) -> usize {
        self.current_memory
    }

    /// Get max memory limit
    pub fn memory_limit(&self) -> usize {
        self.max_memory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(stack: usize) -> Snapshot {
        Snapshot {
            pc: 0,
            sp: 64 + stack,
            opcode: None,
            opcode_offset: None,
            registers: vec![0; 64],
            stack: vec![0; stack],
            output_len: 0,
            exit_code: None,
        }
    }

    #[test]
    fn test_terminal_captures_lines() {
        let mut terminal = Terminal::new();
        terminal.write_line("hello");
        terminal.write_line("42");
        assert_eq!(terminal.get_output(), &["hello".to_string(), "42".to_string()]);
    }

    #[test]
    fn test_manager_enforces_budget() {
        let size = snapshot(16).estimated_size();
        let mut manager = SnapshotManager::new(size * 2);

        manager.push(snapshot(16)).unwrap();
        manager.push(snapshot(16)).unwrap();
        assert_eq!(manager.len(), 2);
        assert_eq!(manager.memory_usage(), size * 2);

        assert!(matches!(
            manager.push(snapshot(16)),
            Err(HistoryError::SnapshotLimitExceeded { .. })
        ));
        assert_eq!(manager.len(), 2);
    }
}
