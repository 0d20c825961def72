// Constants for the virtual machine

/// Initial size of flat memory (32 KiB)
pub const DEFAULT_MEMORY_SIZE: usize = 32 * 1024;

/// Flat memory never grows past this (16 MiB)
pub const DEFAULT_MEMORY_LIMIT: usize = 16 * 1024 * 1024;

/// Initial size of the scratch pool's main buffer (8 KiB)
pub const DEFAULT_SCRATCH_SIZE: usize = 8 * 1024;

/// Default snapshot budget for recorded runs (1 GiB)
pub const DEFAULT_SNAPSHOT_LIMIT: usize = 1024 * 1024 * 1024;

/// Sizes used when building a [`Machine`](super::engine::Machine)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MachineConfig {
    /// Initial length of flat memory in bytes
    pub memory_size: usize,
    /// Hard cap on memory growth
    pub memory_limit: usize,
    /// Initial length of the scratch main buffer
    pub scratch_size: usize,
}

impl Default for MachineConfig {
    fn default() -> Self {
        MachineConfig {
            memory_size: DEFAULT_MEMORY_SIZE,
            memory_limit: DEFAULT_MEMORY_LIMIT,
            scratch_size: DEFAULT_SCRATCH_SIZE,
        }
    }
}
