use core::alloc::Layout;
use core::fmt;

/// The error returned by `try_reserve` when the table cannot grow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TryReserveError {
    /// The requested group count does not fit in `usize`, or its layout
    /// exceeds `isize::MAX` bytes.
    CapacityOverflow,
    /// The allocator refused a request of this layout.
    AllocError {
        /// The layout of the rejected group array.
        layout: Layout,
    },
}

impl fmt::Display for TryReserveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TryReserveError::CapacityOverflow => {
                f.write_str("capacity overflow while sizing the group array")
            }
            TryReserveError::AllocError { layout } => write!(
                f,
                "memory allocation of {} bytes for the group array failed",
                layout.size()
            ),
        }
    }
}

impl core::error::Error for TryReserveError {}
