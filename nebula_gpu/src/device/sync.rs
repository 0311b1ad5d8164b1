/// Fence and CommandQueue traits - CPU/GPU synchronization and submission

use crate::device::CommandList;
use crate::error::Result;

/// Monotonic fence for CPU/GPU synchronization
///
/// The device advances the completed value as it finishes work signaled on
/// the queue. The completed value never exceeds the last signaled target.
pub trait Fence: Send + Sync {
    /// Most recent value the device has completed
    fn completed_value(&self) -> u64;

    /// Block the calling thread until the completed value reaches `value`
    ///
    /// The wait is unbounded; a hung device is indistinguishable from a slow
    /// one. Callers skip the call entirely when the fence is already
    /// satisfied.
    fn wait(&self, value: u64) -> Result<()>;
}

/// Execution queue of the device
pub trait CommandQueue: Send + Sync {
    /// Submit a closed command list as the sole work item
    ///
    /// # Arguments
    ///
    /// * `list` - The command list to execute; must be closed
    fn execute(&self, list: &mut dyn CommandList) -> Result<()>;

    /// Enqueue a fence signal after all previously submitted work
    ///
    /// # Arguments
    ///
    /// * `fence` - The fence to signal
    /// * `value` - The value the fence completes to
    fn signal(&self, fence: &dyn Fence, value: u64) -> Result<()>;
}
