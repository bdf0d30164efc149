//! Overflow policies for the buffered writer queue
//!
//! When the buffered writer's queue is full, these policies determine how
//! to handle new writes. Writes at `error` severity and above always block.

use super::level::Level;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Policy for handling a full queue in [`BufferedWriter`](crate::writers::BufferedWriter)
///
/// # Example
///
/// ```
/// use logz::OverflowPolicy;
/// use std::time::Duration;
///
/// // Default behavior: wait for space
/// let policy = OverflowPolicy::default();
/// assert_eq!(policy, OverflowPolicy::Block);
///
/// let policy = OverflowPolicy::BlockWithTimeout(Duration::from_millis(100));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Block until space is available
    #[default]
    Block,

    /// Block with timeout, then drop
    BlockWithTimeout(Duration),

    /// Drop new writes while the queue is full; drops are counted
    DropNewest,

    /// Drop, then report the running drop count via callback and stderr
    AlertAndDrop,
}

impl fmt::Display for OverflowPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverflowPolicy::Block => write!(f, "Block"),
            OverflowPolicy::BlockWithTimeout(d) => write!(f, "BlockWithTimeout({:?})", d),
            OverflowPolicy::DropNewest => write!(f, "DropNewest"),
            OverflowPolicy::AlertAndDrop => write!(f, "AlertAndDrop"),
        }
    }
}

/// Preservation class of a write during overflow
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogPriority {
    /// Everything below `warn`
    #[default]
    Normal = 0,
    /// `warn` and `alert`
    High = 1,
    /// `error` and above; never dropped
    Critical = 2,
}

impl LogPriority {
    pub fn of(level: Level) -> Self {
        if level >= Level::Error {
            LogPriority::Critical
        } else if level >= Level::Warn {
            LogPriority::High
        } else {
            LogPriority::Normal
        }
    }
}

impl fmt::Display for LogPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogPriority::Normal => write!(f, "Normal"),
            LogPriority::High => write!(f, "High"),
            LogPriority::Critical => write!(f, "Critical"),
        }
    }
}

/// Called with the total number of dropped writes so far
pub type OverflowCallback = Arc<dyn Fn(u64) + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overflow_policy_default() {
        assert_eq!(OverflowPolicy::default(), OverflowPolicy::Block);
    }

    #[test]
    fn test_overflow_policy_display() {
        assert_eq!(OverflowPolicy::DropNewest.to_string(), "DropNewest");
        assert_eq!(
            OverflowPolicy::BlockWithTimeout(Duration::from_millis(100)).to_string(),
            "BlockWithTimeout(100ms)"
        );
        assert_eq!(OverflowPolicy::AlertAndDrop.to_string(), "AlertAndDrop");
    }

    #[test]
    fn test_priority_of_level() {
        assert_eq!(LogPriority::of(Level::Debug), LogPriority::Normal);
        assert_eq!(LogPriority::of(Level::Alert), LogPriority::High);
        assert_eq!(LogPriority::of(Level::Error), LogPriority::Critical);
        assert_eq!(LogPriority::of(Level::Panic), LogPriority::Critical);
        assert!(LogPriority::Normal < LogPriority::Critical);
    }
}
