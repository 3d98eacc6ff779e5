//! Channel to latest-task index
//!
//! Dependencies are declared by channel ("after B") and resolved to a
//! concrete task when the dependent task is enqueued. Each task has at most
//! one predecessor.

use crate::layout::{Channel, ChannelMap};
use crate::motion::TaskId;

/// Most recently enqueued task per channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DependencyIndex {
    latest: ChannelMap<Option<TaskId>>,
}

impl Default for DependencyIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl DependencyIndex {
    /// Empty index
    pub const fn new() -> Self {
        Self {
            latest: ChannelMap::splat(None),
        }
    }

    /// Note that `id` is now the latest task for `channel`
    pub fn record(&mut self, channel: Channel, id: TaskId) {
        self.latest[channel] = Some(id);
    }

    /// Task a new dependent on `channel` should wait for
    pub fn predecessor(&self, channel: Option<Channel>) -> Option<TaskId> {
        channel.and_then(|c| self.latest[c])
    }

    /// Forget every task
    pub fn clear(&mut self) {
        self.latest = ChannelMap::splat(None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_task_wins() {
        let mut index = DependencyIndex::new();
        let ch = Channel::new(8).unwrap();
        assert_eq!(index.predecessor(Some(ch)), None);

        index.record(ch, TaskId(1));
        index.record(ch, TaskId(4));
        assert_eq!(index.predecessor(Some(ch)), Some(TaskId(4)));
        assert_eq!(index.predecessor(None), None);

        index.clear();
        assert_eq!(index.predecessor(Some(ch)), None);
    }
}
