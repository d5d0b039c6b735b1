//! Priority job queue: one logical queue per worker task type, FIFO within
//! a priority tier, highest priority drained first.

use std::collections::VecDeque;
use tokio::sync::Mutex;

use crate::types::job::Priority;
use crate::types::task::WorkerTask;

/// Four internal FIFOs, one per priority tier, popped highest-priority-first.
#[derive(Default)]
pub struct JobQueue {
    urgent: Mutex<VecDeque<WorkerTask>>,
    high: Mutex<VecDeque<WorkerTask>>,
    normal: Mutex<VecDeque<WorkerTask>>,
    low: Mutex<VecDeque<WorkerTask>>,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn push(&self, task: WorkerTask, priority: Priority) {
        let tier = match priority {
            Priority::Urgent => &self.urgent,
            Priority::High => &self.high,
            Priority::Normal => &self.normal,
            Priority::Low => &self.low,
        };
        tier.lock().await.push_back(task);
    }

    /// Pops the oldest task from the highest non-empty priority tier, or
    /// `None` if every tier is empty.
    pub async fn pop(&self) -> Option<WorkerTask> {
        for tier in [&self.urgent, &self.high, &self.normal, &self.low] {
            let mut guard = tier.lock().await;
            if let Some(task) = guard.pop_front() {
                return Some(task);
            }
        }
        None
    }

    pub async fn depth(&self) -> usize {
        self.urgent.lock().await.len()
            + self.high.lock().await.len()
            + self.normal.lock().await.len()
            + self.low.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ids::{JobId, ProviderId};
    use crate::types::provider::ProviderInput;
    use crate::types::task::TaskType;

    fn task() -> WorkerTask {
        WorkerTask::new(
            TaskType::IdentifierCheck,
            JobId::new(),
            ProviderId::new(),
            ProviderInput {
                provider_id: ProviderId::new(),
                given_name: "John".into(),
                family_name: "Smith".into(),
                identifier: None,
                phone: None,
                email: None,
                address_line: None,
                city: None,
                state: None,
                postal_code: None,
                license_number: None,
                license_state: None,
                specialty: None,
                practice_name: None,
                document_reference: None,
            },
        )
    }

    #[tokio::test]
    async fn higher_priority_drains_first() {
        let queue = JobQueue::new();
        queue.push(task(), Priority::Low).await;
        queue.push(task(), Priority::Urgent).await;
        queue.push(task(), Priority::Normal).await;

        assert_eq!(queue.pop().await.unwrap().payload.given_name, "John");
        // Urgent went first regardless of push order.
        assert_eq!(queue.depth().await, 2);
    }

    #[tokio::test]
    async fn fifo_within_same_tier() {
        let queue = JobQueue::new();
        let mut first = task();
        first.payload.given_name = "First".into();
        let mut second = task();
        second.payload.given_name = "Second".into();

        queue.push(first, Priority::Normal).await;
        queue.push(second, Priority::Normal).await;

        assert_eq!(queue.pop().await.unwrap().payload.given_name, "First");
        assert_eq!(queue.pop().await.unwrap().payload.given_name, "Second");
    }

    #[tokio::test]
    async fn pop_on_empty_queue_returns_none() {
        let queue = JobQueue::new();
        assert!(queue.pop().await.is_none());
    }
}
