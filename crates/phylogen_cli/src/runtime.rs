use std::future::Future;
use std::time::Duration;

use phylogen::api::EventLoop;
use tokio_util::task::TaskTracker;

/// Runs detached work on the current `LocalSet`, tracked so the client can
/// let in-flight saves finish before exiting.
#[derive(Debug, Clone, Default)]
pub struct TokioLoop {
    tasks: TaskTracker,
}

impl TokioLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for every detached task spawned so far.
    pub async fn drain(&self) {
        self.tasks.close();
        self.tasks.wait().await;
        self.tasks.reopen();
    }
}

impl EventLoop for TokioLoop {
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> {
        tokio::time::sleep(duration)
    }

    fn spawn_detached<F>(&self, task: F)
    where
        F: Future<Output = ()> + 'static,
    {
        self.tasks.spawn_local(task);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;
    use tokio::task::LocalSet;

    #[tokio::test(start_paused = true)]
    async fn drain_waits_for_detached_tasks() {
        LocalSet::new()
            .run_until(async {
                let runtime = TokioLoop::new();
                let done = Rc::new(Cell::new(false));
                let flag = Rc::clone(&done);
                runtime.spawn_detached(async move {
                    tokio::time::sleep(Duration::from_secs(2)).await;
                    flag.set(true);
                });
                runtime.drain().await;
                assert!(done.get());
            })
            .await;
    }
}
