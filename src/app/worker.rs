use std::io;
use std::sync::mpsc::Sender;

use super::event::Completion;

pub type Job = Box<dyn FnOnce() -> Completion + Send + 'static>;

/// Runs network work off the event loop and posts the completion back.
pub trait JobRunner {
    /// An error means the job was dropped without running.
    fn spawn(
        &self,
        label: &'static str,
        job: Job,
        completions: Sender<Completion>,
    ) -> io::Result<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadJobRunner;

impl JobRunner for ThreadJobRunner {
    fn spawn(
        &self,
        label: &'static str,
        job: Job,
        completions: Sender<Completion>,
    ) -> io::Result<()> {
        std::thread::Builder::new()
            .name(format!("postcomposer-{label}"))
            .spawn(move || {
                let _ = completions.send(job());
            })
            .map(|_| ())
    }
}

#[cfg(test)]
pub(crate) use manual::ManualJobRunner;
