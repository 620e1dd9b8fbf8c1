use std::panic::{self, AssertUnwindSafe};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;

/// Fixed-size pool of worker threads serving connections, joining all of them on drop.
pub struct ThreadPool {
    workers: Vec<Worker>,
    sender: Option<mpsc::Sender<Job>>,
}

impl ThreadPool {
    /// Create a new ThreadPool with `size` threads.
    ///
    /// `size` must be greater than 0.
    pub fn new(size: usize) -> ThreadPool {
        assert!(size > 0, "ThreadPool size must be greater than 0");

        let (sender, receiver) = mpsc::channel();
        let receiver = Arc::new(Mutex::new(receiver));

        let workers = (0..size)
            .map(|id| Worker::new(id, Arc::clone(&receiver)))
            .collect();
        tracing::debug!(size, "Thread pool started");

        ThreadPool {
            workers,
            sender: Some(sender),
        }
    }

    /// Queue a task to run on the threadpool when a worker is available.
    pub fn execute<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let sent = self
            .sender
            .as_ref()
            .map(|sender| sender.send(Box::new(f)).is_ok());
        if sent != Some(true) {
            tracing::error!("Thread pool is shut down, dropping job");
        }
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        drop(self.sender.take());
        for worker in &mut self.workers {
            if let Some(thread) = worker.handle.take() {
                if thread.join().is_err() {
                    tracing::error!(worker = worker.id, "Worker panicked");
                }
            }
        }
    }
}

/// Type of jobs to be executed by the threadpool.
type Job = Box<dyn FnOnce() + Send + 'static>;

/// Worker struct, holding a thread handle.
struct Worker {
    id: usize,
    handle: Option<thread::JoinHandle<()>>,
}

impl Worker {
    /// Create a new worker that will execute jobs from the given receiver until this one is closed.
    /// A panicking job is logged and the worker moves on to the next one.
    fn new(id: usize, receiver: Arc<Mutex<mpsc::Receiver<Job>>>) -> Worker {
        let handle = thread::spawn(move || loop {
            let message = match receiver.lock() {
                Ok(guard) => guard.recv(),
                Err(poisoned) => poisoned.into_inner().recv(),
            };
            match message {
                Ok(job) => {
                    if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
                        tracing::error!(worker = id, "Job panicked");
                    }
                }
                Err(_) => break,
            }
        });
        Worker {
            id,
            handle: Some(handle),
        }
    }
}
