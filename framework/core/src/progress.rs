use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Displays a progress bar for one batch, fed from the shared item counter.
///
/// The bar lives on its own thread and polls the counter, so workers only
/// ever touch the atomic. Call [BatchProgress::finish] once all workers have
/// joined to stop the thread and clear the bar.
pub(crate) struct BatchProgress {
    done: Arc<AtomicBool>,
    handle: Option<std::thread::JoinHandle<()>>,
}

impl BatchProgress {
    pub(crate) fn start(label: &str, total: u64, counter: Arc<AtomicU64>) -> Self {
        let done = Arc::new(AtomicBool::new(false));
        let thread_done = done.clone();
        let label = label.to_string();

        let handle = std::thread::Builder::new()
            .name("progress".to_string())
            .spawn(move || {
                let pb = ProgressBar::new(total);
                pb.set_style(
                    ProgressStyle::with_template(
                        "{msg} {spinner:.green} [{wide_bar:.cyan/blue}] {pos}/{len}",
                    )
                    .expect("Failed to set progress style")
                    .progress_chars("#>-"),
                );
                pb.set_message(label);

                loop {
                    pb.set_position(counter.load(Ordering::Relaxed));
                    if thread_done.load(Ordering::Acquire) {
                        pb.finish_and_clear();
                        break;
                    }
                    std::thread::sleep(Duration::from_millis(100));
                }
            })
            .expect("Failed to start progress thread");

        Self {
            done,
            handle: Some(handle),
        }
    }

    /// A handle that renders nothing, for `--no-progress` runs and tests.
    pub(crate) fn disabled() -> Self {
        Self {
            done: Arc::new(AtomicBool::new(true)),
            handle: None,
        }
    }

    pub(crate) fn finish(mut self) {
        self.done.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
