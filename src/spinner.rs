// Progress indicator shown while a blocking request is in flight. One
// background thread redraws an indicatif spinner until the stop flag is set.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

pub const FRAME_INTERVAL: Duration = Duration::from_millis(100);
const FRAMES: &[&str] = &["|", "/", "-", "\\", ""];

pub struct Spinner {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Spinner {
    /// Start animating `message`. The bar draws to stderr and stays hidden
    /// when stderr is not a terminal.
    pub fn start(message: &str) -> Self {
        Self::with_bar(ProgressBar::new_spinner(), message)
    }

    fn with_bar(bar: ProgressBar, message: &str) -> Self {
        // The template is a literal; a parse failure leaves indicatif's default style.
        if let Ok(style) = ProgressStyle::with_template("⏳ {msg} {spinner}") {
            bar.set_style(style.tick_strings(FRAMES));
        }
        bar.set_message(message.to_string());

        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let handle = thread::spawn(move || {
            while !flag.load(Ordering::Acquire) {
                bar.tick();
                thread::sleep(FRAME_INTERVAL);
            }
            bar.finish_and_clear();
        });

        Self {
            stop,
            handle: Some(handle),
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Signal the thread and wait for it to clear the line.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            // A panicked spinner thread has nothing left to clean up.
            let _ = handle.join();
        }
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        self.stop();
    }
}
