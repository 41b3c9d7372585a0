//! Terminal progress display for the indexing pipeline.

use std::sync::Mutex;

use indicatif::{ProgressBar, ProgressStyle};

use crate::pipeline::Progress;

/// Shows a spinner while extracting and a bar while embedding.
pub struct IndexProgress {
    bar: Mutex<Option<ProgressBar>>,
}

impl IndexProgress {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    pub fn update(&self, progress: Progress) {
        let Ok(mut slot) = self.bar.lock() else {
            return;
        };

        match progress {
            Progress::Extracting => {
                *slot = Some(spinner("Extracting text, tables and images..."));
            }
            Progress::Extracted { items } => {
                if let Some(pb) = slot.take() {
                    pb.finish_and_clear();
                }
                println!("  {} Extracted {} content blocks", super::icons::success(), items);
            }
            Progress::Chunked { chunks } => {
                println!("  {} Split into {} passages", super::icons::success(), chunks);
            }
            Progress::Embedding { done, total } => {
                let pb = slot.get_or_insert_with(|| embedding_bar(total as u64));
                if pb.length() != Some(total as u64) {
                    pb.set_length(total as u64);
                }
                pb.set_position(done as u64);
                if done >= total {
                    pb.finish_and_clear();
                    *slot = None;
                    println!("  {} Embedded {} passages", super::icons::success(), total);
                }
            }
            Progress::Saving => {
                if let Some(pb) = slot.take() {
                    pb.finish_and_clear();
                }
                *slot = Some(spinner("Saving index..."));
            }
        }
    }

    /// Clear whatever is still on screen.
    pub fn finish(&self) {
        if let Ok(mut slot) = self.bar.lock() {
            if let Some(pb) = slot.take() {
                pb.finish_and_clear();
            }
        }
    }
}

impl Default for IndexProgress {
    fn default() -> Self {
        Self::new()
    }
}

pub fn spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb.set_message(message);
    pb
}

fn embedding_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}")
    {
        pb.set_style(style.progress_chars("█▓░"));
    }
    pb.set_message("Embedding passages...");
    pb
}
