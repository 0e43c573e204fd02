//! Progress rendering for the CLI
//!
//! Converts coordinator events into a single overall progress bar.

use colored::*;
use hashtab_core::HashEvent;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tokio::sync::mpsc;

/// Render events from a channel until the run completes or the channel closes
pub async fn render_progress(
    mut rx: mpsc::UnboundedReceiver<HashEvent>,
    resolution: u32,
    files: usize,
) {
    let mut renderer = ProgressRenderer::new(resolution, files);

    while let Some(event) = rx.recv().await {
        let done = event == HashEvent::AllFinished;
        renderer.handle_event(event);
        if done {
            break;
        }
    }

    renderer.finish();
}

/// Overall progress bar counting discrete steps and finished files
pub struct ProgressRenderer {
    bar: ProgressBar,
    files: usize,
    finished: usize,
}

impl ProgressRenderer {
    /// Create a renderer drawing to stderr
    pub fn new(resolution: u32, files: usize) -> Self {
        Self::with_bar(ProgressBar::new(u64::from(resolution)), files)
    }

    /// Create a renderer that draws nothing
    pub fn hidden(resolution: u32, files: usize) -> Self {
        let bar = ProgressBar::with_draw_target(
            Some(u64::from(resolution)),
            ProgressDrawTarget::hidden(),
        );
        Self::with_bar(bar, files)
    }

    fn with_bar(bar: ProgressBar, files: usize) -> Self {
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{msg}\n{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {percent}% | ETA: {eta}")
        {
            bar.set_style(style.progress_chars("#>-"));
        }
        let renderer = Self {
            bar,
            files,
            finished: 0,
        };
        renderer.update_message();
        renderer
    }

    /// Handle one coordinator event
    pub fn handle_event(&mut self, event: HashEvent) {
        match event {
            HashEvent::Progress { step } => self.bar.set_position(u64::from(step)),
            HashEvent::TaskFinished { .. } => {
                self.finished += 1;
                self.update_message();
            }
            HashEvent::AllFinished => {
                if let Some(len) = self.bar.length() {
                    self.bar.set_position(len);
                }
            }
        }
    }

    /// Current bar position
    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    /// Files reported finished so far
    pub fn finished(&self) -> usize {
        self.finished
    }

    fn update_message(&self) {
        self.bar.set_message(format!(
            "{}: {}/{} files",
            "Hashing".bold(),
            self.finished,
            self.files
        ));
    }

    /// Finish the progress bar
    pub fn finish(self) {
        self.bar.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hashtab_core::{AlgorithmSelection, Coordinator, CoreConfig, MemorySource};
    use std::sync::Arc;

    #[test]
    fn test_renderer_tracks_events() {
        let coordinator = Coordinator::new(CoreConfig::test(), AlgorithmSelection::new()).unwrap();
        let task = coordinator
            .add_source(Arc::new(MemorySource::new(vec![0u8; 4])), vec![])
            .unwrap();

        let mut renderer = ProgressRenderer::hidden(256, 2);
        renderer.handle_event(HashEvent::Progress { step: 100 });
        assert_eq!(renderer.position(), 100);

        renderer.handle_event(HashEvent::TaskFinished { task });
        assert_eq!(renderer.finished(), 1);

        renderer.handle_event(HashEvent::AllFinished);
        assert_eq!(renderer.position(), 256);
        renderer.finish();
    }
}
