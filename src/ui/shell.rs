//! Foreground owner of the display

use tokio::sync::mpsc;

use super::{StatusDisplay, UiHandle, UiUpdate};

type CloseHook = Box<dyn FnOnce() + Send>;

/// Owns the display and its update queue; lives on the foreground task
pub struct Shell {
    display: StatusDisplay,
    rx: mpsc::UnboundedReceiver<UiUpdate>,
    handle: UiHandle,
    close_hooks: Vec<CloseHook>,
}

impl Shell {
    #[must_use]
    pub fn new(display: StatusDisplay) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();

        Self {
            display,
            rx,
            handle: UiHandle { tx },
            close_hooks: Vec::new(),
        }
    }

    /// Handle for queuing updates from any thread
    #[must_use]
    pub fn handle(&self) -> UiHandle {
        self.handle.clone()
    }

    /// Register a hook run on close, before the display is released
    ///
    /// Hooks run in registration order.
    pub fn on_close(&mut self, hook: impl FnOnce() + Send + 'static) {
        self.close_hooks.push(Box::new(hook));
    }

    /// Wait for the next queued update
    pub async fn next_update(&mut self) -> Option<UiUpdate> {
        self.rx.recv().await
    }

    /// Draw one update
    pub fn apply(&mut self, update: UiUpdate) {
        self.display.apply(update);
    }

    /// Draw everything already queued
    pub fn flush(&mut self) {
        while let Ok(update) = self.rx.try_recv() {
            self.display.apply(update);
        }
    }

    /// Current display
    #[must_use]
    pub const fn display(&self) -> &StatusDisplay {
        &self.display
    }

    /// Run close hooks, then release the display
    pub fn close(mut self) -> StatusDisplay {
        self.flush();

        tracing::info!(hooks = self.close_hooks.len(), "closing");
        for hook in self.close_hooks.drain(..) {
            hook();
        }

        self.display
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::ui::{Color, Presentation};

    fn shell() -> Shell {
        Shell::new(StatusDisplay::new(Box::new(std::io::sink()), "NURA"))
    }

    #[test]
    fn test_updates_from_other_threads() {
        let mut shell = shell();
        let handle = shell.handle();

        std::thread::spawn(move || {
            handle.update_status("NURA: Active", Color::Green, Color::Red);
            handle.show_exchange("hello", "hi");
        })
        .join()
        .unwrap();

        // nothing is drawn until the owner drains the queue
        assert!(shell.display().state().status.is_empty());

        shell.flush();
        assert_eq!(shell.display().state().status, "NURA: Active");
        assert_eq!(shell.display().state().user_line, "You: hello");
    }

    #[test]
    fn test_close_hooks_run_in_order() {
        let mut shell = shell();
        let calls = Arc::new(Mutex::new(Vec::new()));

        for i in 0..3 {
            let calls = Arc::clone(&calls);
            shell.on_close(move || calls.lock().unwrap().push(i));
        }

        let _display = shell.close();
        assert_eq!(*calls.lock().unwrap(), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_next_update() {
        let mut shell = shell();
        shell
            .handle()
            .update_status("waiting", Color::Black, Color::Grey);

        let update = shell.next_update().await.unwrap();
        assert!(matches!(update, UiUpdate::Status { .. }));
    }
}
