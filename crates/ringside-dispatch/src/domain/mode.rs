//! Process-wide mode cell.
//!
//! Unset until mode selection finishes, then `Live` or `Simulated`. The
//! only transition after that is the downgrade `Live -> Simulated`.

use ringside_types::Mode;
use tokio::sync::watch;

#[derive(Debug)]
pub struct ModeCell {
    tx: watch::Sender<Option<Mode>>,
}

impl ModeCell {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// Set the startup mode. Ignored once a mode is set.
    pub fn initialize(&self, mode: Mode) -> bool {
        self.tx.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(mode);
            true
        })
    }

    /// `Live -> Simulated`. Returns false if not live.
    pub fn downgrade(&self) -> bool {
        self.tx.send_if_modified(|current| {
            if *current != Some(Mode::Live) {
                return false;
            }
            *current = Some(Mode::Simulated);
            true
        })
    }

    pub fn get(&self) -> Option<Mode> {
        *self.tx.borrow()
    }

    /// Wait for mode selection to finish.
    pub async fn ready(&self) -> Mode {
        let mut rx = self.tx.subscribe();
        let mode = match rx.wait_for(Option::is_some).await {
            Ok(mode) => *mode,
            // Unreachable while `self` holds the sender.
            Err(_) => None,
        };
        mode.unwrap_or(Mode::Simulated)
    }
}

impl Default for ModeCell {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_once() {
        let cell = ModeCell::new();
        assert_eq!(cell.get(), None);
        assert!(cell.initialize(Mode::Live));
        assert!(!cell.initialize(Mode::Simulated));
        assert_eq!(cell.get(), Some(Mode::Live));
    }

    #[test]
    fn test_downgrade_only() {
        let cell = ModeCell::new();
        assert!(!cell.downgrade());

        cell.initialize(Mode::Live);
        assert!(cell.downgrade());
        assert_eq!(cell.get(), Some(Mode::Simulated));
        assert!(!cell.downgrade());
    }

    #[tokio::test]
    async fn test_ready_waits_for_selection() {
        let cell = std::sync::Arc::new(ModeCell::new());
        let waiter = {
            let cell = cell.clone();
            tokio::spawn(async move { cell.ready().await })
        };
        tokio::task::yield_now().await;
        cell.initialize(Mode::Simulated);
        assert_eq!(waiter.await.unwrap(), Mode::Simulated);
    }
}
