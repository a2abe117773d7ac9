//! Panics the runner catches are reported through its own messages, so the
//! default hook stays quiet while one of them may happen.

use std::cell::Cell;
use std::panic;
use std::sync::Once;

use tracing::debug;

thread_local! {
    static CATCHING: Cell<usize> = const { Cell::new(0) };
}

static INSTALL: Once = Once::new();

/// Silences the panic hook on this thread until dropped. Nests.
pub(crate) struct QuietPanics(());

impl QuietPanics {
    pub(crate) fn enter() -> Self {
        INSTALL.call_once(|| {
            let previous = panic::take_hook();
            panic::set_hook(Box::new(move |info| {
                if CATCHING.with(Cell::get) == 0 {
                    previous(info);
                } else {
                    debug!("caught panic: {}", info);
                }
            }));
        });
        CATCHING.with(|depth| depth.set(depth.get() + 1));
        QuietPanics(())
    }
}

impl Drop for QuietPanics {
    fn drop(&mut self) {
        CATCHING.with(|depth| depth.set(depth.get() - 1));
    }
}
