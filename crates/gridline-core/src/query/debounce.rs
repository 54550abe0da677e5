// ── Trailing-edge debouncer ──
//
// Every pushed value restarts the quiet-period timer; only the last value
// of a burst is emitted, once the input has been quiet for the whole
// window. Dropping or shutting down the debouncer discards a pending value.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub struct Debouncer<T> {
    input: mpsc::UnboundedSender<T>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl<T: Send + 'static> Debouncer<T> {
    /// Spawn the timer task on the current runtime. Emitted values arrive on
    /// the returned receiver.
    pub fn new(window: Duration) -> (Self, mpsc::UnboundedReceiver<T>) {
        let (input, input_rx) = mpsc::unbounded_channel();
        let (output_tx, output) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(run(window, input_rx, output_tx, cancel.clone()));
        (
            Self {
                input,
                cancel,
                task,
            },
            output,
        )
    }

    /// Feed a new value. Returns `false` once the debouncer is shut down.
    pub fn push(&self, value: T) -> bool {
        !self.cancel.is_cancelled() && self.input.send(value).is_ok()
    }

    /// Cancel the pending timer. A value waiting for its window is dropped.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.cancel.is_cancelled() || self.task.is_finished()
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run<T>(
    window: Duration,
    mut input: mpsc::UnboundedReceiver<T>,
    output: mpsc::UnboundedSender<T>,
    cancel: CancellationToken,
) {
    loop {
        let mut pending = tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            next = input.recv() => match next {
                Some(value) => value,
                None => return,
            },
        };

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => return,
                next = input.recv() => match next {
                    Some(value) => pending = value,
                    None => return,
                },
                () = tokio::time::sleep(window) => {
                    if output.send(pending).is_err() {
                        return;
                    }
                    break;
                }
            }
        }
    }
}
