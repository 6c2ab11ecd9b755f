//! Speculative search on the opponent's time.
//!
//! At most one ponder thread runs next to the main search. It gets its own
//! evaluation context and shares only the transposition table; stopping it
//! sets its flag and joins, with nothing to flush.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;

use crate::nnue::EvalContext;
use crate::sync::StopFlag;
use crate::tt::TranspositionTable;

/// Everything a ponder job may touch.
pub struct PonderLine {
    /// Owned by this thread only
    pub eval: EvalContext,
    pub tt: Arc<TranspositionTable>,
    stop: StopFlag,
}

impl PonderLine {
    /// Poll this often; the job must return promptly once it is true.
    #[inline]
    #[must_use]
    pub fn should_stop(&self) -> bool {
        self.stop.is_stopped()
    }
}

struct PonderHandle<R> {
    stop: StopFlag,
    thread: JoinHandle<R>,
}

impl<R> PonderHandle<R> {
    fn finish(self) -> Option<R> {
        self.stop.stop();
        match self.thread.join() {
            Ok(result) => {
                log::debug!("ponder thread stopped");
                Some(result)
            }
            Err(_) => {
                log::error!("ponder thread panicked");
                None
            }
        }
    }
}

/// Supervisor owning the single ponder slot.
pub struct Ponder<R> {
    active: Mutex<Option<PonderHandle<R>>>,
}

impl<R> Ponder<R> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            active: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.active.lock().is_some()
    }

    /// Signal the running job, wait for it, and return its result.
    ///
    /// Returns `None` if nothing was running or the job panicked.
    pub fn stop(&self) -> Option<R> {
        let handle = self.active.lock().take();
        handle.and_then(PonderHandle::finish)
    }
}

impl<R: Send + 'static> Ponder<R> {
    /// Start pondering, stopping any previous job first.
    ///
    /// `eval` must be a clone of the main line's context for the position
    /// to ponder from. Returns the result of the job that was replaced, if
    /// one was running and finished cleanly.
    ///
    /// # Errors
    /// Fails if the OS refuses to spawn the thread.
    pub fn start<F>(
        &self,
        eval: EvalContext,
        tt: Arc<TranspositionTable>,
        job: F,
    ) -> io::Result<Option<R>>
    where
        F: FnOnce(&mut PonderLine) -> R + Send + 'static,
    {
        let mut slot = self.active.lock();
        let replaced = slot.take().and_then(PonderHandle::finish);
        if replaced.is_some() {
            log::debug!("replaced ponder job returned a result");
        }

        let stop = StopFlag::new();
        let mut line = PonderLine {
            eval,
            tt,
            stop: stop.clone(),
        };
        let thread = thread::Builder::new()
            .name("ponder".into())
            .spawn(move || job(&mut line))?;

        log::debug!("ponder thread started");
        *slot = Some(PonderHandle { stop, thread });
        Ok(replaced)
    }
}

impl<R> Default for Ponder<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> Drop for Ponder<R> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nnue::test_support::{sq, start_position, test_network};
    use crate::tt::BoundType;
    use crate::types::{Color, Piece};

    fn setup() -> (EvalContext, Arc<TranspositionTable>) {
        let ctx = EvalContext::from_pieces(test_network(), start_position());
        (ctx, Arc::new(TranspositionTable::with_buckets(1024)))
    }

    #[test]
    fn test_stop_joins_running_job() {
        let (ctx, tt) = setup();
        let ponder = Ponder::new();

        ponder
            .start(ctx, Arc::clone(&tt), |line| {
                let mut iterations = 0u64;
                while !line.should_stop() {
                    line.tt
                        .store(iterations % 4096, BoundType::Exact, 1, 0, None);
                    iterations += 1;
                    std::thread::yield_now();
                }
                iterations
            })
            .unwrap();

        assert!(ponder.is_running());
        assert!(ponder.stop().is_some());
        assert!(!ponder.is_running());
        assert!(ponder.stop().is_none());
    }

    #[test]
    fn test_ponder_context_is_private() {
        let (main, tt) = setup();
        let ponder = Ponder::new();

        let mut expected = main.clone();
        expected.remove_piece(Piece::Queen, sq("d8"), Color::Black);

        ponder
            .start(main.clone(), tt, |line| {
                line.eval.remove_piece(Piece::Queen, sq("d8"), Color::Black);
                line.eval.evaluate(Color::White)
            })
            .unwrap();

        assert_eq!(ponder.stop(), Some(expected.evaluate(Color::White)));
        assert_ne!(main.accumulator(Color::White), expected.accumulator(Color::White));
    }

    #[test]
    fn test_restart_replaces_previous_job() {
        let (ctx, tt) = setup();
        let ponder = Ponder::new();

        ponder
            .start(ctx.clone(), Arc::clone(&tt), |line| {
                while !line.should_stop() {
                    std::thread::yield_now();
                }
                1
            })
            .unwrap();
        let replaced = ponder.start(ctx, tt, |_| 2).unwrap();

        assert_eq!(replaced, Some(1));
        assert_eq!(ponder.stop(), Some(2));
    }
}
