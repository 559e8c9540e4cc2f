use std::time::Duration;

use log::warn;
use tokio::sync::{mpsc, watch};
use tokio::time::{self, Instant, MissedTickBehavior};

use super::engine::{AnswerOutcome, PendingAdvance, QuizEngine, SessionGeneration, TickOutcome};
use super::view::QuizSnapshot;
use super::workflow::QuizLoopService;
use crate::error::QuizError;

/// Commands the presentation adapter feeds into a running session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizCommand {
    /// The user picked an option for the current question.
    Answer(usize),
    /// Re-run the quiz from question 0.
    Restart,
    /// Tear the session down. Closing the command channel has the same
    /// effect.
    Stop,
}

/// Drive a session against real time.
///
/// One task owns the engine. A one-second interval produces countdown
/// ticks, the command channel carries user input, and the pending-advance
/// deadline implements the transition delay; all three funnel into the same
/// serialized transition code, so no two transitions ever run concurrently.
/// After every event the loop publishes a fresh [`QuizSnapshot`] for the
/// presentation adapter.
///
/// A restart drops the scheduled advance on the spot; the engine's
/// generation guard additionally discards any callback that slips through.
/// The engine stays fully usable without this driver via manual
/// `tick()`/`handle_expiry()` calls.
///
/// # Errors
///
/// Propagates engine invariant failures. Completion-write failures are
/// logged and do not end the session; the completed engine is returned on
/// shutdown for a later [`QuizLoopService::finalize_result`].
pub async fn run_quiz(
    service: QuizLoopService,
    mut engine: QuizEngine,
    mut commands: mpsc::Receiver<QuizCommand>,
    snapshots: watch::Sender<QuizSnapshot>,
) -> Result<QuizEngine, QuizError> {
    let second = Duration::from_secs(1);
    let mut ticker = time::interval_at(Instant::now() + second, second);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut pending: Option<(Instant, SessionGeneration)> = None;

    snapshots.send_replace(QuizSnapshot::from_engine(&engine));

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let TickOutcome::TimedOut { advance } = engine.tick() {
                    pending = Some(deadline_for(&advance));
                }
            }
            () = sleep_until_pending(pending), if pending.is_some() => {
                let Some((_, generation)) = pending.take() else {
                    continue;
                };
                match service.advance(&mut engine, generation).await {
                    Ok(_) => {}
                    Err(QuizError::Storage(e)) => {
                        warn!("completion write failed, result kept in memory: {e}");
                    }
                    Err(e) => return Err(e),
                }
            }
            command = commands.recv() => {
                match command {
                    Some(QuizCommand::Answer(index)) => {
                        match service.submit_answer(&mut engine, index) {
                            Ok(AnswerOutcome::Accepted { advance, .. }) => {
                                pending = Some(deadline_for(&advance));
                            }
                            Ok(AnswerOutcome::Ignored) => {}
                            Err(
                                e @ (QuizError::InvalidAnswerIndex { .. }
                                | QuizError::SessionCompleted),
                            ) => {
                                warn!("rejected answer: {e}");
                            }
                            Err(e) => return Err(e),
                        }
                    }
                    Some(QuizCommand::Restart) => {
                        pending = None;
                        service.restart(&mut engine);
                    }
                    Some(QuizCommand::Stop) | None => break,
                }
            }
        }

        snapshots.send_replace(QuizSnapshot::from_engine(&engine));
    }

    Ok(engine)
}

fn deadline_for(advance: &PendingAdvance) -> (Instant, SessionGeneration) {
    (
        Instant::now() + Duration::from_secs(u64::from(advance.delay_secs)),
        advance.generation,
    )
}

async fn sleep_until_pending(pending: Option<(Instant, SessionGeneration)>) {
    match pending {
        Some((deadline, _)) => time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
