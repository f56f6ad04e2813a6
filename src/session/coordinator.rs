//! Foreground coordinator
//!
//! Owns the session mode and the display. Runs one listening loop at a time on
//! a worker thread, switches modes from the loop's outcome and starts the next
//! loop. A worker that panics drops its outcome channel, which the coordinator
//! treats as a loop failure.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::{broadcast, oneshot};

use super::loops::{LoopContext, LoopOutcome, Opening, Pacing, run_command_loop, run_wake_loop};
use super::{Mode, PhraseMatcher, Session, SessionEvent, Transition};
use crate::db::FactStore;
use crate::interpreter::Interpreter;
use crate::ui::{Shell, StatusDisplay};
use crate::voice::{SpeechInput, SpeechOutput};
use crate::Result;

/// Transition subscribers that fall this far behind miss events
const TRANSITION_CAPACITY: usize = 16;

/// Collaborators the assistant is built from
pub struct AssistantParts {
    pub input: Arc<dyn SpeechInput>,
    pub output: Arc<dyn SpeechOutput>,
    pub interpreter: Interpreter,
    pub store: Arc<FactStore>,
    pub wake: PhraseMatcher,
    pub exit: PhraseMatcher,
    pub pacing: Pacing,
}

#[derive(Debug, Clone, Copy)]
enum Job {
    Wake(Opening),
    Command,
}

impl Job {
    const fn thread_name(self) -> &'static str {
        match self {
            Self::Wake(_) => "nura-wake",
            Self::Command => "nura-command",
        }
    }
}

/// Starts a named, detached worker thread
type Spawner = fn(&'static str, Box<dyn FnOnce() + Send>) -> std::io::Result<()>;

fn spawn_thread(name: &'static str, work: Box<dyn FnOnce() + Send>) -> std::io::Result<()> {
    std::thread::Builder::new()
        .name(name.to_string())
        .spawn(work)
        .map(|_detached| ())
}

/// The running assistant
pub struct Assistant {
    session: Session,
    shell: Shell,
    ctx: LoopContext,
    transitions: broadcast::Sender<Transition>,
    spawner: Spawner,
}

impl Assistant {
    /// Wire the collaborators to `shell`
    ///
    /// Registers a close hook on the shell that closes the fact store.
    #[must_use]
    pub fn new(parts: AssistantParts, mut shell: Shell) -> Self {
        let store = Arc::clone(&parts.store);
        shell.on_close(move || store.close());

        let ctx = LoopContext {
            input: parts.input,
            output: parts.output,
            ui: Arc::new(shell.handle()),
            interpreter: Arc::new(parts.interpreter),
            store: parts.store,
            wake: parts.wake,
            exit: parts.exit,
            pacing: parts.pacing,
            stop: Arc::new(AtomicBool::new(false)),
        };

        let (transitions, _) = broadcast::channel(TRANSITION_CAPACITY);

        Self {
            session: Session::new(),
            shell,
            ctx,
            transitions,
            spawner: spawn_thread,
        }
    }

    /// Receive every mode transition from now on
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Transition> {
        self.transitions.subscribe()
    }

    /// Current mode
    #[must_use]
    pub const fn mode(&self) -> Mode {
        self.session.mode()
    }

    /// Run until `shutdown` resolves, then close the shell
    ///
    /// Returns the display as it was left.
    ///
    /// # Errors
    ///
    /// Returns error if a worker thread cannot be spawned
    pub async fn run(mut self, shutdown: impl Future<Output = ()>) -> Result<StatusDisplay> {
        let result = self.supervise(shutdown).await;

        // Workers blocked in input notice the flag after their current turn
        self.ctx.stop.store(true, Ordering::Release);

        let display = self.shell.close();
        result.map(|()| display)
    }

    async fn supervise(&mut self, shutdown: impl Future<Output = ()>) -> Result<()> {
        tokio::pin!(shutdown);

        tracing::info!(mode = %self.session.mode(), "assistant started");
        let mut worker = self.spawn(Job::Wake(Opening::Introduce))?;

        loop {
            tokio::select! {
                biased;

                () = &mut shutdown => {
                    tracing::info!("shutdown requested");
                    return Ok(());
                }
                Some(update) = self.shell.next_update() => {
                    self.shell.apply(update);
                }
                outcome = &mut worker => {
                    match self.next_job(outcome) {
                        Some(job) => worker = self.spawn(job)?,
                        None => return Ok(()),
                    }
                }
            }
        }
    }

    fn next_job(
        &mut self,
        outcome: std::result::Result<LoopOutcome, oneshot::error::RecvError>,
    ) -> Option<Job> {
        match outcome {
            Ok(LoopOutcome::Woke) => {
                self.transition(SessionEvent::WakeDetected);
                Some(Job::Command)
            }
            Ok(LoopOutcome::Exited) => {
                self.transition(SessionEvent::ExitDetected);
                Some(Job::Wake(Opening::Farewell))
            }
            Ok(LoopOutcome::Stopped) => {
                tracing::debug!("listening loop stopped");
                None
            }
            Err(_) => {
                tracing::error!(mode = %self.session.mode(), "listening loop failed, recovering");
                self.transition(SessionEvent::LoopFailed);
                Some(Job::Wake(Opening::Recover))
            }
        }
    }

    fn transition(&mut self, event: SessionEvent) {
        if let Some(transition) = self.session.handle(event) {
            // No subscribers is fine
            let _ = self.transitions.send(transition);
        }
    }

    fn spawn(&self, job: Job) -> Result<oneshot::Receiver<LoopOutcome>> {
        let (tx, rx) = oneshot::channel();
        let ctx = self.ctx.clone();

        tracing::debug!(?job, "starting listening loop");

        (self.spawner)(
            job.thread_name(),
            Box::new(move || {
                let outcome = match job {
                    Job::Wake(opening) => run_wake_loop(&ctx, opening),
                    Job::Command => run_command_loop(&ctx),
                };

                if tx.send(outcome).is_err() {
                    tracing::trace!("coordinator gone, outcome dropped");
                }
            }),
        )
        .inspect_err(|e| tracing::error!(error = %e, "failed to start listening loop"))?;

        Ok(rx)
    }
}
