use clap::Subcommand;
use serde_json::json;
use studyroom_core::SessionType;

use super::{orchestrator, print_json, CommandResult};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start a session
    Start {
        /// focus, short-break or long-break
        #[arg(default_value = "focus")]
        session_type: String,
    },
    /// Advance the running session by N seconds
    Tick {
        secs: u64,
    },
    /// Pause the running session
    Pause,
    /// Resume the paused session
    Resume,
    /// Abandon the current session
    Cancel,
    /// Catch elapsed time up with the wall clock
    Sync,
    /// Move on from a completed session
    Next,
    /// Start the session decided by `next`
    StartPending,
    /// Print current and pending session as JSON
    Status,
    /// Recently started sessions
    History {
        #[arg(long, default_value = "10")]
        limit: usize,
    },
}

pub fn run(action: TimerAction) -> CommandResult {
    let orch = orchestrator()?;

    match action {
        TimerAction::Start { session_type } => {
            let session_type: SessionType = session_type.parse()?;
            print_json(&orch.start_session(session_type)?)?;
        }
        TimerAction::Tick { secs } => print_json(&orch.tick(secs)?)?,
        TimerAction::Pause => print_json(&orch.pause()?)?,
        TimerAction::Resume => print_json(&orch.resume()?)?,
        TimerAction::Cancel => print_json(&orch.cancel()?)?,
        TimerAction::Sync => print_json(&orch.sync()?)?,
        TimerAction::Next => print_json(&orch.advance()?)?,
        TimerAction::StartPending => print_json(&orch.start_pending()?)?,
        TimerAction::Status => {
            // Bring the running session up to date before reporting it.
            let session = orch.sync()?;
            let remaining = session.as_ref().map(|s| s.remaining_secs());
            let status = json!({
                "session": session,
                "remaining_secs": remaining,
                "pending": orch.pending_session()?,
            });
            print_json(&status)?;
        }
        TimerAction::History { limit } => print_json(&orch.recent_sessions(limit)?)?,
    }
    Ok(())
}
