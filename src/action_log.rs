use crate::gate::Outcome;
use crate::{ActorId, Direction, Tile};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Host requests that can change occupancy
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Action {
    Move { actor: ActorId, direction: Direction },
    Diagonal { actor: ActorId, horizontal: Direction, vertical: Direction },
    Turn { actor: ActorId, direction: Direction },
    TurnToward { actor: ActorId, target: Tile },
    Jump { actor: ActorId, dx: i32, dy: i32 },
    Swap { a: ActorId, b: ActorId },
    Locate { actor: ActorId, position: Tile },
    Board { player: ActorId, vehicle: ActorId },
    Alight { player: ActorId, direction: Direction },
    Transfer { position: Tile },
    /// Toggle a map tile (x, y)
    ToggleCell { x: i32, y: i32 },
}

/// Logged action with timestamp and what came of it
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoggedAction {
    /// Milliseconds since start
    pub timestamp_ms: u64,
    pub action: Action,
    /// Gate verdict; `None` for actions that aren't validated
    pub outcome: Option<Outcome>,
}

/// Action logger
pub struct ActionLog {
    start_time: Instant,
    actions: Vec<LoggedAction>,
}

impl Default for ActionLog {
    fn default() -> Self {
        Self::new()
    }
}

impl ActionLog {
    pub fn new() -> Self {
        ActionLog {
            start_time: Instant::now(),
            actions: Vec::new(),
        }
    }

    /// Log an action with current timestamp
    pub fn log(&mut self, action: Action, outcome: Option<Outcome>) {
        let timestamp_ms = self.start_time.elapsed().as_millis() as u64;
        self.actions.push(LoggedAction {
            timestamp_ms,
            action,
            outcome,
        });
    }

    /// Log a gated attempt
    pub fn log_attempt(&mut self, action: Action, outcome: Outcome) {
        self.log(action, Some(outcome));
    }

    pub fn get_actions(&self) -> &[LoggedAction] {
        &self.actions
    }

    pub fn clear(&mut self) {
        self.actions.clear();
    }

    /// Save log to JSON file
    pub fn save_to_file(&self, path: &str) -> crate::Result<()> {
        let json = serde_json::to_string_pretty(&self.actions)?;
        std::fs::write(path, json).map_err(|source| crate::Error::Io {
            path: path.to_string(),
            source,
        })?;
        Ok(())
    }

    /// Print log to console
    pub fn print(&self) {
        println!("\n=== Action Log ({} events) ===", self.actions.len());
        for (i, logged) in self.actions.iter().enumerate() {
            let verdict = match &logged.outcome {
                Some(Outcome::Committed) => "OK    ".to_string(),
                Some(Outcome::Rejected(rejection)) => format!("REJECT ({})", rejection),
                None => "-     ".to_string(),
            };
            println!("[{:6}ms] #{:3} {} {:?}", logged.timestamp_ms, i + 1, verdict, logged.action);
        }
        println!("=== End of Log ===\n");
    }

    /// Get summary statistics
    pub fn summary(&self) -> String {
        let mut committed = 0;
        let mut rejected = 0;
        let mut moves = 0;
        let mut turns = 0;
        let mut jumps = 0;
        let mut swaps = 0;
        let mut toggles = 0;

        for logged in &self.actions {
            match logged.outcome {
                Some(Outcome::Committed) => committed += 1,
                Some(Outcome::Rejected(_)) => rejected += 1,
                None => {}
            }
            match &logged.action {
                Action::Move { .. } | Action::Diagonal { .. } => moves += 1,
                Action::Turn { .. } | Action::TurnToward { .. } => turns += 1,
                Action::Jump { .. } => jumps += 1,
                Action::Swap { .. } => swaps += 1,
                Action::ToggleCell { .. } => toggles += 1,
                _ => {}
            }
        }

        let duration = self.actions.last().map(|last| last.timestamp_ms).unwrap_or(0);

        format!(
            "Session Duration: {}ms\n\
             Total Events: {} ({} committed, {} rejected)\n\
             Movement: {} moves, {} turns, {} jumps, {} swaps\n\
             Map Edits: {} toggled",
            duration,
            self.actions.len(),
            committed,
            rejected,
            moves,
            turns,
            jumps,
            swaps,
            toggles
        )
    }
}
