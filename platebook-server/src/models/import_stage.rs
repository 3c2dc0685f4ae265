//! Beli import stage machine
//!
//! An import run moves through a fixed sequence of stages:
//! IDLE → UPLOADING → INFERRING → PARSING → NORMALIZING → PERSISTING → DONE
//!
//! FAILED is reachable from any stage after IDLE. DONE and FAILED are
//! terminal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Import pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ImportStage {
    /// Nothing started yet
    Idle,
    /// Writing the file to object storage
    Uploading,
    /// Waiting on the inference API (includes video processing)
    Inferring,
    /// Extracting and decoding JSON from the model text
    Parsing,
    /// Coercing entries into place drafts
    Normalizing,
    /// Upserting drafts into the ratings pool
    Persisting,
    /// Places extracted
    Done,
    /// Run aborted
    Failed,
}

impl ImportStage {
    pub fn is_terminal(self) -> bool {
        matches!(self, ImportStage::Done | ImportStage::Failed)
    }

    /// Stage that follows this one on the success path
    pub fn next(self) -> Option<ImportStage> {
        use ImportStage::*;
        match self {
            Idle => Some(Uploading),
            Uploading => Some(Inferring),
            Inferring => Some(Parsing),
            Parsing => Some(Normalizing),
            Normalizing => Some(Persisting),
            Persisting => Some(Done),
            Done | Failed => None,
        }
    }

    pub fn can_transition_to(self, to: ImportStage) -> bool {
        match to {
            ImportStage::Failed => !self.is_terminal() && self != ImportStage::Idle,
            _ => self.next() == Some(to),
        }
    }
}

impl std::fmt::Display for ImportStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ImportStage::Idle => "IDLE",
            ImportStage::Uploading => "UPLOADING",
            ImportStage::Inferring => "INFERRING",
            ImportStage::Parsing => "PARSING",
            ImportStage::Normalizing => "NORMALIZING",
            ImportStage::Persisting => "PERSISTING",
            ImportStage::Done => "DONE",
            ImportStage::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

/// Stage transition event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageTransition {
    pub from: ImportStage,
    pub to: ImportStage,
    pub at: DateTime<Utc>,
}

/// One pass of the import pipeline (in-memory only)
#[derive(Debug, Clone, Serialize)]
pub struct ImportRun {
    pub stage: ImportStage,
    pub transitions: Vec<StageTransition>,
    pub started_at: DateTime<Utc>,
    /// Set on reaching DONE or FAILED
    pub ended_at: Option<DateTime<Utc>>,
}

impl Default for ImportRun {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportRun {
    pub fn new() -> Self {
        Self {
            stage: ImportStage::Idle,
            transitions: Vec::new(),
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    /// Move to the next stage on the success path
    ///
    /// No-op once terminal.
    pub fn advance(&mut self) -> Option<&StageTransition> {
        let next = self.stage.next()?;
        Some(self.transition_to(next))
    }

    /// Mark the run failed; no-op when already terminal or never started
    pub fn fail(&mut self) -> Option<&StageTransition> {
        if !self.stage.can_transition_to(ImportStage::Failed) {
            return None;
        }
        Some(self.transition_to(ImportStage::Failed))
    }

    fn transition_to(&mut self, to: ImportStage) -> &StageTransition {
        let transition = StageTransition {
            from: self.stage,
            to,
            at: Utc::now(),
        };
        tracing::debug!(from = %transition.from, to = %transition.to, "Import stage transition");

        self.stage = to;
        if to.is_terminal() {
            self.ended_at = Some(transition.at);
        }

        self.transitions.push(transition);
        &self.transitions[self.transitions.len() - 1]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_path() {
        let mut run = ImportRun::new();
        let mut seen = vec![run.stage];
        while run.advance().is_some() {
            seen.push(run.stage);
        }

        assert_eq!(
            seen,
            vec![
                ImportStage::Idle,
                ImportStage::Uploading,
                ImportStage::Inferring,
                ImportStage::Parsing,
                ImportStage::Normalizing,
                ImportStage::Persisting,
                ImportStage::Done,
            ]
        );
        assert_eq!(run.transitions.len(), 6);
        assert!(run.ended_at.is_some());
    }

    #[test]
    fn test_fail_from_running_stage() {
        let mut run = ImportRun::new();
        run.advance();
        run.advance();

        let transition = run.fail().cloned().unwrap();
        assert_eq!(transition.from, ImportStage::Inferring);
        assert_eq!(transition.to, ImportStage::Failed);
        assert!(run.stage.is_terminal());

        assert!(run.fail().is_none());
        assert!(run.advance().is_none());
    }

    #[test]
    fn test_cannot_fail_before_start() {
        let mut run = ImportRun::new();
        assert!(run.fail().is_none());
        assert_eq!(run.stage, ImportStage::Idle);
    }

    #[test]
    fn test_transition_rules() {
        assert!(ImportStage::Parsing.can_transition_to(ImportStage::Normalizing));
        assert!(!ImportStage::Parsing.can_transition_to(ImportStage::Done));
        assert!(ImportStage::Persisting.can_transition_to(ImportStage::Failed));
        assert!(!ImportStage::Done.can_transition_to(ImportStage::Failed));
    }

    #[test]
    fn test_serializes_uppercase() {
        assert_eq!(serde_json::to_value(ImportStage::Normalizing).unwrap(), "NORMALIZING");
        assert_eq!(ImportStage::Inferring.to_string(), "INFERRING");
    }
}
