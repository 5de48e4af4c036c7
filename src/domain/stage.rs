//! Uninstall state machine.
//!
//! Stages only move forward. Optional stages (code backup, static content,
//! data removal) may be skipped; required ones may not. `Failed` is reachable
//! from any non-terminal stage.
//!
//! ```text
//! NotStarted → Validated → DependenciesChecked → MaintenanceOn
//!   → (CodeBackedUp) → DbCleaned → RegistryRewritten → CacheCleared
//!   → CodegenCleared → (StaticCleared) → (DataRemoved) → MaintenanceOff → Done
//! ```

use crate::utils::error::{Result, UninstallError};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum UninstallStage {
    NotStarted = 0,
    Validated = 1,
    DependenciesChecked = 2,
    MaintenanceOn = 3,
    CodeBackedUp = 4,
    DbCleaned = 5,
    RegistryRewritten = 6,
    CacheCleared = 7,
    CodegenCleared = 8,
    StaticCleared = 9,
    DataRemoved = 10,
    MaintenanceOff = 11,
    Done = 12,
    Failed = 255,
}

impl UninstallStage {
    #[inline]
    pub const fn order(self) -> u8 {
        self as u8
    }

    #[inline]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    #[inline]
    pub const fn is_optional(self) -> bool {
        matches!(
            self,
            Self::CodeBackedUp | Self::StaticCleared | Self::DataRemoved
        )
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::NotStarted => "not started",
            Self::Validated => "modules validated",
            Self::DependenciesChecked => "dependencies checked",
            Self::MaintenanceOn => "maintenance mode on",
            Self::CodeBackedUp => "code backed up",
            Self::DbCleaned => "module registry cleaned",
            Self::RegistryRewritten => "deployment configuration rewritten",
            Self::CacheCleared => "cache cleared",
            Self::CodegenCleared => "generated code cleared",
            Self::StaticCleared => "static content cleared",
            Self::DataRemoved => "module data removed",
            Self::MaintenanceOff => "maintenance mode off",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    pub const fn all_stages() -> &'static [Self] {
        &[
            Self::NotStarted,
            Self::Validated,
            Self::DependenciesChecked,
            Self::MaintenanceOn,
            Self::CodeBackedUp,
            Self::DbCleaned,
            Self::RegistryRewritten,
            Self::CacheCleared,
            Self::CodegenCleared,
            Self::StaticCleared,
            Self::DataRemoved,
            Self::MaintenanceOff,
            Self::Done,
        ]
    }

    /// Whether `next` may directly follow `self`.
    pub fn can_transition_to(self, next: Self) -> bool {
        if self.is_terminal() {
            return false;
        }
        if next == Self::Failed {
            return true;
        }
        if next.order() <= self.order() {
            return false;
        }
        Self::all_stages()
            .iter()
            .filter(|stage| stage.order() > self.order() && stage.order() < next.order())
            .all(|stage| stage.is_optional())
    }
}

impl fmt::Display for UninstallStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Tracks the current stage of one run and the path taken so far.
#[derive(Debug, Clone)]
pub struct StageTracker {
    current: UninstallStage,
    history: Vec<UninstallStage>,
}

impl Default for StageTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl StageTracker {
    pub fn new() -> Self {
        Self {
            current: UninstallStage::NotStarted,
            history: vec![UninstallStage::NotStarted],
        }
    }

    pub fn current(&self) -> UninstallStage {
        self.current
    }

    pub fn history(&self) -> &[UninstallStage] {
        &self.history
    }

    pub fn advance(&mut self, next: UninstallStage) -> Result<()> {
        if !self.current.can_transition_to(next) {
            return Err(UninstallError::InvalidTransition {
                from: self.current,
                to: next,
            });
        }
        tracing::debug!(from = %self.current, to = %next, "uninstall stage transition");
        self.current = next;
        self.history.push(next);
        Ok(())
    }

    /// Moves to `Failed` unless the run already reached a terminal stage.
    pub fn fail(&mut self) {
        if !self.current.is_terminal() {
            tracing::debug!(from = %self.current, "uninstall failed");
            self.current = UninstallStage::Failed;
            self.history.push(UninstallStage::Failed);
        }
    }

    pub fn visited(&self, stage: UninstallStage) -> bool {
        self.history.contains(&stage)
    }
}
