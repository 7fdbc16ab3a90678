//! Linear undo/redo history and the re-entrancy gate.
//!
//! [`UndoRedoManager`] keeps two stacks of [`Command`]s, most recent last.
//! Any new command invalidates the redo branch. The manager also owns the
//! session-wide [`ReentrancyGate`]: while a command is executing, undoing,
//! or redoing, the gate is suspended so that the low-level events those
//! operations fire are not mistaken for fresh user gestures and wrapped
//! into new commands.
//!
//! Gates are scoped guards, not bare booleans: [`ReentrancyGate::suspend`]
//! returns a [`GateGuard`] that restores the previous state on drop, so an
//! error thrown mid-command cannot leave the session stuck deaf.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::command::Command;

/// A shared boolean flag with scoped suspension.
///
/// In the engine's single-threaded cooperative model this is the sole
/// concurrency-control primitive. The same type serves both the
/// command-listening gate here and the collaboration channel's echo
/// suppression.
///
/// # Examples
///
/// ```
/// use flowboard::undo_redo::ReentrancyGate;
///
/// let gate = ReentrancyGate::new();
/// assert!(gate.is_open());
/// {
///     let _guard = gate.suspend();
///     assert!(!gate.is_open());
///     // nested suspension is fine; the prior state is restored per guard
///     let _inner = gate.suspend();
///     assert!(!gate.is_open());
/// }
/// assert!(gate.is_open());
/// ```
#[derive(Clone, Debug)]
pub struct ReentrancyGate {
    open: Arc<AtomicBool>,
}

impl Default for ReentrancyGate {
    fn default() -> Self {
        Self::new()
    }
}

impl ReentrancyGate {
    #[must_use]
    pub fn new() -> Self {
        Self {
            open: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Whether listeners should currently react to low-level events.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Relaxed)
    }

    /// Suspends the gate until the returned guard drops.
    #[must_use = "the gate re-opens as soon as the guard is dropped"]
    pub fn suspend(&self) -> GateGuard {
        let prior = self.open.swap(false, Ordering::Relaxed);
        GateGuard {
            open: Arc::clone(&self.open),
            prior,
        }
    }
}

/// Restores the gate's prior state on drop, error or not.
#[derive(Debug)]
pub struct GateGuard {
    open: Arc<AtomicBool>,
    prior: bool,
}

impl Drop for GateGuard {
    fn drop(&mut self) {
        self.open.store(self.prior, Ordering::Relaxed);
    }
}

/// Two-stack linear command history with a global modification gate.
#[derive(Debug)]
pub struct UndoRedoManager {
    undo_stack: Vec<Command>,
    redo_stack: Vec<Command>,
    listen_gate: ReentrancyGate,
    modification_enabled: bool,
}

impl Default for UndoRedoManager {
    fn default() -> Self {
        Self::new()
    }
}

impl UndoRedoManager {
    #[must_use]
    pub fn new() -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            listen_gate: ReentrancyGate::new(),
            modification_enabled: true,
        }
    }

    /// Records a freshly executed command. Clears the redo stack: once a
    /// new action lands, the abandoned branch can no longer be replayed.
    pub fn add_command(&mut self, command: Command) {
        self.undo_stack.push(command);
        self.redo_stack.clear();
    }

    pub fn pop_undo(&mut self) -> Option<Command> {
        self.undo_stack.pop()
    }

    pub fn push_undo(&mut self, command: Command) {
        self.undo_stack.push(command);
    }

    pub fn pop_redo(&mut self) -> Option<Command> {
        self.redo_stack.pop()
    }

    pub fn push_redo(&mut self, command: Command) {
        self.redo_stack.push(command);
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    #[must_use]
    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    #[must_use]
    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// The session-wide listening gate. Cloning is cheap; the clone shares
    /// the underlying flag.
    #[must_use]
    pub fn listen_gate(&self) -> &ReentrancyGate {
        &self.listen_gate
    }

    /// Allows substantive (`modifies_workflow`) commands again.
    pub fn enable_workflow_modification(&mut self) {
        self.modification_enabled = true;
    }

    /// Blocks substantive commands, e.g. while an execution is running.
    /// Cosmetic commands (position moves) stay allowed.
    pub fn disable_workflow_modification(&mut self) {
        self.modification_enabled = false;
    }

    #[must_use]
    pub fn modification_enabled(&self) -> bool {
        self.modification_enabled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Point;

    fn cosmetic_command() -> Command {
        Command::MoveOperators {
            operator_ids: vec!["a".into()],
            offset: Point::new(1.0, 1.0),
            apply_on_execute: true,
        }
    }

    #[test]
    fn new_command_clears_redo_branch() {
        let mut manager = UndoRedoManager::new();
        manager.add_command(cosmetic_command());
        let undone = manager.pop_undo().unwrap();
        manager.push_redo(undone);
        assert!(manager.can_redo());

        manager.add_command(cosmetic_command());
        assert!(!manager.can_redo());
        assert_eq!(manager.undo_len(), 1);
    }

    #[test]
    fn guard_restores_gate_state_on_drop() {
        let gate = ReentrancyGate::new();
        {
            let _outer = gate.suspend();
            assert!(!gate.is_open());
        }
        assert!(gate.is_open());

        // A guard taken while already suspended restores "suspended".
        let outer = gate.suspend();
        {
            let _inner = gate.suspend();
        }
        assert!(!gate.is_open());
        drop(outer);
        assert!(gate.is_open());
    }

    #[test]
    fn modification_gate_toggles() {
        let mut manager = UndoRedoManager::new();
        assert!(manager.modification_enabled());
        manager.disable_workflow_modification();
        assert!(!manager.modification_enabled());
        manager.enable_workflow_modification();
        assert!(manager.modification_enabled());
    }
}
