//! Editor Controller
//! Drives the data store while keeping containment and reference invariants,
//! and records every edit in the undo history.
//!
//! Each public mutation collects the commands it performs into one batch and
//! commits the batch as a single history step: the last command heads the
//! group and counts every other command of the batch as connected. Passing
//! `can_undo = false` performs the edit without recording it.
//!
//! The sub-controllers live in their own files as further `impl Controller`
//! blocks: `states`, `vertices`, `transitions`, `components`, `notes`.

use std::collections::{BTreeMap, HashMap};

use crate::config::EditorConfig;
use crate::fsm::{Elements, StateMachine};
use crate::history::{Command, History};
use crate::platform::PlatformRegistry;
use crate::store::{ChangeEvent, EditorModel, SubscriptionId};
use crate::validator::{self, ValidationResult};

mod components;
mod notes;
mod states;
mod transitions;
mod vertices;

#[cfg(test)]
mod tests;

pub use states::{EventSelection, EventValue, StateOptions};
pub use transitions::ChangeTransitionParams;

/// Commands performed by one user-visible step
type Batch = Vec<Command>;

/// Owns one open document: its store, its history and derived view data
#[derive(Debug)]
pub struct Controller {
    model: EditorModel,
    history: History<Command>,
    config: EditorConfig,
    /// Rendering layer owner of every transition, per machine
    layers: HashMap<String, BTreeMap<String, Option<String>>>,
}

impl Default for Controller {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl Controller {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            model: EditorModel::new(),
            history: History::new(config.history()),
            config,
            layers: HashMap::new(),
        }
    }

    pub fn model(&self) -> &EditorModel {
        &self.model
    }

    pub fn elements(&self) -> &Elements {
        self.model.elements()
    }

    pub fn machine(&self, sm_id: &str) -> Option<&StateMachine> {
        self.model.machine(sm_id)
    }

    pub fn history(&self) -> &History<Command> {
        &self.history
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn subscribe<F>(&mut self, path: impl Into<String>, listener: F) -> SubscriptionId
    where
        F: FnMut(&ChangeEvent) + 'static,
    {
        self.model.subscribe(path, listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.model.unsubscribe(id)
    }

    pub fn snapshot(&self, path: &str) -> Option<serde_json::Value> {
        self.model.snapshot(path)
    }

    /// Check the document against the platforms its machines target
    pub fn validate(&self, platforms: &PlatformRegistry) -> ValidationResult<()> {
        validator::validate(self.model.elements(), platforms)
    }

    // ========================================================================
    // Recording
    // ========================================================================

    /// Perform `command` and add it to the batch when it applied
    fn exec(&mut self, batch: &mut Batch, command: Command) -> bool {
        if command.redo(&mut self.model) {
            batch.push(command);
            true
        } else {
            false
        }
    }

    /// Record a finished batch as one history step
    fn commit(&mut self, batch: Batch, can_undo: bool) {
        if batch.is_empty() {
            return;
        }
        log::debug!("Edit of {} command(s)", batch.len());
        if can_undo {
            self.history.do_group(batch);
        }
    }

    // ========================================================================
    // Undo / Redo
    // ========================================================================

    pub fn undo(&mut self) {
        self.history.undo(&mut self.model);
        self.sync_all_layers();
    }

    pub fn redo(&mut self) {
        self.history.redo(&mut self.model);
        self.sync_all_layers();
    }

    /// Drop all recorded steps
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    // ========================================================================
    // Transition layers
    // ========================================================================

    /// State whose layer draws the transition (`Some(None)` = top level)
    pub fn transition_layer(&self, sm_id: &str, transition_id: &str) -> Option<Option<&str>> {
        self.layers
            .get(sm_id)?
            .get(transition_id)
            .map(|layer| layer.as_deref())
    }

    fn sync_layers(&mut self, sm_id: &str) {
        let Some(sm) = self.model.machine(sm_id) else {
            self.layers.remove(sm_id);
            return;
        };
        let layers = sm
            .transitions
            .iter()
            .map(|(id, t)| (id.clone(), sm.transition_layer(t)))
            .collect();
        self.layers.insert(sm_id.to_string(), layers);
    }

    fn sync_all_layers(&mut self) {
        self.layers.clear();
        for sm_id in self.model.machine_ids() {
            self.sync_layers(&sm_id);
        }
    }

    // ========================================================================
    // Document
    // ========================================================================

    /// Replace the document. History is cleared: it is never persisted.
    pub fn load(&mut self, base_path: Option<String>, name: Option<String>, elements: Elements) {
        self.model.init(base_path, name, elements);
        self.history.clear();
        self.sync_all_layers();
    }

    pub fn reset(&mut self) {
        self.model.reset();
        self.history.clear();
        self.layers.clear();
    }

    pub fn mark_saved(&mut self, base_path: Option<String>, name: Option<String>) {
        self.model.set_base_path(base_path, name);
        self.model.make_unstale();
    }

    // ========================================================================
    // State machines
    // ========================================================================

    pub fn create_state_machine(&mut self, sm_id: &str, machine: StateMachine, can_undo: bool) -> bool {
        let mut batch = Batch::new();
        let done = self.exec(
            &mut batch,
            Command::CreateStateMachine {
                sm: sm_id.to_string(),
                data: machine,
            },
        );
        self.sync_layers(sm_id);
        self.commit(batch, can_undo);
        done
    }

    pub fn delete_state_machine(&mut self, sm_id: &str, can_undo: bool) -> bool {
        let Some(data) = self.model.machine(sm_id).cloned() else {
            return false;
        };
        let mut batch = Batch::new();
        let done = self.exec(
            &mut batch,
            Command::DeleteStateMachine {
                sm: sm_id.to_string(),
                data,
            },
        );
        self.sync_layers(sm_id);
        self.commit(batch, can_undo);
        done
    }

    pub fn change_state_machine_name(&mut self, sm_id: &str, name: Option<String>, can_undo: bool) -> bool {
        let Some(prev_name) = self.model.machine(sm_id).map(|sm| sm.name.clone()) else {
            return false;
        };
        let mut batch = Batch::new();
        let done = self.exec(
            &mut batch,
            Command::ChangeStateMachineName {
                sm: sm_id.to_string(),
                name,
                prev_name,
            },
        );
        self.commit(batch, can_undo);
        done
    }

    /// Clear every selection flag. Not recorded.
    pub fn remove_selection(&mut self) {
        self.model.remove_selection();
    }
}
