//! Component editing and the reference rewrite that follows a rename

use std::collections::BTreeMap;

use super::{Batch, Controller};
use crate::fsm::{Component, Point, Transition, SYSTEM_COMPONENT};
use crate::history::Command;

impl Controller {
    /// Add a component of `component_type` under `name`, last in declaration order
    pub fn create_component(
        &mut self,
        sm_id: &str,
        name: &str,
        component_type: &str,
        parameters: BTreeMap<String, String>,
        can_undo: bool,
    ) -> bool {
        let Some(sm) = self.model.machine(sm_id) else {
            return false;
        };
        if name.is_empty() || name == SYSTEM_COMPONENT || sm.components.contains_key(name) {
            log::warn!("Component name '{}' is not available in '{}'", name, sm_id);
            return false;
        }
        let data = Component {
            component_type: component_type.to_string(),
            parameters,
            order: sm.next_component_order(),
            position: Point::default(),
            selection: false,
        };

        let mut batch = Batch::new();
        let done = self.exec(
            &mut batch,
            Command::CreateComponent {
                sm: sm_id.to_string(),
                name: name.to_string(),
                data,
            },
        );
        self.commit(batch, can_undo);
        done
    }

    /// Replace the parameters of a component, renaming it when `new_name` differs
    pub fn change_component(
        &mut self,
        sm_id: &str,
        name: &str,
        parameters: BTreeMap<String, String>,
        new_name: Option<&str>,
        can_undo: bool,
    ) -> bool {
        let Some(prev_parameters) = self.model.component(sm_id, name).map(|c| c.parameters.clone()) else {
            return false;
        };
        let mut batch = Batch::new();
        let mut done = false;
        if parameters != prev_parameters {
            done |= self.exec(
                &mut batch,
                Command::ChangeComponent {
                    sm: sm_id.to_string(),
                    name: name.to_string(),
                    parameters,
                    prev_parameters,
                },
            );
        }
        if let Some(new_name) = new_name.filter(|n| *n != name) {
            done |= self.rename_cascade(&mut batch, sm_id, name, new_name);
        }
        self.commit(batch, can_undo);
        done
    }

    /// Rename a component and every trigger, action and condition variable
    /// naming it. Renaming again with the same arguments does nothing.
    pub fn rename_component(&mut self, sm_id: &str, name: &str, new_name: &str, can_undo: bool) -> bool {
        let mut batch = Batch::new();
        let done = self.rename_cascade(&mut batch, sm_id, name, new_name);
        self.commit(batch, can_undo);
        done
    }

    fn rename_cascade(&mut self, batch: &mut Batch, sm_id: &str, name: &str, new_name: &str) -> bool {
        let Some(sm) = self.model.machine(sm_id) else {
            return false;
        };
        if name == new_name || new_name.is_empty() || new_name == SYSTEM_COMPONENT {
            return false;
        }
        if !sm.components.contains_key(name) || sm.components.contains_key(new_name) {
            log::debug!("Nothing to rename from '{}' to '{}'", name, new_name);
            return false;
        }

        let mut rewrites = Vec::new();
        for (id, state) in &sm.states {
            let mut events = state.events.clone();
            let changed = events
                .iter_mut()
                .fold(false, |changed, e| e.rename_component(name, new_name) | changed);
            if changed {
                rewrites.push(Command::ChangeStateEvents {
                    sm: sm_id.to_string(),
                    id: id.clone(),
                    events,
                    prev_events: state.events.clone(),
                });
            }
        }
        for (id, transition) in &sm.transitions {
            let Some(mut label) = transition.label.clone() else {
                continue;
            };
            if label.rename_component(name, new_name) {
                rewrites.push(Command::ChangeTransition {
                    sm: sm_id.to_string(),
                    id: id.clone(),
                    data: Transition {
                        label: Some(label),
                        ..transition.clone()
                    },
                    prev_data: transition.clone(),
                });
            }
        }

        let renamed = self.exec(
            batch,
            Command::RenameComponent {
                sm: sm_id.to_string(),
                name: name.to_string(),
                new_name: new_name.to_string(),
            },
        );
        if !renamed {
            return false;
        }
        let count = rewrites.len();
        for command in rewrites {
            self.exec(batch, command);
        }
        log::debug!("Renamed component '{}' to '{}', {} owner(s) rewritten", name, new_name, count);
        true
    }

    /// Exchange the declaration order of two components
    pub fn swap_components(&mut self, sm_id: &str, a: &str, b: &str, can_undo: bool) -> bool {
        let mut batch = Batch::new();
        let done = self.exec(
            &mut batch,
            Command::SwapComponents {
                sm: sm_id.to_string(),
                a: a.to_string(),
                b: b.to_string(),
            },
        );
        self.commit(batch, can_undo);
        done
    }

    pub fn change_component_position(&mut self, sm_id: &str, name: &str, position: Point, can_undo: bool) -> bool {
        let Some(prev_position) = self.model.component(sm_id, name).map(|c| c.position) else {
            return false;
        };
        let mut batch = Batch::new();
        let done = self.exec(
            &mut batch,
            Command::ChangeComponentPosition {
                sm: sm_id.to_string(),
                name: name.to_string(),
                position,
                prev_position,
            },
        );
        self.commit(batch, can_undo);
        done
    }

    /// Number of triggers, actions and condition variables naming a component
    pub fn component_references(&self, sm_id: &str, name: &str) -> usize {
        self.model
            .machine(sm_id)
            .map(|sm| sm.count_component_references(name))
            .unwrap_or(0)
    }

    /// Delete a component. Refused while any event or label still names it.
    pub fn delete_component(&mut self, sm_id: &str, name: &str, can_undo: bool) -> bool {
        let Some(data) = self.model.component(sm_id, name).cloned() else {
            return false;
        };
        let references = self.component_references(sm_id, name);
        if references > 0 {
            log::warn!("Component '{}' is still referenced {} time(s)", name, references);
            return false;
        }
        let mut batch = Batch::new();
        let done = self.exec(
            &mut batch,
            Command::DeleteComponent {
                sm: sm_id.to_string(),
                name: name.to_string(),
                data,
            },
        );
        self.commit(batch, can_undo);
        done
    }

    pub fn select_component(&mut self, sm_id: &str, name: &str) -> bool {
        self.model.remove_selection();
        self.model.change_component_selection(sm_id, name, true)
    }
}
