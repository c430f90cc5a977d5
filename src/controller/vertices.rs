//! Initial, final and choice states, and the per-scope initial state upkeep

use super::{Batch, Controller};
use crate::fsm::{ChoiceState, Dimensions, FinalState, InitialState, Point, Transition, VertexKind};
use crate::history::Command;
use crate::store::{CreateVertexParams, IdKind};

impl Controller {
    // ========================================================================
    // Scope upkeep
    // ========================================================================

    /// Explicit id when free in the vertex namespace, otherwise a generated one
    pub(super) fn claim_vertex_id(&mut self, sm_id: &str, kind: VertexKind, explicit: Option<String>) -> Option<String> {
        match explicit {
            Some(id) if self.model.machine(sm_id)?.has_vertex(&id) => {
                log::warn!("Vertex id '{}' is already taken in '{}'", id, sm_id);
                None
            }
            Some(id) => Some(id),
            None => self.model.generate_id(sm_id, IdKind::Vertex(kind)),
        }
    }

    fn initial_position_for(&self, sm_id: &str, target: &str) -> Point {
        let offset = self.config.initial_state_offset;
        self.model
            .state(sm_id, target)
            .map(|s| s.position.offset(offset.x, offset.y))
            .unwrap_or_default()
    }

    /// Create the initial state of `scope` together with its transition to `target`
    pub(super) fn create_initial_with_transition(
        &mut self,
        batch: &mut Batch,
        sm_id: &str,
        scope: Option<&str>,
        target: &str,
    ) -> Option<String> {
        let init_id = self.model.generate_id(sm_id, IdKind::Vertex(VertexKind::Initial))?;
        let data = InitialState {
            position: self.initial_position_for(sm_id, target),
            dimensions: self.config.initial_state_dimensions,
            parent_id: scope.map(str::to_string),
        };
        let created = self.exec(
            batch,
            Command::CreateInitialState {
                sm: sm_id.to_string(),
                id: init_id.clone(),
                data,
            },
        );
        if !created {
            return None;
        }
        let transition_id = self.model.generate_id(sm_id, IdKind::Transition)?;
        let transition = Transition::new(init_id.clone(), target, self.config.transition_color.clone());
        self.exec(
            batch,
            Command::CreateTransition {
                sm: sm_id.to_string(),
                id: transition_id,
                data: transition,
            },
        );
        log::debug!("Initial state '{}' now designates '{}'", init_id, target);
        Some(init_id)
    }

    /// Delete an initial state and its transition
    pub(super) fn remove_initial(&mut self, batch: &mut Batch, sm_id: &str, init_id: &str) {
        self.delete_incident_transitions(batch, sm_id, init_id);
        let data = self
            .model
            .machine(sm_id)
            .and_then(|sm| sm.initial_states.get(init_id))
            .cloned();
        if let Some(data) = data {
            self.exec(
                batch,
                Command::DeleteInitialState {
                    sm: sm_id.to_string(),
                    id: init_id.to_string(),
                    data,
                },
            );
        }
    }

    /// Point an initial state at another sibling and move it next to it
    pub(super) fn retarget_initial(&mut self, batch: &mut Batch, sm_id: &str, init_id: &str, target: &str) -> bool {
        let Some(sm) = self.model.machine(sm_id) else {
            return false;
        };
        let Some((transition_id, prev_data)) = sm
            .initial_transition(init_id)
            .map(|(id, t)| (id.to_string(), t.clone()))
        else {
            return false;
        };
        let Some(prev_position) = sm.initial_states.get(init_id).map(|i| i.position) else {
            return false;
        };
        if prev_data.target == target {
            return false;
        }

        let data = Transition {
            target: target.to_string(),
            ..prev_data.clone()
        };
        self.exec(
            batch,
            Command::ChangeTransition {
                sm: sm_id.to_string(),
                id: transition_id,
                data,
                prev_data,
            },
        );
        let position = self.initial_position_for(sm_id, target);
        if position != prev_position {
            self.exec(
                batch,
                Command::ChangeInitialStatePosition {
                    sm: sm_id.to_string(),
                    id: init_id.to_string(),
                    position,
                    prev_position,
                },
            );
        }
        true
    }

    /// `leaving` is about to leave `scope`. Relocates the scope's initial
    /// state when it designates `leaving`, removes it when no sibling remains.
    pub(super) fn leave_scope(&mut self, batch: &mut Batch, sm_id: &str, scope: Option<&str>, leaving: &str) {
        let Some(sm) = self.model.machine(sm_id) else {
            return;
        };
        let Some(init_id) = sm.scope_initial(scope).map(str::to_string) else {
            return;
        };
        let remaining: Option<String> = sm
            .children_of(scope)
            .into_iter()
            .find(|id| *id != leaving)
            .map(str::to_string);
        let designates_leaving = sm.initial_target(&init_id) == Some(leaving);

        match remaining {
            None => self.remove_initial(batch, sm_id, &init_id),
            Some(sibling) if designates_leaving => {
                self.retarget_initial(batch, sm_id, &init_id, &sibling);
            }
            Some(_) => {}
        }
    }

    /// `entering` has just joined `scope`; the first member gets an initial state
    pub(super) fn enter_scope(&mut self, batch: &mut Batch, sm_id: &str, scope: Option<&str>, entering: &str) {
        let has_initial = self
            .model
            .machine(sm_id)
            .is_some_and(|sm| sm.scope_initial(scope).is_some());
        if !has_initial {
            self.create_initial_with_transition(batch, sm_id, scope, entering);
        }
    }

    pub(super) fn delete_incident_transitions(&mut self, batch: &mut Batch, sm_id: &str, vertex_id: &str) {
        let Some(sm) = self.model.machine(sm_id) else {
            return;
        };
        let doomed: Vec<(String, Transition)> = sm
            .incident_transitions(vertex_id)
            .into_iter()
            .map(|id| (id.to_string(), sm.transitions[id].clone()))
            .collect();
        for (id, data) in doomed {
            self.exec(
                batch,
                Command::DeleteTransition {
                    sm: sm_id.to_string(),
                    id,
                    data,
                },
            );
        }
    }

    // ========================================================================
    // Initial states
    // ========================================================================

    pub fn change_initial_state_position(&mut self, sm_id: &str, id: &str, position: Point, can_undo: bool) -> bool {
        let Some(prev_position) = self
            .model
            .machine(sm_id)
            .and_then(|sm| sm.initial_states.get(id))
            .map(|i| i.position)
        else {
            return false;
        };
        let mut batch = Batch::new();
        let done = self.exec(
            &mut batch,
            Command::ChangeInitialStatePosition {
                sm: sm_id.to_string(),
                id: id.to_string(),
                position,
                prev_position,
            },
        );
        self.commit(batch, can_undo);
        done
    }

    // ========================================================================
    // Final and choice states
    // ========================================================================

    fn default_dimensions(&self, kind: VertexKind) -> Dimensions {
        match kind {
            VertexKind::State => self.config.state_dimensions,
            VertexKind::Initial => self.config.initial_state_dimensions,
            VertexKind::Final => self.config.final_state_dimensions,
            VertexKind::Choice => self.config.choice_state_dimensions,
        }
    }

    fn create_pseudo_state(
        &mut self,
        sm_id: &str,
        kind: VertexKind,
        params: CreateVertexParams,
        can_undo: bool,
    ) -> Option<String> {
        let sm = self.model.machine(sm_id)?;
        let dimensions = if params.dimensions == Dimensions::default() {
            self.default_dimensions(kind)
        } else {
            params.dimensions
        };
        let position = if params.place_in_center {
            dimensions.centered_at(params.position)
        } else {
            params.position
        };
        let parent_id = match params.parent_id {
            Some(parent) if sm.states.contains_key(&parent) => Some(parent),
            Some(parent) => {
                log::warn!("Cannot place vertex inside missing state '{}'", parent);
                return None;
            }
            None => sm.state_at_point(params.position, None).map(str::to_string),
        };
        let id = self.claim_vertex_id(sm_id, kind, params.id)?;

        let sm = sm_id.to_string();
        let command = match kind {
            VertexKind::Final => Command::CreateFinalState {
                sm,
                id: id.clone(),
                data: FinalState {
                    position,
                    dimensions,
                    parent_id,
                },
            },
            VertexKind::Choice => Command::CreateChoiceState {
                sm,
                id: id.clone(),
                data: ChoiceState {
                    position,
                    dimensions,
                    parent_id,
                    selection: false,
                },
            },
            VertexKind::State | VertexKind::Initial => return None,
        };

        let mut batch = Batch::new();
        let done = self.exec(&mut batch, command);
        self.commit(batch, can_undo);
        done.then_some(id)
    }

    pub fn create_final_state(&mut self, sm_id: &str, params: CreateVertexParams, can_undo: bool) -> Option<String> {
        self.create_pseudo_state(sm_id, VertexKind::Final, params, can_undo)
    }

    pub fn create_choice_state(&mut self, sm_id: &str, params: CreateVertexParams, can_undo: bool) -> Option<String> {
        self.create_pseudo_state(sm_id, VertexKind::Choice, params, can_undo)
    }

    fn delete_pseudo_state(&mut self, sm_id: &str, kind: VertexKind, id: &str, can_undo: bool) -> bool {
        let Some(sm) = self.model.machine(sm_id) else {
            return false;
        };
        let (sm_name, key) = (sm_id.to_string(), id.to_string());
        let command = match kind {
            VertexKind::Final => match sm.final_states.get(id) {
                Some(data) => Command::DeleteFinalState {
                    sm: sm_name,
                    id: key,
                    data: data.clone(),
                },
                None => return false,
            },
            VertexKind::Choice => match sm.choice_states.get(id) {
                Some(data) => Command::DeleteChoiceState {
                    sm: sm_name,
                    id: key,
                    data: data.clone(),
                },
                None => return false,
            },
            VertexKind::State | VertexKind::Initial => return false,
        };

        let mut batch = Batch::new();
        self.delete_incident_transitions(&mut batch, sm_id, id);
        let done = self.exec(&mut batch, command);
        self.sync_layers(sm_id);
        self.commit(batch, can_undo);
        done
    }

    /// Delete a final state with every transition into it
    pub fn delete_final_state(&mut self, sm_id: &str, id: &str, can_undo: bool) -> bool {
        self.delete_pseudo_state(sm_id, VertexKind::Final, id, can_undo)
    }

    /// Delete a choice state with every transition into or out of it
    pub fn delete_choice_state(&mut self, sm_id: &str, id: &str, can_undo: bool) -> bool {
        self.delete_pseudo_state(sm_id, VertexKind::Choice, id, can_undo)
    }

    pub fn change_final_state_position(&mut self, sm_id: &str, id: &str, position: Point, can_undo: bool) -> bool {
        let Some(prev_position) = self
            .model
            .machine(sm_id)
            .and_then(|sm| sm.final_states.get(id))
            .map(|v| v.position)
        else {
            return false;
        };
        let mut batch = Batch::new();
        let done = self.exec(
            &mut batch,
            Command::ChangeFinalStatePosition {
                sm: sm_id.to_string(),
                id: id.to_string(),
                position,
                prev_position,
            },
        );
        self.commit(batch, can_undo);
        done
    }

    pub fn change_choice_state_position(&mut self, sm_id: &str, id: &str, position: Point, can_undo: bool) -> bool {
        let Some(prev_position) = self
            .model
            .machine(sm_id)
            .and_then(|sm| sm.choice_states.get(id))
            .map(|v| v.position)
        else {
            return false;
        };
        let mut batch = Batch::new();
        let done = self.exec(
            &mut batch,
            Command::ChangeChoiceStatePosition {
                sm: sm_id.to_string(),
                id: id.to_string(),
                position,
                prev_position,
            },
        );
        self.commit(batch, can_undo);
        done
    }

    /// Move a final or choice state into `parent` (top level when `None`)
    pub fn link_pseudo_state(&mut self, sm_id: &str, id: &str, parent: Option<&str>, can_undo: bool) -> bool {
        let Some(sm) = self.model.machine(sm_id) else {
            return false;
        };
        if !matches!(sm.vertex_kind(id), Some(VertexKind::Final | VertexKind::Choice)) {
            return false;
        }
        if parent.is_some_and(|p| !sm.states.contains_key(p)) {
            return false;
        }
        let prev_parent = sm.vertex_parent(id).map(str::to_string);
        if prev_parent.as_deref() == parent {
            return false;
        }

        let mut batch = Batch::new();
        let done = self.exec(
            &mut batch,
            Command::LinkVertex {
                sm: sm_id.to_string(),
                id: id.to_string(),
                parent: parent.map(str::to_string),
                prev_parent,
            },
        );
        self.sync_layers(sm_id);
        self.commit(batch, can_undo);
        done
    }

    pub fn select_choice_state(&mut self, sm_id: &str, id: &str) -> bool {
        self.model.remove_selection();
        self.model.change_choice_state_selection(sm_id, id, true)
    }
}
