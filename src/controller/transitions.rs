//! Transition editing

use super::{Batch, Controller};
use crate::fsm::{Point, StateMachine, Transition, TransitionLabel, VertexKind};
use crate::history::Command;
use crate::store::{CreateTransitionParams, IdKind};

/// New content of an existing transition
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeTransitionParams {
    pub id: String,
    pub source: String,
    pub target: String,
    pub color: String,
    pub label: Option<TransitionLabel>,
}

/// Endpoint rules shared by creation and change
fn endpoints_allowed(sm: &StateMachine, source: &str, target: &str) -> bool {
    let (Some(source_kind), Some(target_kind)) = (sm.vertex_kind(source), sm.vertex_kind(target)) else {
        log::warn!("Transition endpoints '{}' -> '{}' do not exist", source, target);
        return false;
    };
    match (source_kind, target_kind) {
        (_, VertexKind::Initial) => {
            log::warn!("A transition cannot end at initial state '{}'", target);
            false
        }
        (VertexKind::Final, _) => {
            log::warn!("A transition cannot start at final state '{}'", source);
            false
        }
        (VertexKind::Initial, kind) if kind != VertexKind::State => {
            log::warn!("Initial state '{}' may only designate a state", source);
            false
        }
        _ => true,
    }
}

impl Controller {
    pub fn create_transition(&mut self, sm_id: &str, params: CreateTransitionParams, can_undo: bool) -> Option<String> {
        let sm = self.model.machine(sm_id)?;
        if !endpoints_allowed(sm, &params.source, &params.target) {
            return None;
        }
        if sm.vertex_kind(&params.source) == Some(VertexKind::Initial) && sm.initial_transition(&params.source).is_some() {
            log::warn!("Initial state '{}' already has its transition", params.source);
            return None;
        }
        let id = match params.id {
            Some(id) if sm.transitions.contains_key(&id) => {
                log::warn!("Transition id '{}' is already taken in '{}'", id, sm_id);
                return None;
            }
            Some(id) => id,
            None => self.model.generate_id(sm_id, IdKind::Transition)?,
        };
        let color = if params.color.is_empty() {
            self.config.transition_color.clone()
        } else {
            params.color
        };

        let data = Transition {
            source: params.source,
            target: params.target,
            color,
            label: params.label,
            selection: false,
        };
        let mut batch = Batch::new();
        let done = self.exec(
            &mut batch,
            Command::CreateTransition {
                sm: sm_id.to_string(),
                id: id.clone(),
                data,
            },
        );
        self.sync_layers(sm_id);
        self.commit(batch, can_undo);
        done.then_some(id)
    }

    /// Replace endpoints, color and label of a transition
    pub fn change_transition(&mut self, sm_id: &str, params: ChangeTransitionParams, can_undo: bool) -> bool {
        let Some(sm) = self.model.machine(sm_id) else {
            return false;
        };
        let Some(prev_data) = sm.transitions.get(&params.id).cloned() else {
            return false;
        };
        if !endpoints_allowed(sm, &params.source, &params.target) {
            return false;
        }
        if params.source != prev_data.source
            && [&params.source, &prev_data.source]
                .iter()
                .any(|v| sm.vertex_kind(v) == Some(VertexKind::Initial))
        {
            log::warn!("The transition of an initial state cannot change its source");
            return false;
        }
        if sm.vertex_kind(&params.source) == Some(VertexKind::Initial)
            && sm.vertex_parent(&params.source) != sm.vertex_parent(&params.target)
        {
            log::warn!("Initial state '{}' may only designate a member of its scope", params.source);
            return false;
        }

        let data = Transition {
            source: params.source,
            target: params.target,
            color: params.color,
            label: params.label,
            selection: prev_data.selection,
        };
        if data == prev_data {
            return false;
        }
        let mut batch = Batch::new();
        let done = self.exec(
            &mut batch,
            Command::ChangeTransition {
                sm: sm_id.to_string(),
                id: params.id,
                data,
                prev_data,
            },
        );
        self.sync_layers(sm_id);
        self.commit(batch, can_undo);
        done
    }

    /// Move the label of a transition
    pub fn change_transition_position(&mut self, sm_id: &str, id: &str, position: Point, can_undo: bool) -> bool {
        let Some(prev_position) = self
            .model
            .transition(sm_id, id)
            .and_then(|t| t.label.as_ref())
            .map(|l| l.position)
        else {
            return false;
        };
        let mut batch = Batch::new();
        let done = self.exec(
            &mut batch,
            Command::ChangeTransitionPosition {
                sm: sm_id.to_string(),
                id: id.to_string(),
                position,
                prev_position,
            },
        );
        self.commit(batch, can_undo);
        done
    }

    /// Delete a transition. The transition of an initial state goes only
    /// together with the initial state.
    pub fn delete_transition(&mut self, sm_id: &str, id: &str, can_undo: bool) -> bool {
        let Some(sm) = self.model.machine(sm_id) else {
            return false;
        };
        let Some(data) = sm.transitions.get(id).cloned() else {
            return false;
        };
        if sm.vertex_kind(&data.source) == Some(VertexKind::Initial) {
            log::warn!("Transition '{}' belongs to initial state '{}'", id, data.source);
            return false;
        }

        let mut batch = Batch::new();
        let done = self.exec(
            &mut batch,
            Command::DeleteTransition {
                sm: sm_id.to_string(),
                id: id.to_string(),
                data,
            },
        );
        self.sync_layers(sm_id);
        self.commit(batch, can_undo);
        done
    }

    pub fn select_transition(&mut self, sm_id: &str, id: &str) -> bool {
        self.model.remove_selection();
        self.model.change_transition_selection(sm_id, id, true)
    }
}
