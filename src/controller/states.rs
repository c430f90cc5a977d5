//! State editing: creation with parent resolution, re-linking between scopes,
//! the delete cascade and the event/action lists.

use super::{Batch, Controller};
use crate::fsm::{Action, Condition, Dimensions, Event, EventData, Point, State, VertexKind};
use crate::history::Command;
use crate::parser::{self, ParseResult};
use crate::store::CreateStateParams;

/// Behaviour switches for [`Controller::create_state`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateOptions {
    /// Resolve a missing parent by hit-testing the creation point
    pub link_by_point: bool,
    /// Give the scope an initial state when the new state is its first member
    pub can_be_initial: bool,
}

impl Default for StateOptions {
    fn default() -> Self {
        Self {
            link_by_point: true,
            can_be_initial: true,
        }
    }
}

/// Addresses one event of a state, or one action inside it.
/// `action_index: None` selects the trigger and condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSelection {
    pub state_id: String,
    pub event_index: usize,
    pub action_index: Option<usize>,
}

impl EventSelection {
    pub fn trigger(state_id: impl Into<String>, event_index: usize) -> Self {
        Self {
            state_id: state_id.into(),
            event_index,
            action_index: None,
        }
    }

    pub fn action(state_id: impl Into<String>, event_index: usize, action_index: usize) -> Self {
        Self {
            state_id: state_id.into(),
            event_index,
            action_index: Some(action_index),
        }
    }
}

/// New value for the part of an event an [`EventSelection`] points at
#[derive(Debug, Clone, PartialEq)]
pub enum EventValue {
    Trigger(Event),
    Action(Action),
}

impl Controller {
    // ========================================================================
    // Creation and linking
    // ========================================================================

    /// Create a state and, when it opens a new scope, that scope's initial state
    pub fn create_state(
        &mut self,
        sm_id: &str,
        params: CreateStateParams,
        options: StateOptions,
        can_undo: bool,
    ) -> Option<String> {
        let sm = self.model.machine(sm_id)?;
        let dimensions = if params.dimensions == Dimensions::default() {
            self.config.state_dimensions
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
                log::warn!("Cannot create a state inside missing state '{}'", parent);
                return None;
            }
            None if options.link_by_point => sm.state_at_point(params.position, None).map(str::to_string),
            None => None,
        };
        let id = self.claim_vertex_id(sm_id, VertexKind::State, params.id)?;

        let state = State {
            name: params.name,
            parent_id: parent_id.clone(),
            position,
            dimensions,
            events: params.events,
            color: params.color,
            selection: false,
        };
        let mut batch = Batch::new();
        let created = self.exec(
            &mut batch,
            Command::CreateState {
                sm: sm_id.to_string(),
                id: id.clone(),
                data: state,
            },
        );
        if !created {
            return None;
        }
        if options.can_be_initial {
            self.enter_scope(&mut batch, sm_id, parent_id.as_deref(), &id);
        }
        self.sync_layers(sm_id);
        self.commit(batch, can_undo);
        log::debug!("Created state '{}' in '{}'", id, sm_id);
        Some(id)
    }

    /// Move a state into `parent` (top level when `None`), keeping both scopes'
    /// initial states consistent
    fn relink(&mut self, batch: &mut Batch, sm_id: &str, id: &str, parent: Option<&str>, can_be_initial: bool) -> bool {
        let Some(sm) = self.model.machine(sm_id) else {
            return false;
        };
        let Some(prev_parent) = sm.states.get(id).map(|s| s.parent_id.clone()) else {
            return false;
        };
        if prev_parent.as_deref() == parent {
            return false;
        }
        if let Some(parent) = parent {
            if parent == id || !sm.states.contains_key(parent) || sm.is_ancestor(id, parent) {
                log::warn!("Cannot link '{}' into '{}': would break the hierarchy", id, parent);
                return false;
            }
        }

        self.leave_scope(batch, sm_id, prev_parent.as_deref(), id);
        let linked = self.exec(
            batch,
            Command::LinkVertex {
                sm: sm_id.to_string(),
                id: id.to_string(),
                parent: parent.map(str::to_string),
                prev_parent,
            },
        );
        if linked && can_be_initial {
            self.enter_scope(batch, sm_id, parent, id);
        }
        linked
    }

    pub fn link_state(&mut self, sm_id: &str, parent_id: &str, child_id: &str, can_undo: bool) -> bool {
        let mut batch = Batch::new();
        let done = self.relink(&mut batch, sm_id, child_id, Some(parent_id), true);
        self.sync_layers(sm_id);
        self.commit(batch, can_undo);
        done
    }

    /// Move a nested state to the top level
    pub fn unlink_state(&mut self, sm_id: &str, id: &str, can_undo: bool) -> bool {
        let mut batch = Batch::new();
        let done = self.relink(&mut batch, sm_id, id, None, true);
        self.sync_layers(sm_id);
        self.commit(batch, can_undo);
        done
    }

    /// Make `state_id` the target of its scope's initial state
    pub fn set_initial_state(&mut self, sm_id: &str, state_id: &str, can_undo: bool) -> bool {
        let Some(sm) = self.model.machine(sm_id) else {
            return false;
        };
        let Some(scope) = sm.states.get(state_id).map(|s| s.parent_id.clone()) else {
            return false;
        };
        let initial = sm.scope_initial(scope.as_deref()).map(str::to_string);

        let mut batch = Batch::new();
        let done = match initial {
            Some(init_id) => self.retarget_initial(&mut batch, sm_id, &init_id, state_id),
            None => self
                .create_initial_with_transition(&mut batch, sm_id, scope.as_deref(), state_id)
                .is_some(),
        };
        self.sync_layers(sm_id);
        self.commit(batch, can_undo);
        done
    }

    // ========================================================================
    // Deletion
    // ========================================================================

    /// Delete a state. Its children move up to its parent, its transitions
    /// go away and every affected scope keeps exactly one initial state.
    pub fn delete_state(&mut self, sm_id: &str, id: &str, can_undo: bool) -> bool {
        let Some(parent) = self.model.state(sm_id, id).map(|s| s.parent_id.clone()) else {
            return false;
        };
        let mut batch = Batch::new();

        self.leave_scope(&mut batch, sm_id, parent.as_deref(), id);
        self.delete_incident_transitions(&mut batch, sm_id, id);

        let inner_initial = self
            .model
            .machine(sm_id)
            .and_then(|sm| sm.scope_initial(Some(id)))
            .map(str::to_string);
        if let Some(init_id) = inner_initial {
            self.remove_initial(&mut batch, sm_id, &init_id);
        }

        let (children, pseudo_children) = match self.model.machine(sm_id) {
            Some(sm) => (
                sm.children_of(Some(id))
                    .into_iter()
                    .map(str::to_string)
                    .collect::<Vec<_>>(),
                sm.pseudo_children_of(id)
                    .into_iter()
                    .map(|(_, child)| child.to_string())
                    .collect::<Vec<_>>(),
            ),
            None => return false,
        };
        for child in &children {
            self.relink(&mut batch, sm_id, child, parent.as_deref(), true);
        }
        for child in pseudo_children {
            self.exec(
                &mut batch,
                Command::LinkVertex {
                    sm: sm_id.to_string(),
                    id: child,
                    parent: parent.clone(),
                    prev_parent: Some(id.to_string()),
                },
            );
        }

        let data = self.model.state(sm_id, id).cloned();
        let done = match data {
            Some(data) => self.exec(
                &mut batch,
                Command::DeleteState {
                    sm: sm_id.to_string(),
                    id: id.to_string(),
                    data,
                },
            ),
            None => false,
        };
        log::debug!("Deleted state '{}' ({} command(s))", id, batch.len());
        self.sync_layers(sm_id);
        self.commit(batch, can_undo);
        done
    }

    // ========================================================================
    // Appearance
    // ========================================================================

    pub fn change_state_name(&mut self, sm_id: &str, id: &str, name: &str, can_undo: bool) -> bool {
        let Some(prev_name) = self.model.state(sm_id, id).map(|s| s.name.clone()) else {
            return false;
        };
        let mut batch = Batch::new();
        let done = self.exec(
            &mut batch,
            Command::ChangeStateName {
                sm: sm_id.to_string(),
                id: id.to_string(),
                name: name.to_string(),
                prev_name,
            },
        );
        self.commit(batch, can_undo);
        done
    }

    /// Move a state. Coordinates are absolute, so everything drawn inside
    /// the state moves by the same offset in the same step.
    pub fn change_state_position(&mut self, sm_id: &str, id: &str, position: Point, can_undo: bool) -> bool {
        let Some(sm) = self.model.machine(sm_id) else {
            return false;
        };
        let Some(prev_position) = sm.states.get(id).map(|s| s.position) else {
            return false;
        };
        let (dx, dy) = (position.x - prev_position.x, position.y - prev_position.y);
        let inside = |parent: Option<&String>| parent.is_some_and(|p| p == id || sm.is_ancestor(id, p));

        let mut moves = vec![Command::ChangeStatePosition {
            sm: sm_id.to_string(),
            id: id.to_string(),
            position,
            prev_position,
        }];
        for (child, s) in sm.states.iter().filter(|(_, s)| inside(s.parent_id.as_ref())) {
            moves.push(Command::ChangeStatePosition {
                sm: sm_id.to_string(),
                id: child.clone(),
                position: s.position.offset(dx, dy),
                prev_position: s.position,
            });
        }
        for (child, v) in sm.initial_states.iter().filter(|(_, v)| inside(v.parent_id.as_ref())) {
            moves.push(Command::ChangeInitialStatePosition {
                sm: sm_id.to_string(),
                id: child.clone(),
                position: v.position.offset(dx, dy),
                prev_position: v.position,
            });
        }
        for (child, v) in sm.final_states.iter().filter(|(_, v)| inside(v.parent_id.as_ref())) {
            moves.push(Command::ChangeFinalStatePosition {
                sm: sm_id.to_string(),
                id: child.clone(),
                position: v.position.offset(dx, dy),
                prev_position: v.position,
            });
        }
        for (child, v) in sm.choice_states.iter().filter(|(_, v)| inside(v.parent_id.as_ref())) {
            moves.push(Command::ChangeChoiceStatePosition {
                sm: sm_id.to_string(),
                id: child.clone(),
                position: v.position.offset(dx, dy),
                prev_position: v.position,
            });
        }

        let mut batch = Batch::new();
        let mut done = false;
        for command in moves {
            done |= self.exec(&mut batch, command);
        }
        self.commit(batch, can_undo);
        done
    }

    pub fn change_state_dimensions(&mut self, sm_id: &str, id: &str, dimensions: Dimensions, can_undo: bool) -> bool {
        let Some(prev_dimensions) = self.model.state(sm_id, id).map(|s| s.dimensions) else {
            return false;
        };
        let mut batch = Batch::new();
        let done = self.exec(
            &mut batch,
            Command::ChangeStateDimensions {
                sm: sm_id.to_string(),
                id: id.to_string(),
                dimensions,
                prev_dimensions,
            },
        );
        self.commit(batch, can_undo);
        done
    }

    pub fn change_state_color(&mut self, sm_id: &str, id: &str, color: Option<String>, can_undo: bool) -> bool {
        let Some(prev_color) = self.model.state(sm_id, id).map(|s| s.color.clone()) else {
            return false;
        };
        let mut batch = Batch::new();
        let done = self.exec(
            &mut batch,
            Command::ChangeStateColor {
                sm: sm_id.to_string(),
                id: id.to_string(),
                color,
                prev_color,
            },
        );
        self.commit(batch, can_undo);
        done
    }

    pub fn select_state(&mut self, sm_id: &str, id: &str) -> bool {
        self.model.remove_selection();
        self.model.change_state_selection(sm_id, id, true)
    }

    // ========================================================================
    // Events
    // ========================================================================

    /// Replace the whole event list of a state
    pub fn change_state_events(&mut self, sm_id: &str, id: &str, events: Vec<EventData>, can_undo: bool) -> bool {
        let Some(prev_events) = self.model.state(sm_id, id).map(|s| s.events.clone()) else {
            return false;
        };
        if prev_events == events {
            return false;
        }
        let mut batch = Batch::new();
        let done = self.exec(
            &mut batch,
            Command::ChangeStateEvents {
                sm: sm_id.to_string(),
                id: id.to_string(),
                events,
                prev_events,
            },
        );
        self.commit(batch, can_undo);
        done
    }

    /// Text editing mode: replace the event list with the parsed `text`
    pub fn change_state_events_text(&mut self, sm_id: &str, id: &str, text: &str, can_undo: bool) -> ParseResult<bool> {
        let events = parser::parse_events(text)?;
        Ok(self.change_state_events(sm_id, id, events, can_undo))
    }

    /// The event list of a state in text editing form
    pub fn state_events_text(&self, sm_id: &str, id: &str) -> Option<String> {
        self.model
            .state(sm_id, id)
            .map(|s| parser::serialize_events(&s.events))
    }

    /// Insert an event at `index` (appended when `None`)
    pub fn create_event(
        &mut self,
        sm_id: &str,
        state_id: &str,
        event: EventData,
        index: Option<usize>,
        can_undo: bool,
    ) -> bool {
        let Some(len) = self.model.state(sm_id, state_id).map(|s| s.events.len()) else {
            return false;
        };
        let mut batch = Batch::new();
        let done = self.exec(
            &mut batch,
            Command::CreateEvent {
                sm: sm_id.to_string(),
                state_id: state_id.to_string(),
                index: index.unwrap_or(len).min(len),
                event,
            },
        );
        self.commit(batch, can_undo);
        done
    }

    /// Append an action to an event
    pub fn create_event_action(
        &mut self,
        sm_id: &str,
        state_id: &str,
        event_index: usize,
        action: Action,
        can_undo: bool,
    ) -> bool {
        let Some(action_index) = self
            .model
            .state(sm_id, state_id)
            .and_then(|s| s.events.get(event_index))
            .map(|e| e.actions.len())
        else {
            return false;
        };
        let mut batch = Batch::new();
        let done = self.exec(
            &mut batch,
            Command::CreateEventAction {
                sm: sm_id.to_string(),
                state_id: state_id.to_string(),
                event_index,
                action_index,
                action,
            },
        );
        self.commit(batch, can_undo);
        done
    }

    /// Replace the trigger or one action, depending on `selection`
    pub fn change_event(&mut self, sm_id: &str, selection: &EventSelection, value: EventValue, can_undo: bool) -> bool {
        let Some(prev_event) = self
            .model
            .state(sm_id, &selection.state_id)
            .and_then(|s| s.events.get(selection.event_index))
            .cloned()
        else {
            return false;
        };

        let command = match (selection.action_index, value) {
            (None, EventValue::Trigger(trigger)) => Command::ChangeEvent {
                sm: sm_id.to_string(),
                state_id: selection.state_id.clone(),
                index: selection.event_index,
                event: EventData {
                    trigger,
                    ..prev_event.clone()
                },
                prev_event,
            },
            (Some(action_index), EventValue::Action(action)) => {
                let Some(prev_action) = prev_event.actions.get(action_index).cloned() else {
                    return false;
                };
                Command::ChangeEventAction {
                    sm: sm_id.to_string(),
                    state_id: selection.state_id.clone(),
                    event_index: selection.event_index,
                    action_index,
                    action,
                    prev_action,
                }
            }
            _ => {
                log::warn!("Event selection and value kind do not match");
                return false;
            }
        };

        let mut batch = Batch::new();
        let done = self.exec(&mut batch, command);
        self.commit(batch, can_undo);
        done
    }

    pub fn change_event_condition(
        &mut self,
        sm_id: &str,
        state_id: &str,
        event_index: usize,
        condition: Option<Condition>,
        can_undo: bool,
    ) -> bool {
        let Some(prev_event) = self
            .model
            .state(sm_id, state_id)
            .and_then(|s| s.events.get(event_index))
            .cloned()
        else {
            return false;
        };
        let mut batch = Batch::new();
        let done = self.exec(
            &mut batch,
            Command::ChangeEvent {
                sm: sm_id.to_string(),
                state_id: state_id.to_string(),
                index: event_index,
                event: EventData {
                    condition,
                    ..prev_event.clone()
                },
                prev_event,
            },
        );
        self.commit(batch, can_undo);
        done
    }

    /// Delete an event, or one of its actions. Removing the only action of an
    /// event removes the event.
    pub fn delete_event(&mut self, sm_id: &str, selection: &EventSelection, can_undo: bool) -> bool {
        let Some(event) = self
            .model
            .state(sm_id, &selection.state_id)
            .and_then(|s| s.events.get(selection.event_index))
            .cloned()
        else {
            return false;
        };

        let command = match selection.action_index {
            Some(action_index) if event.actions.len() > 1 => {
                let Some(action) = event.actions.get(action_index).cloned() else {
                    return false;
                };
                Command::DeleteEventAction {
                    sm: sm_id.to_string(),
                    state_id: selection.state_id.clone(),
                    event_index: selection.event_index,
                    action_index,
                    action,
                }
            }
            Some(action_index) if action_index >= event.actions.len() => return false,
            _ => Command::DeleteEvent {
                sm: sm_id.to_string(),
                state_id: selection.state_id.clone(),
                index: selection.event_index,
                event,
            },
        };

        let mut batch = Batch::new();
        let done = self.exec(&mut batch, command);
        self.commit(batch, can_undo);
        done
    }
}
