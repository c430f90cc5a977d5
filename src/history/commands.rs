//! History Commands
//! Every kind of recorded edit as plain data. Each command carries enough of
//! the before/after state to be applied or reverted against the store
//! without consulting anything else.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::fsm::{
    Action, ChoiceState, Component, Dimensions, EventData, FinalState, InitialState, Note, Point,
    State, StateMachine, Transition,
};
use crate::history::Reversible;
use crate::store::EditorModel;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "args", rename_all = "camelCase")]
pub enum Command {
    // State machines
    CreateStateMachine { sm: String, data: StateMachine },
    DeleteStateMachine { sm: String, data: StateMachine },
    ChangeStateMachineName { sm: String, name: Option<String>, prev_name: Option<String> },

    // States
    CreateState { sm: String, id: String, data: State },
    DeleteState { sm: String, id: String, data: State },
    ChangeStateName { sm: String, id: String, name: String, prev_name: String },
    ChangeStatePosition { sm: String, id: String, position: Point, prev_position: Point },
    ChangeStateDimensions {
        sm: String,
        id: String,
        dimensions: Dimensions,
        prev_dimensions: Dimensions,
    },
    ChangeStateColor {
        sm: String,
        id: String,
        color: Option<String>,
        prev_color: Option<String>,
    },
    ChangeStateEvents {
        sm: String,
        id: String,
        events: Vec<EventData>,
        prev_events: Vec<EventData>,
    },
    /// Re-parent a state, final state or choice state
    LinkVertex {
        sm: String,
        id: String,
        parent: Option<String>,
        prev_parent: Option<String>,
    },

    // Events
    CreateEvent { sm: String, state_id: String, index: usize, event: EventData },
    ChangeEvent {
        sm: String,
        state_id: String,
        index: usize,
        event: EventData,
        prev_event: EventData,
    },
    DeleteEvent { sm: String, state_id: String, index: usize, event: EventData },
    CreateEventAction {
        sm: String,
        state_id: String,
        event_index: usize,
        action_index: usize,
        action: Action,
    },
    ChangeEventAction {
        sm: String,
        state_id: String,
        event_index: usize,
        action_index: usize,
        action: Action,
        prev_action: Action,
    },
    DeleteEventAction {
        sm: String,
        state_id: String,
        event_index: usize,
        action_index: usize,
        action: Action,
    },

    // Pseudo-states
    CreateInitialState { sm: String, id: String, data: InitialState },
    DeleteInitialState { sm: String, id: String, data: InitialState },
    ChangeInitialStatePosition { sm: String, id: String, position: Point, prev_position: Point },
    CreateFinalState { sm: String, id: String, data: FinalState },
    DeleteFinalState { sm: String, id: String, data: FinalState },
    ChangeFinalStatePosition { sm: String, id: String, position: Point, prev_position: Point },
    CreateChoiceState { sm: String, id: String, data: ChoiceState },
    DeleteChoiceState { sm: String, id: String, data: ChoiceState },
    ChangeChoiceStatePosition { sm: String, id: String, position: Point, prev_position: Point },

    // Transitions
    CreateTransition { sm: String, id: String, data: Transition },
    DeleteTransition { sm: String, id: String, data: Transition },
    ChangeTransition { sm: String, id: String, data: Transition, prev_data: Transition },
    ChangeTransitionPosition { sm: String, id: String, position: Point, prev_position: Point },

    // Components
    CreateComponent { sm: String, name: String, data: Component },
    DeleteComponent { sm: String, name: String, data: Component },
    ChangeComponent {
        sm: String,
        name: String,
        parameters: BTreeMap<String, String>,
        prev_parameters: BTreeMap<String, String>,
    },
    RenameComponent { sm: String, name: String, new_name: String },
    ChangeComponentPosition { sm: String, name: String, position: Point, prev_position: Point },
    SwapComponents { sm: String, a: String, b: String },

    // Notes
    CreateNote { sm: String, id: String, data: Note },
    DeleteNote { sm: String, id: String, data: Note },
    ChangeNoteText { sm: String, id: String, text: String, prev_text: String },
    ChangeNotePosition { sm: String, id: String, position: Point, prev_position: Point },
    ChangeNoteFontSize {
        sm: String,
        id: String,
        font_size: Option<u32>,
        prev_font_size: Option<u32>,
    },
}

impl Command {
    /// State machine the command touches
    pub fn state_machine(&self) -> &str {
        use Command::*;
        match self {
            CreateStateMachine { sm, .. }
            | DeleteStateMachine { sm, .. }
            | ChangeStateMachineName { sm, .. }
            | CreateState { sm, .. }
            | DeleteState { sm, .. }
            | ChangeStateName { sm, .. }
            | ChangeStatePosition { sm, .. }
            | ChangeStateDimensions { sm, .. }
            | ChangeStateColor { sm, .. }
            | ChangeStateEvents { sm, .. }
            | LinkVertex { sm, .. }
            | CreateEvent { sm, .. }
            | ChangeEvent { sm, .. }
            | DeleteEvent { sm, .. }
            | CreateEventAction { sm, .. }
            | ChangeEventAction { sm, .. }
            | DeleteEventAction { sm, .. }
            | CreateInitialState { sm, .. }
            | DeleteInitialState { sm, .. }
            | ChangeInitialStatePosition { sm, .. }
            | CreateFinalState { sm, .. }
            | DeleteFinalState { sm, .. }
            | ChangeFinalStatePosition { sm, .. }
            | CreateChoiceState { sm, .. }
            | DeleteChoiceState { sm, .. }
            | ChangeChoiceStatePosition { sm, .. }
            | CreateTransition { sm, .. }
            | DeleteTransition { sm, .. }
            | ChangeTransition { sm, .. }
            | ChangeTransitionPosition { sm, .. }
            | CreateComponent { sm, .. }
            | DeleteComponent { sm, .. }
            | ChangeComponent { sm, .. }
            | RenameComponent { sm, .. }
            | ChangeComponentPosition { sm, .. }
            | SwapComponents { sm, .. }
            | CreateNote { sm, .. }
            | DeleteNote { sm, .. }
            | ChangeNoteText { sm, .. }
            | ChangeNotePosition { sm, .. }
            | ChangeNoteFontSize { sm, .. } => sm,
        }
    }

    /// Perform the edit
    pub fn redo(&self, model: &mut EditorModel) -> bool {
        use Command::*;
        log::trace!("redo {:?}", self);
        match self {
            CreateStateMachine { sm, data } => model.create_state_machine(sm, data.clone()),
            DeleteStateMachine { sm, .. } => model.delete_state_machine(sm),
            ChangeStateMachineName { sm, name, .. } => model.change_state_machine_name(sm, name.clone()),

            CreateState { sm, id, data } => model.insert_state(sm, id, data.clone()),
            DeleteState { sm, id, .. } => model.delete_state(sm, id),
            ChangeStateName { sm, id, name, .. } => model.change_state_name(sm, id, name),
            ChangeStatePosition { sm, id, position, .. } => model.change_state_position(sm, id, *position),
            ChangeStateDimensions { sm, id, dimensions, .. } => {
                model.change_state_dimensions(sm, id, *dimensions)
            }
            ChangeStateColor { sm, id, color, .. } => model.change_state_color(sm, id, color.clone()),
            ChangeStateEvents { sm, id, events, .. } => model.change_state_events(sm, id, events.clone()),
            LinkVertex { sm, id, parent, .. } => model.set_vertex_parent(sm, id, parent.clone()),

            CreateEvent { sm, state_id, index, event } => {
                model.create_event(sm, state_id, Some(*index), event.clone())
            }
            ChangeEvent { sm, state_id, index, event, .. } => {
                model.change_event(sm, state_id, *index, event.clone())
            }
            DeleteEvent { sm, state_id, index, .. } => model.delete_event(sm, state_id, *index),
            CreateEventAction { sm, state_id, event_index, action_index, action } => {
                model.create_event_action(sm, state_id, *event_index, Some(*action_index), action.clone())
            }
            ChangeEventAction { sm, state_id, event_index, action_index, action, .. } => {
                model.change_event_action(sm, state_id, *event_index, *action_index, action.clone())
            }
            DeleteEventAction { sm, state_id, event_index, action_index, .. } => {
                model.delete_event_action(sm, state_id, *event_index, *action_index)
            }

            CreateInitialState { sm, id, data } => model.insert_initial_state(sm, id, data.clone()),
            DeleteInitialState { sm, id, .. } => model.delete_initial_state(sm, id),
            ChangeInitialStatePosition { sm, id, position, .. } => {
                model.change_initial_state_position(sm, id, *position)
            }
            CreateFinalState { sm, id, data } => model.insert_final_state(sm, id, data.clone()),
            DeleteFinalState { sm, id, .. } => model.delete_final_state(sm, id),
            ChangeFinalStatePosition { sm, id, position, .. } => {
                model.change_final_state_position(sm, id, *position)
            }
            CreateChoiceState { sm, id, data } => model.insert_choice_state(sm, id, data.clone()),
            DeleteChoiceState { sm, id, .. } => model.delete_choice_state(sm, id),
            ChangeChoiceStatePosition { sm, id, position, .. } => {
                model.change_choice_state_position(sm, id, *position)
            }

            CreateTransition { sm, id, data } => model.insert_transition(sm, id, data.clone()),
            DeleteTransition { sm, id, .. } => model.delete_transition(sm, id),
            ChangeTransition { sm, id, data, .. } => model.change_transition(sm, id, data.clone()),
            ChangeTransitionPosition { sm, id, position, .. } => {
                model.change_transition_position(sm, id, *position)
            }

            CreateComponent { sm, name, data } => model.create_component(sm, name, data.clone()),
            DeleteComponent { sm, name, .. } => model.delete_component(sm, name),
            ChangeComponent { sm, name, parameters, .. } => {
                model.change_component(sm, name, parameters.clone())
            }
            RenameComponent { sm, name, new_name } => model.rename_component(sm, name, new_name),
            ChangeComponentPosition { sm, name, position, .. } => {
                model.change_component_position(sm, name, *position)
            }
            SwapComponents { sm, a, b } => model.swap_components(sm, a, b),

            CreateNote { sm, id, data } => model.insert_note(sm, id, data.clone()),
            DeleteNote { sm, id, .. } => model.delete_note(sm, id),
            ChangeNoteText { sm, id, text, .. } => model.change_note_text(sm, id, text),
            ChangeNotePosition { sm, id, position, .. } => model.change_note_position(sm, id, *position),
            ChangeNoteFontSize { sm, id, font_size, .. } => {
                model.change_note_font_size(sm, id, *font_size)
            }
        }
    }

    /// Revert the edit
    pub fn undo(&self, model: &mut EditorModel) -> bool {
        use Command::*;
        log::trace!("undo {:?}", self);
        match self {
            CreateStateMachine { sm, .. } => model.delete_state_machine(sm),
            DeleteStateMachine { sm, data } => model.create_state_machine(sm, data.clone()),
            ChangeStateMachineName { sm, prev_name, .. } => {
                model.change_state_machine_name(sm, prev_name.clone())
            }

            CreateState { sm, id, .. } => model.delete_state(sm, id),
            DeleteState { sm, id, data } => model.insert_state(sm, id, data.clone()),
            ChangeStateName { sm, id, prev_name, .. } => model.change_state_name(sm, id, prev_name),
            ChangeStatePosition { sm, id, prev_position, .. } => {
                model.change_state_position(sm, id, *prev_position)
            }
            ChangeStateDimensions { sm, id, prev_dimensions, .. } => {
                model.change_state_dimensions(sm, id, *prev_dimensions)
            }
            ChangeStateColor { sm, id, prev_color, .. } => {
                model.change_state_color(sm, id, prev_color.clone())
            }
            ChangeStateEvents { sm, id, prev_events, .. } => {
                model.change_state_events(sm, id, prev_events.clone())
            }
            LinkVertex { sm, id, prev_parent, .. } => model.set_vertex_parent(sm, id, prev_parent.clone()),

            CreateEvent { sm, state_id, index, .. } => model.delete_event(sm, state_id, *index),
            ChangeEvent { sm, state_id, index, prev_event, .. } => {
                model.change_event(sm, state_id, *index, prev_event.clone())
            }
            DeleteEvent { sm, state_id, index, event } => {
                model.create_event(sm, state_id, Some(*index), event.clone())
            }
            CreateEventAction { sm, state_id, event_index, action_index, .. } => {
                model.delete_event_action(sm, state_id, *event_index, *action_index)
            }
            ChangeEventAction { sm, state_id, event_index, action_index, prev_action, .. } => {
                model.change_event_action(sm, state_id, *event_index, *action_index, prev_action.clone())
            }
            DeleteEventAction { sm, state_id, event_index, action_index, action } => {
                model.create_event_action(sm, state_id, *event_index, Some(*action_index), action.clone())
            }

            CreateInitialState { sm, id, .. } => model.delete_initial_state(sm, id),
            DeleteInitialState { sm, id, data } => model.insert_initial_state(sm, id, data.clone()),
            ChangeInitialStatePosition { sm, id, prev_position, .. } => {
                model.change_initial_state_position(sm, id, *prev_position)
            }
            CreateFinalState { sm, id, .. } => model.delete_final_state(sm, id),
            DeleteFinalState { sm, id, data } => model.insert_final_state(sm, id, data.clone()),
            ChangeFinalStatePosition { sm, id, prev_position, .. } => {
                model.change_final_state_position(sm, id, *prev_position)
            }
            CreateChoiceState { sm, id, .. } => model.delete_choice_state(sm, id),
            DeleteChoiceState { sm, id, data } => model.insert_choice_state(sm, id, data.clone()),
            ChangeChoiceStatePosition { sm, id, prev_position, .. } => {
                model.change_choice_state_position(sm, id, *prev_position)
            }

            CreateTransition { sm, id, .. } => model.delete_transition(sm, id),
            DeleteTransition { sm, id, data } => model.insert_transition(sm, id, data.clone()),
            ChangeTransition { sm, id, prev_data, .. } => model.change_transition(sm, id, prev_data.clone()),
            ChangeTransitionPosition { sm, id, prev_position, .. } => {
                model.change_transition_position(sm, id, *prev_position)
            }

            CreateComponent { sm, name, .. } => model.delete_component(sm, name),
            DeleteComponent { sm, name, data } => model.create_component(sm, name, data.clone()),
            ChangeComponent { sm, name, prev_parameters, .. } => {
                model.change_component(sm, name, prev_parameters.clone())
            }
            RenameComponent { sm, name, new_name } => model.rename_component(sm, new_name, name),
            ChangeComponentPosition { sm, name, prev_position, .. } => {
                model.change_component_position(sm, name, *prev_position)
            }
            SwapComponents { sm, a, b } => model.swap_components(sm, a, b),

            CreateNote { sm, id, .. } => model.delete_note(sm, id),
            DeleteNote { sm, id, data } => model.insert_note(sm, id, data.clone()),
            ChangeNoteText { sm, id, prev_text, .. } => model.change_note_text(sm, id, prev_text),
            ChangeNotePosition { sm, id, prev_position, .. } => {
                model.change_note_position(sm, id, *prev_position)
            }
            ChangeNoteFontSize { sm, id, prev_font_size, .. } => {
                model.change_note_font_size(sm, id, *prev_font_size)
            }
        }
    }
}

impl Reversible<EditorModel> for Command {
    fn revert(&self, target: &mut EditorModel) -> bool {
        let done = self.undo(target);
        if !done {
            log::warn!("Undo did not apply cleanly in '{}'", self.state_machine());
        }
        done
    }

    fn apply(&self, target: &mut EditorModel) -> bool {
        let done = self.redo(target);
        if !done {
            log::warn!("Redo did not apply cleanly in '{}'", self.state_machine());
        }
        done
    }
}
