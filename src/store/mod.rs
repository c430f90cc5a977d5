//! Data Store
//! In-memory document with raw CRUD per entity kind and change notification.
//! No business rules live here: containment and reference invariants are
//! maintained by the controller.
//!
//! Mutators on a missing machine or entity return `false` (or `None`) and
//! emit nothing. Every successful mutation emits the dotted path of the
//! collection it touched, e.g. `elements.stateMachines.G.transitions`.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use serde_json::Value;

use crate::fsm::{
    Action, ChoiceState, Component, Dimensions, Elements, EventData, FinalState, InitialState,
    Note, Point, State, StateMachine, Transition, TransitionLabel, VertexKind,
};

pub mod notify;


pub use notify::{paths_overlap, ChangeBus, ChangeEvent, SubscriptionId};

/// Document-level data published to subscribers
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorData {
    /// Directory the document was loaded from
    pub base_path: Option<String>,
    /// Document name
    pub name: Option<String>,
    pub is_initialized: bool,
    /// Unsaved changes exist
    pub is_stale: bool,
    pub elements: Elements,
}

/// Collections of a state machine, used to build notification paths
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    States,
    InitialStates,
    FinalStates,
    ChoiceStates,
    Transitions,
    Components,
    Notes,
    Meta,
}

impl Collection {
    pub fn segment(&self) -> &'static str {
        match self {
            Collection::States => "states",
            Collection::InitialStates => "initialStates",
            Collection::FinalStates => "finalStates",
            Collection::ChoiceStates => "choiceStates",
            Collection::Transitions => "transitions",
            Collection::Components => "components",
            Collection::Notes => "notes",
            Collection::Meta => "meta",
        }
    }

    pub fn of_vertex(kind: VertexKind) -> Self {
        match kind {
            VertexKind::State => Collection::States,
            VertexKind::Initial => Collection::InitialStates,
            VertexKind::Final => Collection::FinalStates,
            VertexKind::Choice => Collection::ChoiceStates,
        }
    }
}

/// Id namespaces. Every vertex kind draws from the same one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdKind {
    Vertex(VertexKind),
    Transition,
    Note,
}

impl IdKind {
    fn prefix(&self) -> &'static str {
        match self {
            IdKind::Vertex(VertexKind::State) => "state",
            IdKind::Vertex(VertexKind::Initial) => "init",
            IdKind::Vertex(VertexKind::Final) => "final",
            IdKind::Vertex(VertexKind::Choice) => "choice",
            IdKind::Transition => "trans",
            IdKind::Note => "note",
        }
    }

    fn namespace(&self) -> &'static str {
        match self {
            IdKind::Vertex(_) => "vertex",
            IdKind::Transition => "transition",
            IdKind::Note => "note",
        }
    }

    fn is_taken(&self, sm: &StateMachine, id: &str) -> bool {
        match self {
            IdKind::Vertex(_) => sm.has_vertex(id),
            IdKind::Transition => sm.transitions.contains_key(id),
            IdKind::Note => sm.notes.contains_key(id),
        }
    }
}

// ============================================================================
// CREATION PARAMETERS
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct CreateStateParams {
    /// Explicit id; generated when `None`
    pub id: Option<String>,
    pub name: String,
    pub position: Point,
    pub dimensions: Dimensions,
    pub parent_id: Option<String>,
    pub events: Vec<EventData>,
    pub color: Option<String>,
    /// Treat `position` as the center of the new shape
    pub place_in_center: bool,
}

/// Parameters shared by initial, final and choice states
#[derive(Debug, Clone, Default)]
pub struct CreateVertexParams {
    pub id: Option<String>,
    pub position: Point,
    pub dimensions: Dimensions,
    pub parent_id: Option<String>,
    pub place_in_center: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CreateTransitionParams {
    pub id: Option<String>,
    pub source: String,
    pub target: String,
    pub color: String,
    pub label: Option<TransitionLabel>,
}

#[derive(Debug, Clone, Default)]
pub struct CreateNoteParams {
    pub id: Option<String>,
    pub text: String,
    pub position: Point,
    pub place_in_center: bool,
}

// ============================================================================
// MODEL
// ============================================================================

/// The document store
#[derive(Debug, Default)]
pub struct EditorModel {
    data: EditorData,
    bus: ChangeBus,
    /// Last issued counter per `machine/namespace`
    counters: HashMap<String, u64>,
}

impl EditorModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data(&self) -> &EditorData {
        &self.data
    }

    pub fn elements(&self) -> &Elements {
        &self.data.elements
    }

    pub fn machine(&self, sm_id: &str) -> Option<&StateMachine> {
        self.data.elements.state_machines.get(sm_id)
    }

    pub fn machine_ids(&self) -> Vec<String> {
        self.data.elements.state_machines.keys().cloned().collect()
    }

    /// Replace the whole document
    pub fn init(&mut self, base_path: Option<String>, name: Option<String>, elements: Elements) {
        self.data = EditorData {
            base_path,
            name,
            is_initialized: true,
            is_stale: false,
            elements,
        };
        self.counters.clear();
        log::debug!(
            "Document initialized with {} state machine(s)",
            self.data.elements.state_machines.len()
        );
        self.bus.emit("");
    }

    /// Back to an empty, uninitialized document
    pub fn reset(&mut self) {
        self.data = EditorData::default();
        self.counters.clear();
        self.bus.emit("");
    }

    pub fn make_stale(&mut self) {
        if !self.data.is_stale {
            self.data.is_stale = true;
            self.bus.emit("isStale");
        }
    }

    pub fn make_unstale(&mut self) {
        if self.data.is_stale {
            self.data.is_stale = false;
            self.bus.emit("isStale");
        }
    }

    pub fn set_base_path(&mut self, base_path: Option<String>, name: Option<String>) {
        self.data.base_path = base_path;
        self.data.name = name;
        self.bus.emit("basePath");
        self.bus.emit("name");
    }

    // ========================================================================
    // Subscription
    // ========================================================================

    pub fn subscribe<F>(&mut self, path: impl Into<String>, listener: F) -> SubscriptionId
    where
        F: FnMut(&ChangeEvent) + 'static,
    {
        self.bus.subscribe(path, listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Current value at a dotted path; the empty path is the whole document
    pub fn snapshot(&self, path: &str) -> Option<Value> {
        let mut value = serde_json::to_value(&self.data).ok()?;
        for segment in path.split('.').filter(|s| !s.is_empty()) {
            value = match value {
                Value::Object(mut map) => map.remove(segment)?,
                Value::Array(mut items) => {
                    let index: usize = segment.parse().ok()?;
                    if index >= items.len() {
                        return None;
                    }
                    items.swap_remove(index)
                }
                _ => return None,
            };
        }
        Some(value)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn emit_collection(&mut self, sm_id: &str, collection: Collection) {
        let path = format!("elements.stateMachines.{}.{}", sm_id, collection.segment());
        self.bus.emit(&path);
    }

    /// Run a mutation against one machine; notify and mark stale when it reports success
    fn update<F>(&mut self, sm_id: &str, collection: Collection, mutate: F) -> bool
    where
        F: FnOnce(&mut StateMachine) -> bool,
    {
        let Some(sm) = self.data.elements.state_machines.get_mut(sm_id) else {
            log::debug!("No state machine '{}'", sm_id);
            return false;
        };
        if !mutate(sm) {
            log::debug!("No-op mutation of {} in '{}'", collection.segment(), sm_id);
            return false;
        }
        self.make_stale();
        self.emit_collection(sm_id, collection);
        true
    }

    /// Like `update` for transient UI state: notifies without marking stale
    fn update_transient<F>(&mut self, sm_id: &str, collection: Collection, mutate: F) -> bool
    where
        F: FnOnce(&mut StateMachine) -> bool,
    {
        let Some(sm) = self.data.elements.state_machines.get_mut(sm_id) else {
            return false;
        };
        if !mutate(sm) {
            return false;
        }
        self.emit_collection(sm_id, collection);
        true
    }

    /// Next free id of `kind` in machine `sm_id`
    pub fn generate_id(&mut self, sm_id: &str, kind: IdKind) -> Option<String> {
        let sm = self.data.elements.state_machines.get(sm_id)?;
        let counter = self
            .counters
            .entry(format!("{}/{}", sm_id, kind.namespace()))
            .or_insert(0);
        loop {
            *counter += 1;
            let candidate = format!("{}{}", kind.prefix(), counter);
            if !kind.is_taken(sm, &candidate) {
                return Some(candidate);
            }
        }
    }

    /// Use `explicit` when it is free, otherwise generate one
    fn claim_id(&mut self, sm_id: &str, kind: IdKind, explicit: Option<String>) -> Option<String> {
        match explicit {
            Some(id) => {
                let sm = self.machine(sm_id)?;
                if kind.is_taken(sm, &id) {
                    log::warn!("Id '{}' is already taken in '{}'", id, sm_id);
                    None
                } else {
                    Some(id)
                }
            }
            None => self.generate_id(sm_id, kind),
        }
    }

    // ========================================================================
    // State machines
    // ========================================================================

    pub fn create_state_machine(&mut self, sm_id: &str, machine: StateMachine) -> bool {
        if sm_id.is_empty() || sm_id.contains('.') {
            log::warn!("Invalid state machine id '{}'", sm_id);
            return false;
        }
        if self.data.elements.state_machines.contains_key(sm_id) {
            return false;
        }
        self.data
            .elements
            .state_machines
            .insert(sm_id.to_string(), machine);
        self.make_stale();
        self.bus.emit("elements.stateMachines");
        true
    }

    pub fn delete_state_machine(&mut self, sm_id: &str) -> bool {
        if self.data.elements.state_machines.remove(sm_id).is_none() {
            return false;
        }
        self.counters.retain(|key, _| !key.starts_with(&format!("{}/", sm_id)));
        self.make_stale();
        self.bus.emit("elements.stateMachines");
        true
    }

    pub fn change_state_machine_name(&mut self, sm_id: &str, name: Option<String>) -> bool {
        self.update(sm_id, Collection::Meta, |sm| {
            sm.name = name;
            true
        })
    }

    pub fn change_state_machine_meta(&mut self, sm_id: &str, meta: BTreeMap<String, String>) -> bool {
        self.update(sm_id, Collection::Meta, |sm| {
            sm.meta = meta;
            true
        })
    }

    // ========================================================================
    // States
    // ========================================================================

    pub fn state(&self, sm_id: &str, id: &str) -> Option<&State> {
        self.machine(sm_id)?.states.get(id)
    }

    pub fn create_state(&mut self, sm_id: &str, params: CreateStateParams) -> Option<String> {
        let id = self.claim_id(sm_id, IdKind::Vertex(VertexKind::State), params.id)?;
        let position = if params.place_in_center {
            params.dimensions.centered_at(params.position)
        } else {
            params.position
        };
        let state = State {
            name: params.name,
            parent_id: params.parent_id,
            position,
            dimensions: params.dimensions,
            events: params.events,
            color: params.color,
            selection: false,
        };
        self.insert_state(sm_id, &id, state).then_some(id)
    }

    /// Raw insert under a known id
    pub fn insert_state(&mut self, sm_id: &str, id: &str, state: State) -> bool {
        self.update(sm_id, Collection::States, |sm| {
            if sm.has_vertex(id) {
                return false;
            }
            sm.states.insert(id.to_string(), state);
            true
        })
    }

    fn update_state<F>(&mut self, sm_id: &str, id: &str, mutate: F) -> bool
    where
        F: FnOnce(&mut State) -> bool,
    {
        self.update(sm_id, Collection::States, |sm| match sm.states.get_mut(id) {
            Some(state) => mutate(state),
            None => false,
        })
    }

    pub fn change_state_name(&mut self, sm_id: &str, id: &str, name: &str) -> bool {
        self.update_state(sm_id, id, |s| {
            s.name = name.to_string();
            true
        })
    }

    pub fn change_state_position(&mut self, sm_id: &str, id: &str, position: Point) -> bool {
        self.update_state(sm_id, id, |s| {
            s.position = position;
            true
        })
    }

    pub fn change_state_dimensions(&mut self, sm_id: &str, id: &str, dimensions: Dimensions) -> bool {
        self.update_state(sm_id, id, |s| {
            s.dimensions = dimensions;
            true
        })
    }

    pub fn change_state_color(&mut self, sm_id: &str, id: &str, color: Option<String>) -> bool {
        self.update_state(sm_id, id, |s| {
            s.color = color;
            true
        })
    }

    /// Replace the whole event list
    pub fn change_state_events(&mut self, sm_id: &str, id: &str, events: Vec<EventData>) -> bool {
        self.update_state(sm_id, id, |s| {
            s.events = events;
            true
        })
    }

    pub fn change_state_selection(&mut self, sm_id: &str, id: &str, selection: bool) -> bool {
        self.update_transient(sm_id, Collection::States, |sm| match sm.states.get_mut(id) {
            Some(s) => {
                s.selection = selection;
                true
            }
            None => false,
        })
    }

    /// Set the containment parent of any vertex except initial states
    pub fn set_vertex_parent(&mut self, sm_id: &str, id: &str, parent_id: Option<String>) -> bool {
        let Some(kind) = self.machine(sm_id).and_then(|sm| sm.vertex_kind(id)) else {
            return false;
        };
        self.update(sm_id, Collection::of_vertex(kind), |sm| {
            if let Some(parent) = parent_id.as_deref() {
                if parent == id || !sm.states.contains_key(parent) {
                    return false;
                }
            }
            let slot = match kind {
                VertexKind::State => sm.states.get_mut(id).map(|v| &mut v.parent_id),
                VertexKind::Final => sm.final_states.get_mut(id).map(|v| &mut v.parent_id),
                VertexKind::Choice => sm.choice_states.get_mut(id).map(|v| &mut v.parent_id),
                VertexKind::Initial => None,
            };
            match slot {
                Some(slot) => {
                    *slot = parent_id;
                    true
                }
                None => false,
            }
        })
    }

    pub fn link_state(&mut self, sm_id: &str, parent_id: &str, child_id: &str) -> bool {
        let is_state = self.state(sm_id, child_id).is_some();
        is_state && self.set_vertex_parent(sm_id, child_id, Some(parent_id.to_string()))
    }

    pub fn unlink_state(&mut self, sm_id: &str, id: &str) -> bool {
        let has_parent = self
            .state(sm_id, id)
            .is_some_and(|s| s.parent_id.is_some());
        has_parent && self.set_vertex_parent(sm_id, id, None)
    }

    pub fn delete_state(&mut self, sm_id: &str, id: &str) -> bool {
        self.update(sm_id, Collection::States, |sm| sm.states.remove(id).is_some())
    }

    // ========================================================================
    // Events and actions
    // ========================================================================

    /// Insert an event at `index` (appended when `None` or past the end)
    pub fn create_event(&mut self, sm_id: &str, state_id: &str, index: Option<usize>, event: EventData) -> bool {
        self.update_state(sm_id, state_id, |s| {
            let index = index.unwrap_or(s.events.len()).min(s.events.len());
            s.events.insert(index, event);
            true
        })
    }

    pub fn change_event(&mut self, sm_id: &str, state_id: &str, index: usize, event: EventData) -> bool {
        self.update_state(sm_id, state_id, |s| match s.events.get_mut(index) {
            Some(slot) => {
                *slot = event;
                true
            }
            None => false,
        })
    }

    pub fn delete_event(&mut self, sm_id: &str, state_id: &str, index: usize) -> bool {
        self.update_state(sm_id, state_id, |s| {
            if index < s.events.len() {
                s.events.remove(index);
                true
            } else {
                false
            }
        })
    }

    pub fn create_event_action(
        &mut self,
        sm_id: &str,
        state_id: &str,
        event_index: usize,
        action_index: Option<usize>,
        action: Action,
    ) -> bool {
        self.update_state(sm_id, state_id, |s| match s.events.get_mut(event_index) {
            Some(event) => {
                let index = action_index
                    .unwrap_or(event.actions.len())
                    .min(event.actions.len());
                event.actions.insert(index, action);
                true
            }
            None => false,
        })
    }

    pub fn change_event_action(
        &mut self,
        sm_id: &str,
        state_id: &str,
        event_index: usize,
        action_index: usize,
        action: Action,
    ) -> bool {
        self.update_state(sm_id, state_id, |s| {
            match s
                .events
                .get_mut(event_index)
                .and_then(|e| e.actions.get_mut(action_index))
            {
                Some(slot) => {
                    *slot = action;
                    true
                }
                None => false,
            }
        })
    }

    pub fn delete_event_action(&mut self, sm_id: &str, state_id: &str, event_index: usize, action_index: usize) -> bool {
        self.update_state(sm_id, state_id, |s| match s.events.get_mut(event_index) {
            Some(event) if action_index < event.actions.len() => {
                event.actions.remove(action_index);
                true
            }
            _ => false,
        })
    }

    // ========================================================================
    // Initial, final and choice states
    // ========================================================================

    fn vertex_position(params: &CreateVertexParams) -> Point {
        if params.place_in_center {
            params.dimensions.centered_at(params.position)
        } else {
            params.position
        }
    }

    pub fn create_initial_state(&mut self, sm_id: &str, params: CreateVertexParams) -> Option<String> {
        let id = self.claim_id(sm_id, IdKind::Vertex(VertexKind::Initial), params.id.clone())?;
        let initial = InitialState {
            position: Self::vertex_position(&params),
            dimensions: params.dimensions,
            parent_id: params.parent_id,
        };
        self.insert_initial_state(sm_id, &id, initial).then_some(id)
    }

    pub fn insert_initial_state(&mut self, sm_id: &str, id: &str, initial: InitialState) -> bool {
        self.update(sm_id, Collection::InitialStates, |sm| {
            if sm.has_vertex(id) {
                return false;
            }
            sm.initial_states.insert(id.to_string(), initial);
            true
        })
    }

    pub fn change_initial_state_position(&mut self, sm_id: &str, id: &str, position: Point) -> bool {
        self.update(sm_id, Collection::InitialStates, |sm| match sm.initial_states.get_mut(id) {
            Some(v) => {
                v.position = position;
                true
            }
            None => false,
        })
    }

    pub fn delete_initial_state(&mut self, sm_id: &str, id: &str) -> bool {
        self.update(sm_id, Collection::InitialStates, |sm| {
            sm.initial_states.remove(id).is_some()
        })
    }

    pub fn create_final_state(&mut self, sm_id: &str, params: CreateVertexParams) -> Option<String> {
        let id = self.claim_id(sm_id, IdKind::Vertex(VertexKind::Final), params.id.clone())?;
        let vertex = FinalState {
            position: Self::vertex_position(&params),
            dimensions: params.dimensions,
            parent_id: params.parent_id,
        };
        self.insert_final_state(sm_id, &id, vertex).then_some(id)
    }

    pub fn insert_final_state(&mut self, sm_id: &str, id: &str, vertex: FinalState) -> bool {
        self.update(sm_id, Collection::FinalStates, |sm| {
            if sm.has_vertex(id) {
                return false;
            }
            sm.final_states.insert(id.to_string(), vertex);
            true
        })
    }

    pub fn change_final_state_position(&mut self, sm_id: &str, id: &str, position: Point) -> bool {
        self.update(sm_id, Collection::FinalStates, |sm| match sm.final_states.get_mut(id) {
            Some(v) => {
                v.position = position;
                true
            }
            None => false,
        })
    }

    pub fn delete_final_state(&mut self, sm_id: &str, id: &str) -> bool {
        self.update(sm_id, Collection::FinalStates, |sm| {
            sm.final_states.remove(id).is_some()
        })
    }

    pub fn create_choice_state(&mut self, sm_id: &str, params: CreateVertexParams) -> Option<String> {
        let id = self.claim_id(sm_id, IdKind::Vertex(VertexKind::Choice), params.id.clone())?;
        let vertex = ChoiceState {
            position: Self::vertex_position(&params),
            dimensions: params.dimensions,
            parent_id: params.parent_id,
            selection: false,
        };
        self.insert_choice_state(sm_id, &id, vertex).then_some(id)
    }

    pub fn insert_choice_state(&mut self, sm_id: &str, id: &str, vertex: ChoiceState) -> bool {
        self.update(sm_id, Collection::ChoiceStates, |sm| {
            if sm.has_vertex(id) {
                return false;
            }
            sm.choice_states.insert(id.to_string(), vertex);
            true
        })
    }

    pub fn change_choice_state_position(&mut self, sm_id: &str, id: &str, position: Point) -> bool {
        self.update(sm_id, Collection::ChoiceStates, |sm| match sm.choice_states.get_mut(id) {
            Some(v) => {
                v.position = position;
                true
            }
            None => false,
        })
    }

    pub fn change_choice_state_selection(&mut self, sm_id: &str, id: &str, selection: bool) -> bool {
        self.update_transient(sm_id, Collection::ChoiceStates, |sm| {
            match sm.choice_states.get_mut(id) {
                Some(v) => {
                    v.selection = selection;
                    true
                }
                None => false,
            }
        })
    }

    pub fn delete_choice_state(&mut self, sm_id: &str, id: &str) -> bool {
        self.update(sm_id, Collection::ChoiceStates, |sm| {
            sm.choice_states.remove(id).is_some()
        })
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    pub fn transition(&self, sm_id: &str, id: &str) -> Option<&Transition> {
        self.machine(sm_id)?.transitions.get(id)
    }

    pub fn create_transition(&mut self, sm_id: &str, params: CreateTransitionParams) -> Option<String> {
        let id = self.claim_id(sm_id, IdKind::Transition, params.id)?;
        let transition = Transition {
            source: params.source,
            target: params.target,
            color: params.color,
            label: params.label,
            selection: false,
        };
        self.insert_transition(sm_id, &id, transition).then_some(id)
    }

    pub fn insert_transition(&mut self, sm_id: &str, id: &str, transition: Transition) -> bool {
        self.update(sm_id, Collection::Transitions, |sm| {
            if sm.transitions.contains_key(id) {
                return false;
            }
            sm.transitions.insert(id.to_string(), transition);
            true
        })
    }

    /// Replace endpoints, color and label; the selection flag is kept
    pub fn change_transition(&mut self, sm_id: &str, id: &str, transition: Transition) -> bool {
        self.update(sm_id, Collection::Transitions, |sm| match sm.transitions.get_mut(id) {
            Some(slot) => {
                let selection = slot.selection;
                *slot = Transition {
                    selection,
                    ..transition
                };
                true
            }
            None => false,
        })
    }

    /// Move the label; transitions without a label are left untouched
    pub fn change_transition_position(&mut self, sm_id: &str, id: &str, position: Point) -> bool {
        self.update(sm_id, Collection::Transitions, |sm| {
            match sm.transitions.get_mut(id).and_then(|t| t.label.as_mut()) {
                Some(label) => {
                    label.position = position;
                    true
                }
                None => false,
            }
        })
    }

    pub fn change_transition_selection(&mut self, sm_id: &str, id: &str, selection: bool) -> bool {
        self.update_transient(sm_id, Collection::Transitions, |sm| {
            match sm.transitions.get_mut(id) {
                Some(t) => {
                    t.selection = selection;
                    true
                }
                None => false,
            }
        })
    }

    pub fn delete_transition(&mut self, sm_id: &str, id: &str) -> bool {
        self.update(sm_id, Collection::Transitions, |sm| {
            sm.transitions.remove(id).is_some()
        })
    }

    // ========================================================================
    // Components
    // ========================================================================

    pub fn component(&self, sm_id: &str, name: &str) -> Option<&Component> {
        self.machine(sm_id)?.components.get(name)
    }

    pub fn create_component(&mut self, sm_id: &str, name: &str, component: Component) -> bool {
        self.update(sm_id, Collection::Components, |sm| {
            if name.is_empty() || sm.components.contains_key(name) {
                return false;
            }
            sm.components.insert(name.to_string(), component);
            true
        })
    }

    pub fn change_component(&mut self, sm_id: &str, name: &str, parameters: BTreeMap<String, String>) -> bool {
        self.update(sm_id, Collection::Components, |sm| match sm.components.get_mut(name) {
            Some(c) => {
                c.parameters = parameters;
                true
            }
            None => false,
        })
    }

    /// Move a component to a new key. References are not rewritten here.
    pub fn rename_component(&mut self, sm_id: &str, name: &str, new_name: &str) -> bool {
        self.update(sm_id, Collection::Components, |sm| {
            if new_name.is_empty() || sm.components.contains_key(new_name) {
                return false;
            }
            match sm.components.remove(name) {
                Some(c) => {
                    sm.components.insert(new_name.to_string(), c);
                    true
                }
                None => false,
            }
        })
    }

    pub fn change_component_position(&mut self, sm_id: &str, name: &str, position: Point) -> bool {
        self.update(sm_id, Collection::Components, |sm| match sm.components.get_mut(name) {
            Some(c) => {
                c.position = position;
                true
            }
            None => false,
        })
    }

    pub fn change_component_selection(&mut self, sm_id: &str, name: &str, selection: bool) -> bool {
        self.update_transient(sm_id, Collection::Components, |sm| {
            match sm.components.get_mut(name) {
                Some(c) => {
                    c.selection = selection;
                    true
                }
                None => false,
            }
        })
    }

    /// Exchange the declaration order of two components
    pub fn swap_components(&mut self, sm_id: &str, a: &str, b: &str) -> bool {
        self.update(sm_id, Collection::Components, |sm| {
            if a == b {
                return false;
            }
            let (Some(order_a), Some(order_b)) = (
                sm.components.get(a).map(|c| c.order),
                sm.components.get(b).map(|c| c.order),
            ) else {
                return false;
            };
            if let Some(c) = sm.components.get_mut(a) {
                c.order = order_b;
            }
            if let Some(c) = sm.components.get_mut(b) {
                c.order = order_a;
            }
            true
        })
    }

    pub fn delete_component(&mut self, sm_id: &str, name: &str) -> bool {
        self.update(sm_id, Collection::Components, |sm| {
            sm.components.remove(name).is_some()
        })
    }

    // ========================================================================
    // Notes
    // ========================================================================

    pub fn note(&self, sm_id: &str, id: &str) -> Option<&Note> {
        self.machine(sm_id)?.notes.get(id)
    }

    pub fn create_note(&mut self, sm_id: &str, params: CreateNoteParams, dimensions: Dimensions) -> Option<String> {
        let id = self.claim_id(sm_id, IdKind::Note, params.id)?;
        let position = if params.place_in_center {
            dimensions.centered_at(params.position)
        } else {
            params.position
        };
        self.insert_note(sm_id, &id, Note::new(params.text, position))
            .then_some(id)
    }

    pub fn insert_note(&mut self, sm_id: &str, id: &str, note: Note) -> bool {
        self.update(sm_id, Collection::Notes, |sm| {
            if sm.notes.contains_key(id) {
                return false;
            }
            sm.notes.insert(id.to_string(), note);
            true
        })
    }

    pub fn change_note_text(&mut self, sm_id: &str, id: &str, text: &str) -> bool {
        self.update(sm_id, Collection::Notes, |sm| match sm.notes.get_mut(id) {
            Some(n) => {
                n.text = text.to_string();
                true
            }
            None => false,
        })
    }

    pub fn change_note_position(&mut self, sm_id: &str, id: &str, position: Point) -> bool {
        self.update(sm_id, Collection::Notes, |sm| match sm.notes.get_mut(id) {
            Some(n) => {
                n.position = position;
                true
            }
            None => false,
        })
    }

    pub fn change_note_font_size(&mut self, sm_id: &str, id: &str, font_size: Option<u32>) -> bool {
        self.update(sm_id, Collection::Notes, |sm| match sm.notes.get_mut(id) {
            Some(n) => {
                n.font_size = font_size;
                true
            }
            None => false,
        })
    }

    pub fn change_note_selection(&mut self, sm_id: &str, id: &str, selection: bool) -> bool {
        self.update_transient(sm_id, Collection::Notes, |sm| match sm.notes.get_mut(id) {
            Some(n) => {
                n.selection = selection;
                true
            }
            None => false,
        })
    }

    pub fn delete_note(&mut self, sm_id: &str, id: &str) -> bool {
        self.update(sm_id, Collection::Notes, |sm| sm.notes.remove(id).is_some())
    }

    // ========================================================================
    // Selection
    // ========================================================================

    /// Clear every selection flag in every machine
    pub fn remove_selection(&mut self) {
        self.data.elements.clear_selection();
        for sm_id in self.machine_ids() {
            for collection in [
                Collection::States,
                Collection::ChoiceStates,
                Collection::Transitions,
                Collection::Components,
                Collection::Notes,
            ] {
                self.emit_collection(&sm_id, collection);
            }
        }
    }
}
