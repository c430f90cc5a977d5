//! FSM Document Model
//! Plain data types for the editor document: state machines, their vertices,
//! transitions, components and notes. Every cross-reference is a string id
//! resolved through the owning [`StateMachine`].

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

#[cfg(test)]
mod tests;

/// Name of the pseudo-component that exposes the `entry`/`exit` signals of every state.
pub const SYSTEM_COMPONENT: &str = "System";
/// Signals of [`SYSTEM_COMPONENT`].
pub const SYSTEM_SIGNALS: [&str; 2] = ["entry", "exit"];

fn is_false(value: &bool) -> bool {
    !*value
}

// ============================================================================
// GEOMETRY
// ============================================================================

/// A point on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// Width and height of a shape
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f32,
    pub height: f32,
}

impl Dimensions {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Top-left corner of a shape of this size centered on `point`
    pub fn centered_at(&self, point: Point) -> Point {
        point.offset(-self.width / 2.0, -self.height / 2.0)
    }
}

// ============================================================================
// DOCUMENT
// ============================================================================

/// Root of a document: every state machine keyed by its id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Elements {
    #[serde(default)]
    pub state_machines: BTreeMap<String, StateMachine>,
}

impl Elements {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear every transient selection flag
    pub fn clear_selection(&mut self) {
        for sm in self.state_machines.values_mut() {
            sm.clear_selection();
        }
    }
}

/// Kind of a vertex. All kinds share a single id namespace per machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VertexKind {
    State,
    Initial,
    Final,
    Choice,
}

/// A named state machine with its platform selection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateMachine {
    /// Optional display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Identifier of the platform the components are drawn from
    pub platform: String,
    /// Free-form metadata
    #[serde(default)]
    pub meta: BTreeMap<String, String>,
    #[serde(default)]
    pub states: BTreeMap<String, State>,
    #[serde(default)]
    pub initial_states: BTreeMap<String, InitialState>,
    #[serde(default)]
    pub final_states: BTreeMap<String, FinalState>,
    #[serde(default)]
    pub choice_states: BTreeMap<String, ChoiceState>,
    #[serde(default)]
    pub transitions: BTreeMap<String, Transition>,
    /// Components keyed by their name
    #[serde(default)]
    pub components: BTreeMap<String, Component>,
    #[serde(default)]
    pub notes: BTreeMap<String, Note>,
}

impl StateMachine {
    pub fn new(platform: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Whether `id` is taken in the shared vertex namespace
    pub fn has_vertex(&self, id: &str) -> bool {
        self.vertex_kind(id).is_some()
    }

    pub fn vertex_kind(&self, id: &str) -> Option<VertexKind> {
        if self.states.contains_key(id) {
            Some(VertexKind::State)
        } else if self.initial_states.contains_key(id) {
            Some(VertexKind::Initial)
        } else if self.final_states.contains_key(id) {
            Some(VertexKind::Final)
        } else if self.choice_states.contains_key(id) {
            Some(VertexKind::Choice)
        } else {
            None
        }
    }

    /// Containment parent of any vertex; `None` for top-level or unknown ids
    pub fn vertex_parent(&self, id: &str) -> Option<&str> {
        let parent = match self.vertex_kind(id)? {
            VertexKind::State => &self.states[id].parent_id,
            VertexKind::Initial => &self.initial_states[id].parent_id,
            VertexKind::Final => &self.final_states[id].parent_id,
            VertexKind::Choice => &self.choice_states[id].parent_id,
        };
        parent.as_deref()
    }

    /// Ancestor chain of a state, nearest parent first
    pub fn ancestors(&self, state_id: &str) -> Vec<&str> {
        let mut chain = Vec::new();
        let mut current = self.states.get(state_id).and_then(|s| s.parent_id.as_deref());
        while let Some(id) = current {
            // A cycle can only come from a hand-edited document
            if chain.contains(&id) || id == state_id {
                break;
            }
            chain.push(id);
            current = self.states.get(id).and_then(|s| s.parent_id.as_deref());
        }
        chain
    }

    /// Number of ancestors of a state
    pub fn depth(&self, state_id: &str) -> usize {
        self.ancestors(state_id).len()
    }

    /// Whether `ancestor` contains `state_id` at any depth
    pub fn is_ancestor(&self, ancestor: &str, state_id: &str) -> bool {
        self.ancestors(state_id).contains(&ancestor)
    }

    /// Direct child states of a containment scope (`None` = top level)
    pub fn children_of(&self, parent: Option<&str>) -> Vec<&str> {
        self.states
            .iter()
            .filter(|(_, s)| s.parent_id.as_deref() == parent)
            .map(|(id, _)| id.as_str())
            .collect()
    }

    /// Final and choice states placed directly inside `parent`
    pub fn pseudo_children_of(&self, parent: &str) -> Vec<(VertexKind, &str)> {
        let finals = self
            .final_states
            .iter()
            .filter(|(_, v)| v.parent_id.as_deref() == Some(parent))
            .map(|(id, _)| (VertexKind::Final, id.as_str()));
        let choices = self
            .choice_states
            .iter()
            .filter(|(_, v)| v.parent_id.as_deref() == Some(parent))
            .map(|(id, _)| (VertexKind::Choice, id.as_str()));
        finals.chain(choices).collect()
    }

    /// The initial state serving a containment scope
    pub fn scope_initial(&self, parent: Option<&str>) -> Option<&str> {
        self.initial_states
            .iter()
            .find(|(_, i)| i.parent_id.as_deref() == parent)
            .map(|(id, _)| id.as_str())
    }

    /// The transition leaving an initial state
    pub fn initial_transition(&self, initial_id: &str) -> Option<(&str, &Transition)> {
        self.transitions
            .iter()
            .find(|(_, t)| t.source == initial_id)
            .map(|(id, t)| (id.as_str(), t))
    }

    /// The state an initial state designates
    pub fn initial_target(&self, initial_id: &str) -> Option<&str> {
        self.initial_transition(initial_id)
            .map(|(_, t)| t.target.as_str())
    }

    /// Ids of every transition that starts or ends at `vertex_id`
    pub fn incident_transitions(&self, vertex_id: &str) -> Vec<&str> {
        self.transitions
            .iter()
            .filter(|(_, t)| t.source == vertex_id || t.target == vertex_id)
            .map(|(id, _)| id.as_str())
            .collect()
    }

    /// Nearest state containing (or equal to) both `a` and `b`
    pub fn nearest_common_ancestor(&self, a: Option<&str>, b: Option<&str>) -> Option<String> {
        let (a, b) = (a?, b?);
        let mut a_chain: BTreeSet<&str> = self.ancestors(a).into_iter().collect();
        a_chain.insert(a);
        std::iter::once(b)
            .chain(self.ancestors(b))
            .find(|id| a_chain.contains(id))
            .map(str::to_string)
    }

    /// State whose layer renders the transition: the nearest common ancestor
    /// of the endpoints' parents, top level when they share none
    pub fn transition_layer(&self, transition: &Transition) -> Option<String> {
        self.nearest_common_ancestor(
            self.vertex_parent(&transition.source),
            self.vertex_parent(&transition.target),
        )
    }

    /// Deepest state enclosing `point`, descending scope by scope from the
    /// top level. `exclude` and its descendants are never candidates.
    pub fn state_at_point(&self, point: Point, exclude: Option<&str>) -> Option<&str> {
        let mut found: Option<&str> = None;
        loop {
            let next = self
                .children_of(found)
                .into_iter()
                .filter(|id| Some(*id) != exclude)
                .find(|id| self.states[*id].contains(point));
            match next {
                Some(id) => found = Some(id),
                None => return found,
            }
        }
    }

    /// Number of triggers, actions and condition variables naming `component`
    pub fn count_component_references(&self, component: &str) -> usize {
        let in_states: usize = self
            .states
            .values()
            .flat_map(|s| s.events.iter())
            .map(|e| e.count_references(component))
            .sum();
        let in_transitions: usize = self
            .transitions
            .values()
            .filter_map(|t| t.label.as_ref())
            .map(|l| l.count_references(component))
            .sum();
        in_states + in_transitions
    }

    /// Next free component order
    pub fn next_component_order(&self) -> u32 {
        self.components
            .values()
            .map(|c| c.order.saturating_add(1))
            .max()
            .unwrap_or(0)
    }

    pub fn clear_selection(&mut self) {
        self.states.values_mut().for_each(|s| s.selection = false);
        self.choice_states.values_mut().for_each(|s| s.selection = false);
        self.transitions.values_mut().for_each(|t| t.selection = false);
        self.components.values_mut().for_each(|c| c.selection = false);
        self.notes.values_mut().for_each(|n| n.selection = false);
    }
}

// ============================================================================
// VERTICES
// ============================================================================

/// A (possibly composite) state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct State {
    pub name: String,
    /// Containing state, `None` at the top level
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    pub position: Point,
    pub dimensions: Dimensions,
    #[serde(default)]
    pub events: Vec<EventData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub selection: bool,
}

impl State {
    pub fn new(name: impl Into<String>, position: Point, dimensions: Dimensions) -> Self {
        Self {
            name: name.into(),
            parent_id: None,
            position,
            dimensions,
            events: Vec::new(),
            color: None,
            selection: false,
        }
    }

    /// Whether `point` lies inside the state's bounds
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.position.x
            && point.y >= self.position.y
            && point.x <= self.position.x + self.dimensions.width
            && point.y <= self.position.y + self.dimensions.height
    }
}

/// Marker designating the default-entered state of a containment scope.
/// The designated state is the target of its outgoing transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitialState {
    pub position: Point,
    pub dimensions: Dimensions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalState {
    pub position: Point,
    pub dimensions: Dimensions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

/// Decision diamond; its outgoing transitions carry the branch conditions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceState {
    pub position: Point,
    pub dimensions: Dimensions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub selection: bool,
}

// ============================================================================
// EVENTS, ACTIONS AND CONDITIONS
// ============================================================================

/// A signal of a component that triggers an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub component: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

impl Event {
    pub fn new(component: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            method: method.into(),
            args: Vec::new(),
        }
    }

    /// `System.entry`
    pub fn entry() -> Self {
        Self::new(SYSTEM_COMPONENT, "entry")
    }

    /// `System.exit`
    pub fn exit() -> Self {
        Self::new(SYSTEM_COMPONENT, "exit")
    }

    pub fn is_system(&self) -> bool {
        self.component == SYSTEM_COMPONENT
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_system() {
            write!(f, "{}", self.method)
        } else {
            write!(f, "{}.{}", self.component, self.method)
        }
    }
}

/// A method call on a component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    pub component: String,
    pub method: String,
    /// Positional arguments, one per declared method parameter
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

impl Action {
    pub fn new(component: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            method: method.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}({})", self.component, self.method, self.args.join(", "))
    }
}

/// A component variable read inside a condition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub component: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,
}

impl Variable {
    pub fn new(component: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            method: method.into(),
            args: Vec::new(),
        }
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.args.is_empty() {
            write!(f, "{}.{}", self.component, self.method)
        } else {
            write!(f, "{}.{}({})", self.component, self.method, self.args.join(", "))
        }
    }
}

/// Comparison operators allowed in a condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operator {
    Equals,
    NotEquals,
    Greater,
    Less,
    GreaterOrEqual,
    LessOrEqual,
}

impl Operator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Equals => "==",
            Operator::NotEquals => "!=",
            Operator::Greater => ">",
            Operator::Less => "<",
            Operator::GreaterOrEqual => ">=",
            Operator::LessOrEqual => "<=",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "==" => Some(Operator::Equals),
            "!=" => Some(Operator::NotEquals),
            ">" => Some(Operator::Greater),
            "<" => Some(Operator::Less),
            ">=" => Some(Operator::GreaterOrEqual),
            "<=" => Some(Operator::LessOrEqual),
            _ => None,
        }
    }
}

/// Guard expression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Condition {
    /// Literal value
    Value { value: String },
    /// Variable of a component
    Component { variable: Variable },
    /// Binary comparison
    Operator {
        operator: Operator,
        left: Box<Condition>,
        right: Box<Condition>,
    },
}

impl Condition {
    pub fn value(value: impl Into<String>) -> Self {
        Condition::Value {
            value: value.into(),
        }
    }

    pub fn variable(component: impl Into<String>, method: impl Into<String>) -> Self {
        Condition::Component {
            variable: Variable::new(component, method),
        }
    }

    pub fn compare(operator: Operator, left: Condition, right: Condition) -> Self {
        Condition::Operator {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Every variable leaf, left to right
    pub fn variables(&self) -> Vec<&Variable> {
        match self {
            Condition::Value { .. } => Vec::new(),
            Condition::Component { variable } => vec![variable],
            Condition::Operator { left, right, .. } => {
                let mut vars = left.variables();
                vars.extend(right.variables());
                vars
            }
        }
    }

    /// Rewrite variable leaves naming `old`; returns whether anything changed
    pub fn rename_component(&mut self, old: &str, new: &str) -> bool {
        match self {
            Condition::Value { .. } => false,
            Condition::Component { variable } => {
                if variable.component == old {
                    variable.component = new.to_string();
                    true
                } else {
                    false
                }
            }
            Condition::Operator { left, right, .. } => {
                let l = left.rename_component(old, new);
                let r = right.rename_component(old, new);
                l || r
            }
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::Value { value } => write!(f, "{}", value),
            Condition::Component { variable } => write!(f, "{}", variable),
            Condition::Operator {
                operator,
                left,
                right,
            } => {
                let side = |c: &Condition| match c {
                    Condition::Operator { .. } => format!("({})", c),
                    _ => c.to_string(),
                };
                write!(f, "{} {} {}", side(left), operator.symbol(), side(right))
            }
        }
    }
}

/// One entry in a state's event list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventData {
    pub trigger: Event,
    #[serde(rename = "do", default)]
    pub actions: Vec<Action>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
}

impl EventData {
    pub fn new(trigger: Event) -> Self {
        Self {
            trigger,
            actions: Vec::new(),
            condition: None,
        }
    }

    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Rewrite every reference to component `old`; returns whether anything changed
    pub fn rename_component(&mut self, old: &str, new: &str) -> bool {
        let mut changed = false;
        if self.trigger.component == old {
            self.trigger.component = new.to_string();
            changed = true;
        }
        for action in self.actions.iter_mut().filter(|a| a.component == old) {
            action.component = new.to_string();
            changed = true;
        }
        if let Some(condition) = self.condition.as_mut() {
            changed |= condition.rename_component(old, new);
        }
        changed
    }

    pub fn count_references(&self, component: &str) -> usize {
        usize::from(self.trigger.component == component)
            + self.actions.iter().filter(|a| a.component == component).count()
            + self
                .condition
                .as_ref()
                .map(|c| c.variables().iter().filter(|v| v.component == component).count())
                .unwrap_or(0)
    }
}

// ============================================================================
// TRANSITIONS
// ============================================================================

/// Trigger, guard and actions drawn on a transition
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TransitionLabel {
    pub position: Point,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trigger: Option<Event>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Condition>,
    #[serde(rename = "do", default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<Action>,
}

impl TransitionLabel {
    pub fn rename_component(&mut self, old: &str, new: &str) -> bool {
        let mut changed = false;
        if let Some(trigger) = self.trigger.as_mut().filter(|t| t.component == old) {
            trigger.component = new.to_string();
            changed = true;
        }
        for action in self.actions.iter_mut().filter(|a| a.component == old) {
            action.component = new.to_string();
            changed = true;
        }
        if let Some(condition) = self.condition.as_mut() {
            changed |= condition.rename_component(old, new);
        }
        changed
    }

    pub fn count_references(&self, component: &str) -> usize {
        usize::from(self.trigger.as_ref().is_some_and(|t| t.component == component))
            + self.actions.iter().filter(|a| a.component == component).count()
            + self
                .condition
                .as_ref()
                .map(|c| c.variables().iter().filter(|v| v.component == component).count())
                .unwrap_or(0)
    }

    /// Format label for display
    pub fn text(&self) -> String {
        let mut parts = Vec::new();

        if let Some(ref trigger) = self.trigger {
            parts.push(trigger.to_string());
        }

        if let Some(ref condition) = self.condition {
            parts.push(format!("[{}]", condition));
        }

        if !self.actions.is_empty() {
            let actions: Vec<String> = self.actions.iter().map(|a| a.to_string()).collect();
            parts.push(format!("/ {}", actions.join("; ")));
        }

        parts.join(" ")
    }
}

/// A directed edge between two vertices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transition {
    pub source: String,
    pub target: String,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<TransitionLabel>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub selection: bool,
}

impl Transition {
    pub fn new(source: impl Into<String>, target: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            color: color.into(),
            label: None,
            selection: false,
        }
    }

    pub fn with_label(mut self, label: TransitionLabel) -> Self {
        self.label = Some(label);
        self
    }
}

// ============================================================================
// COMPONENTS AND NOTES
// ============================================================================

/// An instance of a platform component prototype
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    /// Prototype name in the platform schema
    #[serde(rename = "type")]
    pub component_type: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
    /// Declaration order
    pub order: u32,
    #[serde(default)]
    pub position: Point,
    #[serde(default, skip_serializing_if = "is_false")]
    pub selection: bool,
}

impl Component {
    pub fn new(component_type: impl Into<String>) -> Self {
        Self {
            component_type: component_type.into(),
            parameters: BTreeMap::new(),
            order: 0,
            position: Point::default(),
            selection: false,
        }
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }
}

/// Free text pinned to the canvas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub text: String,
    pub position: Point,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<u32>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub selection: bool,
}

impl Note {
    pub fn new(text: impl Into<String>, position: Point) -> Self {
        Self {
            text: text.into(),
            position,
            font_size: None,
            selection: false,
        }
    }
}
