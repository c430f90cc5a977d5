//! Document Validator
//! Pure checks of a state machine against the platform it targets.
//! Checks run in a fixed order and stop at the first violation:
//! components, states (hierarchy, then events), other vertices,
//! transitions, and finally the initial state of every scope.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;

use crate::fsm::{Action, Condition, Elements, Event, StateMachine, SYSTEM_COMPONENT, SYSTEM_SIGNALS};
use crate::platform::{PlatformCapabilities, PlatformRegistry, UNIVERSAL_PARAMETERS};


#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("State machine '{machine}': {error}")]
    InMachine {
        machine: String,
        error: Box<ValidationError>,
    },
    #[error("Unknown platform '{0}'")]
    UnknownPlatform(String),
    #[error("Component '{component}' has unknown type '{component_type}'")]
    UnknownComponentType { component: String, component_type: String },
    #[error("Component '{component}' has unknown parameter '{parameter}'")]
    UnknownParameter { component: String, parameter: String },
    #[error("Component type '{0}' allows a single instance")]
    DuplicateSingleton(String),
    #[error("Vertex '{vertex}' references missing parent '{parent}'")]
    MissingParent { vertex: String, parent: String },
    #[error("State '{0}' is its own ancestor")]
    ParentCycle(String),
    #[error("{owner} references unknown component '{component}'")]
    UnknownComponent { owner: String, component: String },
    #[error("{owner}: component '{component}' has no signal '{signal}'")]
    UnknownSignal { owner: String, component: String, signal: String },
    #[error("{owner}: component '{component}' has no method '{method}'")]
    UnknownMethod { owner: String, component: String, method: String },
    #[error("{owner}: '{component}.{method}' takes {expected} argument(s), {found} given")]
    ArgumentCount {
        owner: String,
        component: String,
        method: String,
        expected: usize,
        found: usize,
    },
    #[error("{owner}: component '{component}' has no variable '{variable}'")]
    UnknownVariable { owner: String, component: String, variable: String },
    #[error("Transition '{transition}' references missing vertex '{vertex}'")]
    MissingEndpoint { transition: String, vertex: String },
    #[error("The {0} has no initial state")]
    MissingInitial(String),
    #[error("The {0} has more than one initial state")]
    DuplicateInitial(String),
    #[error("Initial state '{0}' does not designate a state of its scope")]
    InvalidInitialTarget(String),
    #[error("Initial state '{0}' serves an empty scope")]
    OrphanInitial(String),
}

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validate every machine against the platform it names
pub fn validate(elements: &Elements, platforms: &PlatformRegistry) -> ValidationResult<()> {
    for (sm_id, sm) in &elements.state_machines {
        let in_machine = |error: ValidationError| ValidationError::InMachine {
            machine: sm_id.clone(),
            error: Box::new(error),
        };
        let platform = platforms
            .get(&sm.platform)
            .ok_or_else(|| in_machine(ValidationError::UnknownPlatform(sm.platform.clone())))?;
        validate_state_machine(sm, platform).map_err(in_machine)?;
    }
    Ok(())
}

/// Validate one machine against a platform
pub fn validate_state_machine(sm: &StateMachine, platform: &impl PlatformCapabilities) -> ValidationResult<()> {
    check_components(sm, platform)?;

    let refs = References { sm, platform };
    for (id, state) in &sm.states {
        check_state_parent(sm, id)?;
        let owner = format!("State '{}'", id);
        for event in &state.events {
            refs.check_trigger(&owner, &event.trigger)?;
            refs.check_actions(&owner, &event.actions)?;
            if let Some(condition) = &event.condition {
                refs.check_condition(&owner, condition)?;
            }
        }
    }

    check_vertex_parents(sm)?;

    for (id, transition) in &sm.transitions {
        check_endpoints(sm, id)?;
        let Some(label) = &transition.label else {
            continue;
        };
        let owner = format!("Transition '{}'", id);
        if let Some(trigger) = &label.trigger {
            refs.check_trigger(&owner, trigger)?;
        }
        refs.check_actions(&owner, &label.actions)?;
        if let Some(condition) = &label.condition {
            refs.check_condition(&owner, condition)?;
        }
    }

    check_scopes(sm)
}

/// Containment, endpoints and initial states only; no platform needed
pub fn check_structure(sm: &StateMachine) -> ValidationResult<()> {
    for id in sm.states.keys() {
        check_state_parent(sm, id)?;
    }
    check_vertex_parents(sm)?;
    for id in sm.transitions.keys() {
        check_endpoints(sm, id)?;
    }
    check_scopes(sm)
}

// ============================================================================
// Components
// ============================================================================

fn check_components(sm: &StateMachine, platform: &impl PlatformCapabilities) -> ValidationResult<()> {
    let mut instances: BTreeMap<&str, usize> = BTreeMap::new();
    let mut components: Vec<_> = sm.components.iter().collect();
    components.sort_by_key(|(_, c)| c.order);

    for (name, component) in components {
        let Some(declared) = platform.list_parameters(&component.component_type) else {
            return Err(ValidationError::UnknownComponentType {
                component: name.clone(),
                component_type: component.component_type.clone(),
            });
        };
        let unknown = component
            .parameters
            .keys()
            .find(|key| !declared.contains(*key) && !UNIVERSAL_PARAMETERS.contains(&key.as_str()));
        if let Some(parameter) = unknown {
            return Err(ValidationError::UnknownParameter {
                component: name.clone(),
                parameter: parameter.clone(),
            });
        }
        *instances.entry(component.component_type.as_str()).or_default() += 1;
    }

    for (component_type, count) in instances {
        if count > 1 && platform.is_singleton(component_type) {
            return Err(ValidationError::DuplicateSingleton(component_type.to_string()));
        }
    }
    Ok(())
}

// ============================================================================
// Hierarchy
// ============================================================================

fn check_state_parent(sm: &StateMachine, id: &str) -> ValidationResult<()> {
    let mut seen = BTreeSet::from([id]);
    let mut current = id;
    while let Some(parent) = sm.states.get(current).and_then(|s| s.parent_id.as_deref()) {
        if !sm.states.contains_key(parent) {
            return Err(ValidationError::MissingParent {
                vertex: current.to_string(),
                parent: parent.to_string(),
            });
        }
        if !seen.insert(parent) {
            return Err(ValidationError::ParentCycle(id.to_string()));
        }
        current = parent;
    }
    Ok(())
}

fn check_vertex_parents(sm: &StateMachine) -> ValidationResult<()> {
    let parents = sm
        .initial_states
        .iter()
        .map(|(id, v)| (id, &v.parent_id))
        .chain(sm.final_states.iter().map(|(id, v)| (id, &v.parent_id)))
        .chain(sm.choice_states.iter().map(|(id, v)| (id, &v.parent_id)));
    for (id, parent) in parents {
        if let Some(parent) = parent.as_deref().filter(|p| !sm.states.contains_key(*p)) {
            return Err(ValidationError::MissingParent {
                vertex: id.clone(),
                parent: parent.to_string(),
            });
        }
    }
    Ok(())
}

fn check_endpoints(sm: &StateMachine, transition_id: &str) -> ValidationResult<()> {
    let Some(transition) = sm.transitions.get(transition_id) else {
        return Ok(());
    };
    for vertex in [&transition.source, &transition.target] {
        if !sm.has_vertex(vertex) {
            return Err(ValidationError::MissingEndpoint {
                transition: transition_id.to_string(),
                vertex: vertex.clone(),
            });
        }
    }
    Ok(())
}

fn scope_name(scope: Option<&str>) -> String {
    match scope {
        Some(id) => format!("state '{}'", id),
        None => "top level".to_string(),
    }
}

fn check_scopes(sm: &StateMachine) -> ValidationResult<()> {
    let scopes: BTreeSet<Option<&str>> = std::iter::once(None)
        .chain(sm.states.keys().map(|id| Some(id.as_str())))
        .collect();

    for scope in scopes {
        let children = sm.children_of(scope);
        let initials: Vec<&str> = sm
            .initial_states
            .iter()
            .filter(|(_, i)| i.parent_id.as_deref() == scope)
            .map(|(id, _)| id.as_str())
            .collect();

        match (children.is_empty(), initials.as_slice()) {
            (true, []) => {}
            (true, [initial, ..]) => return Err(ValidationError::OrphanInitial(initial.to_string())),
            (false, []) => return Err(ValidationError::MissingInitial(scope_name(scope))),
            (false, [initial]) => {
                let targets_child = sm
                    .initial_target(initial)
                    .is_some_and(|target| children.contains(&target));
                if !targets_child {
                    return Err(ValidationError::InvalidInitialTarget(initial.to_string()));
                }
            }
            (false, _) => return Err(ValidationError::DuplicateInitial(scope_name(scope))),
        }
    }
    Ok(())
}

// ============================================================================
// References
// ============================================================================

/// Resolves component references of one machine through its platform
struct References<'a, P> {
    sm: &'a StateMachine,
    platform: &'a P,
}

impl<P: PlatformCapabilities> References<'_, P> {
    /// Type of a declared component
    fn component_type(&self, owner: &str, component: &str) -> ValidationResult<&str> {
        self.sm
            .components
            .get(component)
            .map(|c| c.component_type.as_str())
            .ok_or_else(|| ValidationError::UnknownComponent {
                owner: owner.to_string(),
                component: component.to_string(),
            })
    }

    fn check_trigger(&self, owner: &str, trigger: &Event) -> ValidationResult<()> {
        let known = if trigger.is_system() {
            SYSTEM_SIGNALS.contains(&trigger.method.as_str())
        } else {
            let component_type = self.component_type(owner, &trigger.component)?;
            self.platform.signal(component_type, &trigger.method).is_some()
        };
        if known {
            Ok(())
        } else {
            Err(ValidationError::UnknownSignal {
                owner: owner.to_string(),
                component: trigger.component.clone(),
                signal: trigger.method.clone(),
            })
        }
    }

    fn check_actions(&self, owner: &str, actions: &[Action]) -> ValidationResult<()> {
        for action in actions {
            let unknown_method = || ValidationError::UnknownMethod {
                owner: owner.to_string(),
                component: action.component.clone(),
                method: action.method.clone(),
            };
            if action.component == SYSTEM_COMPONENT {
                return Err(unknown_method());
            }
            let component_type = self.component_type(owner, &action.component)?;
            let method = self
                .platform
                .method(component_type, &action.method)
                .ok_or_else(unknown_method)?;
            if method.params.len() != action.args.len() {
                return Err(ValidationError::ArgumentCount {
                    owner: owner.to_string(),
                    component: action.component.clone(),
                    method: action.method.clone(),
                    expected: method.params.len(),
                    found: action.args.len(),
                });
            }
        }
        Ok(())
    }

    fn check_condition(&self, owner: &str, condition: &Condition) -> ValidationResult<()> {
        for variable in condition.variables() {
            let known = variable.component != SYSTEM_COMPONENT && {
                let component_type = self.component_type(owner, &variable.component)?;
                self.platform.has_variable(component_type, &variable.method)
            };
            if !known {
                return Err(ValidationError::UnknownVariable {
                    owner: owner.to_string(),
                    component: variable.component.clone(),
                    variable: variable.method.clone(),
                });
            }
        }
        Ok(())
    }
}
