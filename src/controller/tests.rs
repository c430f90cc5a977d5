//! Unit tests for the controller cascades and their history records

use std::collections::BTreeMap;

use serde_json::Value;

use crate::controller::{ChangeTransitionParams, Controller, EventSelection, EventValue, StateOptions};
use crate::fsm::{Action, Condition, Event, EventData, Operator, Point, StateMachine, TransitionLabel};
use crate::history::Command;
use crate::store::{CreateNoteParams, CreateStateParams, CreateTransitionParams, CreateVertexParams};

fn controller() -> Controller {
    let mut ctrl = Controller::default();
    assert!(ctrl.create_state_machine("G", StateMachine::new("ArduinoUno"), false));
    ctrl
}

fn snapshot(ctrl: &Controller) -> Value {
    serde_json::to_value(ctrl.elements()).unwrap()
}

fn state(ctrl: &mut Controller, name: &str, x: f32, parent: Option<&str>) -> String {
    ctrl.create_state(
        "G",
        CreateStateParams {
            name: name.into(),
            position: Point::new(x, 0.0),
            parent_id: parent.map(str::to_string),
            ..Default::default()
        },
        StateOptions::default(),
        true,
    )
    .unwrap()
}

fn transition(ctrl: &mut Controller, source: &str, target: &str) -> Option<String> {
    ctrl.create_transition(
        "G",
        CreateTransitionParams {
            source: source.into(),
            target: target.into(),
            ..Default::default()
        },
        true,
    )
}

fn undo_len(ctrl: &Controller) -> usize {
    ctrl.history().undo_stack().len()
}

fn head_connected(ctrl: &Controller) -> usize {
    ctrl.history()
        .undo_stack()
        .back()
        .map(|e| e.number_of_connected_actions)
        .unwrap_or(0)
}

fn sm(ctrl: &Controller) -> &StateMachine {
    ctrl.machine("G").unwrap()
}

// ============================================================================
// States and initial states
// ============================================================================

#[test]
fn test_nested_scope_lifecycle() {
    let mut ctrl = controller();
    let s1 = ctrl
        .create_state(
            "G",
            CreateStateParams {
                name: "S1".into(),
                position: Point::new(100.0, 150.0),
                ..Default::default()
            },
            StateOptions::default(),
            true,
        )
        .unwrap();
    assert_eq!(s1, "state1");
    assert_eq!(sm(&ctrl).initial_states.len(), 1);
    let top_initial = sm(&ctrl).scope_initial(None).unwrap().to_string();
    assert_eq!(sm(&ctrl).initial_target(&top_initial), Some("state1"));
    assert_eq!(sm(&ctrl).initial_states[&top_initial].position, Point::new(0.0, 150.0));

    let s2 = ctrl
        .create_state(
            "G",
            CreateStateParams {
                name: "S2".into(),
                position: Point::new(150.0, 200.0),
                parent_id: Some(s1.clone()),
                ..Default::default()
            },
            StateOptions::default(),
            true,
        )
        .unwrap();
    assert_eq!(sm(&ctrl).scope_initial(None), Some(top_initial.as_str()));
    assert_eq!(sm(&ctrl).initial_target(&top_initial), Some("state1"));
    let inner_initial = sm(&ctrl).scope_initial(Some(s1.as_str())).unwrap().to_string();
    assert_eq!(sm(&ctrl).initial_target(&inner_initial), Some(s2.as_str()));

    let before = snapshot(&ctrl);
    let depth = undo_len(&ctrl);
    assert!(ctrl.delete_state("G", &s2, true));
    assert!(sm(&ctrl).scope_initial(Some(s1.as_str())).is_none());
    assert!(!sm(&ctrl).states.contains_key(&s2));
    // DeleteTransition, DeleteInitialState, DeleteState
    assert_eq!(undo_len(&ctrl) - depth, 3);
    assert_eq!(head_connected(&ctrl), 2);

    ctrl.undo();
    assert_eq!(snapshot(&ctrl), before);
}

#[test]
fn test_delete_cascade_is_one_step() {
    let mut ctrl = controller();
    let s1 = state(&mut ctrl, "S1", 0.0, None);
    let s2 = state(&mut ctrl, "S2", 1000.0, None);
    let c1 = state(&mut ctrl, "C1", 50.0, Some(s1.as_str()));
    let f = ctrl
        .create_final_state(
            "G",
            CreateVertexParams {
                position: Point::new(200.0, 50.0),
                parent_id: Some(s1.clone()),
                ..Default::default()
            },
            true,
        )
        .unwrap();
    let into_s1 = transition(&mut ctrl, &s2, &s1).unwrap();
    let out_of_c1 = transition(&mut ctrl, &c1, &s2).unwrap();
    assert_eq!(ctrl.transition_layer("G", &out_of_c1), Some(None));

    let before = snapshot(&ctrl);
    let depth = undo_len(&ctrl);
    assert!(ctrl.delete_state("G", &s1, true));
    let after = snapshot(&ctrl);

    let pushed = undo_len(&ctrl) - depth;
    assert_eq!(pushed, 8);
    assert_eq!(head_connected(&ctrl), pushed - 1);

    let machine = sm(&ctrl);
    assert!(!machine.states.contains_key(&s1));
    assert!(!machine.transitions.contains_key(&into_s1));
    assert!(machine.transitions.contains_key(&out_of_c1));
    assert_eq!(machine.states[&c1].parent_id, None);
    assert_eq!(machine.final_states[&f].parent_id, None);
    // The top-level initial moved over to the remaining sibling
    let top_initial = machine.scope_initial(None).unwrap();
    assert_eq!(machine.initial_target(top_initial), Some(s2.as_str()));
    assert_eq!(machine.initial_states.len(), 1);

    ctrl.undo();
    assert_eq!(snapshot(&ctrl), before);
    assert_eq!(undo_len(&ctrl), depth);
    ctrl.redo();
    assert_eq!(snapshot(&ctrl), after);
    assert_eq!(head_connected(&ctrl), 7);
}

#[test]
fn test_link_relocates_initial() {
    let mut ctrl = controller();
    let s1 = state(&mut ctrl, "S1", 0.0, None);
    let s2 = state(&mut ctrl, "S2", 1000.0, None);
    let top_initial = sm(&ctrl).scope_initial(None).unwrap().to_string();
    let before = snapshot(&ctrl);

    assert!(ctrl.link_state("G", &s2, &s1, true));
    let machine = sm(&ctrl);
    assert_eq!(machine.states[&s1].parent_id.as_deref(), Some(s2.as_str()));
    // Linking keeps absolute coordinates
    assert_eq!(machine.states[&s1].position, Point::new(0.0, 0.0));
    assert_eq!(machine.initial_target(&top_initial), Some(s2.as_str()));
    assert_eq!(machine.initial_states[&top_initial].position, Point::new(900.0, 0.0));
    let inner = machine.scope_initial(Some(s2.as_str())).unwrap();
    assert_eq!(machine.initial_target(inner), Some(s1.as_str()));

    ctrl.undo();
    assert_eq!(snapshot(&ctrl), before);
}

#[test]
fn test_link_rejects_cycles() {
    let mut ctrl = controller();
    let s1 = state(&mut ctrl, "S1", 0.0, None);
    let s2 = state(&mut ctrl, "S2", 1000.0, None);
    assert!(ctrl.link_state("G", &s2, &s1, true));
    let before = snapshot(&ctrl);
    let depth = undo_len(&ctrl);

    assert!(!ctrl.link_state("G", &s1, &s2, true));
    assert!(!ctrl.link_state("G", &s1, &s1, true));
    assert!(!ctrl.link_state("G", "state99", &s1, true));
    // Already there
    assert!(!ctrl.link_state("G", &s2, &s1, true));
    assert_eq!(snapshot(&ctrl), before);
    assert_eq!(undo_len(&ctrl), depth);
}

#[test]
fn test_unlink_moves_layer_to_top() {
    let mut ctrl = controller();
    let outer = state(&mut ctrl, "Outer", 0.0, None);
    let a = state(&mut ctrl, "A", 10.0, Some(outer.as_str()));
    let b = state(&mut ctrl, "B", 200.0, Some(outer.as_str()));
    let t = transition(&mut ctrl, &a, &b).unwrap();
    assert_eq!(ctrl.transition_layer("G", &t), Some(Some(outer.as_str())));

    assert!(ctrl.unlink_state("G", &a, true));
    assert_eq!(sm(&ctrl).states[&a].parent_id, None);
    assert_eq!(ctrl.transition_layer("G", &t), Some(None));
    // The scope left behind still designates a member
    let inner = sm(&ctrl).scope_initial(Some(outer.as_str())).unwrap();
    assert_eq!(sm(&ctrl).initial_target(inner), Some(b.as_str()));

    ctrl.undo();
    assert_eq!(ctrl.transition_layer("G", &t), Some(Some(outer.as_str())));
}

#[test]
fn test_set_initial_state() {
    let mut ctrl = controller();
    let s1 = state(&mut ctrl, "S1", 0.0, None);
    let s2 = state(&mut ctrl, "S2", 1000.0, None);
    assert!(ctrl.set_initial_state("G", &s2, true));
    let top_initial = sm(&ctrl).scope_initial(None).unwrap().to_string();
    assert_eq!(sm(&ctrl).initial_target(&top_initial), Some(s2.as_str()));
    assert!(!ctrl.set_initial_state("G", &s2, true));

    ctrl.undo();
    assert_eq!(sm(&ctrl).initial_target(&top_initial), Some(s1.as_str()));
}

#[test]
fn test_state_move_carries_contents() {
    let mut ctrl = controller();
    let outer = state(&mut ctrl, "Outer", 0.0, None);
    let child = state(&mut ctrl, "Child", 10.0, Some(outer.as_str()));
    let inner_initial = sm(&ctrl).scope_initial(Some(outer.as_str())).unwrap().to_string();
    let initial_before = sm(&ctrl).initial_states[&inner_initial].position;
    let depth = undo_len(&ctrl);

    assert!(ctrl.change_state_position("G", &outer, Point::new(100.0, 50.0), true));
    let machine = sm(&ctrl);
    assert_eq!(machine.states[&outer].position, Point::new(100.0, 50.0));
    assert_eq!(machine.states[&child].position, Point::new(110.0, 50.0));
    assert_eq!(
        machine.initial_states[&inner_initial].position,
        initial_before.offset(100.0, 50.0)
    );
    assert_eq!(undo_len(&ctrl) - depth, 3);

    ctrl.undo();
    assert_eq!(sm(&ctrl).states[&child].position, Point::new(10.0, 0.0));
}

#[test]
fn test_unrecorded_edit() {
    let mut ctrl = controller();
    let s1 = state(&mut ctrl, "S1", 0.0, None);
    let depth = undo_len(&ctrl);
    assert!(ctrl.change_state_name("G", &s1, "Renamed", false));
    assert_eq!(sm(&ctrl).states[&s1].name, "Renamed");
    assert_eq!(undo_len(&ctrl), depth);
}

#[test]
fn test_create_state_hit_test() {
    let mut ctrl = controller();
    let outer = state(&mut ctrl, "Outer", 0.0, None);
    // (10, 0) falls inside Outer (450 x 100)
    let inner = ctrl
        .create_state(
            "G",
            CreateStateParams {
                name: "Inner".into(),
                position: Point::new(10.0, 10.0),
                ..Default::default()
            },
            StateOptions::default(),
            true,
        )
        .unwrap();
    assert_eq!(sm(&ctrl).states[&inner].parent_id.as_deref(), Some(outer.as_str()));

    let free = ctrl
        .create_state(
            "G",
            CreateStateParams {
                name: "Free".into(),
                position: Point::new(10.0, 10.0),
                ..Default::default()
            },
            StateOptions {
                link_by_point: false,
                can_be_initial: false,
            },
            true,
        )
        .unwrap();
    assert_eq!(sm(&ctrl).states[&free].parent_id, None);
    assert_eq!(sm(&ctrl).initial_states.len(), 2);
}

#[test]
fn test_taken_id_is_refused() {
    let mut ctrl = controller();
    let s1 = state(&mut ctrl, "S1", 0.0, None);
    let created = ctrl.create_final_state(
        "G",
        CreateVertexParams {
            id: Some(s1),
            position: Point::new(2000.0, 0.0),
            ..Default::default()
        },
        true,
    );
    assert!(created.is_none());
}

// ============================================================================
// Events
// ============================================================================

fn state_with_events(ctrl: &mut Controller) -> String {
    let id = state(ctrl, "S1", 0.0, None);
    let events = vec![
        EventData::new(Event::entry()).with_action(Action::new("led", "on")),
        EventData::new(Event::new("button", "clicked"))
            .with_action(Action::new("led", "blink").with_args(["3", "100"]))
            .with_action(Action::new("timer", "stop")),
    ];
    assert!(ctrl.change_state_events("G", &id, events, true));
    id
}

#[test]
fn test_deleting_last_action_removes_event() {
    let mut ctrl = controller();
    let id = state_with_events(&mut ctrl);
    let before = snapshot(&ctrl);

    assert!(ctrl.delete_event("G", &EventSelection::action(&id, 0, 0), true));
    let events = &sm(&ctrl).states[&id].events;
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].trigger, Event::new("button", "clicked"));
    assert!(matches!(
        ctrl.history().undo_stack().back().map(|e| &e.action),
        Some(Command::DeleteEvent { .. })
    ));

    ctrl.undo();
    assert_eq!(snapshot(&ctrl), before);

    // With two actions only the action goes
    assert!(ctrl.delete_event("G", &EventSelection::action(&id, 1, 0), true));
    let events = &sm(&ctrl).states[&id].events;
    assert_eq!(events[1].actions, vec![Action::new("timer", "stop")]);
    assert!(!ctrl.delete_event("G", &EventSelection::action(&id, 1, 5), true));
}

#[test]
fn test_event_value_kind_must_match() {
    let mut ctrl = controller();
    let id = state_with_events(&mut ctrl);
    let depth = undo_len(&ctrl);

    assert!(!ctrl.change_event(
        "G",
        &EventSelection::trigger(&id, 0),
        EventValue::Action(Action::new("led", "off")),
        true
    ));
    assert!(!ctrl.change_event(
        "G",
        &EventSelection::action(&id, 0, 0),
        EventValue::Trigger(Event::exit()),
        true
    ));
    assert_eq!(undo_len(&ctrl), depth);

    assert!(ctrl.change_event(
        "G",
        &EventSelection::action(&id, 0, 0),
        EventValue::Action(Action::new("led", "off")),
        true
    ));
    assert!(ctrl.change_event("G", &EventSelection::trigger(&id, 0), EventValue::Trigger(Event::exit()), true));
    let event = &sm(&ctrl).states[&id].events[0];
    assert_eq!(event.trigger, Event::exit());
    assert_eq!(event.actions, vec![Action::new("led", "off")]);
}

#[test]
fn test_event_list_editing() {
    let mut ctrl = controller();
    let id = state_with_events(&mut ctrl);
    assert!(ctrl.create_event("G", &id, EventData::new(Event::exit()), Some(0), true));
    assert!(ctrl.create_event_action("G", &id, 0, Action::new("led", "off"), true));
    let guard = Condition::compare(
        Operator::Greater,
        Condition::variable("button", "nClicks"),
        Condition::value("2"),
    );
    assert!(ctrl.change_event_condition("G", &id, 2, Some(guard.clone()), true));

    let events = &sm(&ctrl).states[&id].events;
    assert_eq!(events.len(), 3);
    assert_eq!(events[0].trigger, Event::exit());
    assert_eq!(events[0].actions, vec![Action::new("led", "off")]);
    assert_eq!(events[2].condition, Some(guard));
    assert!(!ctrl.create_event_action("G", &id, 7, Action::new("led", "off"), true));
}

#[test]
fn test_events_text_mode() {
    let mut ctrl = controller();
    let id = state(&mut ctrl, "S1", 0.0, None);
    let text = "entry/\nled.on()\nbutton.clicked[button.nClicks > 2]/\nled.blink(3, 100)\ntimer.stop()";
    assert!(ctrl.change_state_events_text("G", &id, text, true).unwrap());
    assert_eq!(sm(&ctrl).states[&id].events.len(), 2);
    assert_eq!(ctrl.state_events_text("G", &id).as_deref(), Some(text));

    // Same content is not another step
    assert!(!ctrl.change_state_events_text("G", &id, text, true).unwrap());
    assert!(ctrl.change_state_events_text("G", &id, "entry led.on()", true).is_err());

    ctrl.undo();
    assert!(sm(&ctrl).states[&id].events.is_empty());
}

// ============================================================================
// Transitions
// ============================================================================

#[test]
fn test_transition_endpoint_rules() {
    let mut ctrl = controller();
    let s1 = state(&mut ctrl, "S1", 0.0, None);
    let s2 = state(&mut ctrl, "S2", 1000.0, None);
    let init = sm(&ctrl).scope_initial(None).unwrap().to_string();
    let f = ctrl
        .create_final_state(
            "G",
            CreateVertexParams {
                position: Point::new(2000.0, 0.0),
                ..Default::default()
            },
            true,
        )
        .unwrap();

    assert!(transition(&mut ctrl, &s1, &init).is_none());
    assert!(transition(&mut ctrl, &f, &s1).is_none());
    assert!(transition(&mut ctrl, &init, &s2).is_none());
    assert!(transition(&mut ctrl, &s1, "state99").is_none());

    let t = transition(&mut ctrl, &s1, &f).unwrap();
    assert_eq!(sm(&ctrl).transitions[&t].color, ctrl.config().transition_color);

    // The source of an initial's transition is fixed
    let (init_transition, data) = sm(&ctrl)
        .initial_transition(&init)
        .map(|(id, t)| (id.to_string(), t.clone()))
        .unwrap();
    let moved = ChangeTransitionParams {
        id: init_transition.clone(),
        source: s2.clone(),
        target: s1.clone(),
        color: data.color.clone(),
        label: None,
    };
    assert!(!ctrl.change_transition("G", moved, true));
    let retargeted = ChangeTransitionParams {
        id: init_transition.clone(),
        source: init.clone(),
        target: s2.clone(),
        color: data.color,
        label: None,
    };
    assert!(ctrl.change_transition("G", retargeted, true));
    assert_eq!(sm(&ctrl).initial_target(&init), Some(s2.as_str()));

    assert!(!ctrl.delete_transition("G", &init_transition, true));
    assert!(ctrl.delete_transition("G", &t, true));
}

#[test]
fn test_transition_label_edit() {
    let mut ctrl = controller();
    let s1 = state(&mut ctrl, "S1", 0.0, None);
    let s2 = state(&mut ctrl, "S2", 1000.0, None);
    let t = transition(&mut ctrl, &s1, &s2).unwrap();
    let label = TransitionLabel {
        position: Point::new(500.0, -50.0),
        trigger: Some(Event::new("timer", "timeout")),
        ..Default::default()
    };
    let params = ChangeTransitionParams {
        id: t.clone(),
        source: s1.clone(),
        target: s2.clone(),
        color: "#FF0000".into(),
        label: Some(label),
    };
    assert!(ctrl.change_transition("G", params.clone(), true));
    assert!(!ctrl.change_transition("G", params, true));
    assert!(ctrl.change_transition_position("G", &t, Point::new(0.0, 0.0), true));
    let data = &sm(&ctrl).transitions[&t];
    assert_eq!(data.color, "#FF0000");
    assert_eq!(data.label.as_ref().map(|l| l.position), Some(Point::new(0.0, 0.0)));
}

#[test]
fn test_choice_state_deletes_its_transitions() {
    let mut ctrl = controller();
    let s1 = state(&mut ctrl, "S1", 0.0, None);
    let choice = ctrl
        .create_choice_state(
            "G",
            CreateVertexParams {
                position: Point::new(2000.0, 0.0),
                ..Default::default()
            },
            true,
        )
        .unwrap();
    transition(&mut ctrl, &s1, &choice).unwrap();
    transition(&mut ctrl, &choice, &s1).unwrap();
    let before = snapshot(&ctrl);
    let depth = undo_len(&ctrl);

    assert!(ctrl.delete_choice_state("G", &choice, true));
    assert_eq!(sm(&ctrl).incident_transitions(&s1).len(), 1);
    assert_eq!(undo_len(&ctrl) - depth, 3);
    ctrl.undo();
    assert_eq!(snapshot(&ctrl), before);
}

#[test]
fn test_link_pseudo_state() {
    let mut ctrl = controller();
    let s1 = state(&mut ctrl, "S1", 0.0, None);
    let f = ctrl
        .create_final_state(
            "G",
            CreateVertexParams {
                position: Point::new(2000.0, 0.0),
                ..Default::default()
            },
            true,
        )
        .unwrap();
    assert!(ctrl.link_pseudo_state("G", &f, Some(s1.as_str()), true));
    assert_eq!(sm(&ctrl).vertex_parent(&f), Some(s1.as_str()));
    assert!(!ctrl.link_pseudo_state("G", &f, Some(s1.as_str()), true));
    assert!(!ctrl.link_pseudo_state("G", &s1, None, true));
    assert!(ctrl.link_pseudo_state("G", &f, None, true));
}

// ============================================================================
// Components
// ============================================================================

fn machine_with_components(ctrl: &mut Controller) -> String {
    for (name, component_type) in [("led", "LED"), ("button", "Button"), ("timer", "Timer")] {
        assert!(ctrl.create_component("G", name, component_type, BTreeMap::new(), true));
    }
    let id = state_with_events(ctrl);
    let other = state(ctrl, "S2", 1000.0, None);
    let t = transition(ctrl, &id, &other).unwrap();
    let params = ChangeTransitionParams {
        id: t,
        source: id.clone(),
        target: other,
        color: "#0000FF".into(),
        label: Some(TransitionLabel {
            trigger: Some(Event::new("button", "clicked")),
            condition: Some(Condition::compare(
                Operator::Equals,
                Condition::variable("led", "value"),
                Condition::value("0"),
            )),
            actions: vec![Action::new("led", "on")],
            ..Default::default()
        }),
    };
    assert!(ctrl.change_transition("G", params, true));
    id
}

#[test]
fn test_rename_rewrites_references() {
    let mut ctrl = controller();
    machine_with_components(&mut ctrl);
    let references = ctrl.component_references("G", "led");
    assert_eq!(references, 4);
    let before = snapshot(&ctrl);

    assert!(ctrl.rename_component("G", "led", "lamp", true));
    assert_eq!(ctrl.component_references("G", "led"), 0);
    assert_eq!(ctrl.component_references("G", "lamp"), references);
    assert!(sm(&ctrl).components.contains_key("lamp"));
    assert!(!sm(&ctrl).components.contains_key("led"));

    // Second call finds nothing left to rename
    let depth = undo_len(&ctrl);
    assert!(!ctrl.rename_component("G", "led", "lamp", true));
    assert_eq!(undo_len(&ctrl), depth);

    ctrl.undo();
    assert_eq!(snapshot(&ctrl), before);
}

#[test]
fn test_component_edits() {
    let mut ctrl = controller();
    machine_with_components(&mut ctrl);
    assert!(!ctrl.create_component("G", "led", "LED", BTreeMap::new(), true));
    assert!(!ctrl.create_component("G", "System", "LED", BTreeMap::new(), true));
    assert!(!ctrl.create_component("G", "", "LED", BTreeMap::new(), true));

    let parameters = BTreeMap::from([("pin".to_string(), "13".to_string())]);
    assert!(ctrl.change_component("G", "button", parameters.clone(), Some("btn"), true));
    assert_eq!(sm(&ctrl).components["btn"].parameters, parameters);
    assert_eq!(ctrl.component_references("G", "btn"), 2);

    assert!(ctrl.swap_components("G", "led", "timer", true));
    assert_eq!(sm(&ctrl).components["led"].order, 2);
    assert_eq!(sm(&ctrl).components["timer"].order, 0);
}

#[test]
fn test_referenced_component_cannot_be_deleted() {
    let mut ctrl = controller();
    machine_with_components(&mut ctrl);
    assert!(!ctrl.delete_component("G", "led", true));
    assert!(sm(&ctrl).components.contains_key("led"));

    assert!(ctrl.create_component("G", "spare", "LED", BTreeMap::new(), true));
    assert!(ctrl.delete_component("G", "spare", true));
    ctrl.undo();
    assert!(sm(&ctrl).components.contains_key("spare"));
}

// ============================================================================
// Notes, selection and documents
// ============================================================================

#[test]
fn test_note_edits() {
    let mut ctrl = controller();
    let note = ctrl
        .create_note(
            "G",
            CreateNoteParams {
                text: "hello".into(),
                position: Point::new(100.0, 100.0),
                place_in_center: true,
                ..Default::default()
            },
            true,
        )
        .unwrap();
    assert_eq!(sm(&ctrl).notes[&note].position, Point::new(0.0, 80.0));
    assert!(!ctrl.change_note_text("G", &note, "hello", true));
    assert!(ctrl.change_note_text("G", &note, "world", true));
    assert!(ctrl.change_note_font_size("G", &note, Some(24), true));
    assert!(ctrl.delete_note("G", &note, true));
    ctrl.undo();
    assert_eq!(sm(&ctrl).notes[&note].text, "world");
}

#[test]
fn test_selection_is_exclusive_and_unrecorded() {
    let mut ctrl = controller();
    let s1 = state(&mut ctrl, "S1", 0.0, None);
    let s2 = state(&mut ctrl, "S2", 1000.0, None);
    let depth = undo_len(&ctrl);
    assert!(ctrl.select_state("G", &s1));
    assert!(ctrl.select_state("G", &s2));
    assert!(!sm(&ctrl).states[&s1].selection);
    assert!(sm(&ctrl).states[&s2].selection);
    ctrl.remove_selection();
    assert!(!sm(&ctrl).states[&s2].selection);
    assert_eq!(undo_len(&ctrl), depth);
}

#[test]
fn test_new_edit_clears_redo() {
    let mut ctrl = controller();
    let s1 = state(&mut ctrl, "S1", 0.0, None);
    assert!(ctrl.change_state_name("G", &s1, "A", true));
    ctrl.undo();
    assert!(ctrl.history().can_redo());
    assert!(ctrl.change_state_color("G", &s1, Some("#FFFFFF".into()), true));
    assert!(!ctrl.history().can_redo());
}

#[test]
fn test_state_machine_lifecycle() {
    let mut ctrl = Controller::default();
    assert!(ctrl.create_state_machine("G", StateMachine::new("ArduinoUno"), true));
    assert!(!ctrl.create_state_machine("G", StateMachine::new("ArduinoUno"), true));
    assert!(ctrl.change_state_machine_name("G", Some("Blinker".into()), true));
    assert!(ctrl.delete_state_machine("G", true));
    assert!(ctrl.machine("G").is_none());
    ctrl.undo();
    assert_eq!(sm(&ctrl).name.as_deref(), Some("Blinker"));
}
