//! Unit tests for the document data structures

use crate::fsm::{
    Action, Component, Condition, Dimensions, Event, EventData, InitialState, Operator, Point, State,
    StateMachine, Transition, TransitionLabel, Variable, VertexKind,
};

fn state(name: &str, x: f32, y: f32, w: f32, h: f32, parent: Option<&str>) -> State {
    let mut s = State::new(name, Point::new(x, y), Dimensions::new(w, h));
    s.parent_id = parent.map(str::to_string);
    s
}

/// root(0,0 1000x1000) > mid(100,100 500x500) > leaf(150,150 100x100); other(2000,0)
fn nested_machine() -> StateMachine {
    let mut sm = StateMachine::new("ArduinoUno");
    sm.states.insert("root".into(), state("Root", 0.0, 0.0, 1000.0, 1000.0, None));
    sm.states.insert("mid".into(), state("Mid", 100.0, 100.0, 500.0, 500.0, Some("root")));
    sm.states.insert("leaf".into(), state("Leaf", 150.0, 150.0, 100.0, 100.0, Some("mid")));
    sm.states.insert("other".into(), state("Other", 2000.0, 0.0, 100.0, 100.0, None));
    sm
}

#[test]
fn test_centered_at() {
    let dims = Dimensions::new(450.0, 100.0);
    assert_eq!(dims.centered_at(Point::new(500.0, 500.0)), Point::new(275.0, 450.0));
}

#[test]
fn test_ancestors_and_depth() {
    let sm = nested_machine();
    assert_eq!(sm.ancestors("leaf"), vec!["mid", "root"]);
    assert_eq!(sm.depth("leaf"), 2);
    assert_eq!(sm.depth("root"), 0);
    assert!(sm.is_ancestor("root", "leaf"));
    assert!(!sm.is_ancestor("leaf", "root"));
}

#[test]
fn test_ancestors_stop_on_cycle() {
    let mut sm = nested_machine();
    sm.states.get_mut("root").unwrap().parent_id = Some("leaf".into());
    // Must terminate even on a corrupted document
    assert!(sm.ancestors("leaf").len() <= 3);
}

#[test]
fn test_children_of_scope() {
    let sm = nested_machine();
    assert_eq!(sm.children_of(None), vec!["other", "root"]);
    assert_eq!(sm.children_of(Some("root")), vec!["mid"]);
    assert!(sm.children_of(Some("leaf")).is_empty());
}

#[test]
fn test_state_at_point_prefers_narrowest() {
    let sm = nested_machine();
    assert_eq!(sm.state_at_point(Point::new(160.0, 160.0), None), Some("leaf"));
    assert_eq!(sm.state_at_point(Point::new(400.0, 400.0), None), Some("mid"));
    assert_eq!(sm.state_at_point(Point::new(900.0, 900.0), None), Some("root"));
    assert_eq!(sm.state_at_point(Point::new(1500.0, 1500.0), None), None);
}

#[test]
fn test_state_at_point_skips_excluded_subtree() {
    let sm = nested_machine();
    assert_eq!(sm.state_at_point(Point::new(160.0, 160.0), Some("mid")), Some("root"));
}

#[test]
fn test_nearest_common_ancestor() {
    let sm = nested_machine();
    assert_eq!(sm.nearest_common_ancestor(Some("leaf"), Some("mid")), Some("mid".to_string()));
    assert_eq!(sm.nearest_common_ancestor(Some("leaf"), Some("root")), Some("root".to_string()));
    assert_eq!(sm.nearest_common_ancestor(Some("leaf"), Some("other")), None);
    assert_eq!(sm.nearest_common_ancestor(None, Some("mid")), None);
}

#[test]
fn test_transition_layer() {
    let sm = nested_machine();
    // leaf (parent mid) -> mid (parent root): rendered inside root
    let t = Transition::new("leaf", "mid", "#fff");
    assert_eq!(sm.transition_layer(&t), Some("root".to_string()));
    let t = Transition::new("leaf", "other", "#fff");
    assert_eq!(sm.transition_layer(&t), None);
}

#[test]
fn test_initial_target_via_transition() {
    let mut sm = nested_machine();
    sm.initial_states.insert(
        "init".into(),
        InitialState {
            position: Point::default(),
            dimensions: Dimensions::new(50.0, 50.0),
            parent_id: Some("root".into()),
        },
    );
    sm.transitions.insert("t".into(), Transition::new("init", "mid", "#fff"));
    assert_eq!(sm.scope_initial(Some("root")), Some("init"));
    assert_eq!(sm.scope_initial(None), None);
    assert_eq!(sm.initial_target("init"), Some("mid"));
    assert_eq!(sm.vertex_kind("init"), Some(VertexKind::Initial));
    assert_eq!(sm.vertex_parent("init"), Some("root"));
}

#[test]
fn test_rename_component_in_event() {
    let mut event = EventData::new(Event::new("button", "clicked"))
        .with_action(Action::new("button", "reset"))
        .with_action(Action::new("led", "on"))
        .with_condition(Condition::compare(
            Operator::Greater,
            Condition::variable("button", "count"),
            Condition::value("3"),
        ));
    assert_eq!(event.count_references("button"), 3);
    assert!(event.rename_component("button", "btn"));
    assert_eq!(event.count_references("button"), 0);
    assert_eq!(event.count_references("btn"), 3);
    assert!(!event.rename_component("button", "btn"));
}

#[test]
fn test_condition_display_parenthesizes_nested() {
    let cond = Condition::compare(
        Operator::Equals,
        Condition::compare(Operator::Less, Condition::variable("t", "value"), Condition::value("5")),
        Condition::value("1"),
    );
    assert_eq!(cond.to_string(), "(t.value < 5) == 1");
}

#[test]
fn test_label_text() {
    let label = TransitionLabel {
        trigger: Some(Event::new("timer", "timeout")),
        condition: Some(Condition::value("1")),
        actions: vec![Action::new("led", "blink").with_args(["5", "100"])],
        ..Default::default()
    };
    assert_eq!(label.text(), "timer.timeout [1] / led.blink(5, 100)");
}

#[test]
fn test_serde_shape_is_camel_case() {
    let mut sm = nested_machine();
    sm.states.get_mut("leaf").unwrap().events.push(EventData::new(Event::entry()));
    let json = serde_json::to_value(&sm).unwrap();
    assert!(json.get("initialStates").is_some());
    assert_eq!(json["states"]["leaf"]["parentId"], "mid");
    assert!(json["states"]["leaf"]["events"][0].get("do").is_some());
    // Selection is omitted while unset
    assert!(json["states"]["leaf"].get("selection").is_none());
}

#[test]
fn test_condition_serde_tagged() {
    let cond = Condition::compare(Operator::NotEquals, Condition::variable("a", "b"), Condition::value("0"));
    let json = serde_json::to_value(&cond).unwrap();
    assert_eq!(json["type"], "operator");
    assert_eq!(json["operator"], "notEquals");
    assert_eq!(json["left"]["type"], "component");
    let back: Condition = serde_json::from_value(json).unwrap();
    assert_eq!(back, cond);
}

#[test]
fn test_next_component_order_saturates() {
    let mut sm = StateMachine::new("ArduinoUno");
    assert_eq!(sm.next_component_order(), 0);
    sm.components.insert(
        "led".into(),
        Component {
            component_type: "LED".into(),
            parameters: Default::default(),
            order: u32::MAX,
            position: Point::default(),
            selection: false,
        },
    );
    assert_eq!(sm.next_component_order(), u32::MAX);
}

#[test]
fn test_variable_display_keeps_args() {
    let cond = Condition::compare(
        Operator::Greater,
        Condition::Component {
            variable: Variable {
                component: "timer".into(),
                method: "value".into(),
                args: vec!["1".into()],
            },
        },
        Condition::value("5"),
    );
    assert_eq!(cond.to_string(), "timer.value(1) > 5");
}
