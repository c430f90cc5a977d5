//! fsm-studio - Document core of a hierarchical state machine editor
//! Entity store, invariant-keeping controller, grouped undo/redo,
//! platform validation and JSON documents

pub mod config;
pub mod controller;
pub mod fsm;
pub mod history;
pub mod initializer;
pub mod parser;
pub mod platform;
pub mod serializer;
pub mod store;
pub mod validator;

pub use config::EditorConfig;
pub use controller::{ChangeTransitionParams, Controller, EventSelection, EventValue, StateOptions};
pub use fsm::*;
pub use history::{Command, History, HistoryConfig, Reversible};
pub use initializer::Initializer;
pub use parser::{parse_events, serialize_events};
pub use platform::{Platform, PlatformCapabilities, PlatformRegistry};
pub use store::{
    CreateNoteParams, CreateStateParams, CreateTransitionParams, CreateVertexParams, EditorModel,
};
pub use validator::{validate, validate_state_machine, ValidationError};
