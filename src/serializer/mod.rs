//! Document Serializer
//! JSON form of single entities and of whole documents. Selection flags are
//! transient editor state and never leave the process.

use std::path::Path;

use serde::Serialize;
use thiserror::Error;

use crate::fsm::{Elements, StateMachine};


#[derive(Error, Debug)]
pub enum SerializeError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Could not read document: {0}")]
    Io(#[from] std::io::Error),
    #[error("No state machine '{0}'")]
    UnknownMachine(String),
    #[error("No {kind} '{id}' in state machine '{machine}'")]
    UnknownEntity {
        machine: String,
        kind: &'static str,
        id: String,
    },
}

pub type SerializeResult<T> = Result<T, SerializeError>;

/// Output layout of [`get_all`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentFormat {
    #[default]
    Json,
    PrettyJson,
}

fn to_json<T: Serialize>(value: &T, format: DocumentFormat) -> SerializeResult<String> {
    let text = match format {
        DocumentFormat::Json => serde_json::to_string(value)?,
        DocumentFormat::PrettyJson => serde_json::to_string_pretty(value)?,
    };
    Ok(text)
}

fn machine<'a>(elements: &'a Elements, sm_id: &str) -> SerializeResult<&'a StateMachine> {
    elements
        .state_machines
        .get(sm_id)
        .ok_or_else(|| SerializeError::UnknownMachine(sm_id.to_string()))
}

fn unknown(sm_id: &str, kind: &'static str, id: &str) -> SerializeError {
    SerializeError::UnknownEntity {
        machine: sm_id.to_string(),
        kind,
        id: id.to_string(),
    }
}

pub fn get_state(elements: &Elements, sm_id: &str, id: &str) -> SerializeResult<String> {
    let mut state = machine(elements, sm_id)?
        .states
        .get(id)
        .cloned()
        .ok_or_else(|| unknown(sm_id, "state", id))?;
    state.selection = false;
    to_json(&state, DocumentFormat::Json)
}

pub fn get_transition(elements: &Elements, sm_id: &str, id: &str) -> SerializeResult<String> {
    let mut transition = machine(elements, sm_id)?
        .transitions
        .get(id)
        .cloned()
        .ok_or_else(|| unknown(sm_id, "transition", id))?;
    transition.selection = false;
    to_json(&transition, DocumentFormat::Json)
}

pub fn get_note(elements: &Elements, sm_id: &str, id: &str) -> SerializeResult<String> {
    let mut note = machine(elements, sm_id)?
        .notes
        .get(id)
        .cloned()
        .ok_or_else(|| unknown(sm_id, "note", id))?;
    note.selection = false;
    to_json(&note, DocumentFormat::Json)
}

/// The whole document, `{ "stateMachines": { .. } }`
pub fn get_all(elements: &Elements, format: DocumentFormat) -> SerializeResult<String> {
    let mut elements = elements.clone();
    elements.clear_selection();
    to_json(&elements, format)
}

/// Parse a document. Selection flags found in the input are dropped.
pub fn load_document(source: &str) -> SerializeResult<Elements> {
    let mut elements: Elements = serde_json::from_str(source)?;
    elements.clear_selection();
    log::debug!(
        "Loaded document with {} state machine(s)",
        elements.state_machines.len()
    );
    Ok(elements)
}

pub fn load_document_file(path: impl AsRef<Path>) -> SerializeResult<Elements> {
    let source = std::fs::read_to_string(path)?;
    load_document(&source)
}
