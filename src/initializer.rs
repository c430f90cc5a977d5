//! Document Initializer
//! Turns a loaded document into a ready controller: fresh history,
//! transition layers computed, and optionally a structural check first.

use std::path::Path;

use thiserror::Error;

use crate::config::EditorConfig;
use crate::controller::Controller;
use crate::fsm::Elements;
use crate::serializer::{self, SerializeError};
use crate::validator::{check_structure, ValidationError};

#[derive(Error, Debug)]
pub enum InitError {
    #[error(transparent)]
    Serialize(#[from] SerializeError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

pub type InitResult<T> = Result<T, InitError>;

#[derive(Debug, Clone, Default)]
pub struct Initializer {
    config: EditorConfig,
    check_structure: bool,
}

impl Initializer {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            config,
            check_structure: false,
        }
    }

    /// Refuse documents whose containment or initial states are broken
    pub fn with_structure_check(mut self, enabled: bool) -> Self {
        self.check_structure = enabled;
        self
    }

    /// Replace the document of an existing controller
    pub fn load_into(
        &self,
        controller: &mut Controller,
        elements: Elements,
        base_path: Option<String>,
        name: Option<String>,
    ) -> InitResult<()> {
        if self.check_structure {
            for (sm_id, sm) in &elements.state_machines {
                check_structure(sm).map_err(|error| ValidationError::InMachine {
                    machine: sm_id.clone(),
                    error: Box::new(error),
                })?;
            }
        }
        controller.load(base_path, name, elements);
        log::info!(
            "Opened document with {} state machine(s)",
            controller.elements().state_machines.len()
        );
        Ok(())
    }

    pub fn build(&self, elements: Elements, base_path: Option<String>, name: Option<String>) -> InitResult<Controller> {
        let mut controller = Controller::new(self.config.clone());
        self.load_into(&mut controller, elements, base_path, name)?;
        Ok(controller)
    }

    pub fn open_json(&self, source: &str) -> InitResult<Controller> {
        let elements = serializer::load_document(source)?;
        self.build(elements, None, None)
    }

    /// Open a document file; its directory and file name become the base path and name
    pub fn open_file(&self, path: impl AsRef<Path>) -> InitResult<Controller> {
        let path = path.as_ref();
        let elements = serializer::load_document_file(path)?;
        let base_path = path
            .parent()
            .map(|dir| dir.to_string_lossy().into_owned());
        let name = path
            .file_name()
            .map(|file| file.to_string_lossy().into_owned());
        self.build(elements, base_path, name)
    }
}
