//! Note editing

use super::{Batch, Controller};
use crate::fsm::{Note, Point};
use crate::history::Command;
use crate::store::{CreateNoteParams, IdKind};

impl Controller {
    pub fn create_note(&mut self, sm_id: &str, params: CreateNoteParams, can_undo: bool) -> Option<String> {
        let sm = self.model.machine(sm_id)?;
        let id = match params.id {
            Some(id) if sm.notes.contains_key(&id) => {
                log::warn!("Note id '{}' is already taken in '{}'", id, sm_id);
                return None;
            }
            Some(id) => id,
            None => self.model.generate_id(sm_id, IdKind::Note)?,
        };
        let position = if params.place_in_center {
            self.config.note_dimensions.centered_at(params.position)
        } else {
            params.position
        };

        let mut batch = Batch::new();
        let done = self.exec(
            &mut batch,
            Command::CreateNote {
                sm: sm_id.to_string(),
                id: id.clone(),
                data: Note::new(params.text, position),
            },
        );
        self.commit(batch, can_undo);
        done.then_some(id)
    }

    pub fn change_note_text(&mut self, sm_id: &str, id: &str, text: &str, can_undo: bool) -> bool {
        let Some(prev_text) = self.model.note(sm_id, id).map(|n| n.text.clone()) else {
            return false;
        };
        if prev_text == text {
            return false;
        }
        let mut batch = Batch::new();
        let done = self.exec(
            &mut batch,
            Command::ChangeNoteText {
                sm: sm_id.to_string(),
                id: id.to_string(),
                text: text.to_string(),
                prev_text,
            },
        );
        self.commit(batch, can_undo);
        done
    }

    pub fn change_note_position(&mut self, sm_id: &str, id: &str, position: Point, can_undo: bool) -> bool {
        let Some(prev_position) = self.model.note(sm_id, id).map(|n| n.position) else {
            return false;
        };
        let mut batch = Batch::new();
        let done = self.exec(
            &mut batch,
            Command::ChangeNotePosition {
                sm: sm_id.to_string(),
                id: id.to_string(),
                position,
                prev_position,
            },
        );
        self.commit(batch, can_undo);
        done
    }

    pub fn change_note_font_size(&mut self, sm_id: &str, id: &str, font_size: Option<u32>, can_undo: bool) -> bool {
        let Some(prev_font_size) = self.model.note(sm_id, id).map(|n| n.font_size) else {
            return false;
        };
        let mut batch = Batch::new();
        let done = self.exec(
            &mut batch,
            Command::ChangeNoteFontSize {
                sm: sm_id.to_string(),
                id: id.to_string(),
                font_size,
                prev_font_size,
            },
        );
        self.commit(batch, can_undo);
        done
    }

    pub fn delete_note(&mut self, sm_id: &str, id: &str, can_undo: bool) -> bool {
        let Some(data) = self.model.note(sm_id, id).cloned() else {
            return false;
        };
        let mut batch = Batch::new();
        let done = self.exec(
            &mut batch,
            Command::DeleteNote {
                sm: sm_id.to_string(),
                id: id.to_string(),
                data,
            },
        );
        self.commit(batch, can_undo);
        done
    }

    pub fn select_note(&mut self, sm_id: &str, id: &str) -> bool {
        self.model.remove_selection();
        self.model.change_note_selection(sm_id, id, true)
    }
}
