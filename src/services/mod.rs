pub mod note_service;

pub use note_service::{NoteError, NoteService};
