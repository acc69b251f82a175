// handlers/mod.rs - HTTP handlers
//
// Each handler is a thin adapter: extract path/body, call NoteService,
// and map the outcome to a status and body. Connection handling and
// transactions live in services::note_service.
pub mod notes;
