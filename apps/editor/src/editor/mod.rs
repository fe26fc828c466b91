// Editing session: holds the open resume, applies section edits and drives autosave.
// Section values are validated here before they reach the reducer.

pub mod export;
pub mod handlers;
pub mod session;
pub mod validation;
