pub mod commands;
pub mod context;
pub mod doctor;
pub mod error;
pub mod fs_utils;
pub mod lifecycle;
pub mod link;
pub mod logging;
pub mod paths;
pub mod profile;
pub mod prompt;
pub mod reconcile;
pub mod settings;
pub mod shell;
pub mod store;
pub mod switch;
pub mod sync;
pub mod ui;

#[cfg(test)]
pub mod test_utils;
