pub mod app;
pub mod event;
pub mod keys;
pub mod outcome;
pub mod ui;
