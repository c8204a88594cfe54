pub mod compare;
pub mod funds;
pub mod input;
pub mod interactive;
pub mod setup;
pub mod ui;
