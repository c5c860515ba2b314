pub mod cli;
pub mod invoke;
pub mod menu;
pub mod scan;
