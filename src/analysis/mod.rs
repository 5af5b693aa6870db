//! Analysis runs, test association and user commands

pub mod command;
pub mod run;
pub mod test_links;

pub use command::{CommandAction, CommandScope, UserCommand};
pub use run::{analyze, AnalysisOptions, RunContext, Sources};
pub use test_links::associate_tests;
