use tracing::debug;

use crate::types::{ActionKind, StepName};

/// Discrete user actions on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Refresh,
    RunPipeline,
    /// Action card by position, left to right.
    ActionCard(usize),
    /// Step element by its key.
    StepDetails(String),
    Quit,
}

/// What a command resolves to before any side effect runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    Refresh,
    RunPipeline,
    Notify(String),
    Quit,
    Ignored,
}

pub fn resolve(command: &Command) -> Dispatch {
    match command {
        Command::Refresh => Dispatch::Refresh,
        Command::RunPipeline => Dispatch::RunPipeline,
        Command::ActionCard(index) => match ActionKind::from_index(*index) {
            Some(action) => {
                debug!(action = action.as_str(), "Action card activated");
                Dispatch::Notify(action.notice().to_string())
            }
            None => Dispatch::Ignored,
        },
        Command::StepDetails(key) => match StepName::from_key(key) {
            Some(step) => Dispatch::Notify(step.info().summary()),
            None => Dispatch::Ignored,
        },
        Command::Quit => Dispatch::Quit,
    }
}
