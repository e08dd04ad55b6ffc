use super::{orchestrator, print_json, CommandResult};

pub fn run(limit: usize) -> CommandResult {
    let orch = orchestrator()?;
    print_json(&orch.history(limit)?)
}
