use clap::Subcommand;
use studyroom_core::{RecurrenceKind, RecurrenceRule, TaskStatus};

use super::{orchestrator, parse_until, parse_when, print_json, CommandResult};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Add a task
    Add {
        /// Task title
        title: String,
        /// Due date (YYYY-MM-DD or RFC 3339)
        #[arg(long)]
        due: Option<String>,
        /// Repeat cadence: daily, weekly or monthly
        #[arg(long)]
        repeat: Option<String>,
        /// Repeat every N periods
        #[arg(long, default_value = "1", requires = "repeat")]
        every: u32,
        /// Last date an occurrence may fall on
        #[arg(long, requires = "repeat")]
        until: Option<String>,
        /// Checklist item, repeatable
        #[arg(long = "subtask")]
        subtasks: Vec<String>,
    },
    /// Complete a task, creating its next occurrence if it repeats
    Complete {
        /// Task ID
        id: String,
    },
    /// List tasks
    List {
        /// Only open tasks
        #[arg(long)]
        open: bool,
    },
    /// Preview the next due dates of a repeating task
    Upcoming {
        /// Task ID
        id: String,
        #[arg(long, default_value = "5")]
        limit: usize,
    },
}

pub fn run(action: TaskAction) -> CommandResult {
    let orch = orchestrator()?;

    match action {
        TaskAction::Add {
            title,
            due,
            repeat,
            every,
            until,
            subtasks,
        } => {
            let due_at = due.as_deref().map(parse_when).transpose()?;
            let rule = match repeat {
                Some(kind) => {
                    let kind: RecurrenceKind = kind.parse()?;
                    let mut rule = RecurrenceRule::new(kind, every);
                    if let Some(until) = until.as_deref() {
                        rule = rule.until(parse_until(until)?);
                    }
                    Some(rule)
                }
                None => None,
            };
            let task = orch.add_task(&title, due_at, rule, subtasks)?;
            print_json(&task)?;
        }
        TaskAction::Complete { id } => {
            let outcome = orch.complete_task(&id)?;
            print_json(&outcome)?;
        }
        TaskAction::List { open } => {
            let mut tasks = orch.list_tasks()?;
            if open {
                tasks.retain(|t| t.status == TaskStatus::Open);
            }
            print_json(&tasks)?;
        }
        TaskAction::Upcoming { id, limit } => {
            print_json(&orch.upcoming(&id, limit)?)?;
        }
    }
    Ok(())
}
