use clap::Subcommand;
use studyroom_core::RecallQuality;

use super::{orchestrator, print_json, CommandResult};

#[derive(Subcommand)]
pub enum CardAction {
    /// Add a card, due for review right away
    Add {
        /// Front of the card
        label: String,
    },
    /// Record a review
    Review {
        /// Card ID
        id: String,
        /// again, hard, good, easy (or 1-4)
        quality: String,
    },
    /// List cards due now
    Due,
    /// List all cards
    List,
    /// Counts per mastery state
    Summary {
        /// Horizon for the "due soon" count
        #[arg(long, default_value = "7")]
        days: u32,
    },
    /// Cards coming due per day
    Forecast {
        #[arg(long, default_value = "14")]
        days: u32,
    },
}

pub fn run(action: CardAction) -> CommandResult {
    let orch = orchestrator()?;

    match action {
        CardAction::Add { label } => {
            let card = orch.add_card(&label)?;
            print_json(&card)?;
        }
        CardAction::Review { id, quality } => {
            let quality: RecallQuality = quality.parse()?;
            let card = orch.review_card(&id, quality)?;
            print_json(&card)?;
        }
        CardAction::Due => print_json(&orch.due_cards()?)?,
        CardAction::List => print_json(&orch.list_cards()?)?,
        CardAction::Summary { days } => print_json(&orch.deck_summary(days)?)?,
        CardAction::Forecast { days } => print_json(&orch.forecast(days)?)?,
    }
    Ok(())
}
