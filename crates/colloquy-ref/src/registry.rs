//! Builds and rebuilds the reference dialogues by identifier.

use colloquy_contracts::{
    error::{ColloquyError, ColloquyResult},
    snapshot::DialogueSnapshot,
};
use colloquy_core::{Dialogue, DialogueFactory, DialogueHydrator};

use crate::dialogues::{help, menu, mood, onboarding, reverse, tour};

/// Every identifier `ReferenceDialogues` knows, in menu order.
pub const IDENTIFIERS: [&str; 6] = [
    onboarding::IDENTIFIER,
    mood::IDENTIFIER,
    help::IDENTIFIER,
    reverse::IDENTIFIER,
    tour::IDENTIFIER,
    menu::IDENTIFIER,
];

/// Factory and hydrator for the reference dialogues.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceDialogues;

impl DialogueFactory for ReferenceDialogues {
    fn create(&self, identifier: &str) -> ColloquyResult<Box<dyn Dialogue>> {
        let dialogue: Box<dyn Dialogue> = match identifier {
            onboarding::IDENTIFIER => Box::new(onboarding::dialogue()),
            mood::IDENTIFIER => Box::new(mood::dialogue()),
            help::IDENTIFIER => Box::new(help::dialogue()),
            reverse::IDENTIFIER => Box::new(reverse::dialogue()),
            tour::IDENTIFIER => Box::new(tour::dialogue()),
            menu::IDENTIFIER => Box::new(menu::dialogue()),
            other => {
                return Err(ColloquyError::UnknownDialogue {
                    identifier: other.to_string(),
                })
            }
        };
        Ok(dialogue)
    }
}

impl DialogueHydrator for ReferenceDialogues {
    fn hydrate(&self, snapshot: &DialogueSnapshot) -> ColloquyResult<Box<dyn Dialogue>> {
        let dialogue: Box<dyn Dialogue> = match snapshot.identifier.as_str() {
            onboarding::IDENTIFIER => Box::new(onboarding::from_snapshot(snapshot)?),
            mood::IDENTIFIER => Box::new(mood::from_snapshot(snapshot)?),
            help::IDENTIFIER => Box::new(help::from_snapshot(snapshot)?),
            tour::IDENTIFIER => Box::new(tour::from_snapshot(snapshot)?),
            menu::IDENTIFIER => Box::new(menu::from_snapshot(snapshot)?),
            reverse::IDENTIFIER => {
                return Err(ColloquyError::Hydration {
                    identifier: snapshot.identifier.clone(),
                    reason: "revers-o-bot keeps no snapshot".to_string(),
                })
            }
            other => {
                return Err(ColloquyError::Hydration {
                    identifier: other.to_string(),
                    reason: "no reference dialogue has this identifier".to_string(),
                })
            }
        };
        Ok(dialogue)
    }
}
