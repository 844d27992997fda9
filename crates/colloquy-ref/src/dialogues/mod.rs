//! The reference dialogues.
//!
//! | Identifier   | Kind                 |
//! |--------------|----------------------|
//! | `onboarding` | scripted             |
//! | `mood-check` | scripted             |
//! | `help`       | scripted             |
//! | `menu`       | scripted (branching) |
//! | `reverse`    | handler              |
//! | `tour`       | linear               |

pub mod help;
pub mod menu;
pub mod mood;
pub mod onboarding;
pub mod reverse;
pub mod tour;

/// Said by dialogues that repeat their prompt after an interruption.
pub const RESUME_PROMPT: &str = "As I was saying...";
