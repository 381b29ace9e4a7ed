//! # notewise-cli
//!
//! Library half of the `notewise` binary. Commands live here so they can be
//! tested without spawning a process.
//!
//! ```text
//! notewise analyze "Das ist fantastisch"
//! notewise detect --file note.md
//! notewise sentiment --language en --sarcasm "Oh great, another meeting"
//! notewise generate --stream "Summarize my week"
//! notewise save-demo --notes 12
//! notewise prefs export --output prefs.json
//! ```
//!
//! Every command prints pretty JSON on stdout; logs go to stderr.

pub mod commands;
pub mod input;
pub mod logging;

pub use commands::{
    analyze, detect, export_preferences, generate, import_preferences, open_preferences,
    save_demo, sentiment, DetectReport, SaveDemoOptions, SaveDemoReport, SentimentReport,
};
pub use input::read_input;
