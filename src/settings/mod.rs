//! Settings are organized through [store::JsonSettingsStore].
//!  - `settings.json` holds the reminder targets, the reminder-day counter and the running flag.
//!  - `presets.json` maps preset names to reusable pairs of targets.
//!  - Targets are kept as the user typed them and resolved into [time::TimeOfDay] on use.

pub mod entities;
pub mod store;
pub mod time;
