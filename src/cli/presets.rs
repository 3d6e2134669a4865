use anyhow::{anyhow, Result};
use clap::Subcommand;

use crate::settings::{entities::Preset, store::SettingsStore};

#[derive(Subcommand, Debug)]
pub enum PresetCommand {
    #[command(about = "Save current clock-in and clock-out times under a name")]
    Save { name: String },
    #[command(about = "Replace current times with a saved preset")]
    Load { name: String },
    #[command(about = "List saved presets")]
    List,
}

/// Outcome of a preset command that the caller has to act on.
pub enum PresetOutcome {
    Done,
    /// The preset has to be applied to the current settings.
    Apply { name: String, preset: Preset },
}

pub async fn process_preset_command(
    command: PresetCommand,
    store: &impl SettingsStore,
) -> Result<PresetOutcome> {
    match command {
        PresetCommand::Save { name } => {
            let name = name.trim();
            if name.is_empty() {
                return Err(anyhow!("Preset name can't be empty"));
            }
            let settings = store.load().await;
            store
                .save_preset(name, &Preset::from_settings(&settings))
                .await?;
            println!("Preset '{name}' saved");
            Ok(PresetOutcome::Done)
        }
        PresetCommand::Load { name } => {
            let preset = store
                .load_preset(&name)
                .await?
                .ok_or_else(|| anyhow!("No preset named '{name}'"))?;
            preset.validate()?;
            Ok(PresetOutcome::Apply { name, preset })
        }
        PresetCommand::List => {
            let names = store.list_presets().await?;
            if names.is_empty() {
                println!("No presets saved");
            }
            for name in names {
                println!("{name}");
            }
            Ok(PresetOutcome::Done)
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use tempfile::tempdir;

    use crate::settings::{
        entities::Settings,
        store::{JsonSettingsStore, SettingsStore},
        time::{Period, TimeFormat},
    };

    use super::{process_preset_command, PresetCommand, PresetOutcome};

    #[tokio::test]
    async fn test_save_then_load_preset() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonSettingsStore::new(dir.path().to_path_buf())?;
        store
            .save(&Settings {
                clock_in: "07:30".into(),
                clock_out: "03:30".into(),
                format: TimeFormat::TwelveHour,
                clock_out_period: Period::Pm,
                ..Settings::default()
            })
            .await;

        process_preset_command(PresetCommand::Save { name: "early".into() }, &store).await?;
        store
            .save(&Settings {
                reminder_count: 9,
                ..Settings::default()
            })
            .await;

        let outcome =
            process_preset_command(PresetCommand::Load { name: "early".into() }, &store).await?;

        let PresetOutcome::Apply { name, preset } = outcome else {
            panic!("loading a preset should change settings");
        };
        let mut settings = store.load().await;
        preset.apply_to(&mut settings);
        assert_eq!(name, "early");
        assert_eq!(settings.clock_in, "07:30");
        assert_eq!(settings.clock_out, "03:30");
        assert_eq!(settings.format, TimeFormat::TwelveHour);
        assert_eq!(settings.clock_out_period, Period::Pm);
        assert_eq!(settings.reminder_count, 9);
        Ok(())
    }

    #[tokio::test]
    async fn test_load_missing_preset() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonSettingsStore::new(dir.path().to_path_buf())?;

        let result =
            process_preset_command(PresetCommand::Load { name: "nope".into() }, &store).await;

        assert!(result.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn test_save_with_invalid_times_fails() -> Result<()> {
        let dir = tempdir()?;
        let store = JsonSettingsStore::new(dir.path().to_path_buf())?;
        store
            .save(&Settings {
                clock_in: "31:00".into(),
                ..Settings::default()
            })
            .await;

        let result =
            process_preset_command(PresetCommand::Save { name: "broken".into() }, &store).await;

        assert!(result.is_err());
        assert!(store.list_presets().await?.is_empty());
        Ok(())
    }
}
