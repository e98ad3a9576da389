use diary_core::models::ScheduleConfig;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;

#[derive(Deserialize, Debug)]
pub struct Config {
    #[serde(default = "default_database_path")]
    pub database_path: String,
    /// Calendar used when a command names none; created on first use
    #[serde(default = "default_calendar")]
    pub default_calendar: String,
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

fn default_database_path() -> String {
    "diary.db".to_string()
}

fn default_calendar() -> String {
    "Personal".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            default_calendar: default_calendar(),
            schedule: ScheduleConfig::default(),
        }
    }
}

impl Config {
    /// `config.toml` in the working directory, overridden by `DIARY_*`
    /// variables (`DIARY_SCHEDULE__MAX_MUTATION_RETRIES` for nested keys).
    pub fn new() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }

    fn figment() -> Figment {
        Figment::new()
            .merge(Toml::file("config.toml"))
            .merge(Env::prefixed("DIARY_").split("__"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_env_overrides() {
        figment::Jail::expect_with(|jail| {
            let config = Config::new()?;
            assert_eq!(config.database_path, "diary.db");
            assert_eq!(config.default_calendar, "Personal");
            assert_eq!(config.schedule, ScheduleConfig::default());

            jail.create_file("config.toml", "default_calendar = \"Work\"\n[schedule]\nmax_mutation_retries = 1\n")?;
            jail.set_env("DIARY_DATABASE_PATH", "/tmp/other.db");
            let config = Config::new()?;
            assert_eq!(config.database_path, "/tmp/other.db");
            assert_eq!(config.default_calendar, "Work");
            assert_eq!(config.schedule.max_mutation_retries, 1);
            assert_eq!(config.schedule.max_expansion_iterations, ScheduleConfig::default().max_expansion_iterations);
            Ok(())
        });
    }
}
