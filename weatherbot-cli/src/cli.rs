use anyhow::Context;
use chrono::Local;
use clap::{Parser, Subcommand};
use inquire::{InquireError, Password, PasswordDisplayMode, Text};
use weatherbot_core::{
    Config, GeminiClient, InteractionLog, OpenWeatherGateway, WeatherAssistant,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weatherbot", version, about = "Ask about the weather in plain language")]
pub struct Cli {
    /// Show debug logging on stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Answer a single question, e.g. `weatherbot ask "weather in Boston tomorrow"`.
    Ask {
        /// The question; multiple words are joined with spaces.
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },

    /// Start an interactive conversation.
    Chat,

    /// Store API keys in the config file.
    Configure,

    /// Check the configured API keys against the services.
    Check,

    /// Show recent questions and answers.
    History {
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Ask { query } => {
                let assistant = build_assistant()?;
                let answer = assistant.process(Some(&query.join(" "))).await?;
                println!("{answer}");
            }
            Command::Chat => chat().await?,
            Command::Configure => configure()?,
            Command::Check => check().await?,
            Command::History { limit } => history(limit)?,
        }

        Ok(())
    }
}

fn build_assistant() -> anyhow::Result<WeatherAssistant> {
    let config = Config::load()?;
    config.validate()?;
    WeatherAssistant::from_config(&config).context("Failed to set up the assistant")
}

async fn chat() -> anyhow::Result<()> {
    let assistant = build_assistant()?;
    println!(
        "Ask me about the weather (answers: {}). Type `quit` to leave.",
        assistant.composer().mode()
    );

    loop {
        let line = match Text::new(">").prompt() {
            Ok(line) => line,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => break,
            Err(e) => return Err(e).context("Failed to read input"),
        };

        let trimmed = line.trim();
        if matches!(trimmed.to_lowercase().as_str(), "quit" | "exit" | "bye") {
            break;
        }
        if trimmed.is_empty() {
            continue;
        }

        let answer = assistant.process(Some(trimmed)).await?;
        println!("{answer}\n");
    }

    println!("Goodbye!");
    Ok(())
}

fn configure() -> anyhow::Result<()> {
    let mut config = Config::load_file()?;

    let openweather = Password::new("OpenWeatherMap API key:")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .with_help_message("https://home.openweathermap.org/api_keys")
        .prompt()
        .context("Failed to read OpenWeatherMap API key")?;
    if !openweather.trim().is_empty() {
        config.set_openweather_api_key(openweather.trim().to_string());
    }

    let gemini = Password::new("Gemini API key (leave empty for template answers):")
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("Failed to read Gemini API key")?;
    if !gemini.trim().is_empty() {
        config.set_gemini_api_key(gemini.trim().to_string());
    }

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

async fn check() -> anyhow::Result<()> {
    let config = Config::load()?;

    match OpenWeatherGateway::from_config(&config) {
        Ok(gateway) => match gateway.verify_api_key().await {
            Ok(true) => println!("OpenWeatherMap: ok"),
            Ok(false) => println!("OpenWeatherMap: key rejected"),
            Err(e) => println!("OpenWeatherMap: {e}"),
        },
        Err(e) => println!("OpenWeatherMap: {e}"),
    }

    match GeminiClient::from_config(&config)? {
        Some(client) => match client.verify_api_key().await {
            Ok(true) => println!("Gemini: ok"),
            Ok(false) => println!("Gemini: key rejected"),
            Err(e) => println!("Gemini: {e}"),
        },
        None => println!("Gemini: not configured, template answers will be used"),
    }

    Ok(())
}

fn history(limit: usize) -> anyhow::Result<()> {
    let config = Config::load()?;
    let log = InteractionLog::new(config.history_file_path()?);

    let entries = log.recent(limit)?;
    if entries.is_empty() {
        println!("No interactions recorded yet.");
        return Ok(());
    }

    for entry in entries {
        println!(
            "[{}] {}\n  {}\n",
            entry.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S"),
            entry.query,
            entry.response.replace('\n', "\n  ")
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn ask_joins_words() {
        let cli = Cli::try_parse_from(["weatherbot", "ask", "weather", "in", "Boston"]).unwrap();
        match cli.command {
            Command::Ask { query } => assert_eq!(query.join(" "), "weather in Boston"),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn ask_requires_a_query() {
        assert!(Cli::try_parse_from(["weatherbot", "ask"]).is_err());
    }

    #[test]
    fn history_limit_defaults_to_ten() {
        let cli = Cli::try_parse_from(["weatherbot", "-v", "history"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::History { limit: 10 }));
    }
}
