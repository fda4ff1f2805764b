use std::fmt;

use quiz_core::model::{QuizSettings, SettingsError};
use quiz_core::choices::DEFAULT_CHOICE_COUNT;
use quiz_core::scheduler::DEFAULT_BOX_COUNT;

pub const DEFAULT_DB_URL: &str = "sqlite://quiz.sqlite3";

#[derive(Debug)]
pub enum ArgsError {
    MissingCommand,
    UnknownCommand(String),
    MissingValue { flag: &'static str },
    MissingFlag { flag: &'static str },
    UnknownArg(String),
    InvalidNumber { flag: &'static str, raw: String },
    InvalidDbUrl { raw: String },
    Settings(SettingsError),
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingCommand => write!(f, "missing command"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown command: {cmd}"),
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingFlag { flag } => write!(f, "{flag} is required"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::Settings(e) => write!(f, "invalid settings: {e}"),
        }
    }
}

impl std::error::Error for ArgsError {}

impl From<SettingsError> for ArgsError {
    fn from(e: SettingsError) -> Self {
        ArgsError::Settings(e)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    AddUser {
        username: String,
        name: String,
    },
    AddDeck {
        user: String,
        deck: String,
    },
    AddCard {
        user: String,
        deck: String,
        question: String,
        answer: String,
        false_answers: Vec<String>,
    },
    Decks {
        user: String,
    },
    Train {
        user: String,
        deck: String,
        /// `None` continues from the deck's saved round.
        first_round: Option<u32>,
        rounds: u32,
        seed: Option<u64>,
    },
    Seed,
    Help,
}

/// Parsed command line plus environment defaults.
#[derive(Debug, Clone)]
pub struct Args {
    pub db_url: String,
    pub settings: QuizSettings,
    pub command: Command,
}

pub fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  quiz-trainer add-user --username <u> --name <n>");
    eprintln!("  quiz-trainer add-deck --user <u> --deck <name>");
    eprintln!(
        "  quiz-trainer add-card --user <u> --deck <name> --question <q> --answer <a> --false <f> [--false <f> ...]"
    );
    eprintln!("  quiz-trainer decks    --user <u>");
    eprintln!(
        "  quiz-trainer train    --user <u> --deck <name> [--round <n>] [--rounds <n>] [--seed <n>]"
    );
    eprintln!("  quiz-trainer seed");
    eprintln!();
    eprintln!("Global flags:");
    eprintln!("  --db <sqlite_url>   (default {DEFAULT_DB_URL})");
    eprintln!("  --choices <n>       (default {DEFAULT_CHOICE_COUNT})");
    eprintln!("  --boxes <n>         (default {DEFAULT_BOX_COUNT})");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_CHOICES, QUIZ_BOXES, RUST_LOG");
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_number<T: std::str::FromStr>(flag: &'static str, raw: String) -> Result<T, ArgsError> {
    raw.trim()
        .parse()
        .map_err(|_| ArgsError::InvalidNumber { flag, raw })
}

fn required(value: Option<String>, flag: &'static str) -> Result<String, ArgsError> {
    value.ok_or(ArgsError::MissingFlag { flag })
}

/// Command options before they are checked for completeness.
#[derive(Default)]
struct Flags {
    username: Option<String>,
    name: Option<String>,
    user: Option<String>,
    deck: Option<String>,
    question: Option<String>,
    answer: Option<String>,
    false_answers: Vec<String>,
    round: Option<u32>,
    rounds: Option<u32>,
    seed: Option<u64>,
}

impl Args {
    /// Parse `argv` (without the program name). `env` supplies
    /// `QUIZ_DB_URL`, `QUIZ_CHOICES` and `QUIZ_BOXES`; flags win over it.
    pub fn parse(
        argv: impl IntoIterator<Item = String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ArgsError> {
        let mut db_url = env("QUIZ_DB_URL").unwrap_or_else(|| DEFAULT_DB_URL.into());
        let mut choices: usize = match env("QUIZ_CHOICES") {
            Some(raw) => parse_number("QUIZ_CHOICES", raw)?,
            None => DEFAULT_CHOICE_COUNT,
        };
        let mut boxes: usize = match env("QUIZ_BOXES") {
            Some(raw) => parse_number("QUIZ_BOXES", raw)?,
            None => DEFAULT_BOX_COUNT,
        };

        let mut args = argv.into_iter();
        let mut command_name: Option<String> = None;
        let mut flags = Flags::default();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--choices" => choices = parse_number("--choices", require_value(&mut args, "--choices")?)?,
                "--boxes" => boxes = parse_number("--boxes", require_value(&mut args, "--boxes")?)?,
                "--username" => flags.username = Some(require_value(&mut args, "--username")?),
                "--name" => flags.name = Some(require_value(&mut args, "--name")?),
                "--user" => flags.user = Some(require_value(&mut args, "--user")?),
                "--deck" => flags.deck = Some(require_value(&mut args, "--deck")?),
                "--question" => flags.question = Some(require_value(&mut args, "--question")?),
                "--answer" => flags.answer = Some(require_value(&mut args, "--answer")?),
                "--false" => flags.false_answers.push(require_value(&mut args, "--false")?),
                "--round" => flags.round = Some(parse_number("--round", require_value(&mut args, "--round")?)?),
                "--rounds" => flags.rounds = Some(parse_number("--rounds", require_value(&mut args, "--rounds")?)?),
                "--seed" => flags.seed = Some(parse_number("--seed", require_value(&mut args, "--seed")?)?),
                "--help" | "-h" => command_name = Some("help".into()),
                other if other.starts_with("--") => return Err(ArgsError::UnknownArg(arg)),
                _ if command_name.is_none() => command_name = Some(arg),
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let command = match command_name.as_deref() {
            None => return Err(ArgsError::MissingCommand),
            Some("help") => Command::Help,
            Some("add-user") => Command::AddUser {
                username: required(flags.username, "--username")?,
                name: required(flags.name, "--name")?,
            },
            Some("add-deck") => Command::AddDeck {
                user: required(flags.user, "--user")?,
                deck: required(flags.deck, "--deck")?,
            },
            Some("add-card") => Command::AddCard {
                user: required(flags.user, "--user")?,
                deck: required(flags.deck, "--deck")?,
                question: required(flags.question, "--question")?,
                answer: required(flags.answer, "--answer")?,
                false_answers: flags.false_answers,
            },
            Some("decks") => Command::Decks {
                user: required(flags.user, "--user")?,
            },
            Some("train") => Command::Train {
                user: required(flags.user, "--user")?,
                deck: required(flags.deck, "--deck")?,
                first_round: flags.round,
                rounds: flags.rounds.unwrap_or(1),
                seed: flags.seed,
            },
            Some("seed") => Command::Seed,
            Some(other) => return Err(ArgsError::UnknownCommand(other.to_owned())),
        };

        Ok(Self {
            db_url: normalize_sqlite_url(&db_url),
            settings: QuizSettings::new(choices, boxes)?,
            command,
        })
    }
}

/// Turn a bare path or `sqlite:` URL into `sqlite://<path>?mode=rwc` so the
/// file is created on first use.
pub fn normalize_sqlite_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.contains(":memory:") || trimmed.contains("mode=") {
        return trimmed.to_owned();
    }

    let path = trimmed
        .strip_prefix("sqlite://")
        .or_else(|| trimmed.strip_prefix("sqlite:"))
        .unwrap_or(trimmed);
    let separator = if path.contains('?') { '&' } else { '?' };
    format!("sqlite://{path}{separator}mode=rwc")
}
