use std::error::Error;
use std::io::{BufRead, Write};
use std::sync::Arc;

use log::info;
use quiz_core::model::User;
use services::{AppServices, SessionSummary, TrainingError, TrainingService, UserServiceError};
use storage::repository::StorageError;

use crate::args::Command;

type CommandResult = Result<(), Box<dyn Error>>;

/// Run one parsed command. `input` feeds answers during training.
pub async fn run_command(
    app: &AppServices,
    command: Command,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> CommandResult {
    match command {
        Command::Help => {
            crate::args::print_usage();
            Ok(())
        }
        Command::AddUser { username, name } => {
            let id = app.users().register(&username, &name).await?;
            writeln!(out, "Added user {username} ({id})")?;
            Ok(())
        }
        Command::AddDeck { user, deck } => {
            let user = app.users().require_user(&user).await?;
            let id = app.decks().create_deck(&deck, user.id()).await?;
            writeln!(out, "Added deck {deck:?} ({id}) for {}", user.username())?;
            Ok(())
        }
        Command::AddCard {
            user,
            deck,
            question,
            answer,
            false_answers,
        } => {
            let user = app.users().require_user(&user).await?;
            let deck = app.decks().find_deck_by_name(&deck, user.id()).await?;
            let id = app
                .cards()
                .create_card(deck.id(), &question, &answer, false_answers)
                .await?;
            writeln!(out, "Added card {id} to {:?}", deck.name())?;
            Ok(())
        }
        Command::Decks { user } => list_decks(app, &user, out).await,
        Command::Train {
            user,
            deck,
            first_round,
            rounds,
            seed,
        } => {
            let user = app.users().require_user(&user).await?;
            let deck = app.decks().find_deck_by_name(&deck, user.id()).await?;
            let training = match seed {
                Some(seed) => Arc::new(app.training().as_ref().clone().with_seed(seed)),
                None => app.training(),
            };
            for offset in 0..rounds {
                let round = first_round.map(|first| first.saturating_add(offset));
                if !train_round(&training, deck.id(), round, input, out).await? {
                    break;
                }
            }
            Ok(())
        }
        Command::Seed => seed_demo(app, out).await,
    }
}

async fn list_decks(app: &AppServices, username: &str, out: &mut impl Write) -> CommandResult {
    let user = app.users().require_user(username).await?;
    let decks = app.decks().list_decks(user.id()).await?;
    if decks.is_empty() {
        writeln!(out, "{} has no decks", user.username())?;
        return Ok(());
    }

    let max_box = app.settings().leitner().max_box();
    for deck in decks {
        let stats = app.cards().box_stats(deck.id()).await?;
        let boxes: Vec<String> = (0..=max_box)
            .map(|b| format!("{b}:{}", stats.in_box(b)))
            .collect();
        writeln!(
            out,
            "{:<24} {:>4} card(s)  boxes {}",
            deck.name(),
            stats.total,
            boxes.join(" ")
        )?;
    }
    Ok(())
}

/// Play one round, the deck's saved one unless `round` is given.
/// Returns `false` once input is exhausted.
async fn train_round(
    training: &TrainingService,
    deck_id: quiz_core::model::DeckId,
    round: Option<u32>,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<bool, Box<dyn Error>> {
    let started = match round {
        Some(round) => training.start_round(deck_id, round).await,
        None => training.start_next_round(deck_id).await,
    };
    let mut session = match started {
        Ok(session) => session,
        Err(TrainingError::Empty { round }) => {
            writeln!(out, "Round {round}: nothing due")?;
            return Ok(true);
        }
        Err(e) => return Err(e.into()),
    };
    writeln!(
        out,
        "Round {}: {} card(s)",
        session.round(),
        session.progress().total
    )?;

    while let Some(card) = session.current() {
        let card_id = card.id();
        let correct = card.correct_answer().to_owned();
        writeln!(out)?;
        writeln!(out, "[box {}] {}", card.box_number(), card.question())?;
        let choices = session.current_choices().to_vec();
        for (i, choice) in choices.iter().enumerate() {
            writeln!(out, "  {}) {choice}", i + 1)?;
        }

        let Some(chosen) = read_choice(&choices, input, out)? else {
            writeln!(out)?;
            writeln!(out, "Stopped.")?;
            print_summary(&session.summary(), out)?;
            return Ok(false);
        };

        let applied = training.answer(&mut session, card_id, &chosen).await?;
        if applied.outcome.is_correct() {
            writeln!(out, "Correct! Moved to box {}.", applied.box_number)?;
        } else {
            writeln!(out, "Wrong, it was {correct}. Back to box 0.")?;
        }
    }

    writeln!(out)?;
    print_summary(&session.summary(), out)?;
    Ok(true)
}

fn read_choice(
    choices: &[String],
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<Option<String>, Box<dyn Error>> {
    loop {
        write!(out, "> ")?;
        out.flush()?;
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        match line.trim().parse::<usize>() {
            Ok(n) if (1..=choices.len()).contains(&n) => return Ok(Some(choices[n - 1].clone())),
            _ => writeln!(out, "Pick a number from 1 to {}", choices.len())?,
        }
    }
}

fn print_summary(summary: &SessionSummary, out: &mut impl Write) -> std::io::Result<()> {
    writeln!(
        out,
        "Round {}: {}/{} answered, {} correct, {} incorrect, {} promoted, {} reset",
        summary.round,
        summary.answered(),
        summary.total,
        summary.correct,
        summary.incorrect,
        summary.promoted,
        summary.reset
    )
}

const DEMO_CARDS: &[(&str, &str, &[&str])] = &[
    (
        "What is the capital city of Finland?",
        "Helsinki",
        &["Tokyo", "Oslo", "Shanghai", "Stockholm", "Tallinn"],
    ),
    (
        "What is the capital city of Japan?",
        "Tokyo",
        &["Kyoto", "Osaka", "Seoul", "Beijing"],
    ),
    (
        "What is the capital city of Australia?",
        "Canberra",
        &["Sydney", "Melbourne", "Perth", "Wellington"],
    ),
    (
        "What is the capital city of Canada?",
        "Ottawa",
        &["Toronto", "Montreal", "Vancouver"],
    ),
];

async fn demo_user(app: &AppServices) -> Result<User, UserServiceError> {
    match app.users().register("demo", "Demo Learner").await {
        Ok(_) | Err(UserServiceError::Storage(StorageError::Conflict { .. })) => {}
        Err(e) => return Err(e),
    }
    app.users().require_user("demo").await
}

async fn seed_demo(app: &AppServices, out: &mut impl Write) -> CommandResult {
    let user = demo_user(app).await?;
    if app.decks().find_deck_by_name("Capitals", user.id()).await.is_ok() {
        writeln!(out, "Demo deck already present")?;
        return Ok(());
    }

    let deck_id = app.decks().create_deck("Capitals", user.id()).await?;
    for (question, answer, false_answers) in DEMO_CARDS {
        app.cards()
            .create_card(deck_id, question, answer, false_answers.iter().copied())
            .await?;
    }
    info!("seeded {} demo card(s)", DEMO_CARDS.len());
    writeln!(
        out,
        "Seeded user demo with deck \"Capitals\" ({} cards)",
        DEMO_CARDS.len()
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::QuizSettings;
    use quiz_core::time::fixed_clock;

    fn app_with(settings: QuizSettings) -> AppServices {
        AppServices::in_memory(settings, fixed_clock()).with_seed(1)
    }

    async fn run(app: &AppServices, command: Command, input: &str) -> String {
        let mut out = Vec::new();
        run_command(app, command, &mut input.as_bytes(), &mut out)
            .await
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    fn train(rounds: u32) -> Command {
        Command::Train {
            user: "demo".into(),
            deck: "Capitals".into(),
            first_round: None,
            rounds,
            seed: None,
        }
    }

    #[tokio::test]
    async fn seed_is_idempotent() {
        let app = app_with(QuizSettings::default());
        let first = run(&app, Command::Seed, "").await;
        assert!(first.contains("4 cards"));
        let second = run(&app, Command::Seed, "").await;
        assert!(second.contains("already present"));

        let listing = run(&app, Command::Decks { user: "demo".into() }, "").await;
        assert!(listing.contains("Capitals"));
        assert!(listing.contains("0:4"));
    }

    #[tokio::test]
    async fn single_choice_training_promotes_every_card() {
        let app = app_with(QuizSettings::new(1, 5).unwrap());
        run(&app, Command::Seed, "").await;

        let transcript = run(&app, train(1), "1\n1\n1\n1\n").await;
        assert_eq!(transcript.matches("Correct!").count(), 4);
        assert!(transcript.contains("4 correct, 0 incorrect, 4 promoted"));

        // Everything sits in box 1 now, which round 3 skips.
        let transcript = run(
            &app,
            Command::Train {
                user: "demo".into(),
                deck: "Capitals".into(),
                first_round: Some(3),
                rounds: 1,
                seed: None,
            },
            "",
        )
        .await;
        assert!(transcript.contains("Round 3: nothing due"));
    }

    #[tokio::test]
    async fn repeated_default_training_reaches_higher_boxes() {
        let app = app_with(QuizSettings::new(1, 5).unwrap());
        run(&app, Command::Seed, "").await;
        let all_correct = "1\n1\n1\n1\n";

        let first = run(&app, train(1), all_correct).await;
        assert!(first.contains("Round 1: 4 card(s)"));

        // Box 1 is due again on the next run.
        let second = run(&app, train(1), all_correct).await;
        assert!(second.contains("Round 2: 4 card(s)"));
        assert!(second.contains("4 correct, 0 incorrect, 4 promoted"));

        let third = run(&app, train(1), "").await;
        assert!(third.contains("Round 3: nothing due"));

        let fourth = run(&app, train(1), all_correct).await;
        assert!(fourth.contains("Round 4: 4 card(s)"));
        assert!(fourth.contains("[box 2]"));
    }

    #[tokio::test]
    async fn bad_input_is_reprompted_and_eof_stops() {
        let app = app_with(QuizSettings::new(1, 5).unwrap());
        run(&app, Command::Seed, "").await;

        let transcript = run(&app, train(2), "7\nabc\n1\n").await;
        assert_eq!(transcript.matches("Pick a number from 1 to 1").count(), 2);
        assert!(transcript.contains("Stopped."));
        assert!(transcript.contains("1/4 answered"));
        assert!(!transcript.contains("Round 2"));
    }

    #[tokio::test]
    async fn add_commands_build_a_deck() {
        let app = app_with(QuizSettings::default());
        run(
            &app,
            Command::AddUser {
                username: "ada".into(),
                name: "Ada".into(),
            },
            "",
        )
        .await;
        run(
            &app,
            Command::AddDeck {
                user: "ada".into(),
                deck: "Rivers".into(),
            },
            "",
        )
        .await;
        let added = run(
            &app,
            Command::AddCard {
                user: "ada".into(),
                deck: "Rivers".into(),
                question: "Longest river in Finland?".into(),
                answer: "Kemijoki".into(),
                false_answers: vec!["Oulujoki".into(), "Kokemäenjoki".into()],
            },
            "",
        )
        .await;
        assert!(added.contains("Added card"));

        let mut out = Vec::new();
        let err = run_command(
            &app,
            Command::Decks { user: "grace".into() },
            &mut "".as_bytes(),
            &mut out,
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "user not found");
    }
}
