use std::sync::Arc;

use async_trait::async_trait;
use quiz_core::model::{CardId, DeckId, QuizCard, QuizSettings};
use quiz_core::scheduler::SchedulerError;
use quiz_core::time::fixed_now;
use services::{AppServices, Clock, QuizService, QuizServiceError, TrainingError, TrainingService};
use storage::repository::{CardRepository, InMemoryRepository, NewCardRecord, StorageError};

async fn capitals() -> (AppServices, DeckId, CardId) {
    let app = AppServices::in_memory(QuizSettings::default(), Clock::fixed(fixed_now())).with_seed(7);
    let user = app.users().register("ada", "Ada Lovelace").await.unwrap();
    let deck = app.decks().create_deck("Capitals", user).await.unwrap();
    let card = app
        .cards()
        .create_card(
            deck,
            "What is the capital city of Finland?",
            "Helsinki",
            ["Tokyo", "Oslo", "Shanghai", "Stockholm", "Tallinn"],
        )
        .await
        .unwrap();
    (app, deck, card)
}

fn wrong_choice(choices: &[String], correct: &str) -> String {
    choices.iter().find(|c| *c != correct).cloned().unwrap()
}

#[tokio::test]
async fn correct_answers_climb_to_the_top_box() {
    let (app, deck, card_id) = capitals().await;
    let training = app.training();

    // Round 0 reviews every box.
    for expected in [1, 2, 3, 4, 4] {
        let mut session = training.start_round(deck, 0).await.unwrap();
        let applied = training.answer_current(&mut session, "Helsinki").await.unwrap();
        assert_eq!(applied.box_number, expected);
        assert!(session.is_complete());
    }

    let card = app.cards().get_card(card_id).await.unwrap().unwrap();
    assert_eq!(card.box_number(), 4);
}

#[tokio::test]
async fn wrong_answer_resets_to_box_zero() {
    let (app, deck, card_id) = capitals().await;
    let training = app.training();

    let mut session = training.start_round(deck, 0).await.unwrap();
    training.answer_current(&mut session, "Helsinki").await.unwrap();

    let mut session = training.start_round(deck, 0).await.unwrap();
    let wrong = wrong_choice(session.current_choices(), "Helsinki");
    let applied = training.answer(&mut session, card_id, &wrong).await.unwrap();
    assert_eq!(applied.previous_box, 1);
    assert_eq!(applied.box_number, 0);

    let summary = session.summary();
    assert_eq!(summary.incorrect, 1);
    assert_eq!(summary.reset, 1);
    assert_eq!(app.cards().get_card(card_id).await.unwrap().unwrap().box_number(), 0);
}

#[tokio::test]
async fn higher_boxes_are_reviewed_less_often() {
    let (app, deck, _) = capitals().await;
    let training = app.training();

    let mut session = training.start_round(deck, 1).await.unwrap();
    training.answer_current(&mut session, "Helsinki").await.unwrap();

    // Box 1 is reviewed every second round.
    assert!(matches!(
        training.start_round(deck, 1).await,
        Err(TrainingError::Empty { round: 1 })
    ));
    assert!(training.start_round(deck, 2).await.is_ok());
}

#[tokio::test]
async fn next_round_walks_the_cadence_across_sessions() {
    let (app, deck, card_id) = capitals().await;
    let training = app.training();
    assert_eq!(training.next_round(deck).await.unwrap(), 1);

    // Round 1: box 0 only.
    let mut session = training.start_next_round(deck).await.unwrap();
    assert_eq!(session.round(), 1);
    training.answer_current(&mut session, "Helsinki").await.unwrap();
    assert_eq!(training.next_round(deck).await.unwrap(), 2);

    // Round 2 brings the box-1 card back.
    let mut session = training.start_next_round(deck).await.unwrap();
    assert_eq!(session.round(), 2);
    assert_eq!(session.current().unwrap().id(), card_id);
    training.answer_current(&mut session, "Helsinki").await.unwrap();

    // Box 2 is skipped in round 3; the empty round still moves the deck on.
    assert!(matches!(
        training.start_next_round(deck).await,
        Err(TrainingError::Empty { round: 3 })
    ));
    let session = training.start_next_round(deck).await.unwrap();
    assert_eq!(session.round(), 4);
}

#[tokio::test]
async fn unfinished_round_is_replayed() {
    let (app, deck, _) = capitals().await;
    app.cards()
        .create_card(deck, "Capital of Norway?", "Oslo", ["Bergen", "Helsinki"])
        .await
        .unwrap();
    let training = app.training();

    let mut session = training.start_next_round(deck).await.unwrap();
    training.answer_current(&mut session, "Helsinki").await.unwrap();
    assert!(!session.is_complete());
    assert_eq!(training.next_round(deck).await.unwrap(), 1);
}

#[tokio::test]
async fn answering_another_card_is_invalid_state() {
    let (app, deck, first) = capitals().await;
    let second = app
        .cards()
        .create_card(deck, "Capital of Norway?", "Oslo", ["Bergen", "Helsinki"])
        .await
        .unwrap();
    let training = app.training();

    let mut session = training.start_round(deck, 0).await.unwrap();
    assert_eq!(session.current().unwrap().id(), first);

    let err = training.answer(&mut session, second, "Oslo").await.unwrap_err();
    assert!(matches!(
        err,
        TrainingError::Scheduler(SchedulerError::UntrackedCard { .. })
    ));
    assert!(err.to_string().starts_with("invalid state"));
    assert_eq!(session.progress().answered, 0);
}

#[tokio::test]
async fn seeded_sessions_repeat_their_choices() {
    let (app, deck, _) = capitals().await;
    let a = app.training().start_round(deck, 0).await.unwrap();
    let b = app.training().start_round(deck, 0).await.unwrap();
    assert_eq!(a.current_choices(), b.current_choices());
    assert_eq!(a.current_choices().len(), 3);
}

/// Card store whose box writes always fail.
#[derive(Clone)]
struct FailingBoxWrites {
    inner: InMemoryRepository,
}

#[async_trait]
impl CardRepository for FailingBoxWrites {
    async fn insert_new_card(&self, card: NewCardRecord) -> Result<CardId, StorageError> {
        self.inner.insert_new_card(card).await
    }

    async fn get_card(&self, id: CardId) -> Result<Option<QuizCard>, StorageError> {
        self.inner.get_card(id).await
    }

    async fn cards_by_deck(&self, deck_id: DeckId) -> Result<Vec<QuizCard>, StorageError> {
        self.inner.cards_by_deck(deck_id).await
    }

    async fn update_card_box(&self, _id: CardId, _box_number: u32) -> Result<(), StorageError> {
        Err(StorageError::Connection("disk full".into()))
    }

    async fn delete_card(&self, id: CardId) -> Result<(), StorageError> {
        self.inner.delete_card(id).await
    }
}

#[tokio::test]
async fn failed_box_write_keeps_the_session_on_the_card() {
    let repo = InMemoryRepository::new();
    let storage = storage::Storage {
        users: Arc::new(repo.clone()),
        decks: Arc::new(repo.clone()),
        cards: Arc::new(repo.clone()),
    };
    let app = AppServices::from_storage(&storage, QuizSettings::default(), Clock::fixed(fixed_now()));
    let user = app.users().register("ada", "Ada").await.unwrap();
    let deck = app.decks().create_deck("Capitals", user).await.unwrap();
    let card_id = app
        .cards()
        .create_card(deck, "Capital of Finland?", "Helsinki", ["Oslo", "Tallinn"])
        .await
        .unwrap();

    let quiz = QuizService::new(
        &QuizSettings::default(),
        Arc::new(FailingBoxWrites { inner: repo.clone() }),
    );
    let training = TrainingService::new(Clock::fixed(fixed_now()), quiz, Arc::new(repo.clone()));

    let mut session = training.start_round(deck, 0).await.unwrap();
    let err = training.answer_current(&mut session, "Helsinki").await.unwrap_err();
    assert!(matches!(
        err,
        TrainingError::Quiz(QuizServiceError::SaveBox { card_id: id, .. }) if id == card_id
    ));

    assert!(!session.is_complete());
    assert_eq!(training.next_round(deck).await.unwrap(), 1);
    assert_eq!(session.current().unwrap().box_number(), 0);
    assert_eq!(repo.get_card(card_id).await.unwrap().unwrap().box_number(), 0);
}
