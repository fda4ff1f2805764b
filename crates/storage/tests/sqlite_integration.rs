use quiz_core::model::{Deck, DeckId, QuizCardDraft, User, UserId};
use quiz_core::time::fixed_now;
use storage::repository::{
    CardRepository, DeckRepository, NewDeckRecord, NewUserRecord, StorageError, UserRepository,
};
use storage::sqlite::SqliteRepository;

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

async fn add_user(repo: &SqliteRepository, username: &str) -> UserId {
    let user = User::new(UserId::new(0), username, "Test User", fixed_now()).unwrap();
    repo.insert_new_user(NewUserRecord::from_user(&user))
        .await
        .expect("insert user")
}

async fn add_deck(repo: &SqliteRepository, user_id: UserId, name: &str) -> DeckId {
    let deck = Deck::new(DeckId::new(0), user_id, name, fixed_now()).unwrap();
    repo.insert_new_deck(NewDeckRecord::from_deck(&deck))
        .await
        .expect("insert deck")
}

#[tokio::test]
async fn sqlite_roundtrips_cards_and_box_updates() {
    let repo = connect("memdb_quiz_roundtrip").await;
    let user = add_user(&repo, "ada").await;
    let deck = add_deck(&repo, user, "Capitals").await;

    let draft = QuizCardDraft::new(
        deck,
        "What is the capital city of Finland?",
        "Helsinki",
        ["Tokyo", "Oslo", "Shanghai", "Stockholm", "Tallinn"],
    );
    let card_id = repo
        .insert_new_card(draft.validate(fixed_now()).unwrap().into())
        .await
        .unwrap();

    let cards = repo.cards_by_deck(deck).await.unwrap();
    assert_eq!(cards.len(), 1);
    let card = &cards[0];
    assert_eq!(card.id(), card_id);
    assert_eq!(card.box_number(), 0);
    assert_eq!(card.correct_answer(), "Helsinki");
    assert_eq!(card.false_answers().len(), 5);
    assert_eq!(card.false_answers()[4], "Tallinn");
    assert_eq!(card.created_at(), fixed_now());

    repo.update_card_box(card_id, 2).await.unwrap();
    let fetched = repo.get_card(card_id).await.unwrap().expect("card");
    assert_eq!(fetched.box_number(), 2);

    let err = repo.update_card_box(quiz_core::model::CardId::new(404), 1).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound { entity: "card" }));
}

#[tokio::test]
async fn sqlite_finds_and_lists_decks_per_user() {
    let repo = connect("memdb_quiz_decks").await;
    let ada = add_user(&repo, "ada").await;
    let grace = add_user(&repo, "grace").await;

    let capitals = add_deck(&repo, ada, "Capitals").await;
    let rivers = add_deck(&repo, ada, "Rivers").await;
    add_deck(&repo, grace, "Capitals").await;

    let found = repo.find_deck_by_name("Capitals", ada).await.unwrap();
    assert_eq!(found.id(), capitals);
    assert_eq!(found.user_id(), ada);

    let listed: Vec<DeckId> = repo
        .list_decks_by_user(ada)
        .await
        .unwrap()
        .iter()
        .map(Deck::id)
        .collect();
    assert_eq!(listed, vec![capitals, rivers]);

    let missing = repo.find_deck_by_name("Lakes", ada).await.unwrap_err();
    assert!(missing.is_not_found());

    let dup = Deck::new(DeckId::new(0), ada, "Capitals", fixed_now()).unwrap();
    let err = repo
        .insert_new_deck(NewDeckRecord::from_deck(&dup))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Conflict { entity: "deck" }));
}

#[tokio::test]
async fn sqlite_enforces_unique_usernames_and_owners() {
    let repo = connect("memdb_quiz_users").await;
    let ada = add_user(&repo, "ada").await;

    let found = repo.find_user_by_username("ada").await.unwrap().expect("user");
    assert_eq!(found.id(), ada);
    assert!(repo.find_user_by_username("nobody").await.unwrap().is_none());

    let dup = User::new(UserId::new(0), "ada", "Someone Else", fixed_now()).unwrap();
    let err = repo
        .insert_new_user(NewUserRecord::from_user(&dup))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Conflict { entity: "user" }));

    let orphan = Deck::new(DeckId::new(0), UserId::new(999), "Orphan", fixed_now()).unwrap();
    let err = repo
        .insert_new_deck(NewDeckRecord::from_deck(&orphan))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound { entity: "user" }));
}

#[tokio::test]
async fn sqlite_deletes_cascade_from_user_to_cards() {
    let repo = connect("memdb_quiz_cascade").await;
    let ada = add_user(&repo, "ada").await;
    let deck = add_deck(&repo, ada, "Capitals").await;
    let card = repo
        .insert_new_card(
            QuizCardDraft::new(deck, "Q", "A", ["B", "C"])
                .validate(fixed_now())
                .unwrap()
                .into(),
        )
        .await
        .unwrap();

    repo.delete_user(ada).await.unwrap();

    assert!(repo.get_user(ada).await.unwrap().is_none());
    assert!(repo.get_deck(deck).await.unwrap().is_none());
    assert!(repo.get_card(card).await.unwrap().is_none());
    assert!(repo.delete_deck(deck).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn sqlite_migrations_are_idempotent() {
    let repo = connect("memdb_quiz_migrate_twice").await;
    repo.migrate().await.expect("second migrate");
    add_user(&repo, "ada").await;
}

#[tokio::test]
async fn sqlite_keeps_the_next_round_per_deck() {
    let repo = connect("memdb_quiz_next_round").await;
    let user = add_user(&repo, "ada").await;
    let capitals = add_deck(&repo, user, "Capitals").await;
    let rivers = add_deck(&repo, user, "Rivers").await;

    assert_eq!(repo.next_round(capitals).await.unwrap(), 1);
    repo.set_next_round(capitals, 4).await.unwrap();
    assert_eq!(repo.next_round(capitals).await.unwrap(), 4);
    assert_eq!(repo.next_round(rivers).await.unwrap(), 1);

    let missing = DeckId::new(9_999);
    assert!(matches!(
        repo.next_round(missing).await,
        Err(StorageError::NotFound { entity: "deck" })
    ));
    assert!(repo.set_next_round(missing, 2).await.unwrap_err().is_not_found());
}
