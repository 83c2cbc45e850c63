use futures::TryStreamExt as _;
use sqlx::Executor;
use yamdb_dal::{
    Error, ListingParams,
    category::{CategoryRepository, CreateCategory},
    comment::{CommentRepository, CreateComment, UpdateComment},
    review::{CreateReview, ReviewRepository, UpdateReview},
    title::{CreateTitle, TitleFilter, TitleRepository, UpdateTitle},
    user::{CreateUser, UpdateUser, UserRepository},
};
use yamdb_types::{claim::Role, general::ValidEmail};

const TEST_DATA: &str = r#"
INSERT INTO users (id, username, email, role, confirmation_nonce)
VALUES (1, 'alice', 'alice@example.com', 'user', 'n1');
INSERT INTO users (id, username, email, role, confirmation_nonce)
VALUES (2, 'bob', 'bob@example.com', 'user', 'n2');
INSERT INTO users (id, username, email, role, confirmation_nonce)
VALUES (3, 'carol', 'carol@example.com', 'moderator', 'n3');

INSERT INTO categories (id, name, slug) VALUES (1, 'Books', 'books');
INSERT INTO categories (id, name, slug) VALUES (2, 'Movies', 'movies');

INSERT INTO genres (id, name, slug) VALUES (1, 'Science fiction', 'sci-fi');
INSERT INTO genres (id, name, slug) VALUES (2, 'Drama', 'drama');

INSERT INTO titles (id, name, year, description, category_id) VALUES (1, 'Dune', 1965, NULL, 1);
INSERT INTO titles (id, name, year, description, category_id) VALUES (2, 'Alien', 1979, NULL, 2);
INSERT INTO titles (id, name, year, description, category_id) VALUES (3, 'Casablanca', 1942, NULL, 2);

INSERT INTO title_genres (title_id, genre_id) VALUES (1, 1);
INSERT INTO title_genres (title_id, genre_id) VALUES (2, 1);
INSERT INTO title_genres (title_id, genre_id) VALUES (3, 2);
"#;

async fn init_db() -> sqlx::Pool<sqlx::Sqlite> {
    const DB_URL: &str = "sqlite::memory:";
    let conn = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .connect(DB_URL)
        .await
        .unwrap();
    conn.execute("PRAGMA foreign_keys = ON").await.unwrap();
    yamdb_dal::migrate(&conn).await.unwrap();

    conn.execute_many(TEST_DATA)
        .try_collect::<Vec<_>>()
        .await
        .unwrap();

    conn
}

fn review(text: &str, score: i64) -> CreateReview {
    CreateReview {
        text: text.to_string(),
        score,
    }
}

#[tokio::test]
async fn test_rating_is_truncated_mean() {
    let conn = init_db().await;
    let titles = TitleRepository::new(conn.clone());
    let reviews = ReviewRepository::new(conn.clone());

    let dune = titles.get(1).await.unwrap();
    assert_eq!(None, dune.rating);

    reviews.create(1, 1, review("great", 8)).await.unwrap();
    reviews.create(1, 2, review("the best", 10)).await.unwrap();
    reviews.create(1, 3, review("fine", 7)).await.unwrap();

    let dune = titles.get(1).await.unwrap();
    // (8 + 10 + 7) / 3 = 8.33
    assert_eq!(Some(8), dune.rating);
    assert_eq!("books", dune.category.unwrap().slug);
    assert_eq!(vec!["sci-fi".to_string()], dune.genre.into_iter().map(|g| g.slug).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_title_filters() {
    let conn = init_db().await;
    let titles = TitleRepository::new(conn.clone());

    let all = titles
        .list(ListingParams::default(), &TitleFilter::default())
        .await
        .unwrap();
    assert_eq!(3, all.total);
    let names: Vec<_> = all.rows.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(vec!["Alien", "Casablanca", "Dune"], names);

    let filter = TitleFilter {
        genre: Some("sci".to_string()),
        ..Default::default()
    };
    let sci_fi = titles.list(ListingParams::default(), &filter).await.unwrap();
    assert_eq!(2, sci_fi.total);

    let filter = TitleFilter {
        genre: Some("sci".to_string()),
        category: Some("MOV".to_string()),
        ..Default::default()
    };
    let batch = titles.list(ListingParams::default(), &filter).await.unwrap();
    assert_eq!(1, batch.total);
    assert_eq!("Alien", batch.rows[0].name);

    let filter = TitleFilter {
        year: Some(1942),
        ..Default::default()
    };
    let batch = titles.list(ListingParams::default(), &filter).await.unwrap();
    assert_eq!("Casablanca", batch.rows[0].name);

    let filter = TitleFilter {
        name: Some("un".to_string()),
        ..Default::default()
    };
    let batch = titles.list(ListingParams::default(), &filter).await.unwrap();
    assert_eq!(1, batch.total);
    assert_eq!("Dune", batch.rows[0].name);

    let filter = TitleFilter {
        name: Some(" ".to_string()),
        category: Some(String::new()),
        genre: Some(String::new()),
        ..Default::default()
    };
    let batch = titles.list(ListingParams::default(), &filter).await.unwrap();
    assert_eq!(3, batch.total);

    let page = titles
        .list(ListingParams::new(2, 2), &TitleFilter::default())
        .await
        .unwrap();
    assert_eq!(3, page.total);
    assert_eq!(1, page.rows.len());
}

#[tokio::test]
async fn test_title_create_and_update() {
    let conn = init_db().await;
    let titles = TitleRepository::new(conn.clone());

    let created = titles
        .create(CreateTitle {
            name: "Solaris".to_string(),
            year: 1961,
            description: Some("Ocean planet".to_string()),
            genre: vec!["sci-fi".to_string(), "drama".to_string(), "sci-fi".to_string()],
            category: "books".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(Some("books".to_string()), created.category);
    assert_eq!(vec!["sci-fi".to_string(), "drama".to_string()], created.genre);

    let updated = titles
        .update(
            created.id,
            UpdateTitle {
                category: Some("movies".to_string()),
                genre: Some(vec!["drama".to_string()]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!("Solaris", updated.name);
    assert_eq!(Some("movies".to_string()), updated.category);
    assert_eq!(vec!["drama".to_string()], updated.genre);

    let res = titles
        .create(CreateTitle {
            name: "Stalker".to_string(),
            year: 1979,
            description: None,
            genre: vec!["western".to_string()],
            category: "movies".to_string(),
        })
        .await;
    assert!(matches!(res, Err(Error::ReferenceNotFound(_))));
    let all = titles
        .list(ListingParams::default(), &TitleFilter::default())
        .await
        .unwrap();
    assert_eq!(4, all.total, "failed create must not leave a title behind");
}

#[tokio::test]
async fn test_deleted_category_leaves_title() {
    let conn = init_db().await;
    let categories = CategoryRepository::new(conn.clone());
    let titles = TitleRepository::new(conn.clone());

    categories.delete("books").await.unwrap();
    let dune = titles.get(1).await.unwrap();
    assert!(dune.category.is_none());

    let res = categories.delete("books").await;
    assert!(matches!(res, Err(Error::RecordNotFound(_))));

    let res = categories
        .create(CreateCategory {
            name: "Other movies".to_string(),
            slug: "movies".to_string(),
        })
        .await;
    assert!(matches!(res, Err(Error::UniqueViolation { .. })));

    let found = categories
        .list(ListingParams::default(), Some("MOV"))
        .await
        .unwrap();
    assert_eq!(1, found.total);
}

#[tokio::test]
async fn test_duplicate_review() {
    let conn = init_db().await;
    let reviews = ReviewRepository::new(conn.clone());

    reviews.create(2, 1, review("scary", 9)).await.unwrap();
    let res = reviews.create(2, 1, review("still scary", 10)).await;
    assert!(matches!(res, Err(Error::DuplicateReview)));

    let res = reviews.create(99, 1, review("nothing", 5)).await;
    assert!(matches!(res, Err(Error::RecordNotFound(_))));
}

#[tokio::test]
async fn test_review_scoped_by_title() {
    let conn = init_db().await;
    let reviews = ReviewRepository::new(conn.clone());

    let created = reviews.create(2, 1, review("scary", 9)).await.unwrap();
    assert_eq!("alice", created.author);
    assert!(reviews.get(1, created.id).await.is_err());

    let updated = reviews
        .update(
            2,
            created.id,
            UpdateReview {
                score: Some(4),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(4, updated.score);
    assert_eq!("scary", updated.text);

    let res = reviews.delete(1, created.id).await;
    assert!(matches!(res, Err(Error::RecordNotFound(_))));
    reviews.delete(2, created.id).await.unwrap();
}

#[tokio::test]
async fn test_comments_newest_first() {
    let conn = init_db().await;
    let reviews = ReviewRepository::new(conn.clone());
    let comments = CommentRepository::new(conn.clone());

    let r = reviews.create(3, 1, review("classic", 10)).await.unwrap();
    for text in ["first", "second", "third"] {
        comments
            .create(
                3,
                r.id,
                2,
                CreateComment {
                    text: text.to_string(),
                },
            )
            .await
            .unwrap();
    }

    let batch = comments
        .list_for_review(3, r.id, ListingParams::default())
        .await
        .unwrap();
    assert_eq!(3, batch.total);
    assert_eq!("third", batch.rows[0].text);
    assert_eq!("bob", batch.rows[0].author);

    let id = batch.rows[0].id;
    let res = comments.get(1, r.id, id).await;
    assert!(matches!(res, Err(Error::RecordNotFound(_))));

    let updated = comments
        .update(
            3,
            r.id,
            id,
            UpdateComment {
                text: Some("edited".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!("edited", updated.text);

    reviews.delete(3, r.id).await.unwrap();
    let res = comments.get(3, r.id, id).await;
    assert!(res.is_err());
}

#[tokio::test]
async fn test_user_uniqueness_and_nonce() {
    let conn = init_db().await;
    let users = UserRepository::new(conn.clone());

    let email: ValidEmail = "dave@example.com".parse().unwrap();
    let dave = users
        .create(CreateUser::new("dave", email).with_role(Role::Admin))
        .await
        .unwrap();
    assert!(dave.is_admin());

    let res = users
        .create(CreateUser::new("dave", "other@example.com".parse().unwrap()))
        .await;
    match res {
        Err(Error::UniqueViolation { field }) => assert_eq!("username", field),
        other => panic!("Unexpected result {other:?}"),
    }

    let state = users.confirmation_state(dave.id).await.unwrap();
    assert!(users
        .consume_nonce(dave.id, &state.confirmation_nonce)
        .await
        .unwrap());
    assert!(!users
        .consume_nonce(dave.id, &state.confirmation_nonce)
        .await
        .unwrap());

    let before = users.confirmation_state(dave.id).await.unwrap();
    let updated = users
        .update(
            dave.id,
            UpdateUser {
                bio: Some("Likes films".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(Some("Likes films".to_string()), updated.bio);
    let after = users.confirmation_state(dave.id).await.unwrap();
    assert_ne!(before.confirmation_nonce, after.confirmation_nonce);
}
