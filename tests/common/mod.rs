#![allow(dead_code)]

use querycrate::filtering::{Boolean, Comparison, NullCheck, Scalar, SetTest};
use querycrate::{ModelDefinition, ModelRegistry, QueryBuilder, RelationDefinition};
use sea_orm::sea_query::Order;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbErr};
use serde_json::Value as JsonValue;

/// users -> profile (one), country (one), posts (many)
pub fn catalog() -> ModelRegistry {
    ModelRegistry::new()
        .register(
            ModelDefinition::new("User", "users")
                .columns([
                    "id",
                    "name",
                    "email",
                    "age",
                    "status",
                    "profile_id",
                    "country_id",
                    "password",
                ])
                .relation(RelationDefinition::has_one("profile", "Profile", "id", "profile_id"))
                .relation(RelationDefinition::has_one("country", "Country", "id", "country_id"))
                .relation(RelationDefinition::has_many("posts", "Post", "user_id", "id"))
                .hidden(["password"])
                .serializer(|mut row| {
                    if let JsonValue::Object(map) = &mut row {
                        if let Some(JsonValue::String(email)) = map.get("email") {
                            let lowered = email.to_lowercase();
                            map.insert("email".into(), JsonValue::String(lowered));
                        }
                    }
                    row
                }),
        )
        .register(
            ModelDefinition::new("Profile", "profiles")
                .columns(["id", "bio", "city", "country_id"])
                .relation(RelationDefinition::has_one("country", "Country", "id", "country_id")),
        )
        .register(
            ModelDefinition::new("Post", "posts")
                .columns(["id", "user_id", "title", "published"])
                .relation(RelationDefinition::has_one("author", "User", "id", "user_id")),
        )
        .register(ModelDefinition::new("Country", "countries").columns(["id", "name", "code"]))
}

/// Records every builder call as one line of text
#[derive(Debug, Default)]
pub struct RecordingBuilder {
    pub calls: Vec<String>,
}

fn verb(boolean: Boolean) -> &'static str {
    match boolean {
        Boolean::And => "where",
        Boolean::Or => "orWhere",
    }
}

impl QueryBuilder for RecordingBuilder {
    fn select_all(&mut self, table: &str) {
        self.calls.push(format!("select {table}.*"));
    }

    fn select(&mut self, columns: &[String]) {
        self.calls.push(format!("select {}", columns.join(", ")));
    }

    fn where_null(&mut self, boolean: Boolean, column: &str, check: NullCheck) {
        let test = match check {
            NullCheck::IsNull => "IS NULL",
            NullCheck::IsNotNull => "IS NOT NULL",
        };
        self.calls.push(format!("{} {column} {test}", verb(boolean)));
    }

    fn where_compare(&mut self, boolean: Boolean, column: &str, op: Comparison, value: &Scalar) {
        self.calls
            .push(format!("{} {column} {} {value}", verb(boolean), op.symbol()));
    }

    fn where_set(&mut self, boolean: Boolean, column: &str, op: SetTest, values: &[Scalar]) {
        let values: Vec<String> = values.iter().map(ToString::to_string).collect();
        self.calls.push(format!(
            "{} {column} {} [{}]",
            verb(boolean),
            op.symbol(),
            values.join(",")
        ));
    }

    fn where_group(&mut self, boolean: Boolean, build: &mut dyn FnMut(&mut Self)) {
        self.calls.push(format!("{} (", verb(boolean)));
        build(self);
        self.calls.push(")".to_string());
    }

    fn left_join(&mut self, table: &str, first: &str, second: &str) {
        self.calls.push(format!("leftJoin {table} on {first} = {second}"));
    }

    fn order_by(&mut self, column: &str, direction: Order) {
        let direction = match direction {
            Order::Desc => "desc",
            _ => "asc",
        };
        self.calls.push(format!("orderBy {column} {direction}"));
    }

    fn paginate(&mut self, per_page: u64, current_page: u64) {
        self.calls.push(format!("paginate {per_page} {current_page}"));
    }
}

const SCHEMA: [&str; 4] = [
    "CREATE TABLE countries (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        code TEXT NOT NULL
    )",
    "CREATE TABLE profiles (
        id INTEGER PRIMARY KEY,
        bio TEXT,
        city TEXT,
        country_id INTEGER REFERENCES countries(id)
    )",
    "CREATE TABLE users (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT NOT NULL,
        age INTEGER,
        status TEXT,
        profile_id INTEGER REFERENCES profiles(id),
        country_id INTEGER REFERENCES countries(id),
        password TEXT NOT NULL
    )",
    "CREATE TABLE posts (
        id INTEGER PRIMARY KEY,
        user_id INTEGER NOT NULL REFERENCES users(id),
        title TEXT NOT NULL,
        published INTEGER NOT NULL
    )",
];

const SEED: [&str; 4] = [
    "INSERT INTO countries (id, name, code) VALUES
        (1, 'Switzerland', 'CH'),
        (2, 'Norway', 'NO')",
    "INSERT INTO profiles (id, bio, city, country_id) VALUES
        (1, 'Mathematician', 'London', NULL),
        (2, 'Compilers', 'Bern', 1),
        (3, NULL, 'Oslo', 2)",
    "INSERT INTO users (id, name, email, age, status, profile_id, country_id, password) VALUES
        (1, 'Ada', 'ADA@example.com', 36, 'active', 1, NULL, 'secret'),
        (2, 'Grace', 'grace@example.com', 85, 'active', 2, 1, 'secret'),
        (3, 'Linus', 'linus@example.com', 28, NULL, 3, 2, 'secret'),
        (4, 'Barbara', 'barbara@example.com', 17, 'banned', NULL, 1, 'secret'),
        (5, 'Edsger', 'edsger@example.com', 72, 'active', NULL, NULL, 'secret')",
    "INSERT INTO posts (id, user_id, title, published) VALUES
        (1, 1, 'Notes', 1),
        (2, 1, 'Engines', 0),
        (3, 2, 'Debugging', 1)",
];

/// Route library logs to the test harness; safe to call from every test
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// In-memory SQLite database seeded with five users
pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect("sqlite::memory:").await?;

    for statement in SCHEMA.iter().chain(SEED.iter()) {
        db.execute_unprepared(statement).await?;
    }

    Ok(db)
}
