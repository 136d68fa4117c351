#![allow(dead_code)]

use axum::{
    Json, Router,
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::Html,
    routing::get,
};
use crudcrate_filters::{
    AllowedFields, ConditionalFilter, EntityModel, FieldsFilter, FilterBackends, FilterError,
    FilterSettings, QueryParams, SchemaSerializer, SearchMode, ViewConfig,
};
use sea_orm::{
    ConnectOptions, Database, DatabaseConnection, DbErr, EntityTrait, QueryOrder, Schema, Set,
};
use sea_orm_migration::prelude::*;
use std::sync::Arc;
use tower::ServiceExt;

pub mod author {
    use sea_orm::entity::prelude::*;
    use serde::{Deserialize, Serialize};
    use utoipa::ToSchema;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
    #[sea_orm(table_name = "authors")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        pub name: String,
        #[schema(write_only)]
        pub email: String,
        pub active: bool,
        pub verified: bool,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod article {
    use sea_orm::entity::prelude::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "articles")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        pub title: String,
        pub code: String,
        #[sea_orm(column_type = "Text")]
        pub body: String,
        pub published: bool,
        pub featured: bool,
        pub views: i32,
        pub author_id: i32,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod tag {
    use sea_orm::entity::prelude::*;
    use serde::{Deserialize, Serialize};

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "tags")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        pub name: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

pub mod article_tag {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "article_tags")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub article_id: i32,
        #[sea_orm(primary_key, auto_increment = false)]
        pub tag_id: i32,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {}

    impl ActiveModelBehavior for ActiveModel {}
}

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(CreateBlogTables)]
    }
}

pub struct CreateBlogTables;

impl MigrationName for CreateBlogTables {
    fn name(&self) -> &'static str {
        "m20240101_000001_create_blog_tables"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for CreateBlogTables {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let schema = Schema::new(manager.get_database_backend());
        manager
            .create_table(schema.create_table_from_entity(author::Entity))
            .await?;
        manager
            .create_table(schema.create_table_from_entity(article::Entity))
            .await?;
        manager
            .create_table(schema.create_table_from_entity(tag::Entity))
            .await?;
        manager
            .create_table(schema.create_table_from_entity(article_tag::Entity))
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in ["article_tags", "tags", "articles", "authors"] {
            manager
                .drop_table(Table::drop().table(Alias::new(table)).to_owned())
                .await?;
        }
        Ok(())
    }
}

pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    // SQLite has no REGEXP function of its own
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.map_sqlx_sqlite_opts(|options| options.with_regexp());
    let db = Database::connect(options).await?;

    // Run migrations
    Migrator::up(&db, None).await?;
    seed(&db).await?;

    Ok(db)
}

fn new_author(id: i32, name: &str, active: bool, verified: bool) -> author::ActiveModel {
    author::ActiveModel {
        id: Set(id),
        name: Set(name.to_string()),
        email: Set(format!("{}@example.com", name.to_lowercase().replace(' ', "."))),
        active: Set(active),
        verified: Set(verified),
    }
}

#[allow(clippy::too_many_arguments)]
fn new_article(
    id: i32,
    title: &str,
    code: &str,
    body: &str,
    published: bool,
    featured: bool,
    views: i32,
    author_id: i32,
) -> article::ActiveModel {
    article::ActiveModel {
        id: Set(id),
        title: Set(title.to_string()),
        code: Set(code.to_string()),
        body: Set(body.to_string()),
        published: Set(published),
        featured: Set(featured),
        views: Set(views),
        author_id: Set(author_id),
    }
}

async fn seed(db: &DatabaseConnection) -> Result<(), DbErr> {
    author::Entity::insert_many([
        new_author(1, "Ada Lovelace", true, true),
        new_author(2, "Grace Hopper", true, false),
        new_author(3, "Linus Torvalds", false, false),
    ])
    .exec_without_returning(db)
    .await?;

    article::Entity::insert_many([
        new_article(1, "Rust error handling", "RS-101", "Result and the question mark operator", true, false, 120, 1),
        new_article(2, "Async Rust in practice", "RS-202", "Futures, executors and pinning", true, true, 45, 2),
        new_article(3, "Draft: SQL tips", "SQL-1", "Indexes and query plans", false, false, 0, 2),
        new_article(4, "100% coverage myths", "QA_1", "What line coverage does not tell you", true, false, 7, 3),
    ])
    .exec_without_returning(db)
    .await?;

    tag::Entity::insert_many([
        tag::ActiveModel { id: Set(1), name: Set("rust".to_string()) },
        tag::ActiveModel { id: Set(2), name: Set("databases".to_string()) },
    ])
    .exec_without_returning(db)
    .await?;

    article_tag::Entity::insert_many([(1, 1), (2, 1), (3, 2)].map(|(article_id, tag_id)| {
        article_tag::ActiveModel {
            article_id: Set(article_id),
            tag_id: Set(tag_id),
        }
    }))
    .exec_without_returning(db)
    .await?;

    Ok(())
}

pub fn author_model() -> EntityModel {
    EntityModel::of::<author::Entity>().label("verified", "Verified author")
}

pub fn article_model() -> EntityModel {
    EntityModel::of::<article::Entity>()
        .relation(
            "author",
            article::Column::AuthorId,
            author::Column::Id,
            author_model(),
        )
        .many_to_many(
            "tags",
            article::Column::Id,
            article_tag::Column::ArticleId,
            article_tag::Column::TagId,
            tag::Column::Id,
            EntityModel::of::<tag::Entity>(),
        )
}

pub fn article_view() -> ViewConfig {
    ViewConfig::new(article_model())
        .with_conditional_fields(AllowedFields::keys(["published", "featured", "author__active"]))
        .with_filter_fields(["title", "^code", "author__name", "=tags__name", "views__gte"])
}

/// Authors derive their valid conditional fields from the response schema.
pub fn author_view() -> ViewConfig {
    ViewConfig::new(author_model())
        .with_serializer(SchemaSerializer::of::<author::Model>())
        .with_default_conditional(["active"])
        .with_filter_fields(["name", "=email"])
}

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub filters: Arc<FilterBackends>,
    pub articles: Arc<ViewConfig>,
    pub authors: Arc<ViewConfig>,
}

async fn list_articles(
    State(state): State<AppState>,
    params: QueryParams,
) -> Result<Json<Vec<article::Model>>, FilterError> {
    let query = article::Entity::find().order_by_asc(article::Column::Id);
    let query = state
        .filters
        .filter_query(&params, query, state.articles.as_ref())?;
    Ok(Json(query.all(&state.db).await?))
}

async fn list_authors(
    State(state): State<AppState>,
    params: QueryParams,
) -> Result<Json<Vec<author::Model>>, FilterError> {
    let query = author::Entity::find().order_by_asc(author::Column::Id);
    let query = state
        .filters
        .filter_query(&params, query, state.authors.as_ref())?;
    Ok(Json(query.all(&state.db).await?))
}

async fn article_controls(
    State(state): State<AppState>,
    params: QueryParams,
) -> Result<Html<String>, FilterError> {
    let controls = state.filters.to_html(&params, state.articles.as_ref())?;
    Ok(Html(controls.join("\n")))
}

/// Views without a serializer or allow-list cannot use the conditional filter.
async fn list_misconfigured(
    State(state): State<AppState>,
    params: QueryParams,
) -> Result<Json<Vec<author::Model>>, FilterError> {
    let view = ViewConfig::new(author_model());
    let query = state
        .filters
        .filter_query(&params, author::Entity::find().order_by_asc(author::Column::Id), &view)?;
    Ok(Json(query.all(&state.db).await?))
}

pub fn setup_test_app_with(db: DatabaseConnection, settings: &FilterSettings) -> Router {
    let filters = FilterBackends::new()
        .with(ConditionalFilter::new(settings))
        .with(FieldsFilter::new(settings));

    let state = AppState {
        db,
        filters: Arc::new(filters),
        articles: Arc::new(article_view()),
        authors: Arc::new(author_view()),
    };

    let api = Router::new()
        .route("/articles", get(list_articles))
        .route("/articles/controls", get(article_controls))
        .route("/authors", get(list_authors))
        .route("/misconfigured", get(list_misconfigured))
        .with_state(state);

    Router::new().nest("/api/v1", api)
}

pub fn setup_test_app(db: DatabaseConnection) -> Router {
    setup_test_app_with(db, &FilterSettings::default())
}

pub fn per_field_settings() -> FilterSettings {
    FilterSettings::default().with_search_mode(SearchMode::PerField)
}

/// `GET` `uri` and return the status with the decoded JSON body.
pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

pub async fn get_text(app: &Router, uri: &str) -> (StatusCode, String) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

/// Ids of the objects in a JSON list response.
pub fn ids(body: &serde_json::Value) -> Vec<i64> {
    body.as_array()
        .expect("list response")
        .iter()
        .map(|item| item["id"].as_i64().expect("numeric id"))
        .collect()
}
