//! Entities shared by the unit tests.

use sea_orm::{DbBackend, EntityTrait, QueryFilter, QueryTrait, sea_query::IntoCondition};

use crate::introspection::EntityModel;

pub mod author {
    use sea_orm::entity::prelude::*;

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
    #[sea_orm(table_name = "authors")]
    pub struct Model {
        #[sea_orm(primary_key)]
        pub id: i32,
        pub name: String,
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

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
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

    #[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
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

/// Articles with `author` and `tags` relations registered.
pub fn article_model() -> EntityModel {
    EntityModel::of::<article::Entity>()
        .relation(
            "author",
            article::Column::AuthorId,
            author::Column::Id,
            EntityModel::of::<author::Entity>(),
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

/// SQL of `SELECT ... FROM articles WHERE <condition>` for `backend`.
pub fn article_sql(condition: impl IntoCondition, backend: DbBackend) -> String {
    article::Entity::find()
        .filter(condition)
        .build(backend)
        .to_string()
}
