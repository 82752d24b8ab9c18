//! PostgreSQL repository implementations.

use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, FromQueryResult, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};
use uuid::Uuid;

use quill_core::domain::{
    Category, CategoryCount, Comment, CommentWithAuthor, Post, PostWithAuthor, Profile, User,
};
use quill_core::error::RepoError;
use quill_core::ports::{
    CategoryRepository, CommentRepository, Page, PostRepository, ProfileRepository, UserRepository,
};

use super::entity::category::{self, Entity as CategoryEntity};
use super::entity::comment::{self, Entity as CommentEntity};
use super::entity::post::{self, Entity as PostEntity};
use super::entity::post_category::{self, Entity as PostCategoryEntity};
use super::entity::profile::Entity as ProfileEntity;
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{PostgresBaseRepository, map_db_err};

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL profile repository.
pub type PostgresProfileRepository = PostgresBaseRepository<ProfileEntity>;

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

/// PostgreSQL category repository.
pub type PostgresCategoryRepository = PostgresBaseRepository<CategoryEntity>;

/// PostgreSQL comment repository.
pub type PostgresCommentRepository = PostgresBaseRepository<CommentEntity>;

/// Escapes LIKE wildcards so user-supplied search terms match literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Masks the local part of an email address so logs never carry PII.
fn mask_email(email: &str) -> String {
    match email.find('@') {
        Some(at_pos) => {
            let (local, domain) = email.split_at(at_pos);
            match local.chars().next() {
                Some(first) if local.chars().count() > 1 => format!("{first}***{domain}"),
                _ => format!("***{domain}"),
            }
        }
        None => "***".to_string(),
    }
}

fn missing_author() -> RepoError {
    RepoError::Query("row is missing its author".to_string())
}

fn collect_posts_with_authors(
    rows: Vec<(post::Model, Option<user::Model>)>,
) -> Result<Vec<PostWithAuthor>, RepoError> {
    rows.into_iter()
        .map(|(post, author)| {
            let author = author.ok_or_else(missing_author)?;
            Ok(PostWithAuthor {
                post: post.into(),
                author: author.into(),
            })
        })
        .collect()
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let result = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(user_email = %mask_email(email), "Finding user by email");

        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn update_with_profile(
        &self,
        user: User,
        profile: Profile,
    ) -> Result<(User, Profile), RepoError> {
        let txn = self.db.begin().await.map_err(map_db_err)?;

        let user_model = user::ActiveModel::from(user)
            .update(&txn)
            .await
            .map_err(map_db_err)?;
        let profile_model = super::entity::profile::ActiveModel::from(profile)
            .update(&txn)
            .await
            .map_err(map_db_err)?;

        txn.commit().await.map_err(map_db_err)?;

        Ok((user_model.into(), profile_model.into()))
    }
}

impl ProfileRepository for PostgresProfileRepository {}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Post>, RepoError> {
        let result = PostEntity::find()
            .filter(post::Column::Slug.eq(slug))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn find_by_slug_with_author(
        &self,
        slug: &str,
    ) -> Result<Option<PostWithAuthor>, RepoError> {
        let row = PostEntity::find()
            .filter(post::Column::Slug.eq(slug))
            .find_also_related(UserEntity)
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        match row {
            Some((found, author)) => {
                let author = author.ok_or_else(missing_author)?;
                Ok(Some(PostWithAuthor {
                    post: found.into(),
                    author: author.into(),
                }))
            }
            None => Ok(None),
        }
    }

    async fn page_all(&self, page: u64, per_page: u64) -> Result<Page<PostWithAuthor>, RepoError> {
        let paginator = PostEntity::find()
            .order_by_desc(post::Column::CreatedAt)
            .find_also_related(UserEntity)
            .paginate(&self.db, per_page);

        let totals = paginator.num_items_and_pages().await.map_err(map_db_err)?;
        let rows = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(map_db_err)?;

        Ok(Page {
            items: collect_posts_with_authors(rows)?,
            page,
            per_page,
            total_items: totals.number_of_items,
            total_pages: totals.number_of_pages,
        })
    }

    async fn page_by_category(
        &self,
        category_id: Uuid,
        page: u64,
        per_page: u64,
    ) -> Result<Page<PostWithAuthor>, RepoError> {
        let paginator = PostEntity::find()
            .join(JoinType::InnerJoin, post_category::Relation::Post.def().rev())
            .filter(post_category::Column::CategoryId.eq(category_id))
            .order_by_desc(post::Column::CreatedAt)
            .find_also_related(UserEntity)
            .paginate(&self.db, per_page);

        let totals = paginator.num_items_and_pages().await.map_err(map_db_err)?;
        let rows = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(map_db_err)?;

        Ok(Page {
            items: collect_posts_with_authors(rows)?,
            page,
            per_page,
            total_items: totals.number_of_items,
            total_pages: totals.number_of_pages,
        })
    }

    async fn search(&self, term: Option<&str>) -> Result<Vec<PostWithAuthor>, RepoError> {
        let mut query = PostEntity::find();

        if let Some(term) = term {
            let pattern = format!("%{}%", escape_like(term));
            query = query.filter(
                Condition::any()
                    .add(Expr::col((post::Entity, post::Column::Title)).ilike(pattern.clone()))
                    .add(Expr::col((post::Entity, post::Column::Content)).ilike(pattern)),
            );
        }

        let rows = query
            .order_by_desc(post::Column::CreatedAt)
            .find_also_related(UserEntity)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        collect_posts_with_authors(rows)
    }

    async fn recent(&self, limit: u64) -> Result<Vec<Post>, RepoError> {
        let rows = PostEntity::find()
            .order_by_desc(post::Column::CreatedAt)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn insert_with_categories(
        &self,
        post: Post,
        category_ids: &[Uuid],
    ) -> Result<Post, RepoError> {
        let txn = self.db.begin().await.map_err(map_db_err)?;

        let model = post::ActiveModel::from(post)
            .insert(&txn)
            .await
            .map_err(map_db_err)?;

        if !category_ids.is_empty() {
            let links = category_ids
                .iter()
                .map(|category_id| post_category::ActiveModel {
                    post_id: Set(model.id),
                    category_id: Set(*category_id),
                });
            PostCategoryEntity::insert_many(links)
                .exec(&txn)
                .await
                .map_err(map_db_err)?;
        }

        txn.commit().await.map_err(map_db_err)?;

        Ok(model.into())
    }

    async fn update_with_categories(
        &self,
        post: Post,
        category_ids: &[Uuid],
    ) -> Result<Post, RepoError> {
        let txn = self.db.begin().await.map_err(map_db_err)?;

        let model = post::ActiveModel::from(post)
            .update(&txn)
            .await
            .map_err(map_db_err)?;

        PostCategoryEntity::delete_many()
            .filter(post_category::Column::PostId.eq(model.id))
            .exec(&txn)
            .await
            .map_err(map_db_err)?;

        if !category_ids.is_empty() {
            let links = category_ids
                .iter()
                .map(|category_id| post_category::ActiveModel {
                    post_id: Set(model.id),
                    category_id: Set(*category_id),
                });
            PostCategoryEntity::insert_many(links)
                .exec(&txn)
                .await
                .map_err(map_db_err)?;
        }

        txn.commit().await.map_err(map_db_err)?;

        Ok(model.into())
    }

    async fn categories_of(&self, post_id: Uuid) -> Result<Vec<Category>, RepoError> {
        let rows = CategoryEntity::find()
            .join(
                JoinType::InnerJoin,
                post_category::Relation::Category.def().rev(),
            )
            .filter(post_category::Column::PostId.eq(post_id))
            .order_by_asc(category::Column::Title)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

/// Aggregation row for per-category post counts.
#[derive(Debug, FromQueryResult)]
struct CategoryCountRow {
    slug: String,
    title: String,
    post_count: i64,
}

#[async_trait]
impl CategoryRepository for PostgresCategoryRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, RepoError> {
        let result = CategoryEntity::find()
            .filter(category::Column::Slug.eq(slug))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn list_all(&self) -> Result<Vec<Category>, RepoError> {
        let rows = CategoryEntity::find()
            .order_by_desc(category::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_by_slugs(&self, slugs: &[String]) -> Result<Vec<Category>, RepoError> {
        if slugs.is_empty() {
            return Ok(Vec::new());
        }

        let rows = CategoryEntity::find()
            .filter(category::Column::Slug.is_in(slugs.iter().map(String::as_str)))
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn counts(&self) -> Result<Vec<CategoryCount>, RepoError> {
        let rows = CategoryEntity::find()
            .select_only()
            .column(category::Column::Slug)
            .column(category::Column::Title)
            .column_as(post_category::Column::PostId.count(), "post_count")
            .join(
                JoinType::InnerJoin,
                post_category::Relation::Category.def().rev(),
            )
            .group_by(category::Column::Slug)
            .group_by(category::Column::Title)
            .order_by_asc(category::Column::Slug)
            .into_model::<CategoryCountRow>()
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(rows
            .into_iter()
            .map(|row| CategoryCount {
                slug: row.slug,
                title: row.title,
                post_count: row.post_count,
            })
            .collect())
    }
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentWithAuthor>, RepoError> {
        let rows = CommentEntity::find()
            .filter(comment::Column::PostId.eq(post_id))
            .order_by_asc(comment::Column::CreatedAt)
            .find_also_related(UserEntity)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        rows.into_iter()
            .map(|(found, author)| {
                let author = author.ok_or_else(missing_author)?;
                Ok(CommentWithAuthor {
                    comment: found.into(),
                    author: author.into(),
                })
            })
            .collect()
    }
}
