//! PostgreSQL repository implementations.

use async_trait::async_trait;
use sea_orm::sea_query::{Expr, Func, IntoColumnRef, SimpleExpr};
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, Order, PaginatorTrait, QueryFilter, QueryOrder,
    SelectTwo, TransactionTrait,
};
use uuid::Uuid;

use quill_core::domain::{Author, CommentView, PostListing, User};
use quill_core::error::RepoError;
use quill_core::filter::{Page, PostFilter, PostOrdering, RangeEnd};
use quill_core::ports::{AuthorRepository, CommentRepository, PostRepository, UserRepository};

use super::entity::author::{self, Entity as AuthorEntity};
use super::entity::comment::{self, Entity as CommentEntity};
use super::entity::post::{self, Entity as PostEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{PostgresBaseRepository, map_db_err};

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL author repository.
pub type PostgresAuthorRepository = PostgresBaseRepository<AuthorEntity>;

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

/// PostgreSQL comment repository.
pub type PostgresCommentRepository = PostgresBaseRepository<CommentEntity>;

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(username, "Finding user by username");

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
}

#[async_trait]
impl AuthorRepository for PostgresAuthorRepository {
    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Option<Author>, RepoError> {
        let result = AuthorEntity::find()
            .filter(author::Column::UserId.eq(user_id))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn list_active(&self, filter: &PostFilter) -> Result<Page<PostListing>, RepoError> {
        let paginator = listing_query(filter).paginate(&self.db, filter.page.page_size);

        let count = paginator.num_items().await.map_err(map_db_err)?;
        let rows = paginator
            .fetch_page(filter.page.page - 1)
            .await
            .map_err(map_db_err)?;
        let items = rows
            .into_iter()
            .map(into_listing)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Page::new(items, count, filter.page))
    }

    async fn find_listing(&self, id: Uuid) -> Result<Option<PostListing>, RepoError> {
        PostEntity::find_by_id(id)
            .find_also_related(AuthorEntity)
            .one(&self.db)
            .await
            .map_err(map_db_err)?
            .map(into_listing)
            .transpose()
    }

    async fn delete_with_comments(&self, id: Uuid) -> Result<u64, RepoError> {
        let txn = self.db.begin().await.map_err(map_db_err)?;

        let comments = CommentEntity::delete_many()
            .filter(comment::Column::PostId.eq(id))
            .exec(&txn)
            .await
            .map_err(map_db_err)?;
        let post = PostEntity::delete_by_id(id)
            .exec(&txn)
            .await
            .map_err(map_db_err)?;

        if post.rows_affected == 0 {
            txn.rollback().await.map_err(map_db_err)?;
            return Err(RepoError::NotFound);
        }

        txn.commit().await.map_err(map_db_err)?;
        Ok(comments.rows_affected)
    }
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentView>, RepoError> {
        let rows = CommentEntity::find()
            .find_also_related(UserEntity)
            .filter(comment::Column::PostId.eq(post_id))
            .order_by_asc(comment::Column::Created)
            .order_by_asc(comment::Column::Id)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(rows
            .into_iter()
            .map(|(comment, user)| CommentView {
                comment: comment.into(),
                user_name: user.map(|u| u.username),
            })
            .collect())
    }
}

/// Active posts joined with their authors, filtered and ordered per `filter`.
fn listing_query(filter: &PostFilter) -> SelectTwo<PostEntity, AuthorEntity> {
    let mut query = PostEntity::find()
        .find_also_related(AuthorEntity)
        .filter(post::Column::Active.eq(true));

    if let Some(name) = &filter.author_name {
        query = query.filter(icontains((AuthorEntity, author::Column::Name), name));
    }
    if let Some(title) = &filter.title {
        query = query.filter(icontains((PostEntity, post::Column::Title), title));
    }
    if let Some(term) = &filter.search {
        query = query.filter(
            Condition::any()
                .add(icontains((PostEntity, post::Column::Title), term))
                .add(icontains((AuthorEntity, author::Column::Name), term)),
        );
    }
    if let Some(start) = filter.published.start {
        query = query.filter(post::Column::PublishedDate.gte(start));
    }
    query = match filter.published.end {
        Some(RangeEnd::Inclusive(end)) => query.filter(post::Column::PublishedDate.lte(end)),
        Some(RangeEnd::Before(end)) => query.filter(post::Column::PublishedDate.lt(end)),
        None => query,
    };

    let query = match filter.ordering {
        PostOrdering::PublishedDesc => query.order_by_desc(post::Column::PublishedDate),
        PostOrdering::PublishedAsc => query.order_by_asc(post::Column::PublishedDate),
        PostOrdering::TitleAsc => query.order_by(title_key(), Order::Asc),
        PostOrdering::TitleDesc => query.order_by(title_key(), Order::Desc),
    };
    query.order_by_desc(post::Column::Id)
}

/// Lowercased title in code point order, the same key the memory store sorts on.
fn title_key() -> SimpleExpr {
    Expr::cust(r#"LOWER("posts"."title") COLLATE "C""#)
}

/// `lower(column) LIKE '%needle%'` with LIKE metacharacters escaped.
fn icontains(column: impl IntoColumnRef, needle: &str) -> SimpleExpr {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for ch in needle.to_lowercase().chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');

    Expr::expr(Func::lower(Expr::col(column))).like(pattern)
}

fn into_listing(
    (post, author): (post::Model, Option<author::Model>),
) -> Result<PostListing, RepoError> {
    let author = author.ok_or_else(|| RepoError::Query(format!("post {} has no author", post.id)))?;

    Ok(PostListing {
        post: post.into(),
        author_name: author.name,
    })
}

/// Mask an email for logging to keep PII out of logs.
fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => {
            let first = local.chars().next().map(String::from).unwrap_or_default();
            format!("{first}***@{domain}")
        }
        None => "***".to_string(),
    }
}
