//! PostgreSQL repository implementations.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::sea_query::{Expr, LikeExpr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbConn, EntityTrait, FromQueryResult, JoinType,
    ModelTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select, Set,
    TransactionTrait,
    prelude::{DateTimeWithTimeZone, Uuid},
};

use agora_core::domain::{Owner, Post, PostDraft, PostQuery, PostWithVotes, User, Vote};
use agora_core::error::RepoError;
use agora_core::ports::{Guarded, PostRepository, UserRepository, VoteRepository};

use super::entity::post::{self, Entity as PostEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::entity::vote::{self, Entity as VoteEntity};
use super::postgres_base::{PostgresBaseRepository, map_db_err};

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

/// Mask the local part of an email so it can be logged.
pub(crate) fn mask_email(email: &str) -> String {
    if let Some(at_pos) = email.find('@') {
        let (local, domain) = email.split_at(at_pos);
        let masked_local = match local.chars().next() {
            Some(first) if local.len() > 1 => format!("{first}***"),
            _ => "***".to_string(),
        };
        format!("{}{}", masked_local, domain)
    } else {
        "***".to_string()
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(user_email = %mask_email(email), "Finding user by email");

        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }
}

/// `LIKE` pattern matching `search` literally anywhere in the value.
pub(crate) fn like_contains(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for c in search.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// One row of the posts/owner/vote-count aggregate.
#[derive(Debug, FromQueryResult)]
pub(crate) struct PostWithVotesRow {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub published: bool,
    pub created_at: DateTimeWithTimeZone,
    pub owner_id: Uuid,
    pub owner_email: String,
    pub owner_created_at: DateTimeWithTimeZone,
    pub votes: i64,
}

impl From<PostWithVotesRow> for PostWithVotes {
    fn from(row: PostWithVotesRow) -> Self {
        Self {
            post: Post {
                id: row.id,
                owner_id: row.owner_id,
                title: row.title,
                content: row.content,
                published: row.published,
                created_at: row.created_at.into(),
            },
            owner: Owner {
                id: row.owner_id,
                email: row.owner_email,
                created_at: row.owner_created_at.into(),
            },
            votes: row.votes.max(0) as u64,
        }
    }
}

/// `posts JOIN users LEFT JOIN votes GROUP BY posts.id, users.id`.
///
/// The left join makes a post without votes count 0 instead of vanishing.
fn select_with_votes() -> Select<PostEntity> {
    PostEntity::find()
        .column_as(user::Column::Email, "owner_email")
        .column_as(user::Column::CreatedAt, "owner_created_at")
        .column_as(Expr::col((VoteEntity, vote::Column::PostId)).count(), "votes")
        .join(JoinType::InnerJoin, post::Relation::User.def())
        .join(JoinType::LeftJoin, post::Relation::Vote.def())
        .group_by(post::Column::Id)
        .group_by(user::Column::Id)
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn find_with_votes(&self, id: Uuid) -> Result<Option<PostWithVotes>, RepoError> {
        let row = select_with_votes()
            .filter(post::Column::Id.eq(id))
            .into_model::<PostWithVotesRow>()
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        Ok(row.map(Into::into))
    }

    async fn list_with_votes(&self, query: &PostQuery) -> Result<Vec<PostWithVotes>, RepoError> {
        let rows = select_with_votes()
            .filter(
                Expr::col((PostEntity, post::Column::Title))
                    .like(LikeExpr::new(like_contains(&query.search)).escape('\\')),
            )
            .order_by_asc(post::Column::CreatedAt)
            .order_by_asc(post::Column::Id)
            .limit(query.limit)
            .offset(query.offset)
            .into_model::<PostWithVotesRow>()
            .all(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn update_owned(
        &self,
        id: Uuid,
        caller: Uuid,
        draft: PostDraft,
    ) -> Result<Guarded<Post>, RepoError> {
        // Dropping `txn` on any early return rolls it back.
        let txn = self.db.begin().await.map_err(map_db_err)?;

        let Some(model) = PostEntity::find_by_id(id)
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(map_db_err)?
        else {
            return Ok(Guarded::Missing);
        };

        if !Post::from(model.clone()).is_owned_by(caller) {
            return Ok(Guarded::NotOwner);
        }

        let mut active: post::ActiveModel = model.into();
        active.title = Set(draft.title);
        active.content = Set(draft.content);
        active.published = Set(draft.published);
        let updated = active.update(&txn).await.map_err(map_db_err)?;

        txn.commit().await.map_err(map_db_err)?;
        Ok(Guarded::Applied(updated.into()))
    }

    async fn delete_owned(&self, id: Uuid, caller: Uuid) -> Result<Guarded<()>, RepoError> {
        let txn = self.db.begin().await.map_err(map_db_err)?;

        let Some(model) = PostEntity::find_by_id(id)
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(map_db_err)?
        else {
            return Ok(Guarded::Missing);
        };

        if !Post::from(model.clone()).is_owned_by(caller) {
            return Ok(Guarded::NotOwner);
        }

        // votes.post_id is ON DELETE CASCADE
        model.delete(&txn).await.map_err(map_db_err)?;

        txn.commit().await.map_err(map_db_err)?;
        Ok(Guarded::Applied(()))
    }
}

/// PostgreSQL vote ledger.
pub struct PostgresVoteRepository {
    db: Arc<DbConn>,
}

impl PostgresVoteRepository {
    pub fn new(db: Arc<DbConn>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl VoteRepository for PostgresVoteRepository {
    async fn find(&self, user_id: Uuid, post_id: Uuid) -> Result<Option<Vote>, RepoError> {
        let result = VoteEntity::find_by_id((user_id, post_id))
            .one(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        Ok(result.map(Into::into))
    }

    async fn insert(&self, vote: Vote) -> Result<(), RepoError> {
        // ON CONFLICT DO NOTHING: of two racing inserts the loser sees 0 rows.
        let inserted = VoteEntity::insert(vote::ActiveModel::from(vote))
            .on_conflict(
                OnConflict::columns([vote::Column::UserId, vote::Column::PostId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        if inserted == 0 {
            return Err(RepoError::Constraint("Vote already exists".to_string()));
        }
        Ok(())
    }

    async fn delete(&self, user_id: Uuid, post_id: Uuid) -> Result<(), RepoError> {
        let result = VoteEntity::delete_many()
            .filter(vote::Column::UserId.eq(user_id))
            .filter(vote::Column::PostId.eq(post_id))
            .exec(self.db.as_ref())
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}
