use crate::{
    db::CatalogStore,
    error::{AppError, AppResult},
    models::{
        discussion::{CommentId, DiscussionId},
        BookId, Comment, Discussion, Role, User,
    },
};

fn discussion_not_found() -> AppError {
    AppError::NotFound("Discussion not found".to_string())
}

fn comment_not_found() -> AppError {
    AppError::NotFound("Comment not found".to_string())
}

fn required(value: &str, field: &str) -> AppResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AppError::InvalidInput(format!("{} is required", field)));
    }
    Ok(value.to_string())
}

pub async fn list_discussions(store: &dyn CatalogStore) -> AppResult<Vec<Discussion>> {
    store.list_discussions().await
}

pub async fn get_discussion(store: &dyn CatalogStore, id: DiscussionId) -> AppResult<Discussion> {
    store.get_discussion(id).await?.ok_or_else(discussion_not_found)
}

pub async fn create_discussion(
    store: &dyn CatalogStore,
    author: &User,
    book_id: BookId,
    title: &str,
) -> AppResult<Discussion> {
    let title = required(title, "Title")?;
    if store.get_book(book_id).await?.is_none() {
        return Err(AppError::NotFound("Book not found".to_string()));
    }

    let discussion = store.create_discussion(book_id, &title, author.id).await?;
    tracing::info!(discussion_id = discussion.id, book_id, "Discussion opened");
    Ok(discussion)
}

/// Discussions may be changed by their author or by a moderator
fn ensure_can_moderate(actor: &User, discussion: &Discussion) -> AppResult<()> {
    if discussion.author_id == actor.id || actor.has_role(Role::Moderator) {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Only the author or a moderator can change this discussion".to_string(),
        ))
    }
}

pub async fn update_discussion(
    store: &dyn CatalogStore,
    actor: &User,
    id: DiscussionId,
    title: &str,
) -> AppResult<Discussion> {
    let title = required(title, "Title")?;
    let discussion = get_discussion(store, id).await?;
    ensure_can_moderate(actor, &discussion)?;

    store
        .update_discussion(id, &title)
        .await?
        .ok_or_else(discussion_not_found)
}

pub async fn delete_discussion(
    store: &dyn CatalogStore,
    actor: &User,
    id: DiscussionId,
) -> AppResult<()> {
    let discussion = get_discussion(store, id).await?;
    ensure_can_moderate(actor, &discussion)?;

    if !store.delete_discussion(id).await? {
        return Err(discussion_not_found());
    }
    tracing::info!(discussion_id = id, actor = actor.id, "Discussion deleted");
    Ok(())
}

pub async fn list_comments(
    store: &dyn CatalogStore,
    discussion_id: DiscussionId,
) -> AppResult<Vec<Comment>> {
    get_discussion(store, discussion_id).await?;
    store.list_comments(discussion_id).await
}

pub async fn get_comment(store: &dyn CatalogStore, id: CommentId) -> AppResult<Comment> {
    store.get_comment(id).await?.ok_or_else(comment_not_found)
}

pub async fn create_comment(
    store: &dyn CatalogStore,
    author: &User,
    discussion_id: DiscussionId,
    content: &str,
) -> AppResult<Comment> {
    let content = required(content, "Content")?;
    get_discussion(store, discussion_id).await?;

    store.create_comment(discussion_id, &content, author.id).await
}

/// Comments may only be changed by whoever wrote them
fn ensure_author(actor: &User, comment: &Comment) -> AppResult<()> {
    if comment.author_id == actor.id {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Only the author can change this comment".to_string(),
        ))
    }
}

pub async fn update_comment(
    store: &dyn CatalogStore,
    actor: &User,
    id: CommentId,
    content: &str,
) -> AppResult<Comment> {
    let content = required(content, "Content")?;
    let comment = get_comment(store, id).await?;
    ensure_author(actor, &comment)?;

    store
        .update_comment(id, &content)
        .await?
        .ok_or_else(comment_not_found)
}

pub async fn delete_comment(store: &dyn CatalogStore, actor: &User, id: CommentId) -> AppResult<()> {
    let comment = get_comment(store, id).await?;
    ensure_author(actor, &comment)?;

    if !store.delete_comment(id).await? {
        return Err(comment_not_found());
    }
    Ok(())
}
