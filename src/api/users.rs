//! `/users` terminal handlers

use std::sync::Arc;

use axum::http::StatusCode;
use validator::Validate;

use super::error::ApiError;
use super::framework::{App, Reply, Request, Response};
use crate::domain::storage::UserStorage;
use crate::domain::user::{UserDraft, UserId};

/// Registers the CRUD routes under `/users`
pub fn register_user_routes(app: &mut App, storage: Arc<dyn UserStorage>) {
    let (list, get, create, update, delete) = (
        Arc::clone(&storage),
        Arc::clone(&storage),
        Arc::clone(&storage),
        Arc::clone(&storage),
        storage,
    );

    app.route("/users")
        .get("/", move |req, res| get_all_users(Arc::clone(&list), req, res))
        .get("/{id}", move |req, res| get_user_by_id(Arc::clone(&get), req, res))
        .post("/", move |req, res| create_user(Arc::clone(&create), req, res))
        .put("/{id}", move |req, res| update_user(Arc::clone(&update), req, res))
        .delete("/{id}", move |req, res| delete_user(Arc::clone(&delete), req, res));
}

fn parse_id(req: &Request) -> Result<UserId, ApiError> {
    let raw = req.param("id").unwrap_or_default();

    raw.parse::<UserId>()
        .map_err(|e| ApiError::malformed("Invalid user ID").with_cause(format!("{:?}: {}", raw, e)))
}

/// Decodes and validates the body; nothing reaches storage unless both pass
fn parse_draft(req: &Request) -> Result<UserDraft, ApiError> {
    let draft: UserDraft = req.parse_body()?;
    draft.validate()?;
    Ok(draft)
}

pub async fn create_user(
    storage: Arc<dyn UserStorage>,
    req: Request,
    res: Response,
) -> Result<Reply, ApiError> {
    let draft = parse_draft(&req)?;

    let user = storage
        .create_user(req.context(), draft)
        .await
        .map_err(|e| ApiError::from_storage(e, "Failed to create user"))?;

    Ok(res
        .status(StatusCode::CREATED)
        .success("User created successfully", user))
}

pub async fn get_all_users(
    storage: Arc<dyn UserStorage>,
    req: Request,
    res: Response,
) -> Result<Reply, ApiError> {
    let users = storage
        .get_all_users(req.context())
        .await
        .map_err(|e| ApiError::from_storage(e, "Failed to fetch users"))?;

    Ok(res.success("Users fetched successfully", users))
}

pub async fn get_user_by_id(
    storage: Arc<dyn UserStorage>,
    req: Request,
    res: Response,
) -> Result<Reply, ApiError> {
    let id = parse_id(&req)?;

    let user = storage
        .get_user_by_id(req.context(), id)
        .await
        .map_err(|e| ApiError::from_storage(e, "Failed to fetch user"))?;

    Ok(res.success("User fetched successfully", user))
}

pub async fn update_user(
    storage: Arc<dyn UserStorage>,
    req: Request,
    res: Response,
) -> Result<Reply, ApiError> {
    let id = parse_id(&req)?;
    let draft = parse_draft(&req)?;

    let user = storage
        .update_user(req.context(), id, draft)
        .await
        .map_err(|e| ApiError::from_storage(e, "Failed to update user"))?;

    Ok(res.success("User updated successfully", user))
}

pub async fn delete_user(
    storage: Arc<dyn UserStorage>,
    req: Request,
    res: Response,
) -> Result<Reply, ApiError> {
    let id = parse_id(&req)?;

    storage
        .delete_user(req.context(), id)
        .await
        .map_err(|e| ApiError::from_storage(e, "Failed to delete user"))?;

    Ok(res.success("User deleted successfully", ()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use axum::http::Method;

    use crate::api::error::ApiErrorKind;
    use crate::domain::storage::mock::MockUserStorage;

    #[test]
    fn test_parse_id() {
        let ok = Request::new(Method::GET, "/users/12").with_param("id", "12");
        assert_eq!(parse_id(&ok).unwrap(), UserId::new(12));

        for raw in ["abc", "-1", "1.5", ""] {
            let bad = Request::new(Method::GET, "/users/x").with_param("id", raw);
            let err = parse_id(&bad).unwrap_err();
            assert_eq!(err.kind(), ApiErrorKind::MalformedRequest);
            assert_eq!(err.message(), "Invalid user ID");
        }
    }

    #[tokio::test]
    async fn test_invalid_update_never_reaches_storage() {
        let storage = Arc::new(MockUserStorage::new());
        let req = Request::new(Method::PUT, "/users/1")
            .with_param("id", "1")
            .with_body(Some(Bytes::from_static(br#"{"name":"B","email":"b@example.com"}"#)));

        let err = update_user(storage.clone(), req, Response::new()).await.unwrap_err();

        assert_eq!(err.kind(), ApiErrorKind::ValidationFailed);
        assert!(storage.calls().is_empty());
    }

    #[tokio::test]
    async fn test_delete_replies_with_null_data() {
        let storage = Arc::new(MockUserStorage::new());
        let ctx = crate::domain::storage::CallContext::background();
        let user = storage
            .create_user(&ctx, UserDraft::new("Alice", "alice@example.com"))
            .await
            .unwrap();

        let req = Request::new(Method::DELETE, "/users/1").with_param("id", user.id().to_string());
        let reply = delete_user(storage.clone(), req, Response::new()).await.unwrap();

        assert_eq!(reply.status(), StatusCode::OK);
        assert_eq!(
            reply.body(),
            &serde_json::json!({ "message": "User deleted successfully", "data": null })
        );
        assert_eq!(storage.call_count("delete_user"), 1);
    }
}
