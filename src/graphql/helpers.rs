use async_graphql::{Context, ErrorExtensions, ID};
use uuid::Uuid;

use crate::{
    app_state::AppState,
    auth::{extract_claims_from_context, Claims},
    errors::{AppError, AppResult},
};

/// Converts a service result into a GraphQL one, keeping the error code as
/// an extension and hiding internal detail.
pub fn gql<T>(result: AppResult<T>) -> async_graphql::Result<T> {
    result.map_err(|err| err.extend())
}

/// Ids are UUID strings; anything else is rejected before hitting storage.
pub fn parse_id(id: &ID) -> AppResult<String> {
    Uuid::parse_str(id.as_str())
        .map(|uuid| uuid.to_string())
        .map_err(|_| AppError::ValidationError("Invalid UUID format".to_string()))
}

/// Shared state plus the caller's claims; fails with `UNAUTHORIZED` when the
/// request carried no valid token.
pub fn state_and_claims<'a>(ctx: &Context<'a>) -> async_graphql::Result<(&'a AppState, Claims)> {
    let state = ctx.data::<AppState>()?;
    let claims = gql(extract_claims_from_context(ctx))?;
    Ok((state, claims))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        let id = Uuid::new_v4().to_string();
        assert_eq!(parse_id(&ID::from(id.clone())).unwrap(), id);
        assert!(parse_id(&ID::from("quiz-1")).is_err());
    }

    #[test]
    fn test_gql_keeps_error_code() {
        let err = gql::<()>(Err(AppError::NotFound("Quiz 'x' not found".into()))).unwrap_err();
        assert_eq!(err.message, "Not found: Quiz 'x' not found");
        let extensions = serde_json::to_value(&err.extensions).unwrap();
        assert_eq!(extensions["code"], "NOT_FOUND");
    }

    #[test]
    fn test_gql_hides_database_detail() {
        let err = gql::<()>(Err(AppError::DatabaseError("connection reset".into()))).unwrap_err();
        assert_eq!(err.message, "An internal error occurred");
    }
}
