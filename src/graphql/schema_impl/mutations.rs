use async_graphql::{Context, Object, Result, ID};

use crate::{
    graphql::helpers::{gql, parse_id, state_and_claims},
    models::dto::{
        quiz_dto::SubmissionResult,
        request::{SubmitQuizAttemptInput, SubmitQuizRequest},
    },
};

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    /// Scores a submission and replaces the caller's stored answers for the
    /// quiz. Each call records a new attempt.
    async fn submit_quiz_attempt(
        &self,
        ctx: &Context<'_>,
        input: SubmitQuizAttemptInput,
    ) -> Result<SubmissionResult> {
        let (state, claims) = state_and_claims(ctx)?;
        let quiz_id = gql(parse_id(&ID::from(input.quiz_id.as_str())))?;

        gql(state
            .quiz_attempt_service
            .submit(&claims.sub, &quiz_id, SubmitQuizRequest::from(input))
            .await)
    }
}
