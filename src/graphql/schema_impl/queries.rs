use async_graphql::{Context, Object, Result, ID};

use crate::{
    auth::require_owner_or_admin,
    graphql::helpers::{gql, parse_id, state_and_claims},
    models::dto::{
        quiz_dto::{AttemptDto, QuizForTaking, QuizSummaryDto, ScoreDetails},
        response::{GraphData, UserDashboardStats, UserDto},
    },
};

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// The signed-in user's profile.
    async fn me(&self, ctx: &Context<'_>) -> Result<UserDto> {
        let (state, claims) = state_and_claims(ctx)?;
        gql(state.user_service.get_profile(&claims.sub).await)
    }

    /// A user's profile; admins may look up anyone.
    async fn user(&self, ctx: &Context<'_>, id: ID) -> Result<UserDto> {
        let (state, claims) = state_and_claims(ctx)?;
        let user_id = gql(parse_id(&id))?;
        gql(require_owner_or_admin(&claims, &user_id))?;
        gql(state.user_service.get_profile(&user_id).await)
    }

    async fn available_quizzes(&self, ctx: &Context<'_>) -> Result<Vec<QuizSummaryDto>> {
        let (state, claims) = state_and_claims(ctx)?;
        gql(state.quiz_service.available_quizzes(&claims.sub).await)
    }

    async fn quiz_for_taking(&self, ctx: &Context<'_>, id: ID) -> Result<QuizForTaking> {
        let (state, _claims) = state_and_claims(ctx)?;
        let quiz_id = gql(parse_id(&id))?;
        gql(state.quiz_service.start_quiz(&quiz_id).await)
    }

    async fn my_scores(&self, ctx: &Context<'_>) -> Result<Vec<AttemptDto>> {
        let (state, claims) = state_and_claims(ctx)?;
        gql(state.quiz_attempt_service.list_scores(&claims.sub).await)
    }

    async fn score_details(&self, ctx: &Context<'_>, attempt_id: ID) -> Result<ScoreDetails> {
        let (state, claims) = state_and_claims(ctx)?;
        let attempt_id = gql(parse_id(&attempt_id))?;
        gql(state
            .quiz_attempt_service
            .score_details(&claims.sub, &attempt_id)
            .await)
    }

    async fn dashboard_stats(&self, ctx: &Context<'_>) -> Result<UserDashboardStats> {
        let (state, claims) = state_and_claims(ctx)?;
        gql(state.dashboard_service.user_stats(&claims.sub).await)
    }

    async fn dashboard_graph(&self, ctx: &Context<'_>) -> Result<GraphData> {
        let (state, claims) = state_and_claims(ctx)?;
        gql(state.dashboard_service.user_graph(&claims.sub).await)
    }
}
