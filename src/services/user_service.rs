use std::sync::Arc;

use validator::Validate;

use crate::{
    auth::{hash_password, verify_password},
    errors::{AppError, AppResult},
    models::{
        domain::UserRole,
        dto::{
            request::{parse_date, PaginationParams, UpdateProfileRequest},
            response::{AdminUserDto, PaginatedResponse, PaginationMetadata, UserDto},
        },
    },
    repositories::{QuizAttemptRepository, UserRepository},
    services::statistics::{round_to, summarize, PerformanceLadder},
};

pub struct UserService {
    users: Arc<dyn UserRepository>,
    attempts: Arc<dyn QuizAttemptRepository>,
    ladder: PerformanceLadder,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        attempts: Arc<dyn QuizAttemptRepository>,
        ladder: PerformanceLadder,
    ) -> Self {
        Self {
            users,
            attempts,
            ladder,
        }
    }

    pub async fn get_profile(&self, user_id: &str) -> AppResult<UserDto> {
        self.users
            .find_by_id(user_id)
            .await?
            .map(UserDto::from)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    pub async fn update_profile(
        &self,
        user_id: &str,
        request: UpdateProfileRequest,
    ) -> AppResult<UserDto> {
        request.validate()?;

        let mut user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if let Some(full_name) = request.full_name {
            user.full_name = full_name.trim().to_string();
        }
        if let Some(qualification) = request.qualification {
            user.qualification = Some(qualification.trim().to_string());
        }
        if let Some(dob) = request.dob {
            user.dob = Some(parse_date(&dob, "date of birth")?);
        }
        if let Some(new_password) = request.new_password {
            let current = request.current_password.ok_or_else(|| {
                AppError::ValidationError(
                    "Current password is required to set a new one".to_string(),
                )
            })?;
            if !verify_password(&current, &user.password_hash)? {
                return Err(AppError::Unauthorized(
                    "Current password is incorrect".to_string(),
                ));
            }
            user.password_hash = hash_password(&new_password)?;
            log::info!("User {} changed their password", user_id);
        }

        let user = self.users.update(user).await?;
        Ok(user.into())
    }

    /// Regular users with their attempt count, mean percentage and bucket.
    pub async fn list_users(
        &self,
        pagination: PaginationParams,
    ) -> AppResult<PaginatedResponse<AdminUserDto>> {
        pagination.validate()?;
        let (offset, limit) = (pagination.offset(), pagination.limit());

        let (users, total) = self
            .users
            .find_by_role_paginated(UserRole::User, offset, limit)
            .await?;

        let mut data = Vec::with_capacity(users.len());
        for user in users {
            let summary = summarize(&self.attempts.find_by_user(&user.id).await?);
            data.push(AdminUserDto {
                user: user.into(),
                total_attempts: summary.attempts,
                average_score: round_to(summary.average_percentage, 2),
                performance: self.ladder.bucket(summary.average_percentage).to_string(),
            });
        }

        Ok(PaginatedResponse {
            data,
            pagination: PaginationMetadata {
                offset,
                limit,
                total,
            },
        })
    }
}
