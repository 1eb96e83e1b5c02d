use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{Header, AUTHORIZATION},
    web, Error, FromRequest, HttpMessage, HttpRequest,
};
use actix_web_httpauth::headers::authorization::{Authorization, Bearer};
use futures::future::LocalBoxFuture;

use crate::{
    auth::{require_admin, Claims, JwtService},
    errors::AppError,
};

/// Attaches [`Claims`] to the request when a valid bearer token is present.
///
/// Requests without an `Authorization` header pass through untouched so that
/// public routes keep working; a header that is present but invalid is
/// answered with 401 straight away. Route-level guards are the
/// [`AuthenticatedUser`] and [`AdminUser`] extractors.
pub struct AuthMiddleware;

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            if req.headers().contains_key(AUTHORIZATION) {
                match authenticate(&req) {
                    Ok(claims) => {
                        req.extensions_mut().insert(claims);
                    }
                    Err(err) => {
                        log::debug!("Rejected bearer token: {}", err);
                        return Ok(req.error_response(err).map_into_right_body());
                    }
                }
            }

            let res = service.call(req).await?;
            Ok(res.map_into_left_body())
        })
    }
}

fn authenticate(req: &ServiceRequest) -> Result<Claims, AppError> {
    let jwt_service = req
        .app_data::<web::Data<JwtService>>()
        .ok_or_else(|| AppError::InternalError("JWT service not configured".to_string()))?;

    let header = Authorization::<Bearer>::parse(req).map_err(|_| {
        AppError::Unauthorized("Invalid authorization header format".to_string())
    })?;

    jwt_service
        .validate_token(header.as_ref().token())
        .map_err(|_| AppError::Unauthorized("Invalid or expired token".to_string()))
}

/// Extractor for any signed-in user.
pub struct AuthenticatedUser(pub Claims);

impl FromRequest for AuthenticatedUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        let claims = req
            .extensions()
            .get::<Claims>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("Not authenticated".to_string()));

        ready(claims.map(AuthenticatedUser))
    }
}

/// Extractor for administrators. 401 when signed out, 403 for plain users.
pub struct AdminUser(pub Claims);

impl FromRequest for AdminUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        let result = req
            .extensions()
            .get::<Claims>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("Not authenticated".to_string()))
            .and_then(|claims| require_admin(&claims).map(|_| AdminUser(claims)));

        ready(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::Config, models::domain::User};
    use actix_web::{get, http::StatusCode, test, App, HttpResponse};

    #[get("/open")]
    async fn open() -> HttpResponse {
        HttpResponse::Ok().finish()
    }

    #[get("/private")]
    async fn private(user: AuthenticatedUser) -> HttpResponse {
        HttpResponse::Ok().body(user.0.email)
    }

    #[get("/admin")]
    async fn admin(_admin: AdminUser) -> HttpResponse {
        HttpResponse::Ok().finish()
    }

    fn jwt() -> JwtService {
        let config = Config::test_config();
        JwtService::new(&config.jwt_secret, 1, 168)
    }

    #[actix_web::test]
    async fn test_requests_without_token_reach_public_routes() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(jwt()))
                .wrap(AuthMiddleware)
                .service(open)
                .service(private),
        )
        .await;

        let resp = test::call_service(&app, test::TestRequest::get().uri("/open").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp =
            test::call_service(&app, test::TestRequest::get().uri("/private").to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_valid_token_attaches_claims() {
        let jwt = jwt();
        let token = jwt.create_token(&User::test_user("jane@example.com")).unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(jwt))
                .wrap(AuthMiddleware)
                .service(private)
                .service(admin),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/private")
            .insert_header((AUTHORIZATION, format!("Bearer {}", token)))
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, "jane@example.com");

        let req = test::TestRequest::get()
            .uri("/admin")
            .insert_header((AUTHORIZATION, format!("Bearer {}", token)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn test_invalid_token_is_rejected_even_on_public_routes() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(jwt()))
                .wrap(AuthMiddleware)
                .service(open),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/open")
            .insert_header((AUTHORIZATION, "Bearer not.a.token"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
