use std::future::{ready, Ready};

use actix_http::Payload;
use actix_web::{Error, FromRequest, HttpMessage, HttpRequest};

use crate::error::ApiError;
use crate::middleware::auth::{decode_token, token_from_request, Claims};

/// Handlers take `claims: Claims` to require a signed-in user. Inside an
/// `AuthMiddleware` scope the claims come from the request extensions;
/// on mixed public/protected routes the extractor decodes the token
/// itself.
impl FromRequest for Claims {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        if let Some(claims) = req.extensions().get::<Claims>() {
            return ready(Ok(claims.clone()));
        }

        let token = match token_from_request(req) {
            Some(token) => token,
            None => {
                return ready(Err(ApiError::Unauthorized(
                    "You are not logged in! Please log in to get access.".to_string(),
                )
                .into()))
            }
        };

        match decode_token(&token) {
            Ok(claims) => ready(Ok(claims)),
            Err(_) => ready(Err(
                ApiError::Unauthorized("Invalid token".to_string()).into()
            )),
        }
    }
}
