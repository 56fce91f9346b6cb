use actix_web::{cookie::Cookie, web, HttpResponse};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use mongodb::bson::{doc, oid::ObjectId, DateTime};
use mongodb::Client;
use rand::{distributions::Alphanumeric, Rng};
use std::sync::Arc;

use crate::db::mongo;
use crate::error::ApiError;
use crate::middleware::auth::Claims;
use crate::models::user::{
    ForgotPasswordInput, ResetPasswordInput, SigninInput, SignupInput, UpdatePasswordInput, User,
    UserRole, UserSession,
};
use crate::routes::success_doc;
use crate::services::email_service::EmailService;

const RESET_TOKEN_TTL_MINUTES: i64 = 10;

pub async fn signup(
    data: web::Data<Arc<Client>>,
    input: web::Json<SignupInput>,
) -> Result<HttpResponse, ApiError> {
    let client = data.into_inner();
    let input = input.into_inner();

    if !is_valid_email(&input.email) {
        return Err(ApiError::BadRequest("Invalid email address".to_string()));
    }
    validate_password(&input.password, &input.password_confirm)?;

    let now = DateTime::now();
    let user = User {
        id: None,
        name: input.name,
        email: input.email.clone(),
        photo: None,
        // Role is never taken from the request body
        role: UserRole::User,
        password: bcrypt::hash(&input.password, bcrypt::DEFAULT_COST)?,
        password_changed_at: None,
        password_reset_token: None,
        password_reset_expires: None,
        active: Some(true),
        last_signin: None,
        failed_signins: None,
        created_at: Some(now),
        updated_at: Some(now),
    };

    let result = mongo::users(&client).insert_one(&user).await?;
    let user_id = result
        .inserted_id
        .as_object_id()
        .ok_or_else(|| ApiError::Internal("Insert returned no id".to_string()))?;

    let token = generate_token(&input.email, user_id, UserRole::User)?;
    Ok(send_token(token, HttpResponse::Created()))
}

pub async fn signin(
    data: web::Data<Arc<Client>>,
    input: web::Json<SigninInput>,
) -> Result<HttpResponse, ApiError> {
    let client = data.into_inner();
    let input = input.into_inner();
    let collection = mongo::users(&client);

    // Soft-deleted users cannot sign in
    let filter = doc! { "email": &input.email, "active": { "$ne": false } };
    let user = collection
        .find_one(filter)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Incorrect email or password".to_string()))?;

    if !bcrypt::verify(&input.password, &user.password).unwrap_or(false) {
        collection
            .update_one(doc! { "email": &input.email }, signin_failure_update())
            .await?;
        return Err(ApiError::Unauthorized(
            "Incorrect email or password".to_string(),
        ));
    }

    collection
        .update_one(
            doc! { "email": &input.email },
            doc! { "$set": { "last_signin": DateTime::now(), "failed_signins": 0 } },
        )
        .await?;

    let user_id = user
        .id
        .ok_or_else(|| ApiError::Internal("Unable to read user id".to_string()))?;
    let token = generate_token(&input.email, user_id, user.role)?;
    Ok(send_token(token, HttpResponse::Ok()))
}

pub async fn user_session(
    claims: Claims,
    data: web::Data<Arc<Client>>,
) -> Result<HttpResponse, ApiError> {
    let client = data.into_inner();
    let user_id = ObjectId::parse_str(&claims.user_id)?;

    let user = mongo::users(&client)
        .find_one(doc! { "_id": user_id, "active": { "$ne": false } })
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(success_doc(&UserSession::from(user)))
}

pub async fn forgot_password(
    data: web::Data<Arc<Client>>,
    input: web::Json<ForgotPasswordInput>,
) -> Result<HttpResponse, ApiError> {
    let client = data.into_inner();
    let collection = mongo::users(&client);
    let email = input.into_inner().email;

    collection
        .find_one(doc! { "email": &email, "active": { "$ne": false } })
        .await?
        .ok_or_else(|| ApiError::NotFound("There is no user with that email address".to_string()))?;

    let reset_token: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect();
    let expires = DateTime::from_millis(
        DateTime::now().timestamp_millis() + RESET_TOKEN_TTL_MINUTES * 60 * 1000,
    );

    collection
        .update_one(
            doc! { "email": &email },
            doc! { "$set": {
                "password_reset_token": &reset_token,
                "password_reset_expires": expires,
            }},
        )
        .await?;

    let frontend_url =
        std::env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());
    let reset_url = format!("{}/reset-password/{}", frontend_url, reset_token);

    let send_result = match EmailService::new() {
        Ok(service) => service.send_password_reset(&email, &reset_url).await,
        Err(err) => Err(err),
    };

    if let Err(err) = send_result {
        log::error!("Failed to send password reset email: {}", err);
        // Token is useless if the user never receives it
        collection
            .update_one(
                doc! { "email": &email },
                doc! { "$unset": { "password_reset_token": "", "password_reset_expires": "" } },
            )
            .await?;
        return Err(ApiError::Internal(
            "There was an error sending the email. Try again later!".to_string(),
        ));
    }

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": "success",
        "message": "Token sent to email!",
    })))
}

pub async fn reset_password(
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
    input: web::Json<ResetPasswordInput>,
) -> Result<HttpResponse, ApiError> {
    let client = data.into_inner();
    let collection = mongo::users(&client);
    let reset_token = path.into_inner();
    let input = input.into_inner();

    let user = collection
        .find_one(doc! {
            "password_reset_token": &reset_token,
            "password_reset_expires": { "$gt": DateTime::now() },
        })
        .await?
        .ok_or_else(|| ApiError::BadRequest("Token is invalid or has expired".to_string()))?;

    validate_password(&input.password, &input.password_confirm)?;

    let hashed = bcrypt::hash(&input.password, bcrypt::DEFAULT_COST)?;
    collection
        .update_one(
            doc! { "_id": user.id },
            doc! {
                "$set": {
                    "password": hashed,
                    "password_changed_at": DateTime::now(),
                    "updated_at": DateTime::now(),
                },
                "$unset": { "password_reset_token": "", "password_reset_expires": "" },
            },
        )
        .await?;

    let user_id = user
        .id
        .ok_or_else(|| ApiError::Internal("Unable to read user id".to_string()))?;
    let token = generate_token(&user.email, user_id, user.role)?;
    Ok(send_token(token, HttpResponse::Ok()))
}

pub async fn update_password(
    claims: Claims,
    data: web::Data<Arc<Client>>,
    input: web::Json<UpdatePasswordInput>,
) -> Result<HttpResponse, ApiError> {
    let client = data.into_inner();
    let collection = mongo::users(&client);
    let input = input.into_inner();
    let user_id = ObjectId::parse_str(&claims.user_id)?;

    let user = collection
        .find_one(doc! { "_id": user_id, "active": { "$ne": false } })
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if !bcrypt::verify(&input.password_current, &user.password).unwrap_or(false) {
        return Err(ApiError::Unauthorized(
            "Your current password is wrong".to_string(),
        ));
    }

    validate_password(&input.password, &input.password_confirm)?;

    let hashed = bcrypt::hash(&input.password, bcrypt::DEFAULT_COST)?;
    collection
        .update_one(
            doc! { "_id": user_id },
            doc! { "$set": {
                "password": hashed,
                "password_changed_at": DateTime::now(),
                "updated_at": DateTime::now(),
            }},
        )
        .await?;

    let token = generate_token(&user.email, user_id, user.role)?;
    Ok(send_token(token, HttpResponse::Ok()))
}

/// Soft delete: the account stays in the collection but is excluded
/// from sign-in and session lookups.
pub async fn delete_me(claims: Claims, data: web::Data<Arc<Client>>) -> Result<HttpResponse, ApiError> {
    let client = data.into_inner();
    let user_id = ObjectId::parse_str(&claims.user_id)?;

    mongo::users(&client)
        .update_one(
            doc! { "_id": user_id },
            doc! { "$set": { "active": false, "updated_at": DateTime::now() } },
        )
        .await?;

    Ok(HttpResponse::NoContent().finish())
}

// Atomic so concurrent failed attempts cannot drop increments
fn signin_failure_update() -> mongodb::bson::Document {
    doc! { "$inc": { "failed_signins": 1 } }
}

fn validate_password(password: &str, password_confirm: &str) -> Result<(), ApiError> {
    if password.len() < 8 {
        return Err(ApiError::BadRequest(
            "Password must be at least 8 characters".to_string(),
        ));
    }
    if password != password_confirm {
        return Err(ApiError::BadRequest("Passwords are not the same".to_string()));
    }
    Ok(())
}

fn is_valid_email(email: &str) -> bool {
    let re = regex::Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]*[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]*[a-zA-Z0-9])?)*$",
    );
    re.unwrap().is_match(email)
}

pub fn generate_token(
    email: &str,
    user_id: ObjectId,
    role: UserRole,
) -> Result<String, jsonwebtoken::errors::Error> {
    let secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| "default_secret".to_string());
    let now = Utc::now();

    let claims = Claims {
        sub: email.to_string(),
        iat: now.timestamp() as usize,
        exp: (now + Duration::hours(24)).timestamp() as usize,
        user_id: user_id.to_string(),
        role,
    };

    let header = Header::new(Algorithm::HS256);
    encode(&header, &claims, &EncodingKey::from_secret(secret.as_ref()))
}

fn send_token(token: String, mut builder: actix_web::HttpResponseBuilder) -> HttpResponse {
    let cookie = Cookie::build("jwt", token.clone())
        .path("/")
        .http_only(true)
        .finish();

    builder.cookie(cookie).json(serde_json::json!({
        "status": "success",
        "token": token,
    }))
}
