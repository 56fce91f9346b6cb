use serde::{Deserialize, Serialize};
use std::env;

use crate::error::ApiError;

#[derive(Debug, Serialize, Deserialize)]
pub struct SendGridEmail {
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SendGridPersonalization {
    pub to: Vec<SendGridEmail>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SendGridContent {
    #[serde(rename = "type")]
    pub content_type: String,
    pub value: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SendGridRequest {
    pub personalizations: Vec<SendGridPersonalization>,
    pub from: SendGridEmail,
    pub subject: String,
    pub content: Vec<SendGridContent>,
}

pub struct EmailService {
    api_key: String,
    from_email: String,
    client: reqwest::Client,
}

impl EmailService {
    pub fn new() -> Result<Self, ApiError> {
        let api_key = env::var("SENDGRID_API_KEY")
            .map_err(|_| ApiError::Internal("SENDGRID_API_KEY not set".to_string()))?;
        let from_email =
            env::var("EMAIL_FROM").unwrap_or_else(|_| "hello@tours.example.com".to_string());

        Ok(Self {
            api_key,
            from_email,
            client: reqwest::Client::new(),
        })
    }

    pub async fn send_password_reset(&self, to_email: &str, reset_url: &str) -> Result<(), ApiError> {
        let content = format!(
            "Forgot your password? Submit a PATCH request with your new password to: {}\n\
             If you didn't forget your password, please ignore this email. \
             The link is valid for 10 minutes.",
            reset_url
        );
        self.send_email(to_email, "Your password reset token (valid for 10 min)", &content)
            .await
    }

    async fn send_email(&self, to_email: &str, subject: &str, content: &str) -> Result<(), ApiError> {
        let url = "https://api.sendgrid.com/v3/mail/send";

        let request = SendGridRequest {
            personalizations: vec![SendGridPersonalization {
                to: vec![SendGridEmail {
                    email: to_email.to_string(),
                }],
            }],
            from: SendGridEmail {
                email: self.from_email.clone(),
            },
            subject: subject.to_string(),
            content: vec![SendGridContent {
                content_type: "text/plain".to_string(),
                value: content.to_string(),
            }],
        };

        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| ApiError::Internal(format!("Email request failed: {}", e)))?;

        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            Err(ApiError::Internal(format!(
                "SendGrid error, status: {}, body: {}",
                status, body
            )))
        }
    }
}
