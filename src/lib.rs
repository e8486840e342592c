//! Storefront API Library
//!
//! Multi-tenant store management backend: companies own stores, stores list
//! products, build carts and place orders, and payment settles through an
//! admin-mediated QR-code verification workflow.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod openapi;
pub mod services;

use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

/// Shared application state handed to every handler.
///
/// Everything in here is constructed once in `main` and injected; there is
/// no lazily-initialized global.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: Arc<config::AppConfig>,
    pub auth: Arc<auth::AuthService>,
    pub event_sender: events::EventSender,
    pub services: services::AppServices,
}

/// Standard response envelope: `{ success, message, data?, error? }`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<serde_json::Value> {
    pub fn error(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod response_tests {
    use super::*;

    #[test]
    fn success_envelope_shape() {
        let response = ApiResponse::success("Cart fetched", serde_json::json!({"items": []}));
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["success"], serde_json::json!(true));
        assert_eq!(value["message"], serde_json::json!("Cart fetched"));
        assert!(value.get("error").is_none());
        assert_eq!(value["data"]["items"], serde_json::json!([]));
    }

    #[test]
    fn error_envelope_shape() {
        let response = ApiResponse::error("Order not found", "Not Found");
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["success"], serde_json::json!(false));
        assert_eq!(value["error"], serde_json::json!("Not Found"));
        assert!(value.get("data").is_none());
    }
}
