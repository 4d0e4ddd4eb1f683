//! Success half of the API envelope.

use serde::Serialize;
use utoipa::ToSchema;

use crate::pagination::{Paginated, PaginationMeta};

/// `{ "success": true, "message": "...", "data": ... }`
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        }
    }
}

/// Envelope for operations that only report an outcome.
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// `{ "success": true, "data": [...], "pagination": {...} }`
#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub success: bool,
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T> From<Paginated<T>> for PaginatedResponse<T> {
    fn from(page: Paginated<T>) -> Self {
        Self {
            success: true,
            data: page.data,
            pagination: page.pagination,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::PaginationParams;

    #[test]
    fn test_ok_envelope_omits_message() {
        let json = serde_json::to_value(ApiResponse::ok(5)).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"], 5);
        assert!(json.get("message").is_none());
    }

    #[test]
    fn test_message_envelope() {
        let json = serde_json::to_value(ApiResponse::with_message("Branch created", "x")).unwrap();
        assert_eq!(json["message"], "Branch created");
        assert_eq!(json["data"], "x");
    }

    #[test]
    fn test_paginated_envelope() {
        let page = Paginated::from_vec(vec![1, 2, 3], &PaginationParams::new(1, 2));
        let json = serde_json::to_value(PaginatedResponse::from(page)).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"].as_array().unwrap().len(), 2);
        assert_eq!(json["pagination"]["total_pages"], 2);
    }
}
