//! Course inquiries submitted from the public site.

use crate::ids::InquiryId;
use crate::validation::validate_phone;
use chrono::{DateTime, Utc};
use collegium_core::PaginationParams;
use collegium_core::serde::deserialize_optional_from_str;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "inquiry_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InquiryStatus {
    #[default]
    Pending,
    Contacted,
    Enrolled,
    Rejected,
}

impl InquiryStatus {
    pub const ALL: [InquiryStatus; 4] = [
        Self::Pending,
        Self::Contacted,
        Self::Enrolled,
        Self::Rejected,
    ];
}

impl FromStr for InquiryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "contacted" => Ok(Self::Contacted),
            "enrolled" => Ok(Self::Enrolled),
            "rejected" => Ok(Self::Rejected),
            other => Err(format!("unknown inquiry status: {}", other)),
        }
    }
}

/// Where the prospect heard about the institution.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[sqlx(type_name = "inquiry_source", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InquirySource {
    Linkedin,
    Friend,
    College,
    Poster,
    Website,
    Googlemap,
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct CourseInquiry {
    pub id: InquiryId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub qualification: String,
    pub heard_about_us: InquirySource,
    pub message: String,
    pub status: InquiryStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateInquiryDto {
    #[validate(length(min = 2, max = 100, message = "Name must be between 2 and 100 characters"))]
    pub name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(custom(function = "validate_phone"))]
    pub phone: String,
    #[validate(length(min = 1, max = 200, message = "Qualification is required"))]
    pub qualification: String,
    pub heard_about_us: InquirySource,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub message: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateInquiryDto {
    pub status: Option<InquiryStatus>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct InquiryFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_from_str")]
    pub status: Option<InquiryStatus>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct InquiryStats {
    pub total: i64,
    pub pending: i64,
    pub contacted: i64,
    pub enrolled: i64,
    pub rejected: i64,
}

impl InquiryStats {
    pub fn from_counts(counts: &[(InquiryStatus, i64)]) -> Self {
        let mut stats = Self::default();
        for &(status, count) in counts {
            stats.total += count;
            match status {
                InquiryStatus::Pending => stats.pending += count,
                InquiryStatus::Contacted => stats.contacted += count,
                InquiryStatus::Enrolled => stats.enrolled += count,
                InquiryStatus::Rejected => stats.rejected += count,
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_rejects_unknown_value() {
        let result: Result<CreateInquiryDto, _> = serde_json::from_value(serde_json::json!({
            "name": "Kiran",
            "email": "kiran@example.com",
            "phone": "9876543210",
            "qualification": "12th",
            "heard_about_us": "billboard"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_stats_from_counts() {
        let stats = InquiryStats::from_counts(&[
            (InquiryStatus::Pending, 3),
            (InquiryStatus::Enrolled, 2),
        ]);
        assert_eq!(stats.total, 5);
        assert_eq!(stats.pending, 3);
        assert_eq!(stats.enrolled, 2);
        assert_eq!(stats.rejected, 0);
    }

    #[test]
    fn test_create_inquiry_validation() {
        let dto: CreateInquiryDto = serde_json::from_value(serde_json::json!({
            "name": "Kiran",
            "email": "kiran-at-example",
            "phone": "9876543210",
            "qualification": "12th",
            "heard_about_us": "googlemap"
        }))
        .unwrap();
        assert!(dto.validate().is_err());
    }
}
