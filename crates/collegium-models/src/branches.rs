//! Branch domain models and DTOs.
//!
//! A branch is an academic department with a fixed seat capacity.
//! `available_seats` always stays within `[0, total_seats]`.

use crate::ids::{BranchId, UserId};
use crate::images::{BranchImage, ImageRef};
use crate::users::UserSummary;
use crate::validation::validate_phone;
use chrono::{DateTime, Utc};
use collegium_core::PaginationParams;
use collegium_core::serde::deserialize_optional_bool;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

pub const DEFAULT_BRANCH_NAME: &str = "General Studies";
pub const DEFAULT_BRANCH_CODE: &str = "GEN";
pub const DEFAULT_BRANCH_SEATS: i32 = 100;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Branch {
    pub id: BranchId,
    pub branch_name: String,
    pub branch_code: String,
    pub description: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    pub facilities: Vec<String>,
    pub is_headquarters: bool,
    /// User id of the faculty member heading the branch.
    pub department_head: Option<UserId>,
    pub total_seats: i32,
    pub available_seats: i32,
    pub established_year: Option<i32>,
    #[schema(value_type = Vec<BranchImage>)]
    pub images: Json<Vec<BranchImage>>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Branch {
    pub fn occupied_seats(&self) -> i32 {
        self.total_seats - self.available_seats
    }

    pub fn image_public_ids(&self) -> Vec<String> {
        self.images.iter().map(|i| i.public_id.clone()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BranchSummary {
    pub id: BranchId,
    pub branch_name: String,
    pub branch_code: String,
}

impl From<&Branch> for BranchSummary {
    fn from(branch: &Branch) -> Self {
        Self {
            id: branch.id,
            branch_name: branch.branch_name.clone(),
            branch_code: branch.branch_code.clone(),
        }
    }
}

/// Branch with its department head resolved.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BranchDetails {
    #[serde(flatten)]
    pub branch: Branch,
    pub head: Option<UserSummary>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BranchStatistics {
    #[serde(flatten)]
    pub branch: Branch,
    pub occupied_seats: i32,
    /// Percentage of seats taken, rounded to two decimals.
    pub occupancy_rate: f64,
    pub user_count: i64,
}

impl BranchStatistics {
    pub fn new(branch: Branch, user_count: i64) -> Self {
        let occupied_seats = branch.occupied_seats();
        let rate = if branch.total_seats > 0 {
            f64::from(occupied_seats) / f64::from(branch.total_seats) * 100.0
        } else {
            0.0
        };
        Self {
            branch,
            occupied_seats,
            occupancy_rate: (rate * 100.0).round() / 100.0,
            user_count,
        }
    }
}

/// Row values for a new branch, after defaults are applied.
#[derive(Debug, Clone)]
pub struct NewBranch {
    pub branch_name: String,
    pub branch_code: String,
    pub description: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    pub contact_phone: Option<String>,
    pub contact_email: Option<String>,
    pub facilities: Vec<String>,
    pub is_headquarters: bool,
    pub department_head: Option<UserId>,
    pub total_seats: i32,
    pub available_seats: i32,
    pub established_year: Option<i32>,
    pub images: Vec<BranchImage>,
}

impl NewBranch {
    /// The "General Studies" fallback branch.
    pub fn general_studies() -> Self {
        Self {
            branch_name: DEFAULT_BRANCH_NAME.to_string(),
            branch_code: DEFAULT_BRANCH_CODE.to_string(),
            description: "Default branch for general studies".to_string(),
            address: None,
            city: None,
            state: None,
            pincode: None,
            contact_phone: None,
            contact_email: None,
            facilities: Vec::new(),
            is_headquarters: false,
            department_head: None,
            total_seats: DEFAULT_BRANCH_SEATS,
            available_seats: DEFAULT_BRANCH_SEATS,
            established_year: None,
            images: Vec::new(),
        }
    }
}

fn validate_seats(dto: &CreateBranchDto) -> Result<(), ValidationError> {
    match dto.available_seats {
        Some(available) if available > dto.total_seats => {
            let mut err = ValidationError::new("available_seats");
            err.message = Some("Available seats cannot exceed total seats".into());
            Err(err)
        }
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[validate(schema(function = "validate_seats", skip_on_field_errors = false))]
pub struct CreateBranchDto {
    #[validate(length(min = 2, max = 100, message = "Branch name must be between 2 and 100 characters"))]
    pub branch_name: String,
    #[validate(length(min = 2, max = 10, message = "Branch code must be between 2 and 10 characters"))]
    pub branch_code: String,
    #[serde(default)]
    #[validate(length(max = 1000))]
    pub description: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    #[validate(custom(function = "validate_phone"))]
    pub contact_phone: Option<String>,
    #[validate(email(message = "Invalid contact email"))]
    pub contact_email: Option<String>,
    #[serde(default)]
    pub facilities: Vec<String>,
    #[serde(default)]
    pub is_headquarters: bool,
    pub department_head: Option<UserId>,
    #[validate(range(min = 1, message = "Total seats must be at least 1"))]
    pub total_seats: i32,
    /// Defaults to `total_seats`.
    #[validate(range(min = 0, message = "Available seats cannot be negative"))]
    pub available_seats: Option<i32>,
    #[validate(range(min = 1800, max = 2100))]
    pub established_year: Option<i32>,
    #[serde(default)]
    #[validate(length(max = 10), nested)]
    pub images: Vec<ImageRef>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBranchDto {
    #[validate(length(min = 2, max = 100))]
    pub branch_name: Option<String>,
    #[validate(length(min = 2, max = 10))]
    pub branch_code: Option<String>,
    #[validate(length(max = 1000))]
    pub description: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub pincode: Option<String>,
    #[validate(custom(function = "validate_phone"))]
    pub contact_phone: Option<String>,
    #[validate(email(message = "Invalid contact email"))]
    pub contact_email: Option<String>,
    pub facilities: Option<Vec<String>>,
    pub is_headquarters: Option<bool>,
    pub department_head: Option<UserId>,
    #[validate(range(min = 1, message = "Total seats must be at least 1"))]
    pub total_seats: Option<i32>,
    #[validate(range(min = 0, message = "Available seats cannot be negative"))]
    pub available_seats: Option<i32>,
    #[validate(range(min = 1800, max = 2100))]
    pub established_year: Option<i32>,
    pub is_active: Option<bool>,
}

impl UpdateBranchDto {
    /// Merges the supplied fields except the seat counts, see
    /// [`UpdateBranchDto::seat_change`].
    pub fn apply(self, branch: &mut Branch) {
        if let Some(name) = self.branch_name {
            branch.branch_name = name;
        }
        if let Some(code) = self.branch_code {
            branch.branch_code = code.to_uppercase();
        }
        if let Some(description) = self.description {
            branch.description = description;
        }
        if let Some(address) = self.address {
            branch.address = Some(address);
        }
        if let Some(city) = self.city {
            branch.city = Some(city);
        }
        if let Some(state) = self.state {
            branch.state = Some(state);
        }
        if let Some(pincode) = self.pincode {
            branch.pincode = Some(pincode);
        }
        if let Some(phone) = self.contact_phone {
            branch.contact_phone = Some(phone);
        }
        if let Some(email) = self.contact_email {
            branch.contact_email = Some(email);
        }
        if let Some(facilities) = self.facilities {
            branch.facilities = facilities;
        }
        if let Some(hq) = self.is_headquarters {
            branch.is_headquarters = hq;
        }
        if let Some(head) = self.department_head {
            branch.department_head = Some(head);
        }
        if let Some(year) = self.established_year {
            branch.established_year = Some(year);
        }
        if let Some(is_active) = self.is_active {
            branch.is_active = is_active;
        }
    }

    /// Capacity part of the update, written separately from the other columns.
    pub fn seat_change(&self) -> SeatChange {
        SeatChange {
            total_seats: self.total_seats,
            available_seats: self.available_seats,
        }
    }
}

/// Why a capacity change was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatChangeError {
    /// The new total is smaller than the seats already taken.
    BelowOccupied,
    AboveTotal,
}

impl SeatChangeError {
    pub fn message(self) -> &'static str {
        match self {
            Self::BelowOccupied => "Total seats cannot be less than occupied seats",
            Self::AboveTotal => "Available seats cannot exceed total seats",
        }
    }
}

/// Capacity fields of a branch update. `None` keeps the stored value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeatChange {
    pub total_seats: Option<i32>,
    pub available_seats: Option<i32>,
}

impl SeatChange {
    pub fn is_empty(&self) -> bool {
        self.total_seats.is_none() && self.available_seats.is_none()
    }

    /// Resolves against the stored `(total, available)` pair. A new total on
    /// its own keeps the number of occupied seats.
    pub fn resolve(&self, total: i32, available: i32) -> Result<(i32, i32), SeatChangeError> {
        let next_total = self.total_seats.unwrap_or(total);
        let next_available = match self.available_seats {
            Some(available) => i64::from(available),
            None => i64::from(available) + i64::from(next_total) - i64::from(total),
        };
        if next_available < 0 {
            return Err(SeatChangeError::BelowOccupied);
        }
        if next_available > i64::from(next_total) {
            return Err(SeatChangeError::AboveTotal);
        }
        let next_available =
            i32::try_from(next_available).map_err(|_| SeatChangeError::AboveTotal)?;
        Ok((next_total, next_available))
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AssignDepartmentHeadDto {
    /// User id of a faculty user.
    pub faculty_id: UserId,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct UpdateSeatsDto {
    /// Positive frees seats, negative takes seats.
    pub seat_change: i32,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BranchFilterParams {
    #[serde(default, deserialize_with = "deserialize_optional_bool")]
    pub is_active: Option<bool>,
    /// Case-insensitive match on branch name or code
    pub search: Option<String>,
    #[serde(flatten)]
    pub pagination: PaginationParams,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_dto() -> CreateBranchDto {
        CreateBranchDto {
            branch_name: "Computer Science".to_string(),
            branch_code: "cse".to_string(),
            description: String::new(),
            address: None,
            city: None,
            state: None,
            pincode: None,
            contact_phone: None,
            contact_email: None,
            facilities: vec![],
            is_headquarters: false,
            department_head: None,
            total_seats: 60,
            available_seats: None,
            established_year: None,
            images: vec![],
        }
    }

    fn branch(total: i32, available: i32) -> Branch {
        let now = Utc::now();
        Branch {
            id: BranchId::new(),
            branch_name: "Mechanical".to_string(),
            branch_code: "ME".to_string(),
            description: String::new(),
            address: None,
            city: None,
            state: None,
            pincode: None,
            contact_phone: None,
            contact_email: None,
            facilities: vec![],
            is_headquarters: false,
            department_head: None,
            total_seats: total,
            available_seats: available,
            established_year: None,
            images: Json(vec![]),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_create_branch_validation() {
        assert!(create_dto().validate().is_ok());

        let dto = CreateBranchDto {
            total_seats: 0,
            ..create_dto()
        };
        assert!(dto.validate().is_err());

        let dto = CreateBranchDto {
            available_seats: Some(61),
            ..create_dto()
        };
        assert!(dto.validate().is_err());

        let dto = CreateBranchDto {
            contact_email: Some("not-an-email".to_string()),
            ..create_dto()
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_statistics_rounds_rate() {
        let stats = BranchStatistics::new(branch(3, 2), 1);
        assert_eq!(stats.occupied_seats, 1);
        assert_eq!(stats.occupancy_rate, 33.33);
    }

    #[test]
    fn test_update_total_keeps_occupied_seats() {
        let change = UpdateBranchDto {
            total_seats: Some(80),
            ..Default::default()
        }
        .seat_change();
        assert_eq!(change.resolve(60, 50), Ok((80, 70)));
        assert_eq!(change.resolve(60, 0), Ok((80, 20)));
    }

    #[test]
    fn test_apply_leaves_seats_alone() {
        let mut b = branch(60, 50);
        UpdateBranchDto {
            branch_name: Some("Mechanics".to_string()),
            total_seats: Some(80),
            available_seats: Some(10),
            ..Default::default()
        }
        .apply(&mut b);
        assert_eq!(b.branch_name, "Mechanics");
        assert_eq!((b.total_seats, b.available_seats), (60, 50));
    }

    #[test]
    fn test_seat_change_bounds() {
        let shrink = SeatChange {
            total_seats: Some(5),
            available_seats: None,
        };
        assert_eq!(shrink.resolve(50, 40), Err(SeatChangeError::BelowOccupied));

        let overfill = SeatChange {
            total_seats: None,
            available_seats: Some(61),
        };
        assert_eq!(overfill.resolve(60, 10), Err(SeatChangeError::AboveTotal));

        let extreme = SeatChange {
            total_seats: Some(i32::MAX),
            available_seats: None,
        };
        // 1 + i32::MAX - 1 without an intermediate overflow
        assert_eq!(extreme.resolve(1, 1), Ok((i32::MAX, i32::MAX)));
        assert!(SeatChange::default().is_empty());
        assert_eq!(SeatChange::default().resolve(10, 4), Ok((10, 4)));
    }

    #[test]
    fn test_general_studies_defaults() {
        let b = NewBranch::general_studies();
        assert_eq!(b.branch_code, "GEN");
        assert_eq!(b.total_seats, 100);
        assert_eq!(b.available_seats, 100);
    }
}
