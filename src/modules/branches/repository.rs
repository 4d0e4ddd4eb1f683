use anyhow::anyhow;
use async_trait::async_trait;
use collegium_core::{AppError, Paginated};
use collegium_models::branches::{Branch, BranchFilterParams, NewBranch, SeatChange};
use collegium_models::{BranchId, BranchImage, UserId};
use sqlx::types::Json;
use sqlx::{Postgres, QueryBuilder};

use crate::store::PgStore;
use crate::store::postgres::{like_pattern, unique_violation};

/// Result of a bounded seat change.
#[derive(Debug, Clone)]
pub enum SeatAdjustment {
    Updated(Branch),
    NotFound,
    /// The change would take `available_seats` below zero.
    Insufficient,
    /// The change would push `available_seats` above `total_seats`.
    OverCapacity,
}

#[async_trait]
pub trait BranchRepository: Send + Sync {
    async fn create(&self, branch: NewBranch) -> Result<Branch, AppError>;
    async fn find_by_id(&self, id: BranchId) -> Result<Option<Branch>, AppError>;
    async fn find_by_code(&self, code: &str) -> Result<Option<Branch>, AppError>;
    /// Oldest active branch.
    async fn find_first_active(&self) -> Result<Option<Branch>, AppError>;
    async fn list(&self, filters: &BranchFilterParams) -> Result<Paginated<Branch>, AppError>;
    async fn list_active(&self) -> Result<Vec<Branch>, AppError>;
    /// Writes the descriptive columns of `branch`. Seat counts come from
    /// `seats` only and are resolved against the stored row, so a concurrent
    /// [`BranchRepository::adjust_seats`] is never overwritten.
    async fn update(&self, branch: &Branch, seats: SeatChange) -> Result<Branch, AppError>;
    async fn delete(&self, id: BranchId) -> Result<bool, AppError>;
    /// Applies `delta` in one conditional write.
    async fn adjust_seats(&self, id: BranchId, delta: i32) -> Result<SeatAdjustment, AppError>;
    async fn assign_department_head(
        &self,
        id: BranchId,
        head: UserId,
    ) -> Result<Option<Branch>, AppError>;
    async fn add_images(
        &self,
        id: BranchId,
        images: Vec<BranchImage>,
    ) -> Result<Option<Branch>, AppError>;
    async fn remove_image(&self, id: BranchId, public_id: &str)
    -> Result<Option<Branch>, AppError>;
    /// First active branch, creating "General Studies" when none exists.
    async fn ensure_default(&self) -> Result<Branch, AppError>;
}

fn push_filters(query: &mut QueryBuilder<'_, Postgres>, filters: &BranchFilterParams) {
    query.push(" WHERE TRUE");
    if let Some(is_active) = filters.is_active {
        query.push(" AND is_active = ").push_bind(is_active);
    }
    if let Some(search) = filters.search.as_deref().filter(|s| !s.trim().is_empty()) {
        let pattern = like_pattern(search);
        query
            .push(" AND (branch_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR branch_code ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

#[async_trait]
impl BranchRepository for PgStore {
    async fn create(&self, branch: NewBranch) -> Result<Branch, AppError> {
        sqlx::query_as::<_, Branch>(
            r#"
            INSERT INTO branches (id, branch_name, branch_code, description, address, city, state,
                pincode, contact_phone, contact_email, facilities, is_headquarters, department_head,
                total_seats, available_seats, established_year, images)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING *
            "#,
        )
        .bind(BranchId::new())
        .bind(&branch.branch_name)
        .bind(&branch.branch_code)
        .bind(&branch.description)
        .bind(&branch.address)
        .bind(&branch.city)
        .bind(&branch.state)
        .bind(&branch.pincode)
        .bind(&branch.contact_phone)
        .bind(&branch.contact_email)
        .bind(&branch.facilities)
        .bind(branch.is_headquarters)
        .bind(branch.department_head)
        .bind(branch.total_seats)
        .bind(branch.available_seats)
        .bind(branch.established_year)
        .bind(Json(&branch.images))
        .fetch_one(self.pool())
        .await
        .map_err(|e| unique_violation(e, "Branch code already exists"))
    }

    async fn find_by_id(&self, id: BranchId) -> Result<Option<Branch>, AppError> {
        let branch = sqlx::query_as::<_, Branch>("SELECT * FROM branches WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;
        Ok(branch)
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<Branch>, AppError> {
        let branch = sqlx::query_as::<_, Branch>("SELECT * FROM branches WHERE branch_code = $1")
            .bind(code.trim().to_uppercase())
            .fetch_optional(self.pool())
            .await?;
        Ok(branch)
    }

    async fn find_first_active(&self) -> Result<Option<Branch>, AppError> {
        let branch = sqlx::query_as::<_, Branch>(
            "SELECT * FROM branches WHERE is_active ORDER BY created_at LIMIT 1",
        )
        .fetch_optional(self.pool())
        .await?;
        Ok(branch)
    }

    async fn list(&self, filters: &BranchFilterParams) -> Result<Paginated<Branch>, AppError> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM branches");
        push_filters(&mut count, filters);
        let total: i64 = count.build_query_scalar().fetch_one(self.pool()).await?;

        let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM branches");
        push_filters(&mut query, filters);
        query
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(filters.pagination.limit())
            .push(" OFFSET ")
            .push_bind(filters.pagination.offset());
        let branches = query
            .build_query_as::<Branch>()
            .fetch_all(self.pool())
            .await?;

        Ok(Paginated::new(branches, total, &filters.pagination))
    }

    async fn list_active(&self) -> Result<Vec<Branch>, AppError> {
        let branches = sqlx::query_as::<_, Branch>(
            "SELECT * FROM branches WHERE is_active ORDER BY branch_name",
        )
        .fetch_all(self.pool())
        .await?;
        Ok(branches)
    }

    async fn update(&self, branch: &Branch, seats: SeatChange) -> Result<Branch, AppError> {
        let updated = sqlx::query_as::<_, Branch>(
            r#"
            UPDATE branches
            SET branch_name = $2, branch_code = $3, description = $4, address = $5, city = $6,
                state = $7, pincode = $8, contact_phone = $9, contact_email = $10,
                facilities = $11, is_headquarters = $12, department_head = $13,
                total_seats = COALESCE($14, total_seats),
                available_seats = COALESCE(
                    $15,
                    (available_seats::bigint + COALESCE($14, total_seats) - total_seats)::int
                ),
                established_year = $16, is_active = $17, updated_at = NOW()
            WHERE id = $1
              AND COALESCE(
                    $15::bigint,
                    available_seats::bigint + COALESCE($14, total_seats) - total_seats
                  ) BETWEEN 0 AND COALESCE($14, total_seats)
            RETURNING *
            "#,
        )
        .bind(branch.id)
        .bind(&branch.branch_name)
        .bind(&branch.branch_code)
        .bind(&branch.description)
        .bind(&branch.address)
        .bind(&branch.city)
        .bind(&branch.state)
        .bind(&branch.pincode)
        .bind(&branch.contact_phone)
        .bind(&branch.contact_email)
        .bind(&branch.facilities)
        .bind(branch.is_headquarters)
        .bind(branch.department_head)
        .bind(seats.total_seats)
        .bind(seats.available_seats)
        .bind(branch.established_year)
        .bind(branch.is_active)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| unique_violation(e, "Branch code already exists"))?;

        if let Some(branch) = updated {
            return Ok(branch);
        }

        // The seat guard rejected the row, or it is gone.
        let current = self
            .find_by_id(branch.id)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow!("Branch not found")))?;
        let err = seats
            .resolve(current.total_seats, current.available_seats)
            .err()
            .map_or("Branch seats changed concurrently", |e| e.message());
        Err(AppError::bad_request(anyhow!(err)))
    }

    async fn delete(&self, id: BranchId) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM branches WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn adjust_seats(&self, id: BranchId, delta: i32) -> Result<SeatAdjustment, AppError> {
        let updated = sqlx::query_as::<_, Branch>(
            r#"
            UPDATE branches
            SET available_seats = (available_seats::bigint + $2)::int, updated_at = NOW()
            WHERE id = $1 AND available_seats::bigint + $2 BETWEEN 0 AND total_seats
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(delta)
        .fetch_optional(self.pool())
        .await?;

        if let Some(branch) = updated {
            return Ok(SeatAdjustment::Updated(branch));
        }

        // The guard rejected the change; read the row to report why.
        Ok(match self.find_by_id(id).await? {
            None => SeatAdjustment::NotFound,
            Some(branch) if i64::from(branch.available_seats) + i64::from(delta) < 0 => {
                SeatAdjustment::Insufficient
            }
            Some(_) => SeatAdjustment::OverCapacity,
        })
    }

    async fn assign_department_head(
        &self,
        id: BranchId,
        head: UserId,
    ) -> Result<Option<Branch>, AppError> {
        let branch = sqlx::query_as::<_, Branch>(
            "UPDATE branches SET department_head = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(head)
        .fetch_optional(self.pool())
        .await?;
        Ok(branch)
    }

    async fn add_images(
        &self,
        id: BranchId,
        images: Vec<BranchImage>,
    ) -> Result<Option<Branch>, AppError> {
        let branch = sqlx::query_as::<_, Branch>(
            r#"
            UPDATE branches SET images = images || $2::jsonb, updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(Json(images))
        .fetch_optional(self.pool())
        .await?;
        Ok(branch)
    }

    async fn remove_image(
        &self,
        id: BranchId,
        public_id: &str,
    ) -> Result<Option<Branch>, AppError> {
        let branch = sqlx::query_as::<_, Branch>(
            r#"
            UPDATE branches
            SET images = COALESCE(
                    (SELECT jsonb_agg(img) FROM jsonb_array_elements(images) AS img
                     WHERE img->>'public_id' <> $2),
                    '[]'::jsonb),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(public_id)
        .fetch_optional(self.pool())
        .await?;
        Ok(branch)
    }

    async fn ensure_default(&self) -> Result<Branch, AppError> {
        let id = collegium_db::ensure_default_branch(self.pool()).await?;
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::internal_error("Default branch vanished after bootstrap"))
    }
}

#[cfg(any(test, feature = "test-utils"))]
mod memory {
    use super::*;
    use crate::store::MemoryStore;
    use crate::store::memory::{matches_search, newest_first};
    use chrono::Utc;
    use collegium_models::branches::DEFAULT_BRANCH_CODE;

    fn insert(tables: &mut crate::store::memory::Tables, branch: NewBranch) -> Result<Branch, AppError> {
        if tables
            .branches
            .iter()
            .any(|b| b.branch_code == branch.branch_code)
        {
            return Err(AppError::bad_request(anyhow!("Branch code already exists")));
        }
        let now = Utc::now();
        let created = Branch {
            id: BranchId::new(),
            branch_name: branch.branch_name,
            branch_code: branch.branch_code,
            description: branch.description,
            address: branch.address,
            city: branch.city,
            state: branch.state,
            pincode: branch.pincode,
            contact_phone: branch.contact_phone,
            contact_email: branch.contact_email,
            facilities: branch.facilities,
            is_headquarters: branch.is_headquarters,
            department_head: branch.department_head,
            total_seats: branch.total_seats,
            available_seats: branch.available_seats,
            established_year: branch.established_year,
            images: Json(branch.images),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        tables.branches.push(created.clone());
        Ok(created)
    }

    #[async_trait]
    impl BranchRepository for MemoryStore {
        async fn create(&self, branch: NewBranch) -> Result<Branch, AppError> {
            insert(&mut self.lock(), branch)
        }

        async fn find_by_id(&self, id: BranchId) -> Result<Option<Branch>, AppError> {
            Ok(self.lock().branches.iter().find(|b| b.id == id).cloned())
        }

        async fn find_by_code(&self, code: &str) -> Result<Option<Branch>, AppError> {
            let code = code.trim().to_uppercase();
            Ok(self
                .lock()
                .branches
                .iter()
                .find(|b| b.branch_code == code)
                .cloned())
        }

        async fn find_first_active(&self) -> Result<Option<Branch>, AppError> {
            Ok(self
                .lock()
                .branches
                .iter()
                .filter(|b| b.is_active)
                .min_by_key(|b| b.created_at)
                .cloned())
        }

        async fn list(&self, filters: &BranchFilterParams) -> Result<Paginated<Branch>, AppError> {
            let tables = self.lock();
            let rows = newest_first(
                &tables.branches,
                |b| b.created_at,
                |b| {
                    filters.is_active.is_none_or(|active| b.is_active == active)
                        && matches_search(filters.search.as_deref(), &[&b.branch_name, &b.branch_code])
                },
            );
            Ok(Paginated::from_vec(rows, &filters.pagination))
        }

        async fn list_active(&self) -> Result<Vec<Branch>, AppError> {
            let mut rows: Vec<Branch> = self
                .lock()
                .branches
                .iter()
                .filter(|b| b.is_active)
                .cloned()
                .collect();
            rows.sort_by(|a, b| a.branch_name.cmp(&b.branch_name));
            Ok(rows)
        }

        async fn update(&self, branch: &Branch, seats: SeatChange) -> Result<Branch, AppError> {
            let mut tables = self.lock();
            if tables
                .branches
                .iter()
                .any(|b| b.id != branch.id && b.branch_code == branch.branch_code)
            {
                return Err(AppError::bad_request(anyhow!("Branch code already exists")));
            }
            let stored = tables
                .branches
                .iter_mut()
                .find(|b| b.id == branch.id)
                .ok_or_else(|| AppError::not_found(anyhow!("Branch not found")))?;
            let (total_seats, available_seats) = seats
                .resolve(stored.total_seats, stored.available_seats)
                .map_err(|e| AppError::bad_request(anyhow!(e.message())))?;
            let images = stored.images.clone();
            *stored = branch.clone();
            stored.images = images;
            stored.total_seats = total_seats;
            stored.available_seats = available_seats;
            stored.updated_at = Utc::now();
            Ok(stored.clone())
        }

        async fn delete(&self, id: BranchId) -> Result<bool, AppError> {
            let mut tables = self.lock();
            let before = tables.branches.len();
            tables.branches.retain(|b| b.id != id);
            Ok(tables.branches.len() < before)
        }

        async fn adjust_seats(&self, id: BranchId, delta: i32) -> Result<SeatAdjustment, AppError> {
            let mut tables = self.lock();
            let Some(branch) = tables.branches.iter_mut().find(|b| b.id == id) else {
                return Ok(SeatAdjustment::NotFound);
            };
            let next = i64::from(branch.available_seats) + i64::from(delta);
            if next < 0 {
                return Ok(SeatAdjustment::Insufficient);
            }
            if next > i64::from(branch.total_seats) {
                return Ok(SeatAdjustment::OverCapacity);
            }
            branch.available_seats = i32::try_from(next).map_err(AppError::internal)?;
            branch.updated_at = Utc::now();
            Ok(SeatAdjustment::Updated(branch.clone()))
        }

        async fn assign_department_head(
            &self,
            id: BranchId,
            head: UserId,
        ) -> Result<Option<Branch>, AppError> {
            let mut tables = self.lock();
            Ok(tables.branches.iter_mut().find(|b| b.id == id).map(|b| {
                b.department_head = Some(head);
                b.updated_at = Utc::now();
                b.clone()
            }))
        }

        async fn add_images(
            &self,
            id: BranchId,
            images: Vec<BranchImage>,
        ) -> Result<Option<Branch>, AppError> {
            let mut tables = self.lock();
            Ok(tables.branches.iter_mut().find(|b| b.id == id).map(|b| {
                b.images.0.extend(images);
                b.updated_at = Utc::now();
                b.clone()
            }))
        }

        async fn remove_image(
            &self,
            id: BranchId,
            public_id: &str,
        ) -> Result<Option<Branch>, AppError> {
            let mut tables = self.lock();
            Ok(tables.branches.iter_mut().find(|b| b.id == id).map(|b| {
                b.images.0.retain(|i| i.public_id != public_id);
                b.updated_at = Utc::now();
                b.clone()
            }))
        }

        async fn ensure_default(&self) -> Result<Branch, AppError> {
            let mut tables = self.lock();
            if let Some(active) = tables
                .branches
                .iter()
                .filter(|b| b.is_active)
                .min_by_key(|b| b.created_at)
            {
                return Ok(active.clone());
            }
            if let Some(general) = tables
                .branches
                .iter_mut()
                .find(|b| b.branch_code == DEFAULT_BRANCH_CODE)
            {
                general.is_active = true;
                general.updated_at = Utc::now();
                return Ok(general.clone());
            }
            insert(&mut tables, NewBranch::general_studies())
        }
    }
}
