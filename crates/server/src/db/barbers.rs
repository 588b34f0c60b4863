//! Barber repository for listing queries.
//!
//! Filter values are always bound parameters; only fixed SQL fragments are
//! pushed as text.

use sqlx::{PgPool, Postgres, QueryBuilder};

use barberbook_core::BarberId;

use super::StoreError;
use crate::models::barber::{Barber, BarberFilter, BarberSort, PAGE_SIZE};

const SELECT_BARBERS: &str = "SELECT id, name, basic_info, price, experience, status, image_path FROM barbers";

#[derive(Debug, sqlx::FromRow)]
struct BarberRow {
    id: i32,
    name: String,
    basic_info: String,
    price: i32,
    experience: String,
    status: String,
    image_path: String,
}

impl From<BarberRow> for Barber {
    fn from(row: BarberRow) -> Self {
        Self {
            id: BarberId::new(row.id),
            name: row.name,
            basic_info: row.basic_info,
            price: row.price,
            experience: row.experience,
            status: row.status,
            image_path: row.image_path,
        }
    }
}

/// Build the filtered listing query for one page.
fn filtered_query(filter: &BarberFilter) -> QueryBuilder<'_, Postgres> {
    let mut qb = QueryBuilder::new(SELECT_BARBERS);
    let mut has_where = false;

    if let Some(status) = &filter.status {
        qb.push(" WHERE status = ");
        qb.push_bind(status.as_str());
        has_where = true;
    }

    if let Some(experience) = &filter.experience {
        qb.push(if has_where { " AND " } else { " WHERE " });
        qb.push("experience = ");
        qb.push_bind(experience.as_str());
    }

    qb.push(match filter.sort {
        Some(BarberSort::Name) => " ORDER BY name, id",
        Some(BarberSort::Price) => " ORDER BY price, id",
        None => " ORDER BY id",
    });

    qb.push(" LIMIT ");
    qb.push_bind(i64::from(PAGE_SIZE));
    qb.push(" OFFSET ");
    qb.push_bind(filter.offset());

    qb
}

/// Repository for barber listing queries.
pub struct BarberRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BarberRepository<'a> {
    /// Create a new barber repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All barbers in id order.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Barber>, StoreError> {
        let rows = sqlx::query_as::<_, BarberRow>(&format!("{SELECT_BARBERS} ORDER BY id"))
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(Barber::from).collect())
    }

    /// One page of barbers matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if the query fails.
    pub async fn list_filtered(&self, filter: &BarberFilter) -> Result<Vec<Barber>, StoreError> {
        let rows = filtered_query(filter)
            .build_query_as::<BarberRow>()
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(Barber::from).collect())
    }
}
