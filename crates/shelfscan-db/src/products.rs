//! Database operations for `products`.

use chrono::NaiveDateTime;
use shelfscan_core::CleanedProduct;
use sqlx::SqlitePool;

use crate::DbError;

/// A row from the `products` table.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub name: String,
    pub brand: Option<String>,
    pub price: Option<f64>,
    pub original_price: Option<f64>,
    pub discount: Option<i64>,
    pub url: Option<String>,
    pub image_url: Option<String>,
    /// SQLite `CURRENT_TIMESTAMP`, which is UTC without an offset.
    pub created_at: NaiveDateTime,
}

/// Paging and filtering for [`list_products`].
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub limit: i64,
    pub offset: i64,
    /// Exact brand match.
    pub brand: Option<String>,
}

const PRODUCT_COLUMNS: &str =
    "id, name, brand, price, original_price, discount, url, image_url, created_at";

/// Inserts every product in one transaction.
///
/// Returns the number of rows inserted. Either all rows are written or none.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any insert or the commit fails.
pub async fn insert_products(
    pool: &SqlitePool,
    products: &[CleanedProduct],
) -> Result<u64, DbError> {
    let mut tx = pool.begin().await?;
    let mut inserted = 0u64;

    for product in products {
        let result = sqlx::query(
            "INSERT INTO products \
                 (name, brand, price, original_price, discount, url, image_url) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&product.name)
        .bind(&product.brand)
        .bind(product.price)
        .bind(product.original_price)
        .bind(product.discount.map(i64::from))
        .bind(&product.url)
        .bind(&product.image_url)
        .execute(&mut *tx)
        .await?;
        inserted += result.rows_affected();
    }

    tx.commit().await?;
    Ok(inserted)
}

/// Lists products in insertion order, optionally filtered by brand.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_products(
    pool: &SqlitePool,
    filter: &ProductFilter,
) -> Result<Vec<ProductRow>, DbError> {
    let rows = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} \
         FROM products \
         WHERE (?1 IS NULL OR brand = ?1) \
         ORDER BY id \
         LIMIT ?2 OFFSET ?3"
    ))
    .bind(filter.brand.as_deref())
    .bind(filter.limit)
    .bind(filter.offset)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Fetches one product by id; `None` when no such row exists.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_product(pool: &SqlitePool, id: i64) -> Result<Option<ProductRow>, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Distinct non-null brands, sorted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_brands(pool: &SqlitePool) -> Result<Vec<String>, DbError> {
    let brands = sqlx::query_scalar::<_, String>(
        "SELECT DISTINCT brand FROM products WHERE brand IS NOT NULL ORDER BY brand",
    )
    .fetch_all(pool)
    .await?;

    Ok(brands)
}
