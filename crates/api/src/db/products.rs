//! Product repository.

use sqlx::{PgPool, Postgres, QueryBuilder};

use bazaar_core::{CategoryId, ProductId};

use super::{RepositoryError, conflict_on_unique};
use crate::models::{CreateProductRequest, Product, ProductFilter, UpdateProductRequest};

const PRODUCT_COLUMNS: &str = "id, name, slug, description, price, compare_price, category_id, \
                               sku, is_active, is_featured, image_url, created_at, updated_at";

/// Repository for product operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` on a duplicate slug or SKU.
    pub async fn create(&self, req: &CreateProductRequest) -> Result<Product, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            r"
            INSERT INTO products (name, slug, description, price, compare_price, category_id,
                                  sku, image_url, is_featured)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(&req.name)
        .bind(&req.slug)
        .bind(&req.description)
        .bind(req.price)
        .bind(req.compare_price)
        .bind(req.category_id)
        .bind(&req.sku)
        .bind(req.image_url.as_deref())
        .bind(req.is_featured)
        .fetch_one(self.pool)
        .await
        .map_err(conflict_on_unique("product slug or sku already exists"))?;

        Ok(product)
    }

    /// Get an active product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_active(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 AND is_active = TRUE"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(product)
    }

    /// Get a product whether or not it has been deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_any(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(product)
    }

    /// List active products matching `filter`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        filter: &ProductFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Product>, RepositoryError> {
        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE is_active = TRUE"
        ));
        push_filters(&mut query, filter);
        query.push(" ORDER BY created_at DESC LIMIT ");
        query.push_bind(limit);
        query.push(" OFFSET ");
        query.push_bind(offset);

        let products = query
            .build_query_as::<Product>()
            .fetch_all(self.pool)
            .await?;

        Ok(products)
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist, or
    /// `RepositoryError::Conflict` on a duplicate slug or SKU.
    pub async fn update(
        &self,
        id: ProductId,
        req: &UpdateProductRequest,
    ) -> Result<Product, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            r"
            UPDATE products
            SET name = COALESCE($2, name),
                slug = COALESCE($3, slug),
                description = COALESCE($4, description),
                price = COALESCE($5, price),
                compare_price = COALESCE($6, compare_price),
                category_id = COALESCE($7, category_id),
                sku = COALESCE($8, sku),
                image_url = COALESCE($9, image_url),
                is_active = COALESCE($10, is_active),
                is_featured = COALESCE($11, is_featured),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(req.name.as_deref())
        .bind(req.slug.as_deref())
        .bind(req.description.as_deref())
        .bind(req.price)
        .bind(req.compare_price)
        .bind(req.category_id)
        .bind(req.sku.as_deref())
        .bind(req.image_url.as_deref())
        .bind(req.is_active)
        .bind(req.is_featured)
        .fetch_optional(self.pool)
        .await
        .map_err(conflict_on_unique("product slug or sku already exists"))?;

        product.ok_or(RepositoryError::NotFound)
    }

    /// Soft-delete a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn soft_delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE products SET is_active = FALSE, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .execute(self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Insert a product by SKU unless it exists; returns its id either way.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert_by_sku(
        &self,
        req: &CreateProductRequest,
    ) -> Result<ProductId, RepositoryError> {
        let id = sqlx::query_scalar::<_, ProductId>(
            r"
            INSERT INTO products (name, slug, description, price, category_id, sku, is_featured)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (sku) DO UPDATE SET sku = EXCLUDED.sku
            RETURNING id
            ",
        )
        .bind(&req.name)
        .bind(&req.slug)
        .bind(&req.description)
        .bind(req.price)
        .bind(req.category_id)
        .bind(&req.sku)
        .bind(req.is_featured)
        .fetch_one(self.pool)
        .await?;

        Ok(id)
    }

    /// Whether any category row has this id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn category_exists(&self, id: CategoryId) -> Result<bool, RepositoryError> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM categories WHERE id = $1)")
                .bind(id)
                .fetch_one(self.pool)
                .await?;

        Ok(exists)
    }
}

fn push_filters(query: &mut QueryBuilder<'_, Postgres>, filter: &ProductFilter) {
    if let Some(category_id) = filter.category_id {
        query.push(" AND category_id = ");
        query.push_bind(category_id);
    }
    if let Some(min_price) = filter.min_price {
        query.push(" AND price >= ");
        query.push_bind(min_price);
    }
    if let Some(max_price) = filter.max_price {
        query.push(" AND price <= ");
        query.push_bind(max_price);
    }
    if let Some(is_featured) = filter.is_featured {
        query.push(" AND is_featured = ");
        query.push_bind(is_featured);
    }
    if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
        let pattern = contains_pattern(search.trim());
        query.push(" AND (name ILIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR description ILIKE ");
        query.push_bind(pattern);
        query.push(")");
    }
}

/// `ILIKE` pattern matching `term` anywhere, with `\`, `%` and `_` taken literally.
fn contains_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn sql_for(filter: &ProductFilter) -> String {
        let mut query = QueryBuilder::<Postgres>::new("SELECT 1 FROM products WHERE is_active = TRUE");
        push_filters(&mut query, filter);
        query.sql().to_string()
    }

    #[test]
    fn test_no_filters() {
        assert_eq!(
            sql_for(&ProductFilter::default()),
            "SELECT 1 FROM products WHERE is_active = TRUE"
        );
    }

    #[test]
    fn test_price_range_and_search() {
        let filter = ProductFilter {
            min_price: Some(Decimal::new(1000, 2)),
            max_price: Some(Decimal::new(5000, 2)),
            search: Some("mat".to_string()),
            ..ProductFilter::default()
        };
        let sql = sql_for(&filter);

        assert!(sql.contains("price >= $1"));
        assert!(sql.contains("price <= $2"));
        assert!(sql.contains("(name ILIKE $3 OR description ILIKE $4)"));
    }

    #[test]
    fn test_blank_search_ignored() {
        let filter = ProductFilter {
            search: Some("   ".to_string()),
            ..ProductFilter::default()
        };
        assert!(!sql_for(&filter).contains("ILIKE"));
    }

    #[test]
    fn test_search_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("mat"), "%mat%");
        assert_eq!(contains_pattern("%"), "%\\%%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(contains_pattern(r"a\b"), r"%a\\b%");
    }
}
