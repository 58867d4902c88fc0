//! Seed the database with demo data.
//!
//! Every insert is keyed on a natural key (email, slug, SKU, product id), so
//! running the command twice leaves the database unchanged.

use rust_decimal::Decimal;
use tracing::info;

use bazaar_api::db::users::NewUser;
use bazaar_api::db::{CategoryRepository, InventoryRepository, ProductRepository, UserRepository};
use bazaar_api::models::CreateProductRequest;
use bazaar_api::services::auth::hash_password;
use bazaar_core::{Email, UserRole};

/// Password shared by every seeded account.
const SEED_PASSWORD: &str = "password123";

/// Starting stock for each seeded product.
const SEED_STOCK: i32 = 50;

struct SeedUser {
    email: &'static str,
    first_name: &'static str,
    last_name: &'static str,
    role: UserRole,
}

const USERS: [SeedUser; 3] = [
    SeedUser {
        email: "admin@ecommerce.com",
        first_name: "Admin",
        last_name: "User",
        role: UserRole::Admin,
    },
    SeedUser {
        email: "john@example.com",
        first_name: "John",
        last_name: "Doe",
        role: UserRole::Customer,
    },
    SeedUser {
        email: "jane@example.com",
        first_name: "Jane",
        last_name: "Smith",
        role: UserRole::Customer,
    },
];

/// `(name, slug, description)`
const CATEGORIES: [(&str, &str, &str); 5] = [
    ("Electronics", "electronics", "Electronic devices and accessories"),
    ("Clothing", "clothing", "Fashion and apparel"),
    ("Books", "books", "Books and reading materials"),
    ("Home & Garden", "home-garden", "Home and garden products"),
    ("Sports", "sports", "Sports and fitness equipment"),
];

struct SeedProduct {
    name: &'static str,
    slug: &'static str,
    description: &'static str,
    /// Price in cents.
    cents: i64,
    category_slug: &'static str,
    sku: &'static str,
    featured: bool,
}

const PRODUCTS: [SeedProduct; 7] = [
    SeedProduct {
        name: "Laptop",
        slug: "laptop",
        description: "High-performance laptop",
        cents: 99_999,
        category_slug: "electronics",
        sku: "LAP001",
        featured: true,
    },
    SeedProduct {
        name: "Smartphone",
        slug: "smartphone",
        description: "Latest smartphone",
        cents: 69_999,
        category_slug: "electronics",
        sku: "PHN001",
        featured: true,
    },
    SeedProduct {
        name: "T-Shirt",
        slug: "t-shirt",
        description: "Cotton t-shirt",
        cents: 1_999,
        category_slug: "clothing",
        sku: "TSH001",
        featured: false,
    },
    SeedProduct {
        name: "Jeans",
        slug: "jeans",
        description: "Denim jeans",
        cents: 4_999,
        category_slug: "clothing",
        sku: "JNS001",
        featured: false,
    },
    SeedProduct {
        name: "Programming Book",
        slug: "programming-book",
        description: "Learn programming",
        cents: 3_999,
        category_slug: "books",
        sku: "BK001",
        featured: false,
    },
    SeedProduct {
        name: "Coffee Maker",
        slug: "coffee-maker",
        description: "Automatic coffee maker",
        cents: 7_999,
        category_slug: "home-garden",
        sku: "HOM001",
        featured: true,
    },
    SeedProduct {
        name: "Yoga Mat",
        slug: "yoga-mat",
        description: "Exercise yoga mat",
        cents: 2_999,
        category_slug: "sports",
        sku: "SPT001",
        featured: false,
    },
];

/// Insert the demo users, catalog and stock.
///
/// # Errors
///
/// Returns an error if the database is unreachable or an insert fails.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let pool = super::connect().await?;

    let users = UserRepository::new(&pool);
    let password_hash = hash_password(SEED_PASSWORD)?;
    let mut created = 0;
    for seed in &USERS {
        let email = Email::parse(seed.email)?;
        let inserted = users
            .insert_if_absent(NewUser {
                email: &email,
                password_hash: &password_hash,
                first_name: seed.first_name,
                last_name: seed.last_name,
                phone_number: None,
                role: seed.role,
            })
            .await?;
        if inserted {
            created += 1;
        }
    }
    info!(created, total = USERS.len(), "Users seeded");

    let categories = CategoryRepository::new(&pool);
    let mut category_ids = Vec::with_capacity(CATEGORIES.len());
    for (name, slug, description) in CATEGORIES {
        let id = categories.upsert_by_slug(name, slug, description).await?;
        category_ids.push((slug, id));
    }
    info!(total = category_ids.len(), "Categories seeded");

    let products = ProductRepository::new(&pool);
    let inventory = InventoryRepository::new(&pool);
    let mut stocked = 0;
    for seed in &PRODUCTS {
        let category_id = category_ids
            .iter()
            .find(|(slug, _)| *slug == seed.category_slug)
            .map(|(_, id)| *id)
            .ok_or_else(|| format!("unknown category slug: {}", seed.category_slug))?;

        let product_id = products
            .upsert_by_sku(&CreateProductRequest {
                name: seed.name.to_string(),
                slug: seed.slug.to_string(),
                description: seed.description.to_string(),
                price: Decimal::new(seed.cents, 2),
                compare_price: None,
                category_id,
                sku: seed.sku.to_string(),
                image_url: None,
                is_featured: seed.featured,
            })
            .await?;

        if inventory.insert_if_absent(product_id, SEED_STOCK).await? {
            stocked += 1;
        }
    }
    info!(total = PRODUCTS.len(), stocked, "Products and inventory seeded");

    info!("Seed data inserted successfully!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_product_has_a_known_category() {
        for product in &PRODUCTS {
            assert!(
                CATEGORIES
                    .iter()
                    .any(|(_, slug, _)| *slug == product.category_slug),
                "{}",
                product.sku
            );
        }
    }

    #[test]
    fn test_seed_prices() {
        let laptop = PRODUCTS.iter().find(|p| p.sku == "LAP001");
        assert_eq!(
            laptop.map(|p| Decimal::new(p.cents, 2)),
            Some(Decimal::new(99_999, 2))
        );
        assert!(PRODUCTS.iter().all(|p| p.cents > 0));
    }

    #[test]
    fn test_exactly_one_seeded_admin() {
        let admins: Vec<_> = USERS
            .iter()
            .filter(|u| u.role == UserRole::Admin)
            .map(|u| u.email)
            .collect();
        assert_eq!(admins, ["admin@ecommerce.com"]);
    }
}
