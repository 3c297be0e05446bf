use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum_storefront_api::{config::AppConfig, db::create_pool};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let admin_id = ensure_user(&pool, "admin@example.com", "admin123", "admin").await?;
    let user_id = ensure_user(&pool, "user@example.com", "user123", "user").await?;

    let catalog = seed_collections(&pool).await?;
    seed_products(&pool, &catalog).await?;
    seed_mega_menu(&pool, &catalog).await?;
    seed_currencies(&pool).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

struct Catalog {
    electronics: Uuid,
    phones: Uuid,
    laptops: Uuid,
    brands: Uuid,
    acme: Uuid,
    globex: Uuid,
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    email: &str,
    password: &str,
    role: &str,
) -> anyhow::Result<Uuid> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?
        .to_string();

    let (user_id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, password_hash, role)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_one(pool)
    .await?;

    println!("Ensured user {email} (role={role})");
    Ok(user_id)
}

async fn ensure_collection(
    pool: &sqlx::PgPool,
    name: &str,
    slug: &str,
    parent_id: Option<Uuid>,
    collection_type: &str,
    level: i32,
) -> anyhow::Result<Uuid> {
    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO collections (id, name, slug, parent_id, collection_type, level)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (slug) DO UPDATE
        SET parent_id = EXCLUDED.parent_id, level = EXCLUDED.level
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(slug)
    .bind(parent_id)
    .bind(collection_type)
    .bind(level)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

async fn seed_collections(pool: &sqlx::PgPool) -> anyhow::Result<Catalog> {
    let electronics =
        ensure_collection(pool, "Electronics", "electronics", None, "category_parent", 0).await?;
    let phones =
        ensure_collection(pool, "Phones", "phones", Some(electronics), "category", 1).await?;
    let laptops =
        ensure_collection(pool, "Laptops", "laptops", Some(electronics), "category", 1).await?;
    let brands = ensure_collection(pool, "Brands", "brands", None, "brand_parent", 0).await?;
    let acme = ensure_collection(pool, "Acme", "acme", Some(brands), "brand", 1).await?;
    let globex = ensure_collection(pool, "Globex", "globex", Some(brands), "brand", 1).await?;

    println!("Seeded collections");
    Ok(Catalog {
        electronics,
        phones,
        laptops,
        brands,
        acme,
        globex,
    })
}

async fn seed_products(pool: &sqlx::PgPool, catalog: &Catalog) -> anyhow::Result<()> {
    let products: Vec<(&str, &str, i64, &str, &str, i32, Vec<Uuid>)> = vec![
        (
            "Acme Phone X",
            "acme-phone-x",
            4_999_900,
            "Acme",
            "Phones",
            25,
            // Membership must cover every ancestor of the direct collections.
            vec![catalog.phones, catalog.electronics, catalog.acme, catalog.brands],
        ),
        (
            "Globex Ultrabook",
            "globex-ultrabook",
            8_999_900,
            "Globex",
            "Laptops",
            10,
            vec![catalog.laptops, catalog.electronics, catalog.globex, catalog.brands],
        ),
        (
            "Acme Earbuds",
            "acme-earbuds",
            799_900,
            "Acme",
            "Phones",
            120,
            vec![catalog.phones, catalog.electronics, catalog.acme, catalog.brands],
        ),
    ];

    for (title, slug, price, brand, category, stock, collection_ids) in products {
        let (product_id,): (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO products (id, title, slug, price, brand, category, stock)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (slug) DO UPDATE SET price = EXCLUDED.price
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(title)
        .bind(slug)
        .bind(price)
        .bind(brand)
        .bind(category)
        .bind(stock)
        .fetch_one(pool)
        .await?;

        for collection_id in collection_ids {
            sqlx::query(
                r#"
                INSERT INTO product_collections (product_id, collection_id)
                VALUES ($1, $2)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(product_id)
            .bind(collection_id)
            .execute(pool)
            .await?;
        }
    }

    println!("Seeded products");
    Ok(())
}

async fn seed_mega_menu(pool: &sqlx::PgPool, catalog: &Catalog) -> anyhow::Result<()> {
    let existing: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM mega_menu_items")
        .fetch_one(pool)
        .await?;
    if existing.0 > 0 {
        println!("Mega menu already seeded");
        return Ok(());
    }

    let electronics_item = insert_menu_item(pool, catalog.electronics, None, 0, 0, false).await?;
    insert_menu_item(pool, catalog.phones, Some(electronics_item), 0, 1, false).await?;
    insert_menu_item(pool, catalog.laptops, Some(electronics_item), 1, 1, false).await?;
    // Brands hang under Electronics in the menu even though their own parent
    // is the Brands collection.
    insert_menu_item(pool, catalog.acme, Some(electronics_item), 2, 1, true).await?;
    insert_menu_item(pool, catalog.globex, Some(electronics_item), 3, 1, true).await?;

    sqlx::query("UPDATE mega_menu_items SET display_subcollections = TRUE WHERE id = $1")
        .bind(electronics_item)
        .execute(pool)
        .await?;

    println!("Seeded mega menu");
    Ok(())
}

async fn insert_menu_item(
    pool: &sqlx::PgPool,
    collection_id: Uuid,
    parent: Option<Uuid>,
    position: i32,
    level: i32,
    is_featured: bool,
) -> anyhow::Result<Uuid> {
    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO mega_menu_items
            (id, collection_id, parent_menu_item_id, position, level, is_featured)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(collection_id)
    .bind(parent)
    .bind(position)
    .bind(level)
    .bind(is_featured)
    .fetch_one(pool)
    .await?;
    Ok(id)
}

async fn seed_currencies(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let currencies = [
        ("INR", "Indian Rupee", "₹", 1.0, true),
        ("USD", "US Dollar", "$", 0.012, false),
        ("EUR", "Euro", "€", 0.011, false),
    ];

    for (code, name, symbol, rate, is_default) in currencies {
        sqlx::query(
            r#"
            INSERT INTO currencies (code, name, symbol, rate_to_base, is_default)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (code) DO NOTHING
            "#,
        )
        .bind(code)
        .bind(name)
        .bind(symbol)
        .bind(rate)
        .bind(is_default)
        .execute(pool)
        .await?;
    }

    println!("Seeded currencies");
    Ok(())
}
