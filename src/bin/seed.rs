use argon2::{
    Argon2, PasswordHasher,
    password_hash::{SaltString, rand_core::OsRng},
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use axum_storefront_api::{
    config::AppConfig,
    db::{OrmConn, create_orm_conn, create_pool},
    entity::{Categories, Products, categories, product_categories, products},
    models::{ColorList, ImageKind, ImageList, ProductImage, ProductVariant, SizeList, VariantList},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;

    let pool = create_pool(&config.database_url).await?;
    // Ensure migrations are applied.
    sqlx::migrate!("./migrations").run(&pool).await?;

    let admin_id = ensure_user(&pool, "Atelier Admin", "admin@example.com", "admin123", "admin").await?;
    let user_id = ensure_user(&pool, "Demo Customer", "user@example.com", "user123", "user").await?;

    let orm = create_orm_conn(&config.database_url).await?;
    seed_categories(&orm).await?;
    seed_products(&orm).await?;

    println!("Seed completed. Admin ID: {admin_id}, User ID: {user_id}");
    Ok(())
}

async fn ensure_user(
    pool: &sqlx::PgPool,
    name: &str,
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

    let row: Option<(Uuid,)> = sqlx::query_as(
        r#"
        INSERT INTO users (id, name, email, password_hash, role)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (email) DO UPDATE SET role = EXCLUDED.role
        RETURNING id
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_optional(pool)
    .await?;

    let user_id = match row {
        Some((id,)) => id,
        None => {
            let existing: (Uuid,) = sqlx::query_as("SELECT id FROM users WHERE email = $1")
                .bind(email)
                .fetch_one(pool)
                .await?;
            existing.0
        }
    };

    println!("Ensured user {email} (role={role})");
    Ok(user_id)
}

async fn seed_categories(orm: &OrmConn) -> anyhow::Result<()> {
    let seed = [
        ("Bridal", "bridal"),
        ("Ball Gowns", "ball-gowns"),
        ("New Arrivals", "new-arrivals"),
        ("Accessories", "accessories"),
    ];

    for (name, slug) in seed {
        let exists = Categories::find()
            .filter(categories::Column::Slug.eq(slug))
            .one(orm)
            .await?;
        if exists.is_none() {
            categories::ActiveModel {
                id: Set(Uuid::new_v4()),
                name: Set(name.to_string()),
                slug: Set(slug.to_string()),
            }
            .insert(orm)
            .await?;
            println!("Created category: {name}");
        }
    }

    println!("Seeded categories");
    Ok(())
}

async fn seed_products(orm: &OrmConn) -> anyhow::Result<()> {
    let gowns = [
        (
            "Duchess Satin Ball Gown",
            "duchess-satin-ball-gown",
            "CT-BG-001",
            18_500_i64,
            "ball-gowns",
            "Duchess satin",
            false,
        ),
        (
            "Chantilly Lace Bridal Gown",
            "chantilly-lace-bridal-gown",
            "CT-BR-001",
            42_000,
            "bridal",
            "Chantilly lace",
            true,
        ),
        (
            "Silk Organza Evening Dress",
            "silk-organza-evening-dress",
            "CT-NA-001",
            12_750,
            "new-arrivals",
            "Silk organza",
            false,
        ),
        (
            "Pearl Drop Tulle Veil",
            "pearl-drop-tulle-veil",
            "CT-AC-001",
            3_200,
            "accessories",
            "Tulle",
            false,
        ),
    ];

    for (title, slug, sku, price, category_slug, fabric, made_to_order) in gowns {
        let exists = Products::find()
            .filter(products::Column::Slug.eq(slug))
            .one(orm)
            .await?;
        if exists.is_some() {
            continue;
        }

        let sizes = vec!["XS", "S", "M", "L"]
            .into_iter()
            .map(str::to_string)
            .collect::<Vec<_>>();
        let variants = sizes
            .iter()
            .map(|size| ProductVariant {
                sku: Some(format!("{sku}-{size}")),
                size: Some(size.clone()),
                color: Some("Ivory".to_string()),
                fabric: Some(fabric.to_string()),
                inventory_qty: if made_to_order { 0 } else { 8 },
            })
            .collect::<Vec<_>>();

        let product = products::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(title.to_string()),
            slug: Set(slug.to_string()),
            sku: Set(sku.to_string()),
            description: Set(Some(format!("{title}, cut and finished in {fabric}."))),
            price: Set(price),
            images: Set(ImageList(vec![ProductImage {
                url: format!("/images/{slug}.jpg"),
                alt: Some(title.to_string()),
                kind: ImageKind::Hero,
            }])),
            variants: Set(VariantList(variants)),
            sizes: Set(SizeList(sizes)),
            colors: Set(ColorList(Vec::new())),
            fabric: Set(Some(fabric.to_string())),
            is_made_to_order: Set(made_to_order),
            published: Set(true),
            created_at: NotSet,
            updated_at: NotSet,
        }
        .insert(orm)
        .await?;

        if let Some(category) = Categories::find()
            .filter(categories::Column::Slug.eq(category_slug))
            .one(orm)
            .await?
        {
            product_categories::ActiveModel {
                product_id: Set(product.id),
                category_id: Set(category.id),
            }
            .insert(orm)
            .await?;
        }

        println!("Created product: {title}");
    }

    println!("Seeded products");
    Ok(())
}
