use std::collections::HashMap;

use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::products::{CreateProductRequest, ProductList, UpdateProductRequest},
    entity::{
        Categories, ProductCategories, Products, categories,
        product_categories,
        products::{ActiveModel, Column, Model as ProductModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{ColorList, ImageList, Product, SizeList, VariantList},
    response::{ApiResponse, Meta},
    routes::params::{PAGE_SIZE, ProductListQuery},
    slug::{slugify, with_unique_suffix},
    state::AppState,
};

pub async fn list_products(
    state: &AppState,
    viewer: Option<&AuthUser>,
    query: ProductListQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let page = query.page();
    let per_page = PAGE_SIZE;

    let mut condition = Condition::all();

    let is_admin = viewer.map(|u| u.role == "admin").unwrap_or(false);
    if !is_admin {
        condition = condition.add(Column::Published.eq(true));
    }

    if let Some(keyword) = query.keyword.as_ref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", keyword);
        condition = condition.add(Expr::col(Column::Title).ilike(pattern));
    }

    let mut finder = Products::find().filter(condition);

    if let Some(category) = query.category.as_ref().filter(|s| !s.is_empty()) {
        let category_id = match Uuid::parse_str(category) {
            Ok(id) => Some(id),
            Err(_) => Categories::find()
                .filter(categories::Column::Slug.eq(category.as_str()))
                .one(&state.orm)
                .await?
                .map(|c| c.id),
        };

        // An unknown category yields an empty page, not an error.
        let Some(category_id) = category_id else {
            return Ok(ApiResponse::success(
                "Products",
                ProductList { items: Vec::new() },
                Some(Meta::new(page, per_page, 0)),
            ));
        };

        finder = finder
            .join(
                JoinType::InnerJoin,
                product_categories::Relation::Products.def().rev(),
            )
            .filter(product_categories::Column::CategoryId.eq(category_id));
    }

    finder = finder.order_by_desc(Column::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let models = finder
        .limit(per_page as u64)
        .offset(((page - 1) * per_page) as u64)
        .all(&state.orm)
        .await?;

    let ids: Vec<Uuid> = models.iter().map(|m| m.id).collect();
    let mut category_map = load_category_ids(&state.orm, &ids).await?;

    let items = models
        .into_iter()
        .map(|m| {
            let category_ids = category_map.remove(&m.id).unwrap_or_default();
            product_from_entity(m, category_ids)
        })
        .collect();

    let meta = Meta::new(page, per_page, total);
    Ok(ApiResponse::success(
        "Products",
        ProductList { items },
        Some(meta),
    ))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Product>> {
    let model = Products::find_by_id(id).one(&state.orm).await?;
    let model = match model {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };
    let categories = load_category_ids(&state.orm, &[model.id])
        .await?
        .remove(&model.id)
        .unwrap_or_default();
    Ok(ApiResponse::success(
        "Product",
        product_from_entity(model, categories),
        None,
    ))
}

pub async fn get_product_by_slug(state: &AppState, slug: &str) -> AppResult<ApiResponse<Product>> {
    let model = Products::find()
        .filter(Column::Slug.eq(slug))
        .one(&state.orm)
        .await?;
    let model = match model {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };
    let categories = load_category_ids(&state.orm, &[model.id])
        .await?
        .remove(&model.id)
        .unwrap_or_default();
    Ok(ApiResponse::success(
        "Product",
        product_from_entity(model, categories),
        None,
    ))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;

    let title = payload.title.trim().to_string();
    if title.is_empty() {
        return Err(AppError::BadRequest("Title is required".to_string()));
    }
    if payload.price < 0 {
        return Err(AppError::BadRequest(
            "Price must not be negative".to_string(),
        ));
    }

    let txn = state.orm.begin().await?;

    let slug = match payload.slug.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(explicit) => {
            if slug_taken(&txn, explicit, None).await? {
                return Err(AppError::Conflict("Slug already in use".to_string()));
            }
            explicit.to_string()
        }
        None => {
            let base = slugify(&title);
            if base.is_empty() {
                return Err(AppError::BadRequest(
                    "Cannot derive a slug from the title".to_string(),
                ));
            }
            if slug_taken(&txn, &base, None).await? {
                with_unique_suffix(&base)
            } else {
                base
            }
        }
    };

    let category_ids = normalize_category_ids(&txn, payload.categories).await?;

    let id = Uuid::new_v4();
    let active = ActiveModel {
        id: Set(id),
        title: Set(title),
        slug: Set(slug),
        sku: Set(payload.sku),
        description: Set(payload.description),
        price: Set(payload.price),
        images: Set(ImageList(payload.images.unwrap_or_default())),
        variants: Set(VariantList(payload.variants.unwrap_or_default())),
        sizes: Set(SizeList(payload.sizes.unwrap_or_default())),
        colors: Set(ColorList(payload.colors.unwrap_or_default())),
        fabric: Set(payload.fabric),
        is_made_to_order: Set(payload.is_made_to_order.unwrap_or(false)),
        published: Set(payload.published.unwrap_or(false)),
        created_at: NotSet,
        updated_at: NotSet,
    };
    let product = active.insert(&txn).await?;

    replace_category_links(&txn, product.id, &category_ids, false).await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "product_create",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Product created",
        product_from_entity(product, category_ids),
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;

    let txn = state.orm.begin().await?;

    let existing = Products::find_by_id(id).one(&txn).await?;
    let existing = match existing {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    if let Some(price) = payload.price {
        if price < 0 {
            return Err(AppError::BadRequest(
                "Price must not be negative".to_string(),
            ));
        }
    }

    if let Some(slug) = payload.slug.as_deref().map(str::trim) {
        if slug.is_empty() {
            return Err(AppError::BadRequest("Slug must not be empty".to_string()));
        }
        if slug != existing.slug && slug_taken(&txn, slug, Some(existing.id)).await? {
            return Err(AppError::Conflict("Slug already in use".to_string()));
        }
    }

    let category_ids = match payload.categories {
        Some(ids) => Some(normalize_category_ids(&txn, Some(ids)).await?),
        None => None,
    };

    let mut active: ActiveModel = existing.into();
    if let Some(title) = payload.title {
        active.title = Set(title);
    }
    if let Some(slug) = payload.slug {
        active.slug = Set(slug.trim().to_string());
    }
    if let Some(sku) = payload.sku {
        active.sku = Set(sku);
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(images) = payload.images {
        active.images = Set(ImageList(images));
    }
    if let Some(variants) = payload.variants {
        active.variants = Set(VariantList(variants));
    }
    if let Some(sizes) = payload.sizes {
        active.sizes = Set(SizeList(sizes));
    }
    if let Some(colors) = payload.colors {
        active.colors = Set(ColorList(colors));
    }
    if let Some(fabric) = payload.fabric {
        active.fabric = Set(Some(fabric));
    }
    // Present-vs-absent, not truthiness: an explicit `false` is an update.
    if let Some(made_to_order) = payload.is_made_to_order {
        active.is_made_to_order = Set(made_to_order);
    }
    if let Some(published) = payload.published {
        active.published = Set(published);
    }
    active.updated_at = Set(chrono::Utc::now().into());

    let product = active.update(&txn).await?;

    if let Some(ref ids) = category_ids {
        replace_category_links(&txn, product.id, ids, true).await?;
    }

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "product_update",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let categories = match category_ids {
        Some(ids) => ids,
        None => load_category_ids(&state.orm, &[product.id])
            .await?
            .remove(&product.id)
            .unwrap_or_default(),
    };

    Ok(ApiResponse::success(
        "Updated",
        product_from_entity(product, categories),
        Some(Meta::empty()),
    ))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Products::delete_by_id(id).exec(&state.orm).await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "product_delete",
        Some("products"),
        Some(serde_json::json!({ "product_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

async fn slug_taken<C: ConnectionTrait>(
    conn: &C,
    slug: &str,
    exclude: Option<Uuid>,
) -> AppResult<bool> {
    let mut condition = Condition::all().add(Column::Slug.eq(slug));
    if let Some(id) = exclude {
        condition = condition.add(Column::Id.ne(id));
    }
    let count = Products::find().filter(condition).count(conn).await?;
    Ok(count > 0)
}

async fn normalize_category_ids<C: ConnectionTrait>(
    conn: &C,
    ids: Option<Vec<Uuid>>,
) -> AppResult<Vec<Uuid>> {
    let mut ids = ids.unwrap_or_default();
    ids.sort_unstable();
    ids.dedup();
    if ids.is_empty() {
        return Ok(ids);
    }
    let known = Categories::find()
        .filter(categories::Column::Id.is_in(ids.iter().copied()))
        .count(conn)
        .await? as usize;
    if known != ids.len() {
        return Err(AppError::BadRequest("Unknown category".to_string()));
    }
    Ok(ids)
}

async fn replace_category_links<C: ConnectionTrait>(
    conn: &C,
    product_id: Uuid,
    category_ids: &[Uuid],
    clear_existing: bool,
) -> AppResult<()> {
    if clear_existing {
        ProductCategories::delete_many()
            .filter(product_categories::Column::ProductId.eq(product_id))
            .exec(conn)
            .await?;
    }
    for category_id in category_ids {
        product_categories::ActiveModel {
            product_id: Set(product_id),
            category_id: Set(*category_id),
        }
        .insert(conn)
        .await?;
    }
    Ok(())
}

async fn load_category_ids<C: ConnectionTrait>(
    conn: &C,
    product_ids: &[Uuid],
) -> AppResult<HashMap<Uuid, Vec<Uuid>>> {
    if product_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = ProductCategories::find()
        .filter(product_categories::Column::ProductId.is_in(product_ids.iter().copied()))
        .all(conn)
        .await?;
    let mut map: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for row in rows {
        map.entry(row.product_id).or_default().push(row.category_id);
    }
    Ok(map)
}

fn product_from_entity(model: ProductModel, categories: Vec<Uuid>) -> Product {
    Product {
        id: model.id,
        title: model.title,
        slug: model.slug,
        sku: model.sku,
        description: model.description,
        price: model.price,
        categories,
        images: model.images.0,
        variants: model.variants.0,
        sizes: model.sizes.0,
        colors: model.colors.0,
        fabric: model.fabric,
        is_made_to_order: model.is_made_to_order,
        published: model.published,
        created_at: model.created_at.with_timezone(&chrono::Utc),
        updated_at: model.updated_at.with_timezone(&chrono::Utc),
    }
}
