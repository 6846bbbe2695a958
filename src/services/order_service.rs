use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, QuerySelect,
    Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    cart::Cart,
    dto::orders::{
        AdminOrder, AdminOrderList, Customer, OrderList, OrderWithItems, PayOrderRequest,
        PlaceOrderRequest,
    },
    entity::{
        OrderItems, Orders, Products, Users,
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Model as OrderItemModel},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Model as OrderModel},
        products::ActiveModel as ProductActive,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Order, OrderItem, PaymentResult, ShippingAddress},
    pricing,
    response::{ApiResponse, Meta},
    state::AppState,
};

const PAYMENT_METHODS: [&str; 4] = ["COD", "UPI", "Card", "NetBanking"];

pub async fn place_order(
    state: &AppState,
    user: &AuthUser,
    payload: PlaceOrderRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    validate_payment_method(&payload.payment_method)?;

    // Duplicate (product, size) lines in the snapshot collapse into one.
    let cart = Cart::from_lines(payload.order_items);
    if cart.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".into()));
    }
    for line in cart.lines() {
        if line.quantity <= 0 {
            return Err(AppError::BadRequest("Cart has invalid quantity".into()));
        }
    }

    let txn = state.orm.begin().await?;

    for line in cart.lines() {
        let product = Products::find_by_id(line.product_id)
            .lock(LockType::Update)
            .one(&txn)
            .await?;
        let product = match product {
            Some(p) => p,
            None => {
                return Err(AppError::BadRequest(format!(
                    "Product {} is no longer available",
                    line.product_id
                )));
            }
        };

        // The snapshot's unit price must still match the catalog.
        if line.unit_price != product.price {
            return Err(AppError::BadRequest(format!(
                "Price changed for {}",
                product.title
            )));
        }

        // Stocked gowns are decremented per sized variant; made-to-order
        // pieces are produced after purchase and carry no stock.
        if !product.is_made_to_order {
            if let Some(size) = line.size.as_deref() {
                let mut variants = product.variants.clone();
                if let Some(variant) = variants
                    .0
                    .iter_mut()
                    .find(|v| v.size.as_deref() == Some(size))
                {
                    if variant.inventory_qty < line.quantity {
                        return Err(AppError::BadRequest(format!(
                            "Insufficient stock for {} (size {})",
                            product.title, size
                        )));
                    }
                    variant.inventory_qty -= line.quantity;
                    let mut active: ProductActive = product.clone().into();
                    active.variants = Set(variants);
                    active.updated_at = Set(Utc::now().into());
                    active.update(&txn).await?;
                }
            }
        }
    }

    let quote = pricing::quote(cart.lines());

    let order_id = Uuid::new_v4();
    let order = OrderActive {
        id: Set(order_id),
        user_id: Set(user.user_id),
        address: Set(payload.shipping_address.address),
        city: Set(payload.shipping_address.city),
        postal_code: Set(payload.shipping_address.postal_code),
        country: Set(payload.shipping_address.country),
        payment_method: Set(payload.payment_method.trim().to_string()),
        items_price: Set(quote.items_price),
        tax_price: Set(quote.tax_price),
        shipping_price: Set(quote.shipping_price),
        total_price: Set(quote.total_price),
        is_paid: Set(false),
        paid_at: Set(None),
        is_delivered: Set(false),
        delivered_at: Set(None),
        payment_result: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut items: Vec<OrderItem> = Vec::new();
    for line in cart.into_lines() {
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(line.product_id),
            title: Set(line.title),
            quantity: Set(line.quantity),
            unit_price: Set(line.unit_price),
            image: Set(line.image),
            size: Set(line.size),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
        items.push(order_item_from_entity(item));
    }

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_place",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "total_price": order.total_price })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Order placed",
        OrderWithItems {
            order: order_from_entity(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn pay_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: PayOrderRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let txn = state.orm.begin().await?;

    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    if order.is_paid {
        return Err(AppError::BadRequest("Order already paid".into()));
    }

    let mut active: OrderActive = order.into();
    active.is_paid = Set(true);
    active.paid_at = Set(Some(Utc::now().into()));
    active.payment_result = Set(Some(PaymentResult {
        id: payload.id,
        status: payload.status,
        update_time: payload.update_time,
        email_address: payload.email_address,
    }));
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;

    let items = load_items(&txn, order.id).await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_paid",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Payment recorded",
        OrderWithItems {
            order: order_from_entity(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn deliver_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    ensure_admin(user)?;

    let txn = state.orm.begin().await?;

    let order = Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    if !order.is_paid {
        return Err(AppError::BadRequest("Order has not been paid".into()));
    }
    if order.is_delivered {
        return Err(AppError::BadRequest("Order already delivered".into()));
    }

    let mut active: OrderActive = order.into();
    active.is_delivered = Set(true);
    active.delivered_at = Set(Some(Utc::now().into()));
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;

    let items = load_items(&txn, order.id).await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "order_delivered",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Delivered",
        OrderWithItems {
            order: order_from_entity(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_my_orders(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<OrderList>> {
    let items = Orders::find()
        .filter(OrderCol::UserId.eq(user.user_id))
        .order_by_desc(OrderCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Orders",
        OrderList { items },
        Some(Meta::empty()),
    ))
}

pub async fn list_all_orders(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<AdminOrderList>> {
    ensure_admin(user)?;

    let items = Orders::find()
        .find_also_related(Users)
        .order_by_desc(OrderCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|(order, customer)| AdminOrder {
            order: order_from_entity(order),
            customer: customer.map(|u| Customer {
                name: u.name,
                email: u.email,
            }),
        })
        .collect();

    Ok(ApiResponse::success(
        "Orders",
        AdminOrderList { items },
        Some(Meta::empty()),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find_by_id(id).one(&state.orm).await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    // Non-owners learn nothing, not even that the order exists.
    if order.user_id != user.user_id && user.role != "admin" {
        return Err(AppError::NotFound);
    }

    let items = load_items(&state.orm, order.id).await?;

    Ok(ApiResponse::success(
        "Order",
        OrderWithItems {
            order: order_from_entity(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

fn validate_payment_method(method: &str) -> Result<(), AppError> {
    let method = method.trim();
    if method.is_empty() {
        return Err(AppError::BadRequest("Payment method is required".into()));
    }
    if !PAYMENT_METHODS.contains(&method) {
        return Err(AppError::BadRequest("Invalid payment method".into()));
    }
    Ok(())
}

async fn load_items<C: sea_orm::ConnectionTrait>(
    conn: &C,
    order_id: Uuid,
) -> AppResult<Vec<OrderItem>> {
    Ok(OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id))
        .all(conn)
        .await?
        .into_iter()
        .map(order_item_from_entity)
        .collect())
}

fn order_from_entity(model: OrderModel) -> Order {
    Order {
        id: model.id,
        user_id: model.user_id,
        shipping_address: ShippingAddress {
            address: model.address,
            city: model.city,
            postal_code: model.postal_code,
            country: model.country,
        },
        payment_method: model.payment_method,
        items_price: model.items_price,
        tax_price: model.tax_price,
        shipping_price: model.shipping_price,
        total_price: model.total_price,
        is_paid: model.is_paid,
        paid_at: model.paid_at.map(|dt| dt.with_timezone(&Utc)),
        is_delivered: model.is_delivered,
        delivered_at: model.delivered_at.map(|dt| dt.with_timezone(&Utc)),
        payment_result: model.payment_result,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        product_id: model.product_id,
        title: model.title,
        quantity: model.quantity,
        unit_price: model.unit_price,
        image: model.image,
        size: model.size,
    }
}
