use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    cart::CartLine,
    dto::{
        auth::{AuthResponse, LoginRequest, RegisterRequest},
        categories::{CategoryList, CreateCategoryRequest},
        newsletter::SubscribeRequest,
        orders::{
            AdminOrder, AdminOrderList, Customer, OrderList, OrderWithItems, PayOrderRequest,
            PlaceOrderRequest,
        },
        products::{CreateProductRequest, ProductList, UpdateProductRequest},
    },
    models::{
        Category, ImageKind, Order, OrderItem, PaymentResult, Product, ProductColor, ProductImage,
        ProductVariant, ShippingAddress, Subscriber, User,
    },
    response::{ApiResponse, Meta},
    routes::{auth, categories, health, newsletter, orders, params, products},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        products::list_products,
        products::get_product,
        products::get_product_by_slug,
        products::create_product,
        products::update_product,
        products::delete_product,
        categories::list_categories,
        categories::create_category,
        orders::place_order,
        orders::list_my_orders,
        orders::list_all_orders,
        orders::get_order,
        orders::pay_order,
        orders::deliver_order,
        newsletter::subscribe,
    ),
    components(
        schemas(
            User,
            Product,
            ProductImage,
            ImageKind,
            ProductVariant,
            ProductColor,
            Category,
            Order,
            OrderItem,
            ShippingAddress,
            PaymentResult,
            Subscriber,
            CartLine,
            RegisterRequest,
            LoginRequest,
            AuthResponse,
            CreateProductRequest,
            UpdateProductRequest,
            ProductList,
            CreateCategoryRequest,
            CategoryList,
            PlaceOrderRequest,
            PayOrderRequest,
            OrderWithItems,
            OrderList,
            AdminOrder,
            AdminOrderList,
            Customer,
            SubscribeRequest,
            params::ProductListQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>,
            ApiResponse<AdminOrderList>,
            ApiResponse<CategoryList>,
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Products", description = "Catalog endpoints"),
        (name = "Categories", description = "Category endpoints"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Orders", description = "Order endpoints"),
        (name = "Newsletter", description = "Newsletter endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
