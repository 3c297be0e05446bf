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
    dto::{
        analytics::{
            RevenuePoint, RevenueSeries, SalesSummary, StatusBreakdown, StatusCount, TopProduct,
            TopProducts,
        },
        collections::{
            CollectionList, CollectionProductsRequest, CollectionTree, CreateCollectionRequest,
            MembershipChange, UpdateCollectionRequest,
        },
        megamenu::{
            CreateMenuItemRequest, MenuItemList, MenuTree, ReorderEntry, ReorderMenuRequest,
            UpdateMenuItemRequest,
        },
        orders::{CheckoutItem, CreateOrderRequest, OrderDetail, OrderList, OrderWithItems,
            UpdateOrderStatusRequest},
        payments::{
            CreatePaymentRequest, PaymentCheckout, PaymentFailureRequest, PaymentList,
            VerifyPaymentRequest,
        },
        products::{
            CreateProductRequest, ImageInput, ProductCollections, ProductDetail, ProductList,
            UpdateProductRequest, VariantInput,
        },
    },
    hierarchy::{CollectionNode, FeaturedBrand, MenuNode, MenuRow},
    models::{
        Collection, Currency, MegaMenuItem, Order, OrderItem, Payment, Product, ProductImage,
        ProductVariant, User,
    },
    response::{ApiResponse, Meta},
    routes::{
        analytics, auth, collections, currencies, health, megamenu, orders, params, payments,
        products, uploads,
    },
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
        auth::login,
        auth::register,
        products::list_products,
        products::filter_products,
        products::get_product,
        products::get_product_by_slug,
        products::create_product,
        products::update_product,
        products::delete_product,
        products::list_product_collections,
        collections::list_collections,
        collections::collection_tree,
        collections::get_collection,
        collections::get_collection_by_slug,
        collections::create_collection,
        collections::update_collection,
        collections::delete_collection,
        collections::list_collection_products,
        collections::update_collection_products,
        collections::remove_collection_product,
        megamenu::menu_tree,
        megamenu::list_menu_items,
        megamenu::create_menu_item,
        megamenu::update_menu_item,
        megamenu::delete_menu_item,
        megamenu::reorder_menu,
        orders::create_order,
        orders::list_orders,
        orders::get_order,
        orders::update_order_status,
        orders::list_order_payments,
        payments::create_checkout,
        payments::verify_payment,
        payments::record_failure,
        analytics::sales_summary,
        analytics::revenue_by_day,
        analytics::top_products,
        analytics::order_status_breakdown,
        currencies::list_currencies,
        currencies::upsert_currency,
        uploads::upload_image,
    ),
    components(
        schemas(
            User,
            Product,
            ProductImage,
            ProductVariant,
            Collection,
            MegaMenuItem,
            Order,
            OrderItem,
            Payment,
            Currency,
            CollectionNode,
            MenuNode,
            MenuRow,
            FeaturedBrand,
            CreateProductRequest,
            UpdateProductRequest,
            ImageInput,
            VariantInput,
            ProductDetail,
            ProductList,
            ProductCollections,
            CreateCollectionRequest,
            UpdateCollectionRequest,
            CollectionProductsRequest,
            CollectionList,
            CollectionTree,
            MembershipChange,
            CreateMenuItemRequest,
            UpdateMenuItemRequest,
            ReorderEntry,
            ReorderMenuRequest,
            MenuItemList,
            MenuTree,
            CheckoutItem,
            CreateOrderRequest,
            UpdateOrderStatusRequest,
            OrderWithItems,
            OrderDetail,
            OrderList,
            CreatePaymentRequest,
            PaymentCheckout,
            VerifyPaymentRequest,
            PaymentFailureRequest,
            PaymentList,
            SalesSummary,
            RevenuePoint,
            RevenueSeries,
            TopProduct,
            TopProducts,
            StatusCount,
            StatusBreakdown,
            currencies::UpsertCurrencyRequest,
            currencies::CurrencyList,
            uploads::UploadResponse,
            health::HealthData,
            params::Pagination,
            params::ProductQuery,
            params::FilterQuery,
            params::OrderListQuery,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductDetail>,
            ApiResponse<ProductList>,
            ApiResponse<Collection>,
            ApiResponse<CollectionTree>,
            ApiResponse<MenuTree>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderDetail>,
            ApiResponse<OrderList>,
            ApiResponse<Payment>,
            ApiResponse<PaymentList>,
            ApiResponse<SalesSummary>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Products", description = "Catalog endpoints"),
        (name = "Collections", description = "Hierarchical collection endpoints"),
        (name = "Mega menu", description = "Curated navigation tree endpoints"),
        (name = "Orders", description = "Order endpoints"),
        (name = "Payments", description = "Payment provider endpoints"),
        (name = "Analytics", description = "Admin analytics endpoints"),
        (name = "Currencies", description = "Currency endpoints"),
        (name = "Uploads", description = "Image upload endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
