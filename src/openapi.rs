use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Storefront API",
        version = "0.1.0",
        description = r#"
Multi-tenant store management API.

Companies own stores; stores list products, build carts and place orders.
Payment settles through an admin-mediated manual verification workflow:
the store pays by QR code, submits the transaction id, and an admin
verifies or rejects it before the order can ship.

## Authentication

Authenticate against `/api/v1/auth/store/login` or
`/api/v1/auth/admin/login` and send the returned token as a bearer
credential:

```
Authorization: Bearer <token>
```

## Responses

Every endpoint answers with the `{ success, message, data?, error? }`
envelope.
"#
    ),
    components(schemas(
        crate::errors::ErrorResponse,
        crate::auth::Role,
        crate::handlers::auth::LoginRequest,
        crate::handlers::auth::TokenResponse,
        crate::services::carts::AddItemRequest,
        crate::services::carts::UpdateItemRequest,
        crate::services::carts::CartLine,
        crate::services::carts::CartView,
        crate::services::orders::CreateOrderRequest,
        crate::services::orders::CancelOrderRequest,
        crate::services::orders::UpdateShippingStatusRequest,
        crate::services::orders::UpdatePaymentStatusRequest,
        crate::services::orders::OrderItemView,
        crate::services::orders::OrderResponse,
        crate::services::orders::OrderListResponse,
        crate::services::payments::SubmitTransactionRequest,
        crate::services::payments::VerifyPaymentRequest,
        crate::services::payments::PaymentResponse,
        crate::services::addresses::CreateAddressRequest,
        crate::services::addresses::UpdateAddressRequest,
        crate::services::products::CreateProductRequest,
        crate::services::products::UpdateProductRequest,
        crate::services::stores::CreateStoreRequest,
        crate::services::stores::UpdateStoreRequest,
        crate::services::companies::CreateCompanyRequest,
        crate::services::companies::UpdateCompanyRequest,
        crate::services::reports::ReceiptLine,
        crate::services::reports::ReceiptResponse,
        crate::services::reports::DashboardResponse,
        crate::entities::order::OrderStatus,
        crate::entities::order::OrderPaymentStatus,
        crate::entities::order::ShippingStatus,
        crate::entities::order::ShippingAddress,
        crate::entities::payment::PaymentStatus,
    )),
    tags(
        (name = "Auth", description = "Login endpoints for admins and stores"),
        (name = "Carts", description = "Per-store cart management"),
        (name = "Orders", description = "Order lifecycle"),
        (name = "Payments", description = "QR payment verification workflow"),
        (name = "Addresses", description = "Store address book"),
        (name = "Reports", description = "Receipts and dashboard aggregates")
    )
)]
pub struct ApiDoc;

/// Swagger UI served at `/docs`, backed by `/api-docs/openapi.json`.
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}
