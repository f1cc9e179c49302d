use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{get, patch, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use uuid::Uuid;

use crate::adapter::driver::request_dto::{
    BookSearchParams, CreateBookRequest, PlaceOrderRequest, RegisterUserRequest, RestockRequest,
    ReviseBookRequest, UpdateOrderStatusRequest,
};
use crate::adapter::driver::response_dto::{
    BookResponse, OrderResponse, OrderStatusResponse, SaleResponse, UserResponse,
};
use crate::application::service::{
    BookRevision, CatalogService, IdentityService, NewBook, OrderLifecycleService,
    OrderQueryService, SalesQueryService,
};
use crate::application::ApplicationError;
use crate::domain::error::DomainError;
use crate::domain::model::{BookId, Caller, Money, OrderId, UserId, UserRole};
use crate::domain::port::{
    BookRepository, OrderRepository, RepositoryError, SaleRepository, UnitOfWorkFactory,
    UserRepository,
};

/// 呼び出し元のユーザーIDを運ぶヘッダー
pub const USER_ID_HEADER: &str = "x-user-id";

#[derive(Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
}

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

fn api_error(status: StatusCode, code: &str, error: impl Into<String>) -> (StatusCode, Json<ApiError>) {
    (
        status,
        Json(ApiError {
            error: error.into(),
            code: code.to_string(),
        }),
    )
}

// アプリケーションサービスを含む状態
#[derive(Clone)]
pub struct AppState {
    pub order_lifecycle_service: Arc<OrderLifecycleService>,
    pub order_query_service: Arc<OrderQueryService>,
    pub catalog_service: Arc<CatalogService>,
    pub sales_query_service: Arc<SalesQueryService>,
    pub identity_service: Arc<IdentityService>,
}

impl AppState {
    /// ポートの実装からサービス一式を組み立てる
    pub fn from_ports(
        book_repository: Arc<dyn BookRepository>,
        order_repository: Arc<dyn OrderRepository>,
        sale_repository: Arc<dyn SaleRepository>,
        user_repository: Arc<dyn UserRepository>,
        unit_of_work_factory: Arc<dyn UnitOfWorkFactory>,
    ) -> Self {
        Self {
            order_lifecycle_service: Arc::new(OrderLifecycleService::new(
                unit_of_work_factory.clone(),
            )),
            order_query_service: Arc::new(OrderQueryService::new(order_repository)),
            catalog_service: Arc::new(CatalogService::new(book_repository, unit_of_work_factory)),
            sales_query_service: Arc::new(SalesQueryService::new(sale_repository)),
            identity_service: Arc::new(IdentityService::new(user_repository)),
        }
    }
}

// REST APIルーターを作成
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/", get(health_check))
        .route("/users", post(register_user))
        .route("/books", get(list_books))
        .route("/books/:book_id", get(get_book))
        .route("/admin/books", post(add_book))
        .route("/admin/books/:book_id", patch(revise_book).delete(delete_book))
        .route("/admin/books/:book_id/restock", post(restock_book))
        .route("/orders", post(place_order))
        .route("/orders/me", get(get_my_orders))
        .route("/orders/:order_id", get(get_order))
        .route("/admin/orders", get(get_all_orders))
        .route("/admin/orders/:order_id/status", patch(update_order_status))
        .route("/admin/sales", get(list_sales))
}

// ヘルスチェックエンドポイント
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "OK" }))
}

/// `X-User-Id`ヘッダーから呼び出し元を解決する
/// ヘッダーがない・不正・未知のユーザーは401
async fn authenticate(state: &AppState, headers: &HeaderMap) -> ApiResult<Caller> {
    let raw = headers
        .get(USER_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            api_error(
                StatusCode::UNAUTHORIZED,
                "UNAUTHENTICATED",
                "X-User-Idヘッダーが必要です",
            )
        })?;

    let user_id = UserId::from_string(raw.trim()).map_err(|_| {
        api_error(
            StatusCode::UNAUTHORIZED,
            "UNAUTHENTICATED",
            "X-User-Idヘッダーの形式が不正です",
        )
    })?;

    match state.identity_service.resolve_caller(user_id).await {
        Ok(caller) => Ok(caller),
        Err(ApplicationError::Unauthorized(msg)) => {
            Err(api_error(StatusCode::UNAUTHORIZED, "UNAUTHENTICATED", msg))
        }
        Err(err) => Err(map_application_error(err)),
    }
}

// ユーザー登録エンドポイント
// 管理者ロールでの登録は管理者のみ
async fn register_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<RegisterUserRequest>,
) -> ApiResult<(StatusCode, Json<UserResponse>)> {
    let role = match request.role.as_deref() {
        Some(role) => UserRole::from_string(role).map_err(map_domain_error)?,
        None => UserRole::Customer,
    };

    let user = match role {
        UserRole::Admin => {
            let caller = authenticate(&state, &headers).await?;
            state
                .identity_service
                .register_by_admin(&caller, request.username, role)
                .await
        }
        UserRole::Customer => state.identity_service.register(request.username, role).await,
    }
    .map_err(map_application_error)?;

    Ok((StatusCode::CREATED, Json(UserResponse::from_user(&user))))
}

// 書籍一覧取得エンドポイント
// 分類（部分一致）・価格上限で絞り込み、sort_by/orderで並び替える
async fn list_books(
    State(state): State<AppState>,
    Query(params): Query<BookSearchParams>,
) -> ApiResult<Json<Vec<BookResponse>>> {
    let query = params.into_query().map_err(map_domain_error)?;
    let books = state
        .catalog_service
        .list_books(&query)
        .await
        .map_err(map_application_error)?;

    Ok(Json(books.iter().map(BookResponse::from_book).collect()))
}

// 書籍詳細取得エンドポイント
async fn get_book(
    State(state): State<AppState>,
    Path(book_id): Path<Uuid>,
) -> ApiResult<Json<BookResponse>> {
    let book = state
        .catalog_service
        .get_book(BookId::from_uuid(book_id))
        .await
        .map_err(map_application_error)?;

    Ok(Json(BookResponse::from_book(&book)))
}

// 書籍登録エンドポイント
async fn add_book(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateBookRequest>,
) -> ApiResult<(StatusCode, Json<BookResponse>)> {
    let caller = authenticate(&state, &headers).await?;

    let new_book = NewBook {
        title: request.title,
        author: request.author,
        domain: request.domain,
        price: Money::jpy(request.price),
        stock_quantity: request.stock_quantity,
    };
    let book = state
        .catalog_service
        .add_book(&caller, new_book)
        .await
        .map_err(map_application_error)?;

    Ok((StatusCode::CREATED, Json(BookResponse::from_book(&book))))
}

// 書籍情報更新エンドポイント
async fn revise_book(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(book_id): Path<Uuid>,
    Json(request): Json<ReviseBookRequest>,
) -> ApiResult<Json<BookResponse>> {
    let caller = authenticate(&state, &headers).await?;

    let revision = BookRevision {
        title: request.title,
        author: request.author,
        domain: request.domain,
        price: request.price.map(Money::jpy),
    };
    let book = state
        .catalog_service
        .revise_book(&caller, BookId::from_uuid(book_id), revision)
        .await
        .map_err(map_application_error)?;

    Ok(Json(BookResponse::from_book(&book)))
}

// 入荷エンドポイント
async fn restock_book(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(book_id): Path<Uuid>,
    Json(request): Json<RestockRequest>,
) -> ApiResult<Json<BookResponse>> {
    let caller = authenticate(&state, &headers).await?;

    let book = state
        .catalog_service
        .restock(&caller, BookId::from_uuid(book_id), request.quantity)
        .await
        .map_err(map_application_error)?;

    Ok(Json(BookResponse::from_book(&book)))
}

// 書籍削除エンドポイント
async fn delete_book(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(book_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let caller = authenticate(&state, &headers).await?;

    state
        .catalog_service
        .delete_book(&caller, BookId::from_uuid(book_id))
        .await
        .map_err(map_application_error)?;

    Ok(StatusCode::NO_CONTENT)
}

// 注文受付エンドポイント
async fn place_order(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<PlaceOrderRequest>,
) -> ApiResult<(StatusCode, Json<OrderResponse>)> {
    let caller = authenticate(&state, &headers).await?;

    let order = state
        .order_lifecycle_service
        .place_order(BookId::from_uuid(request.book_id), request.quantity, &caller)
        .await
        .map_err(map_application_error)?;

    let response = OrderResponse::from_order(&order).map_err(map_domain_error)?;
    Ok((StatusCode::CREATED, Json(response)))
}

// 自分の注文一覧取得エンドポイント
async fn get_my_orders(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<OrderResponse>>> {
    let caller = authenticate(&state, &headers).await?;

    let orders = state
        .order_query_service
        .get_my_orders(&caller)
        .await
        .map_err(map_application_error)?;

    let response = orders
        .iter()
        .map(OrderResponse::from_order)
        .collect::<Result<Vec<_>, _>>()
        .map_err(map_domain_error)?;
    Ok(Json(response))
}

// 注文詳細取得エンドポイント（注文者本人または管理者）
async fn get_order(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(order_id): Path<Uuid>,
) -> ApiResult<Json<OrderResponse>> {
    let caller = authenticate(&state, &headers).await?;

    let order = state
        .order_query_service
        .get_order(OrderId::from_uuid(order_id), &caller)
        .await
        .map_err(map_application_error)?;

    let response = OrderResponse::from_order(&order).map_err(map_domain_error)?;
    Ok(Json(response))
}

// 全注文一覧取得エンドポイント
async fn get_all_orders(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<OrderResponse>>> {
    let caller = authenticate(&state, &headers).await?;

    let orders = state
        .order_query_service
        .get_all_orders(&caller)
        .await
        .map_err(map_application_error)?;

    let response = orders
        .iter()
        .map(OrderResponse::from_order)
        .collect::<Result<Vec<_>, _>>()
        .map_err(map_domain_error)?;
    Ok(Json(response))
}

// 注文ステータス変更エンドポイント
async fn update_order_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(order_id): Path<Uuid>,
    Json(request): Json<UpdateOrderStatusRequest>,
) -> ApiResult<Json<OrderStatusResponse>> {
    let caller = authenticate(&state, &headers).await?;

    let order = state
        .order_lifecycle_service
        .transition_order(OrderId::from_uuid(order_id), &request.status, &caller)
        .await
        .map_err(map_application_error)?;

    Ok(Json(OrderStatusResponse::from_order(&order)))
}

// 売上台帳取得エンドポイント
async fn list_sales(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<Vec<SaleResponse>>> {
    let caller = authenticate(&state, &headers).await?;

    let sales = state
        .sales_query_service
        .list_sales(&caller)
        .await
        .map_err(map_application_error)?;

    let response = sales
        .iter()
        .map(SaleResponse::from_sale)
        .collect::<Result<Vec<_>, _>>()
        .map_err(map_domain_error)?;
    Ok(Json(response))
}

// アプリケーションエラーをHTTPエラーにマッピング
fn map_application_error(err: ApplicationError) -> (StatusCode, Json<ApiError>) {
    match err {
        ApplicationError::DomainError(domain_err) => map_domain_error(domain_err),
        ApplicationError::RepositoryError(RepositoryError::Conflict(msg)) => {
            api_error(StatusCode::CONFLICT, "CONFLICT", msg)
        }
        ApplicationError::RepositoryError(repo_err) => api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "REPOSITORY_ERROR",
            repo_err.to_string(),
        ),
        ApplicationError::NotFound(msg) => api_error(StatusCode::NOT_FOUND, "NOT_FOUND", msg),
        ApplicationError::Unauthorized(msg) => api_error(StatusCode::FORBIDDEN, "FORBIDDEN", msg),
        ApplicationError::InternalConsistency(msg) => api_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_CONSISTENCY",
            msg,
        ),
    }
}

// ドメインエラーを適切なHTTPステータスコードとエラーコードにマッピング
fn map_domain_error(domain_err: DomainError) -> (StatusCode, Json<ApiError>) {
    let (status, code) = match &domain_err {
        DomainError::InvalidStatus(_) => (StatusCode::BAD_REQUEST, "INVALID_STATUS"),
        DomainError::IllegalTransition { .. } => (StatusCode::CONFLICT, "ILLEGAL_TRANSITION"),
        DomainError::InsufficientStock { .. } => {
            (StatusCode::UNPROCESSABLE_ENTITY, "INSUFFICIENT_STOCK")
        }
        DomainError::InvalidQuantity => (StatusCode::BAD_REQUEST, "INVALID_QUANTITY"),
        DomainError::StockOverflow => (StatusCode::UNPROCESSABLE_ENTITY, "STOCK_OVERFLOW"),
        DomainError::AmountOverflow => (StatusCode::UNPROCESSABLE_ENTITY, "AMOUNT_OVERFLOW"),
        DomainError::BookHasOpenOrders(_) => (StatusCode::CONFLICT, "BOOK_HAS_OPEN_ORDERS"),
        DomainError::UsernameTaken(_) => (StatusCode::CONFLICT, "USERNAME_TAKEN"),
        DomainError::InvalidValue(_) => (StatusCode::BAD_REQUEST, "INVALID_VALUE"),
    };
    api_error(status, code, domain_err.to_string())
}
