use std::{path::PathBuf, sync::Arc};

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderValue, Method, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Form, Router,
};
use custbook::{
    domain::{
        customer::{Customer, CustomerError, CustomerForm, CustomerId, CustomerRepository},
        DataAccessError, Entity,
    },
    infrastructure::{csv, API_PATH},
};
use tokio::sync::Mutex;
use tower::ServiceExt;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use tracing::{error, info};

/// ハンドラ間で共有する状態
///
/// リポジトリはミューテックス越しに扱い、ファイルへのアクセスを直列化する。
pub struct AppState<R> {
    repository: Arc<Mutex<R>>,
    static_dir: Option<Arc<PathBuf>>,
}

impl<R> Clone for AppState<R> {
    fn clone(&self) -> Self {
        Self {
            repository: self.repository.clone(),
            static_dir: self.static_dir.clone(),
        }
    }
}

const ALLOW_METHODS: &str = "GET,POST,PUT,DELETE,OPTIONS";

pub fn app<R>(repository: R, static_dir: Option<PathBuf>) -> Router
where
    R: CustomerRepository + Send + Sync + 'static,
{
    let state = AppState {
        repository: Arc::new(Mutex::new(repository)),
        static_dir: static_dir.map(Arc::new),
    };
    Router::new()
        .route(
            API_PATH,
            get(list::<R>)
                .post(create::<R>)
                .fallback(bad_verb),
        )
        // IDが空の場合は一覧として扱う
        .route(
            &format!("{}/", API_PATH),
            get(list::<R>)
                .post(create::<R>)
                .fallback(bad_verb),
        )
        .route(
            &format!("{}/:id", API_PATH),
            get(show::<R>)
                .put(update::<R>)
                .delete(remove::<R>)
                .fallback(bad_verb),
        )
        .fallback(fallback::<R>)
        .layer(cors())
        .layer(SetResponseHeaderLayer::if_not_present(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOW_METHODS),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("content-type"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE])
}

pub enum ApiError {
    NotFound,
    Invalid(CustomerError),
    DataAccess(DataAccessError),
}

impl From<CustomerError> for ApiError {
    fn from(value: CustomerError) -> Self {
        Self::Invalid(value)
    }
}

impl From<DataAccessError> for ApiError {
    fn from(value: DataAccessError) -> Self {
        Self::DataAccess(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotFound => (StatusCode::NOT_FOUND, "no such customer").into_response(),
            ApiError::Invalid(e) => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
            ApiError::DataAccess(e) => {
                error!("データアクセスエラー: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
            }
        }
    }
}

fn csv_response<'a>(
    status: StatusCode,
    customers: impl IntoIterator<Item = &'a Customer>,
) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, mime::TEXT_CSV.to_string())],
        csv::write(customers),
    )
        .into_response()
}

async fn list<R>(State(state): State<AppState<R>>) -> Result<Response, ApiError>
where
    R: CustomerRepository + Send + Sync + 'static,
{
    let customers = state.repository.lock().await.find_all().await?;
    Ok(csv_response(StatusCode::OK, &customers))
}

async fn show<R>(
    State(state): State<AppState<R>>,
    Path(id): Path<CustomerId>,
) -> Result<Response, ApiError>
where
    R: CustomerRepository + Send + Sync + 'static,
{
    match state.repository.lock().await.find_by_id(id).await? {
        Some(customer) => Ok(csv_response(StatusCode::OK, [&customer])),
        None => Err(ApiError::NotFound),
    }
}

async fn create<R>(
    State(state): State<AppState<R>>,
    Form(form): Form<CustomerForm>,
) -> Result<Response, ApiError>
where
    R: CustomerRepository + Send + Sync + 'static,
{
    form.validate()?;
    let customer = state.repository.lock().await.create(form).await?;
    info!("顧客を登録: {}", customer.id());
    Ok(csv_response(StatusCode::CREATED, [&customer]))
}

async fn update<R>(
    State(state): State<AppState<R>>,
    Path(id): Path<CustomerId>,
    Form(form): Form<CustomerForm>,
) -> Result<Response, ApiError>
where
    R: CustomerRepository + Send + Sync + 'static,
{
    form.validate()?;
    if !state.repository.lock().await.update(id, form).await? {
        return Err(ApiError::NotFound);
    }
    info!("顧客を更新: {}", id);
    Ok((StatusCode::OK, "updated").into_response())
}

async fn remove<R>(
    State(state): State<AppState<R>>,
    Path(id): Path<CustomerId>,
) -> Result<Response, ApiError>
where
    R: CustomerRepository + Send + Sync + 'static,
{
    if !state.repository.lock().await.delete(id).await? {
        return Err(ApiError::NotFound);
    }
    info!("顧客を削除: {}", id);
    Ok(StatusCode::NO_CONTENT.into_response())
}

async fn bad_verb() -> (StatusCode, &'static str) {
    (StatusCode::METHOD_NOT_ALLOWED, "bad verb")
}

/// API以外のパスは静的ファイルとして返す
async fn fallback<R>(State(state): State<AppState<R>>, request: Request<Body>) -> Response
where
    R: CustomerRepository + Send + Sync + 'static,
{
    let path = request.uri().path();
    if path == "/api" || path.starts_with("/api/") {
        return (StatusCode::NOT_FOUND, "Bad endpoint").into_response();
    }
    let Some(dir) = state.static_dir.as_deref() else {
        return (StatusCode::NOT_FOUND, "not found").into_response();
    };
    match ServeDir::new(dir).oneshot(request).await {
        Ok(response) => response.into_response(),
        Err(infallible) => match infallible {},
    }
}
