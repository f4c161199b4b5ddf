use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};
use entity::employees::Model as Employee;
use platform_api::{
    AddEmployeeDto, ApiError, ApiJson, ApiResponse, ApiResult, Created, PatchDocument,
    UpdateEmployeeDto, apply_patch, internal_error,
};
use platform_db::{DbPool, SalaryOrder, employees as repo};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use crate::http::AppState;

type EmployeeResponse = ApiResponse<Employee>;
type EmployeeListResponse = ApiResponse<Vec<Employee>>;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/employees", get(list_employees).post(create_employee))
        .route("/employees/sort", get(sort_employees))
        .route("/employees/list", get(search_employees))
        .route("/employees/ByIdQuery", get(get_employee_by_query))
        .route(
            "/employees/{id}",
            get(get_employee)
                .put(update_employee)
                .patch(patch_employee)
                .delete(delete_employee),
        )
}

#[derive(Debug, Deserialize)]
struct ByIdQuery {
    #[serde(default)]
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SortQuery {
    #[serde(default)]
    sort: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NameQuery {
    #[serde(default)]
    name: Option<String>,
}

// A malformed identifier cannot name any stored employee.
fn parse_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::employee_not_found())
}

async fn load_employee(pool: &DbPool, id: Uuid) -> ApiResult<Employee> {
    repo::find(pool, id)
        .await
        .map_err(internal_error)?
        .ok_or_else(ApiError::employee_not_found)
}

#[instrument(name = "http.employees.list", skip_all)]
async fn list_employees(State(state): State<AppState>) -> ApiResult<EmployeeListResponse> {
    let rows = repo::list_all(&state.pool).await.map_err(internal_error)?;
    Ok(ApiResponse::ok(rows))
}

#[instrument(name = "http.employees.get", skip(state))]
async fn get_employee(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<EmployeeResponse> {
    let employee = load_employee(&state.pool, parse_id(&id)?).await?;
    Ok(ApiResponse::ok(employee))
}

#[instrument(name = "http.employees.get_by_query", skip(state))]
async fn get_employee_by_query(
    State(state): State<AppState>,
    Query(query): Query<ByIdQuery>,
) -> ApiResult<EmployeeResponse> {
    let id = parse_id(query.id.as_deref().unwrap_or_default())?;
    let employee = load_employee(&state.pool, id).await?;
    Ok(ApiResponse::ok(employee))
}

#[instrument(name = "http.employees.create", skip_all)]
async fn create_employee(
    State(state): State<AppState>,
    ApiJson(dto): ApiJson<AddEmployeeDto>,
) -> ApiResult<Created<Employee>> {
    let fields = dto.validate()?;
    let employee = repo::create(&state.pool, fields)
        .await
        .map_err(internal_error)?;
    Ok(Created {
        location: format!("/employees/{}", employee.id),
        body: ApiResponse::ok_with_message(employee, "Employee created successfully."),
    })
}

#[instrument(name = "http.employees.update", skip(state, dto))]
async fn update_employee(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(dto): ApiJson<UpdateEmployeeDto>,
) -> ApiResult<EmployeeResponse> {
    let id = parse_id(&id)?;
    let fields = dto.validate()?;
    let existing = load_employee(&state.pool, id).await?;
    let updated = repo::update(&state.pool, existing, fields)
        .await
        .map_err(internal_error)?;
    Ok(ApiResponse::ok(updated))
}

#[instrument(name = "http.employees.patch", skip(state, document))]
async fn patch_employee(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(document): ApiJson<PatchDocument>,
) -> ApiResult<EmployeeResponse> {
    let existing = load_employee(&state.pool, parse_id(&id)?).await?;
    let patched = apply_patch(UpdateEmployeeDto::from(&existing), &document)?;
    let fields = patched.validate()?;
    let updated = repo::update(&state.pool, existing, fields)
        .await
        .map_err(internal_error)?;
    Ok(ApiResponse::ok(updated))
}

#[instrument(name = "http.employees.delete", skip(state))]
async fn delete_employee(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let id = parse_id(&id)?;
    if repo::delete(&state.pool, id).await.map_err(internal_error)? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::employee_not_found())
    }
}

#[instrument(name = "http.employees.sort", skip(state))]
async fn sort_employees(
    State(state): State<AppState>,
    Query(query): Query<SortQuery>,
) -> ApiResult<EmployeeListResponse> {
    let order = SalaryOrder::parse(query.sort.as_deref());
    let rows = repo::sorted_by_salary(&state.pool, order)
        .await
        .map_err(internal_error)?;
    Ok(ApiResponse::ok(rows))
}

// Unlike the plain listing, an empty match set is reported as not found.
#[instrument(name = "http.employees.search", skip(state))]
async fn search_employees(
    State(state): State<AppState>,
    Query(query): Query<NameQuery>,
) -> ApiResult<EmployeeListResponse> {
    let name = query.name.unwrap_or_default();
    let rows = repo::search_by_name(&state.pool, &name)
        .await
        .map_err(internal_error)?;
    if rows.is_empty() {
        return Err(ApiError::no_results(&name));
    }
    Ok(ApiResponse::ok(rows))
}
