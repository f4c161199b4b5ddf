//! Persistence for the `employees` table.

use entity::employees::{self, EmployeeFields};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder,
    sea_query::{Expr, Func, LikeExpr},
};
use tracing::{info, instrument};
use uuid::Uuid;

/// Direction for the salary listing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SalaryOrder {
    #[default]
    Asc,
    Desc,
}

impl SalaryOrder {
    /// Anything other than a case-insensitive `desc` sorts ascending.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some(raw) if raw.eq_ignore_ascii_case("desc") => Self::Desc,
            _ => Self::Asc,
        }
    }
}

#[instrument(name = "employees.list", skip_all)]
pub async fn list_all<C: ConnectionTrait>(db: &C) -> Result<Vec<employees::Model>, DbErr> {
    employees::Entity::find().all(db).await
}

#[instrument(name = "employees.find", skip(db))]
pub async fn find<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> Result<Option<employees::Model>, DbErr> {
    employees::Entity::find_by_id(id).one(db).await
}

#[instrument(name = "employees.count", skip_all)]
pub async fn count<C: ConnectionTrait>(db: &C) -> Result<u64, DbErr> {
    employees::Entity::find().count(db).await
}

#[instrument(name = "employees.create", skip_all)]
pub async fn create<C: ConnectionTrait>(
    db: &C,
    fields: EmployeeFields,
) -> Result<employees::Model, DbErr> {
    let id = Uuid::new_v4();
    let active = employees::ActiveModel {
        id: Set(id),
        name: Set(fields.name),
        email: Set(fields.email),
        phone: Set(fields.phone),
        salary: Set(fields.salary),
    };
    employees::Entity::insert(active)
        .exec_without_returning(db)
        .await?;
    let record = employees::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(format!("employee {id} vanished after insert")))?;
    info!(employee_id = %id, "employee created");
    Ok(record)
}

/// Overwrite every mutable column of `existing`.
#[instrument(name = "employees.update", skip_all, fields(employee_id = %existing.id))]
pub async fn update<C: ConnectionTrait>(
    db: &C,
    existing: employees::Model,
    fields: EmployeeFields,
) -> Result<employees::Model, DbErr> {
    let mut active: employees::ActiveModel = existing.into();
    active.name = Set(fields.name);
    active.email = Set(fields.email);
    active.phone = Set(fields.phone);
    active.salary = Set(fields.salary);
    let updated = active.update(db).await?;
    info!("employee updated");
    Ok(updated)
}

/// Returns `false` when no row carried `id`.
#[instrument(name = "employees.delete", skip(db))]
pub async fn delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<bool, DbErr> {
    let result = employees::Entity::delete_by_id(id).exec(db).await?;
    let deleted = result.rows_affected > 0;
    if deleted {
        info!("employee deleted");
    }
    Ok(deleted)
}

#[instrument(name = "employees.sorted_by_salary", skip(db))]
pub async fn sorted_by_salary<C: ConnectionTrait>(
    db: &C,
    order: SalaryOrder,
) -> Result<Vec<employees::Model>, DbErr> {
    let query = employees::Entity::find();
    let query = match order {
        SalaryOrder::Asc => query.order_by_asc(employees::Column::Salary),
        SalaryOrder::Desc => query.order_by_desc(employees::Column::Salary),
    };
    query.all(db).await
}

/// Case-insensitive substring match on the name; a blank query matches everything.
#[instrument(name = "employees.search_by_name", skip(db))]
pub async fn search_by_name<C: ConnectionTrait>(
    db: &C,
    query: &str,
) -> Result<Vec<employees::Model>, DbErr> {
    let needle = query.trim().to_lowercase();
    let mut select = employees::Entity::find();
    if !needle.is_empty() {
        let pattern = format!("%{}%", escape_like(&needle));
        let name_expr = Expr::expr(Func::lower(Expr::col(employees::Column::Name)));
        select = select.filter(name_expr.like(LikeExpr::new(pattern).escape(LIKE_ESCAPE)));
    }
    select.all(db).await
}

// Must be usable verbatim inside an ESCAPE clause on every backend.
const LIKE_ESCAPE: char = '!';

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | LIKE_ESCAPE) {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(ch);
    }
    escaped
}

/// Insert a handful of sample rows unless the table already has data.
pub async fn seed_samples<C: ConnectionTrait>(db: &C) -> Result<usize, DbErr> {
    if count(db).await? > 0 {
        return Ok(0);
    }
    let samples = [
        ("Ada Lovelace", "ada@example.com", Some("+44 20 7946 0000"), 5200.0),
        ("Grace Hopper", "grace@example.com", None, 6100.0),
        ("Alan Turing", "alan@example.com", Some("+44 20 7946 0001"), 4800.0),
    ];
    for (name, email, phone, salary) in samples {
        create(
            db,
            EmployeeFields {
                name: name.into(),
                email: email.into(),
                phone: phone.map(Into::into),
                salary,
            },
        )
        .await?;
    }
    Ok(samples.len())
}
