use std::str::FromStr;

use actix_web::{delete, dev, get, patch, post, web, FromRequest, HttpRequest, HttpResponse, Responder};
use futures_util::future::LocalBoxFuture;
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use uuid::Uuid;

use crate::{auth::Admin, config::PayrollSettings, entity::payroll, payroll::{generator::{self, GenerateRequest}, records::{self, PaymentPatch}, summary, Period}, pages::payroll::extractor::ActivePayroll};

use super::PageError;

use model::*;

mod extractor;
mod model;

pub(super) fn config(cfg: &mut web::ServiceConfig) {
    cfg
        .service(generate_payroll)
        .service(get_payroll_records)
        .service(get_salary_summary)
        .service(get_employee_history)
        .service(get_payroll)
        .service(update_payroll)
        .service(delete_payroll);
}

#[post("/generate")]
async fn generate_payroll(db: web::Data<DatabaseConnection>, settings: web::Data<PayrollSettings>, admin: Admin, payload: web::Json<GeneratePayroll>) -> Result<HttpResponse, PageError> {
    let (month, year, options) = payload.into_inner().into_parts();

    let request = GenerateRequest {
        tenant_id: admin.tenant_id,
        period: Period::new(month, year)?,
        actor_id: admin.id,
        options,
    };

    let batch = generator::generate(db.get_ref(), db.get_ref(), &request, settings.concurrency).await?;

    if !batch.success {
        return Ok(HttpResponse::BadRequest().json(web::Json(batch)))
    }

    Ok(HttpResponse::Created().json(web::Json(batch)))
}

#[get("")]
async fn get_payroll_records(db: web::Data<DatabaseConnection>, admin: Admin, query: web::Query<ListPayrolls>) -> Result<impl Responder, PageError> {
    let records = summary::get_payroll_records(db.get_ref(), admin.tenant_id, query.filter(), query.page, query.limit).await?;

    Ok(web::Json(records))
}

#[get("/summary")]
async fn get_salary_summary(db: web::Data<DatabaseConnection>, admin: Admin, query: web::Query<PeriodQuery>) -> Result<impl Responder, PageError> {
    let period = Period::new(query.month, query.year)?;
    let summary = summary::get_salary_summary(db.get_ref(), admin.tenant_id, period).await?;

    Ok(web::Json(summary))
}

#[get("/history/{employee_id}")]
async fn get_employee_history(db: web::Data<DatabaseConnection>, admin: Admin, employee_id: web::Path<Uuid>, query: web::Query<HistoryQuery>) -> Result<impl Responder, PageError> {
    let history = summary::get_employee_payroll_history(db.get_ref(), admin.tenant_id, employee_id.into_inner(), query.year).await?;

    Ok(web::Json(history))
}

#[get("/{payroll_id}")]
async fn get_payroll(db: web::Data<DatabaseConnection>, _admin: Admin, record: payroll::Model) -> Result<impl Responder, PageError> {
    let detail = summary::payroll_detail(db.get_ref(), record).await?;

    Ok(web::Json(detail))
}

#[patch("/{payroll_id}")]
async fn update_payroll(db: web::Data<DatabaseConnection>, admin: Admin, record: ActivePayroll, payload: web::Json<PaymentPatch>) -> Result<impl Responder, PageError> {
    let record = records::update_payment(db.get_ref(), &record, payload.into_inner(), admin.id).await?;

    Ok(web::Json(record))
}

#[delete("/{payroll_id}")]
async fn delete_payroll(db: web::Data<DatabaseConnection>, admin: Admin, record: ActivePayroll) -> Result<impl Responder, PageError> {
    let record = records::soft_delete(db.get_ref(), &record, admin.id).await?;

    Ok(web::Json(record))
}
