use actix_web::{get, web, Responder};
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::{auth::Admin, payroll::summary};

use super::PageError;

pub(super) fn config(cfg: &mut web::ServiceConfig) {
    cfg
        .service(get_advance_ledger);
}

/// Advance with every deduction ever applied to it, reversed lines included
#[get("/{advance_id}")]
async fn get_advance_ledger(db: web::Data<DatabaseConnection>, admin: Admin, advance_id: web::Path<Uuid>) -> Result<impl Responder, PageError> {
    let ledger = summary::advance_ledger(db.get_ref(), admin.tenant_id, advance_id.into_inner()).await?;

    Ok(web::Json(ledger))
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test, App};
    use chrono::Local;
    use rust_decimal_macros::dec;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use serde_json::Value;

    use crate::{auth::{tests::user_with_role, Authority}, entity::{advance_deduction, advance_salary, sea_orm_active_enums::{ApprovalStatus, DeductionStatus, RoleType}}};

    use super::*;

    #[actix_web::test]
    async fn test_advance_ledger() {
        let secret = b"secret";
        let admin = user_with_role(Uuid::new_v4(), RoleType::Admin);
        let now = Local::now().fixed_offset();

        let advance = advance_salary::Model {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            tenant_id: admin.tenant_id,
            employee_id: Uuid::new_v4(),
            amount_requested: dec!(600),
            reason: None,
            approval_status: ApprovalStatus::Approved,
            deduction_status: DeductionStatus::Partial,
            amount_deducted: dec!(500),
            remaining_amount: dec!(100),
            request_date: now,
            approved_by: Some(admin.id),
        };

        let line = |amount, reversed_at| advance_deduction::Model {
            id: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
            tenant_id: admin.tenant_id,
            advance_salary_id: advance.id,
            payroll_id: Uuid::new_v4(),
            amount,
            month: 4,
            year: 2025,
            applied_at: now,
            reversed_at,
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([
                vec![ advance.clone() ],
            ])
            .append_query_results([
                vec![ line(dec!(300), Some(now)), line(dec!(500), None) ],
            ])
            .append_query_results([
                Vec::<advance_salary::Model>::new(),
            ]);

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Authority::new(secret)))
                .app_data(web::Data::new(db.into_connection()))
                .service(web::scope("/advance").configure(config))
        ).await;

        let token = Authority::new(secret).issue_for(&admin);

        let req = test::TestRequest::get()
            .uri(&format!("/advance/{}", advance.id))
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();

        let ledger: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(ledger["id"], Value::String(advance.id.to_string()));
        assert_eq!(ledger["deductions"].as_array().map(Vec::len), Some(2));
        assert!(ledger["deductions"][0]["reversed_at"].is_string());
        assert!(ledger["deductions"][1]["reversed_at"].is_null());

        let req = test::TestRequest::get()
            .uri(&format!("/advance/{}", Uuid::new_v4()))
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();

        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
