use std::ops::Deref;

use crate::{entity::user, payroll::store::PayrollStore as _};

use super::*;

/// Payroll named by the `payroll_id` path segment, within the caller's tenant
impl FromRequest for payroll::Model {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        let req = req.clone();

        Box::pin(async move {
            let payroll_id = req.match_info().get("payroll_id").expect("This extractor must be used under `payroll_id` path");
            let Ok(payroll_id) = Uuid::from_str(payroll_id) else {
                return Err(actix_web::error::ErrorBadRequest("invalid `payroll_id`"))
            };

            let caller = user::Model::from_request(&req, &mut dev::Payload::None).await?;

            let db = req.app_data::<web::Data<DatabaseConnection>>().expect("DatabaseConnection must be attached");

            let Some(record) = db.find_payroll_by_id(caller.tenant_id, payroll_id).await.map_err(PageError::from)? else {
                return Err(actix_web::error::ErrorNotFound("payroll not found"))
            };

            Ok(record)
        })
    }
}

/// A payroll that has not been soft-deleted and can still be edited
pub(super) struct ActivePayroll(pub(super) payroll::Model);

impl Deref for ActivePayroll {
    type Target = payroll::Model;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequest for ActivePayroll {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        let req = req.clone();

        Box::pin(async move {
            let record = payroll::Model::from_request(&req, &mut dev::Payload::None).await?;

            records::ensure_editable(&record).map_err(PageError::from)?;

            Ok(Self(record))
        })
    }
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test, App};
    use sea_orm::{DatabaseBackend, MockDatabase};
    use rust_decimal_macros::dec;

    use crate::{auth::{tests::user_with_role, Authority}, entity::sea_orm_active_enums::{PaymentStatus, RoleType}, pages::payroll::tests::record};

    use super::*;

    #[actix_web::test]
    async fn test_payroll_extractor() {
        #[get("/{payroll_id}")]
        async fn test_handler(record: payroll::Model) -> impl Responder {
            web::Json(record)
        }

        let secret = b"secret";

        let admin = user_with_role(Uuid::new_v4(), RoleType::Admin);
        let existing = record(admin.tenant_id, dec!(1000), PaymentStatus::Pending);

        let token = Authority::new(secret).issue_for(&admin);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([
                vec![ existing.clone() ],
                Vec::<payroll::Model>::new(),
            ]);

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Authority::new(secret)))
                .app_data(web::Data::new(db.into_connection()))
                .service(test_handler)
        ).await;

        let req = test::TestRequest::default()
            .uri(&format!("/{}", existing.id))
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();

        let returned: payroll::Model = test::call_and_read_body_json(&app, req).await;
        assert_eq!(returned, existing);

        // Another tenant's record is filtered out by the query
        let req = test::TestRequest::default()
            .uri(&format!("/{}", Uuid::new_v4()))
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();

        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::default()
            .uri("/not-a-uuid")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();

        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_active_payroll_extractor() {
        #[get("/{payroll_id}")]
        async fn test_handler(record: ActivePayroll) -> impl Responder {
            web::Json(record.0)
        }

        let secret = b"secret";

        let admin = user_with_role(Uuid::new_v4(), RoleType::Admin);
        let active = record(admin.tenant_id, dec!(1000), PaymentStatus::Pending);
        let mut deleted = record(admin.tenant_id, dec!(1000), PaymentStatus::Pending);
        deleted.is_deleted = true;

        let token = Authority::new(secret).issue_for(&admin);

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([
                vec![ active.clone() ],
                vec![ deleted.clone() ],
            ]);

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Authority::new(secret)))
                .app_data(web::Data::new(db.into_connection()))
                .service(test_handler)
        ).await;

        let req = test::TestRequest::default()
            .uri(&format!("/{}", active.id))
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();

        let returned: payroll::Model = test::call_and_read_body_json(&app, req).await;
        assert_eq!(returned, active);

        let req = test::TestRequest::default()
            .uri(&format!("/{}", deleted.id))
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();

        let response = test::call_service(&app, req).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
