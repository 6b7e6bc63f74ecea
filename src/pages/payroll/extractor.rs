use super::*;

impl FromRequest for payroll_run::Model {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        let req = req.clone();

        Box::pin(async move {
            let Some(run_id) = req.match_info().get("run_id") else {
                return Err(actix_web::error::ErrorInternalServerError("this extractor must be used under a `run_id` path"))
            };
            let Ok(run_id) = Uuid::from_str(run_id) else {
                return Err(actix_web::error::ErrorBadRequest("invalid `run_id`"))
            };

            let Some(db) = req.app_data::<web::Data<DatabaseConnection>>() else {
                return Err(actix_web::error::ErrorInternalServerError("database is not configured"))
            };

            let Some(run) = query::get_run(db.as_ref(), run_id).await? else {
                return Err(PayrollError::RunNotFound(run_id).into())
            };

            Ok(run)
        })
    }
}
