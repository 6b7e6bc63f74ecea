use std::ops::Deref;

use actix_web::{body, dev, http::{self, header::ContentType, StatusCode}, web, FromRequest, HttpRequest, HttpResponse};
use futures_util::future::LocalBoxFuture;
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Verifies bearer tokens signed with the shared `JWT_SECRET`.
///
/// Tokens are issued by whatever service owns worker accounts; this one only checks them.
pub struct Authority {
    jwt_key: DecodingKey,
}

impl Authority {
    pub fn new(jwt_key: &[u8]) -> Self {
        Self {
            jwt_key: DecodingKey::from_secret(jwt_key)
        }
    }

    pub fn authorize(&self, token: impl AsRef<str>) -> Result<Identity, AuthError> {
        let payload = decode::<Claims<Identity>>(token.as_ref(), &self.jwt_key, &Validation::default())?;

        Ok(payload.claims.data)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims<T> {
    exp: i64,
    data: T,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Staff,
    Admin,
}

/// Who is calling, as carried by the token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub worker_id: Uuid,
    pub role: Role,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("authority error")]
    AuthorityError(#[from] jsonwebtoken::errors::Error),
}

impl actix_web::error::ResponseError for AuthError {
    fn error_response(&self) -> HttpResponse<body::BoxBody> {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::plaintext())
            .body(self.to_string())
    }

    fn status_code(&self) -> http::StatusCode {
        match self {
            AuthError::AuthorityError(_) => StatusCode::FORBIDDEN,
        }
    }
}

impl FromRequest for Identity {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        let req = req.clone();

        Box::pin(async move {
            // Takes whatever follows the scheme, e.g. `Bearer <token>`
            let Some(Ok(Some((_, token)))) = req.headers()
                .get("Authorization")
                .map(|v|
                    v.to_str()
                        .map(|str| str.split_once(' '))
                )
            else {
                return Err(actix_web::error::ErrorUnauthorized("unauthorized"))
            };

            let Some(authority) = req.app_data::<web::Data<Authority>>() else {
                return Err(actix_web::error::ErrorInternalServerError("authority is not configured"))
            };
            let identity = authority.authorize(token.trim())?;

            Ok(identity)
        })
    }
}

pub struct Admin(pub Identity);

impl Deref for Admin {
    type Target = Identity;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequest for Admin {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut dev::Payload) -> Self::Future {
        let req = req.clone();

        Box::pin(async move {
            let identity = Identity::from_request(&req, &mut dev::Payload::None).await?;

            if identity.role != Role::Admin {
                return Err(actix_web::error::ErrorForbidden("forbidden"))
            }

            Ok(Self(identity))
        })
    }
}

/// Signs a token for `identity` the way the account service does, valid for 1 week.
#[cfg(test)]
pub(crate) fn issue_token(jwt_key: &[u8], identity: &Identity) -> String {
    use chrono::{Duration, Local};
    use jsonwebtoken::{encode, EncodingKey, Header};

    let claims = Claims {
        exp: (Local::now() + Duration::weeks(1)).timestamp(),
        data: identity,
    };

    encode(&Header::default(), &claims, &EncodingKey::from_secret(jwt_key)).expect("Unable to sign token")
}

#[cfg(test)]
mod tests {
    use actix_web::{body::MessageBody, get, test, web, App, Responder};

    use super::*;

    fn identity(role: Role) -> Identity {
        Identity { worker_id: Uuid::new_v4(), role }
    }

    #[actix_web::test]
    async fn test_authority() {
        let authority = Authority::new(b"secret");
        let staff = identity(Role::Staff);

        let token = issue_token(b"secret", &staff);

        let authorized = authority.authorize(token).expect("Unable to authorize identity from token");
        assert_eq!(staff, authorized);

        let other = Authority::new(b"another secret");
        assert!(other.authorize(issue_token(b"another secret", &staff)).is_ok());
        assert!(authority.authorize(issue_token(b"another secret", &staff)).is_err());
    }

    #[actix_web::test]
    async fn test_extractor() {
        let secret = b"secret";

        #[get("/")]
        async fn test_handler(identity: Identity) -> impl Responder {
            identity.worker_id.to_string()
        }

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Authority::new(secret)))
                .service(test_handler)
        ).await;

        {
            let forbidden_req = test::TestRequest::default()
                .uri("/")
                .insert_header(("Authorization", "Bearer wrong"))
                .to_request();

            let response = test::call_service(&app, forbidden_req).await;
            assert_eq!(response.status(), StatusCode::FORBIDDEN);
        }

        {
            let unauthorized_req = test::TestRequest::default()
                .uri("/")
                .to_request();

            let response = test::call_service(&app, unauthorized_req).await;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }

        {
            let no_scheme_req = test::TestRequest::default()
                .uri("/")
                .insert_header(("Authorization", "token"))
                .to_request();

            let response = test::call_service(&app, no_scheme_req).await;
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }

        {
            let staff = identity(Role::Staff);
            let token = issue_token(secret, &staff);

            let authorized_req = test::TestRequest::default()
                .insert_header(("Authorization", format!("Bearer {token}")))
                .to_request();

            let response = test::call_service(&app, authorized_req).await;
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(response.into_body().try_into_bytes().unwrap(), staff.worker_id.to_string().as_bytes());
        }
    }

    #[actix_web::test]
    async fn test_admin_extractor() {
        let secret = b"secret";

        #[get("/")]
        async fn test_handler(admin: Admin) -> impl Responder {
            assert_eq!(admin.role, Role::Admin);

            ""
        }

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(Authority::new(secret)))
                .service(test_handler)
        ).await;

        {
            let token = issue_token(secret, &identity(Role::Admin));

            let success_req = test::TestRequest::default()
                .insert_header(("Authorization", format!("Bearer {token}")))
                .to_request();

            let response = test::call_service(&app, success_req).await;
            assert_eq!(response.status(), StatusCode::OK);
        }

        {
            let token = issue_token(secret, &identity(Role::Staff));

            let forbidden_req = test::TestRequest::default()
                .insert_header(("Authorization", format!("Bearer {token}")))
                .to_request();

            let response = test::call_service(&app, forbidden_req).await;
            assert_eq!(response.status(), StatusCode::FORBIDDEN);
        }
    }
}
