use std::future::{Ready, ready};

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};

use crate::error::AppError;

pub const OWNER_HEADER: &str = "X-Owner-Id";

/// Identity of the caller, resolved upstream and forwarded as a header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerId(pub String);

impl FromRequest for OwnerId {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let owner = req
            .headers()
            .get(OWNER_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| OwnerId(value.to_string()));

        ready(owner.ok_or(AppError::MissingOwner))
    }
}
