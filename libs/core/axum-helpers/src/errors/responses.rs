//! Reusable OpenAPI response types for consistent API documentation.

use super::ErrorResponse;
#[allow(unused_imports)]
use serde_json::json;
use utoipa::ToResponse;

#[derive(ToResponse)]
#[response(
    description = "Internal Server Error",
    content_type = "application/json",
    example = json!({
        "code": 1005,
        "error": "INTERNAL_ERROR",
        "message": "An internal server error occurred"
    })
)]
pub struct InternalServerErrorResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Bad Request - missing field or unusable value",
    content_type = "application/json",
    example = json!({
        "code": 1002,
        "error": "MISSING_FIELD",
        "message": "Please pass a query in the request body"
    })
)]
pub struct BadRequestResponse(pub ErrorResponse);

#[derive(ToResponse)]
#[response(
    description = "Bad Gateway - a hosted model or store request failed",
    content_type = "application/json",
    example = json!({
        "code": 2001,
        "error": "UPSTREAM_ERROR",
        "message": "Azure OpenAI request failed (429 Too Many Requests)"
    })
)]
pub struct BadGatewayResponse(pub ErrorResponse);
