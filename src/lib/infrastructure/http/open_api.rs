//! OpenAPI module

use utoipa::OpenApi;

use crate::{
    domain::members::MembershipStatus,
    infrastructure::http::{errors::ErrorResponse, handlers::v1::*},
};

/// OpenAPI document of the JSON API
#[derive(Debug, OpenApi)]
#[openapi(
    info(title = "Member Portal"),
    paths(messages::handler, uptime::handler),
    components(schemas(
        messages::AttachmentBody,
        messages::SendMessageBody,
        messages::SendMessageResponse,
        uptime::UptimeResponse,
        MembershipStatus,
        ErrorResponse,
    ))
)]
pub struct ApiDocs;
