//! Endpoints.

use crate::diagnostic::Span;
use super::{AliasProperty, AliasSlot, Namespace, Property};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl HttpMethod {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "GET" => Some(Self::Get),
            "POST" => Some(Self::Post),
            "PUT" => Some(Self::Put),
            "DELETE" => Some(Self::Delete),
            "PATCH" => Some(Self::Patch),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Endpoint {
    pub name: String,
    pub method: HttpMethod,
    pub route: String,
    pub description: String,
    pub preserve_property_casing: bool,
    pub params: Vec<Property>,
    pub returns: Option<Property>,
    pub(crate) alias_slots: Vec<AliasSlot>,
    pub(crate) returns_alias: Option<AliasProperty>,
    pub namespace: Namespace,
    pub file: String,
    pub span: Span,
}
