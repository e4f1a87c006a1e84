//! Shared data model types for the iac-schema ecosystem.
//!
//! This crate provides the three representations the schema builder works
//! with:
//!
//! - [`api`]: the API resource graph (models, constants, operations) produced
//!   by an upstream REST spec parser.
//! - [`schema`]: the generated schema models for a declarative
//!   infrastructure-as-code tool.
//! - [`mapping`]: field-level mappings between the two.
//!
//! `iac-schema` (the builder) re-exports everything here. You should not need
//! to depend on this crate directly; use the higher-level crate instead.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod api;
pub mod mapping;
pub mod resource_id;
pub mod schema;

pub use api::{
    ApiField, ApiModel, ApiObjectDefinition, ApiOperation, ApiResource, ConstantDetails,
    ConstantFieldType,
};
pub use mapping::{
    DirectAssignmentMapping, FieldMapping, MappingDefinition, ModelToModelMapping,
    ResourceIdMapping,
};
pub use resource_id::{ResourceIdDefinition, ResourceIdSegment, SegmentType};
pub use schema::{
    CustomFieldType, FieldValidation, SchemaField, SchemaModel, SchemaObjectDefinition,
};
