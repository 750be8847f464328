//! RADIUS attributes and the dictionary collaborator

pub mod attribute;
pub mod dictionary;
pub mod types;

pub use attribute::Attribute;
pub use dictionary::{
    AttributeCodec, AttributeDataType, AttributeDefinition, AttributeValue, DefaultDictionary,
    Dictionary,
};
pub use types::AttributeType;
