// Domain layer - Resource interfaces, snapshot entities and their codecs
pub mod codec;
pub mod error;
pub mod image;
pub mod matrix;
pub mod resource;
pub mod snapshot;
pub mod table_markup;
