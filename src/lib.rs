#![allow(clippy::too_many_arguments, clippy::type_complexity)]

pub mod error;
pub mod validation;
pub mod model;
pub mod db;
pub mod queries;
pub mod denorm;
pub mod ops;
