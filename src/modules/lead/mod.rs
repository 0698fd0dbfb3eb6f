pub mod controller;
pub mod form;
pub mod repository;
