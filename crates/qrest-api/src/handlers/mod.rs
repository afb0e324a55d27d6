//! HTTP handlers grouped by resource

pub mod account;
pub mod admin;
pub mod ai;
pub mod auth;
pub mod category;
pub mod dashboard;
pub mod health;
pub mod menu;
pub mod menu_item;
pub mod organization;
pub mod public;
pub mod qr_code;
pub mod team;
pub mod theme;
