//! Back-office routes under `/api/v1/admin`. Every handler takes an
//! `AdminUser`, so non-admins get 403 before anything is read.

pub mod api_tokens;
pub mod odoo;
pub mod tenants;
pub mod users;

use actix_web::web;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(tenants::list_tenants)
        .service(tenants::create_tenant)
        .service(tenants::get_tenant)
        .service(tenants::update_tenant_status)
        .service(tenants::delete_tenant)
        .service(odoo::get_odoo_config)
        .service(odoo::update_odoo_config)
        .service(odoo::test_odoo_connection)
        .service(odoo::search_employees)
        .service(users::list_users)
        .service(users::create_user)
        .service(users::get_user)
        .service(users::update_user)
        .service(users::delete_user)
        .service(api_tokens::list_api_tokens)
        .service(api_tokens::create_api_token)
        .service(api_tokens::toggle_api_token)
        .service(api_tokens::regenerate_api_token)
        .service(api_tokens::delete_api_token);
}
