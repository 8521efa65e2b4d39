use crate::{
    api::{admin, hours, leave_request},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

/// Per-route limiter allowing `requests_per_min` with an equal burst.
/// `Config` guarantees the rate is non-zero.
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / u64::from(requests_per_min)).max(1);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .expect("non-zero period and burst");
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let register_limiter = Arc::new(build_limiter(config.rate_register_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter)
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/register")
                    .wrap(register_limiter)
                    .route(web::post().to(handlers::register)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            // /hours/{date}
            .service(
                web::resource("/hours/{date}")
                    .route(web::get().to(hours::get_day))
                    .route(web::post().to(hours::save_day)),
            )
            .service(web::resource("/week-data/{date}").route(web::get().to(hours::week_data)))
            .service(
                web::resource("/month-summary/{year}/{month}")
                    .route(web::get().to(hours::month_summary)),
            )
            .service(
                web::resource("/export/month/{year}/{month}")
                    .route(web::get().to(hours::export_month)),
            )
            // /leave-requests
            .service(
                web::resource("/leave-requests")
                    .route(web::get().to(leave_request::my_leaves))
                    .route(web::post().to(leave_request::create_leave)),
            )
            .service(
                web::scope("/admin")
                    .service(
                        web::resource("/leave-requests")
                            .route(web::get().to(leave_request::leave_list)),
                    )
                    .service(
                        web::resource("/leave-requests/{id}")
                            .route(web::delete().to(leave_request::delete_leave)),
                    )
                    .service(
                        web::resource("/leave-requests/{id}/status")
                            .route(web::put().to(leave_request::set_leave_status)),
                    )
                    .service(
                        web::resource("/settings/leave-limit")
                            .route(web::get().to(admin::get_leave_limit))
                            .route(web::post().to(admin::set_leave_limit))
                            .route(web::put().to(admin::set_leave_limit)),
                    )
                    .service(web::resource("/users").route(web::get().to(admin::list_users)))
                    .service(
                        web::resource("/users/{id}").route(web::put().to(admin::update_user)),
                    ),
            ),
    );
}

// LOGIN
//  └─ access_token (24h by default)

// API REQUEST
//  └─ Authorization: Bearer access_token
