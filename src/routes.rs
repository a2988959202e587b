use crate::{
    api::{attendance, fee, school, student, teacher},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    // Public auth surface; /me is the one protected resource in this scope
    cfg.service(
        web::scope(&format!("{}/users", config.api_prefix))
            .service(
                web::resource("")
                    .wrap(build_limiter(config.rate_register_per_min))
                    .route(web::post().to(handlers::register)),
            )
            .service(
                web::resource("/login")
                    .wrap(build_limiter(config.rate_login_per_min))
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(build_limiter(config.rate_refresh_per_min))
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(build_limiter(config.rate_login_per_min))
                    .route(web::post().to(handlers::logout)),
            )
            .service(
                web::resource("/me")
                    .wrap(from_fn(auth_middleware))
                    .route(web::get().to(handlers::me)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            // authentication
            .wrap(build_limiter(config.rate_protected_per_min)) // rate limiting
            .service(
                web::scope("/schools").service(
                    web::resource("")
                        .route(web::post().to(school::create_school))
                        .route(web::get().to(school::get_schools)),
                ),
            )
            .service(
                web::scope("/students").service(
                    web::resource("")
                        .route(web::post().to(student::create_student))
                        .route(web::get().to(student::get_students)),
                ),
            )
            .service(
                web::scope("/teachers").service(
                    web::resource("")
                        .route(web::post().to(teacher::create_teacher))
                        .route(web::get().to(teacher::get_teachers)),
                ),
            )
            .service(
                web::scope("/fees")
                    // /fees
                    .service(
                        web::resource("")
                            .route(web::get().to(fee::get_fees))
                            .route(web::post().to(fee::create_fee)),
                    )
                    // /fees/{id}/pay
                    .service(web::resource("/{id}/pay").route(web::put().to(fee::pay_fee))),
            )
            .service(
                web::scope("/attendance")
                    // /attendance
                    .service(
                        web::resource("")
                            .route(web::post().to(attendance::mark_attendance))
                            .route(web::get().to(attendance::get_attendance)),
                    )
                    // /attendance/student/{student_id}
                    .service(
                        web::resource("/student/{student_id}")
                            .route(web::get().to(attendance::get_student_attendance)),
                    ),
            ),
    );
}

// LOGIN
//  ├─ access_token (15 min)
//  └─ refresh_token (7 days)
//
// API REQUEST
//  └─ Authorization: Bearer access_token
//
// ACCESS EXPIRED
//  └─ POST /users/refresh with refresh_token
//       └─ returns new access_token
