use crate::{
    api::{faculty, salary},
    auth::handlers,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::web;
use std::sync::Arc;

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

    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let upload_limiter = Arc::new(build_limiter(config.rate_upload_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    cfg.service(
        web::scope(&config.api_prefix)
            .service(
                web::scope("/auth").service(
                    web::resource("/login")
                        .wrap(login_limiter.clone())
                        .route(web::post().to(handlers::login)),
                ),
            )
            .service(
                web::scope("/faculty")
                    // literal paths before /{id}
                    .service(
                        web::resource("/me")
                            .wrap(protected_limiter.clone())
                            .route(web::get().to(faculty::get_me)),
                    )
                    .service(
                        web::resource("/upload")
                            .wrap(upload_limiter.clone())
                            .route(web::post().to(faculty::upload_faculty_csv)),
                    )
                    // /faculty
                    .service(
                        web::resource("")
                            .wrap(protected_limiter.clone())
                            .route(web::get().to(faculty::list_faculty))
                            .route(web::post().to(faculty::create_faculty)),
                    )
                    // /faculty/{id}
                    .service(
                        web::resource("/{id}")
                            .wrap(protected_limiter.clone())
                            .route(web::get().to(faculty::get_faculty))
                            .route(web::put().to(faculty::update_faculty))
                            .route(web::delete().to(faculty::delete_faculty)),
                    ),
            )
            .service(
                web::scope("/salary")
                    .service(
                        web::resource("/upload-monthly")
                            .wrap(upload_limiter.clone())
                            .route(web::post().to(salary::upload_monthly)),
                    )
                    .service(
                        web::resource("/upload-faculty")
                            .wrap(upload_limiter.clone())
                            .route(web::post().to(salary::upload_faculty)),
                    )
                    .service(
                        web::resource("/my-history")
                            .wrap(protected_limiter.clone())
                            .route(web::get().to(salary::my_history)),
                    )
                    .service(
                        web::resource("/history")
                            .wrap(protected_limiter.clone())
                            .route(web::get().to(salary::history)),
                    )
                    .service(
                        web::resource("/history/{year}/{month}")
                            .wrap(protected_limiter.clone())
                            .route(web::delete().to(salary::delete_period)),
                    )
                    .service(
                        web::resource("/report/{months}")
                            .wrap(protected_limiter.clone())
                            .route(web::get().to(salary::report)),
                    )
                    // /download/{year}/{month} before /download/{year}
                    .service(
                        web::resource("/download/{year}/{month}")
                            .wrap(protected_limiter.clone())
                            .route(web::get().to(salary::download_month)),
                    )
                    .service(
                        web::resource("/download/{year}")
                            .wrap(protected_limiter.clone())
                            .route(web::get().to(salary::download_year)),
                    )
                    .service(
                        web::resource("/payslip/{username}/{year}/{month}")
                            .wrap(protected_limiter.clone())
                            .route(web::get().to(salary::payslip)),
                    )
                    .service(
                        web::resource("/payslips-all/{username}")
                            .wrap(protected_limiter.clone())
                            .route(web::get().to(salary::payslips_all)),
                    )
                    .service(
                        web::resource("/payslips-monthly-all/{year}/{month}")
                            .wrap(protected_limiter.clone())
                            .route(web::get().to(salary::payslips_monthly_all)),
                    ),
            ),
    );
}
