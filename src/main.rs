#[cfg(test)]
#[macro_use]
mod test_support;

mod auth;
mod config;
mod context;
mod database;
mod error;
mod hooks;
mod model;
mod pages;
mod routes;
mod seed;

use actix_web::{middleware::Logger, web, App, HttpServer};
use config::Config;
use log::{info, warn};
use std::io;

fn startup_error<E: std::fmt::Display>(err: E) -> io::Error {
    io::Error::new(io::ErrorKind::Other, err.to_string())
}

#[actix_rt::main]
async fn main() -> io::Result<()> {
    let config = Config::load().map_err(startup_error)?;

    std::env::set_var("RUST_BACKTRACE", "1");
    env_logger::Builder::new()
        .parse_filters(&config.logging.filter)
        .init();

    let db = database::open(&config.storage).map_err(startup_error)?;
    if config.seed.enabled {
        match seed::seed(&db, &config) {
            Ok(true) => info!("demo data written"),
            Ok(false) => info!("demo data already present"),
            Err(err) => warn!("could not write demo data: {}", err),
        }
    }
    let tera = tera::Tera::new(&config.templates.glob()).map_err(startup_error)?;

    let bind = config.bind_address();
    let session = config.session.clone();
    let tera = web::Data::new(tera);
    let db = web::Data::new(db);
    let settings = web::Data::new(config);

    info!("listening on {}:{}", bind.0, bind.1);
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(context::identity_service(&session))
            .app_data(tera.clone())
            .app_data(db.clone())
            .app_data(settings.clone())
            .configure(routes::configure)
            .default_service(web::to(pages::not_found::fallback))
    })
    .bind(bind)?
    .run()
    .await
}
