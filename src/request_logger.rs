use rocket::fairing::{Fairing, Info, Kind};
use rocket::{Data, Request, Response};
use std::time::Instant;

/// Emits one line per request: `METHOD URI -> STATUS (ms)`.
///
/// Server errors are logged at `warn` so they stand out under the default filter.
pub struct RequestLogger;

struct StartedAt(Instant);

#[rocket::async_trait]
impl Fairing for RequestLogger {
    fn info(&self) -> Info {
        Info {
            name: "Request Logger",
            kind: Kind::Request | Kind::Response,
        }
    }

    async fn on_request(&self, request: &mut Request<'_>, _: &mut Data<'_>) {
        request.local_cache(|| StartedAt(Instant::now()));
    }

    async fn on_response<'r>(&self, request: &'r Request<'_>, response: &mut Response<'r>) {
        let elapsed_ms = request
            .local_cache(|| StartedAt(Instant::now()))
            .0
            .elapsed()
            .as_secs_f64()
            * 1000.0;
        let status = response.status();

        // Path only; query strings are not logged.
        let path = request.uri().path();
        if status.class().is_server_error() {
            log::warn!("{} {} -> {} ({:.2}ms)", request.method(), path, status.code, elapsed_ms);
        } else {
            log::info!("{} {} -> {} ({:.2}ms)", request.method(), path, status.code, elapsed_ms);
        }
    }
}
