//! HTTP endpoint serving combined assets.

mod lifecycle;
mod response;

use crate::{
    concat::Combiner,
    config::{MasherConfig, cfg},
    debug, log,
};
use anyhow::{Context, Result};
use rayon::ThreadPool;
use std::sync::Arc;
use tiny_http::{Request, Server};

/// Bound server ready to accept requests
pub struct BoundServer {
    server: Arc<Server>,
}

/// Bind the HTTP server without starting the request loop
pub fn bind_server() -> Result<BoundServer> {
    let config = cfg();
    let (server, addr) = lifecycle::bind_with_retry(config.serve.interface, config.serve.port)?;
    let server = Arc::new(server);

    lifecycle::register_server_for_shutdown(Arc::clone(&server));

    log!("serve"; "http://{}/{}/", addr, config.concat.slug);
    debug!("serve"; "root {}", config.concat.root.display());

    Ok(BoundServer { server })
}

impl BoundServer {
    /// Start the request loop (blocking).
    pub fn run(self) -> Result<()> {
        run_request_loop(&self.server)
    }
}

fn run_request_loop(server: &Server) -> Result<()> {
    let config = cfg();
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.serve.workers)
        .build()
        .context("failed to create thread pool")?;

    dispatch(&pool, server.incoming_requests(), |request| {
        if let Err(e) = handle_request(request, &config) {
            log!("serve"; "request error: {e}");
        }
    });
    debug!("serve"; "all requests finished");
    Ok(())
}

/// Run `handle` on the pool for every item, returning once the iterator is
/// exhausted and every spawned job has finished.
fn dispatch<T, F>(pool: &ThreadPool, items: impl Iterator<Item = T>, handle: F)
where
    T: Send,
    F: Fn(T) + Sync,
{
    pool.in_place_scope(|scope| {
        let handle = &handle;
        for item in items {
            scope.spawn(move |_| handle(item));
        }
    });
}

/// Handle a single HTTP request
fn handle_request(request: Request, config: &MasherConfig) -> Result<()> {
    if crate::core::is_shutdown() {
        return response::respond_status(request, 503);
    }

    if !is_concat_path(request.url(), &config.concat.slug) {
        return response::respond_status(request, 404);
    }

    let combiner = Combiner::new(&config.concat);
    match combiner.handle(request.method().as_str(), request.url()) {
        Ok(combined) => {
            debug!("serve"; "{} files, {} bytes: {}", combined.file_count, combined.content_length(), request.url());
            response::respond_combined(request, combined)
        }
        Err(e) => {
            debug!("serve"; "{} {}: {}", e.status(), request.url(), e);
            response::respond_status(request, e.status())
        }
    }
}

/// Whether the URL path ends in the endpoint slug (`/s/??...`, `/blog/s??...`).
fn is_concat_path(url: &str, slug: &str) -> bool {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .next_back()
        .is_some_and(|last| last == slug)
}
