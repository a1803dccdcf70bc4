//! Request handler: routes HTTP requests to the cached file store

use std::sync::Arc;

use pathcache::CachedStore;
use serde::Serialize;
use tracing::{debug, error};

use crate::http::{Method, Request, Response, Status};

/// Path that reports cache statistics instead of serving a file
pub const STATS_PATH: &str = "/_stats";

#[derive(Debug, Serialize)]
struct StatsBody {
    cache_size: usize,
    cache_capacity: usize,
    hits: u64,
    misses: u64,
    inserts: u64,
    evictions: u64,
    orphans: u64,
    replacements: u64,
    hit_ratio: f64,
}

/// Routes requests to the cached file store
pub struct RequestHandler {
    cache: Arc<CachedStore>,
}

impl RequestHandler {
    /// Create a handler serving from the given cached store
    pub fn new(cache: Arc<CachedStore>) -> Self {
        Self { cache }
    }

    /// Build the response for one request
    pub fn handle(&self, req: &Request) -> Response {
        let response = match &req.method {
            Method::Get | Method::Head => {
                if req.path == STATS_PATH {
                    self.handle_stats()
                } else {
                    self.handle_file(&req.path)
                }
            }
            Method::Other(method) => {
                debug!(method = %method, "rejecting unsupported method");
                Response::error(Status::MethodNotAllowed)
            }
        };

        if req.method == Method::Head {
            response.without_body()
        } else {
            response
        }
    }

    fn handle_file(&self, path: &str) -> Response {
        match self.cache.get(path) {
            Ok(resource) => Response::ok(resource.content_type, resource.payload),
            Err(e) if e.is_not_found() => Response::error(Status::NotFound),
            Err(e) => {
                error!(path, error = %e, "failed to load resource");
                Response::error(Status::InternalError)
            }
        }
    }

    fn handle_stats(&self) -> Response {
        let stats = self.cache.stats();
        let body = StatsBody {
            cache_size: self.cache.cache_len(),
            cache_capacity: self.cache.capacity(),
            hits: stats.hits,
            misses: stats.misses,
            inserts: stats.inserts,
            evictions: stats.evictions,
            orphans: stats.orphans,
            replacements: stats.replacements,
            hit_ratio: stats.hit_ratio,
        };

        match serde_json::to_vec(&body) {
            Ok(json) => Response::ok("application/json", json),
            Err(e) => {
                error!(error = %e, "failed to encode stats");
                Response::error(Status::InternalError)
            }
        }
    }
}
