pub mod config;
pub mod delivery;
pub mod domain;
pub mod presentation;
pub mod repository;
pub mod seed;
pub mod telemetry;
pub mod usecase;

use metrics_exporter_prometheus::PrometheusHandle;

use crate::repository::postgres::PostgresCommentRepository;
use crate::usecase::comments::CommentsUseCase;

pub struct AppState {
    pub comments_usecase: CommentsUseCase<PostgresCommentRepository>,
    pub metrics_handle: PrometheusHandle,
}
