//! VisitSink implementation for SeaOrmStorage
//!
//! Buffered counts go out as `UPDATE ... SET visits = CASE ... END`
//! statements of at most [`FLUSH_CHUNK`] codes each, all inside one
//! transaction, so a batch is either fully applied or not applied at all.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use sea_orm::sea_query::{CaseStatement, Expr, Query, UpdateStatement};
use sea_orm::{ConnectionTrait, DbErr, ExprTrait, TransactionTrait};
use tracing::debug;

use super::SeaOrmStorage;
use super::retry;
use crate::visits::{VisitFlushError, VisitSink};

use migration::entities::link;

/// Codes per UPDATE; each code binds three parameters
const FLUSH_CHUNK: usize = 500;

/// Where a flush transaction failed
enum FlushFailure {
    /// Before COMMIT was sent; the transaction rolled back
    Statement(DbErr),
    /// During COMMIT; the server may or may not have applied it
    Commit(DbErr),
}

impl fmt::Display for FlushFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlushFailure::Statement(e) => write!(f, "{}", e),
            FlushFailure::Commit(e) => write!(f, "commit failed: {}", e),
        }
    }
}

fn increment_statement(chunk: &[(String, u64)]) -> UpdateStatement {
    let mut case_stmt = CaseStatement::new();
    for (code, count) in chunk {
        case_stmt = case_stmt.case(
            Expr::col(link::Column::ShortCode).eq(Expr::val(code.as_str())),
            Expr::col(link::Column::Visits).add(Expr::val(Ord::min(*count, i64::MAX as u64) as i64)),
        );
    }
    case_stmt = case_stmt.finally(Expr::col(link::Column::Visits));

    Query::update()
        .table(link::Entity)
        .value(link::Column::Visits, case_stmt)
        .and_where(
            Expr::col(link::Column::ShortCode).is_in(chunk.iter().map(|(code, _)| code.clone())),
        )
        .to_owned()
}

#[async_trait]
impl VisitSink for SeaOrmStorage {
    async fn flush_visits(&self, updates: Vec<(String, u64)>) -> Result<(), VisitFlushError> {
        if updates.is_empty() {
            return Ok(());
        }

        let statements: Vec<UpdateStatement> =
            updates.chunks(FLUSH_CHUNK).map(increment_statement).collect();

        let db = &self.db;
        let statements = &statements;
        let timeout = Duration::from_secs(Ord::max(crate::config::get_config().database.timeout, 1));

        let outcome = tokio::time::timeout(
            timeout,
            retry::with_retry_if(
                "flush_visits",
                self.retry_config,
                |failure: &FlushFailure| match failure {
                    FlushFailure::Statement(e) => retry::is_retryable_error(e),
                    FlushFailure::Commit(_) => false,
                },
                || async move {
                    let txn = db.begin().await.map_err(FlushFailure::Statement)?;
                    let mut rows = 0;
                    for stmt in statements {
                        rows += txn
                            .execute(stmt)
                            .await
                            .map_err(FlushFailure::Statement)?
                            .rows_affected();
                    }
                    txn.commit().await.map_err(FlushFailure::Commit)?;
                    Ok::<u64, FlushFailure>(rows)
                },
            ),
        )
        .await;

        match outcome {
            Ok(Ok(rows)) => {
                debug!(
                    "Visit counts flushed to {} storage ({} codes, {} statements, {} rows)",
                    self.backend_name.to_uppercase(),
                    updates.len(),
                    statements.len(),
                    rows
                );
                Ok(())
            }
            Ok(Err(FlushFailure::Statement(e))) => Err(VisitFlushError::NotApplied(e.to_string())),
            Ok(Err(failure @ FlushFailure::Commit(_))) => {
                Err(VisitFlushError::Indeterminate(failure.to_string()))
            }
            Err(_) => Err(VisitFlushError::Indeterminate(format!(
                "visit flush timed out after {:?}",
                timeout
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_large_batches_are_chunked() {
        let updates: Vec<(String, u64)> = (0..1201).map(|i| (format!("c{}", i), 1)).collect();
        let statements: Vec<UpdateStatement> =
            updates.chunks(FLUSH_CHUNK).map(increment_statement).collect();
        assert_eq!(statements.len(), 3);
    }

    #[test]
    fn test_commit_failure_is_labelled() {
        let failure = FlushFailure::Commit(DbErr::Custom("connection reset".to_string()));
        assert!(failure.to_string().starts_with("commit failed"));
    }
}
