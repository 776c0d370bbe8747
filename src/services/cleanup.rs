use std::sync::Arc;
use tracing::{error, info, warn};

use crate::AppState;

pub struct CleanupService {
    state: Arc<AppState>,
}

impl CleanupService {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Запускает полный цикл очистки бронирований
    pub async fn run_full_cleanup(&self) {
        info!("🧹 Starting booking cleanup");

        // Сначала отменяем зависшие неоплаченные бронирования
        self.cancel_stale_unpaid_bookings().await;

        // Затем закрываем оплаченные бронирования с истёкшей арендой
        self.complete_finished_bookings().await;

        info!("✅ Booking cleanup completed");
    }

    /// Отмена неоплаченных бронирований, чьё время начала уже прошло.
    /// Оплаченные бронирования не затрагиваются никогда.
    async fn cancel_stale_unpaid_bookings(&self) {
        let stale: Vec<i64> = sqlx::query_scalar(
            r#"
            SELECT id
            FROM bookings
            WHERE status = 'pending'
              AND payment_status = 'pending'
              AND rental_start < NOW()
            "#,
        )
        .fetch_all(&self.state.db.pool)
        .await
        .unwrap_or_default();

        if stale.is_empty() {
            info!("🚗 No stale unpaid bookings to cancel");
            return;
        }

        info!("🚗 Found {} stale unpaid bookings to cancel", stale.len());

        for booking_id in stale {
            self.cancel_stale_booking(booking_id).await;
        }
    }

    /// Отмена отдельного зависшего бронирования
    async fn cancel_stale_booking(&self, booking_id: i64) {
        let mut tx = match self.state.db.pool.begin().await {
            Ok(tx) => tx,
            Err(e) => {
                error!("Failed to start transaction for booking cleanup: {}", e);
                return;
            }
        };

        // Статус перепроверяется внутри транзакции: бронирование могли
        // успеть оплатить между выборкой и отменой
        let result = sqlx::query(
            "UPDATE bookings SET status = 'cancelled'
             WHERE id = $1 AND status = 'pending' AND payment_status = 'pending'",
        )
        .bind(booking_id)
        .execute(&mut *tx)
        .await;

        match result {
            Ok(affected) if affected.rows_affected() > 0 => {
                if tx.commit().await.is_ok() {
                    info!("🚗 Cancelled stale booking {}", booking_id);
                } else {
                    error!("Failed to commit cleanup transaction for booking {}", booking_id);
                }
            }
            Ok(_) => {
                warn!("🚗 Booking {} was not cancelled (paid meanwhile?)", booking_id);
                let _ = tx.rollback().await;
            }
            Err(e) => {
                error!("Failed to cancel stale booking {}: {:?}", booking_id, e);
                let _ = tx.rollback().await;
            }
        }
    }

    /// Перевод оплаченных бронирований с истёкшей арендой в completed
    async fn complete_finished_bookings(&self) {
        let completed: Vec<i64> = sqlx::query_scalar(
            r#"
            UPDATE bookings
            SET status = 'completed'
            WHERE payment_status = 'Paid'
              AND status IN ('confirmed', 'active')
              AND rental_end < NOW()
            RETURNING id
            "#,
        )
        .fetch_all(&self.state.db.pool)
        .await
        .unwrap_or_default();

        if completed.is_empty() {
            info!("🚗 No finished bookings to complete");
        } else {
            info!("🚗 Completed {} finished bookings", completed.len());
        }
    }
}
