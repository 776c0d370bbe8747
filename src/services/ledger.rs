//! ledger.rs
//!
//! Этот модуль реализует денежную логику аренды: расчёт стоимости,
//! append-only журнал кошелька и оплату бронирования.
//!
//! Ключевые компоненты:
//! 1.  **compute_rental_price**: Стоимость аренды с округлением вверх до
//!     целого часа.
//! 2.  **append_entry / balance**: Журнал кошелька. Баланс всегда считается
//!     свёрткой всей упорядоченной последовательности, а не чтением
//!     последней строки.
//! 3.  **settle_booking / extend_booking**: Оплата и продление. Достаточность
//!     средств проверяется только при оплате.
//!
//! Все функции чистые. Сериализацию записей по пользователю обеспечивает
//! вызывающая сторона (advisory lock в транзакции, см. controllers).

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{Booking, Car, WalletTransaction};

use super::ServiceError;

/// Направление операции по кошельку.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxKind {
    Credit,
    Debit,
}

impl TxKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TxKind::Credit => "credit",
            TxKind::Debit => "debit",
        }
    }
}

const MS_PER_HOUR: i64 = 3_600_000;

// Неполный час оплачивается как полный
fn ceil_hours(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    let ms = (to - from).num_milliseconds();
    (ms + MS_PER_HOUR - 1) / MS_PER_HOUR
}

/// Стоимость аренды за окно `[start, end)` по часовому тарифу.
pub fn compute_rental_price(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    price_per_hour: f64,
) -> Result<f64, ServiceError> {
    if end <= start {
        return Err(ServiceError::Validation(
            "Дата окончания аренды должна быть позже даты начала".to_string(),
        ));
    }
    Ok(ceil_hours(start, end) as f64 * price_per_hour)
}

/// Текущий баланс: свёртка всего журнала по порядку.
pub fn balance(ledger: &[WalletTransaction]) -> f64 {
    ledger.iter().fold(0.0, |acc, tx| {
        if tx.kind == TxKind::Credit.as_str() {
            acc + tx.amount
        } else {
            acc - tx.amount
        }
    })
}

/// Формирует новую строку журнала поверх имеющейся последовательности.
///
/// Дебет может увести баланс в минус: достаточность средств проверяет
/// только `settle_booking`.
pub fn append_entry(
    ledger: &[WalletTransaction],
    user_id: i64,
    amount: f64,
    kind: TxKind,
    message: &str,
) -> Result<WalletTransaction, ServiceError> {
    if amount <= 0.0 {
        return Err(ServiceError::Validation(
            "Сумма операции должна быть положительной".to_string(),
        ));
    }

    let prior = balance(ledger);
    let running_balance = match kind {
        TxKind::Credit => prior + amount,
        TxKind::Debit => prior - amount,
    };

    Ok(WalletTransaction {
        id: Uuid::new_v4(),
        user_id,
        amount,
        kind: kind.as_str().to_string(),
        message: message.to_string(),
        running_balance,
        created_at: Utc::now(),
    })
}

/// Оплата бронирования: списывает `total_price` с кошелька владельца.
///
/// Возвращает строку дебета и копию бронирования с `payment_status = "Paid"`.
/// Повторная оплата - `Conflict`, нехватка средств - `InsufficientFunds`,
/// в обоих случаях журнал не меняется.
pub fn settle_booking(
    ledger: &[WalletTransaction],
    booking: &Booking,
) -> Result<(WalletTransaction, Booking), ServiceError> {
    if booking.payment_status == "Paid" {
        return Err(ServiceError::Conflict(format!(
            "Бронирование №{} уже оплачено",
            booking.id
        )));
    }
    if balance(ledger) < booking.total_price {
        return Err(ServiceError::InsufficientFunds(
            "Недостаточно средств на балансе".to_string(),
        ));
    }

    let debit = append_entry(
        ledger,
        booking.user_id,
        booking.total_price,
        TxKind::Debit,
        &format!("Оплата бронирования №{}", booking.id),
    )?;

    let mut paid = booking.clone();
    paid.payment_status = "Paid".to_string();
    Ok((debit, paid))
}

/// Продление аренды до `new_end` с доплатой за добавленные часы.
///
/// `payment_status` не меняется, в том числе для уже оплаченных
/// бронирований: доплата остаётся задолженностью.
pub fn extend_booking(
    booking: &Booking,
    car: &Car,
    new_end: DateTime<Utc>,
) -> Result<Booking, ServiceError> {
    if new_end <= booking.rental_end {
        return Err(ServiceError::Validation(
            "Новое время окончания должно быть позже текущего".to_string(),
        ));
    }

    let extra_hours = ceil_hours(booking.rental_end, new_end);
    let mut extended = booking.clone();
    extended.total_price += extra_hours as f64 * car.price_per_hour;
    extended.rental_end = new_end;
    Ok(extended)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn at(hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, hour, min, 0).unwrap()
    }

    fn car(price_per_hour: f64) -> Car {
        Car {
            id: 3,
            brand: "Toyota".to_string(),
            model: "Camry".to_string(),
            registration_number: "123 ABC 02".to_string(),
            price_per_hour,
            is_active: true,
        }
    }

    fn booking(total_price: f64, payment_status: &str) -> Booking {
        Booking {
            id: 42,
            user_id: 1,
            car_id: 3,
            rental_start: at(10, 0),
            rental_end: at(12, 0),
            total_price,
            status: "pending".to_string(),
            payment_status: payment_status.to_string(),
            created_at: at(9, 0),
        }
    }

    fn ledger_of(entries: &[(f64, TxKind)]) -> Vec<WalletTransaction> {
        let mut ledger = Vec::new();
        for (amount, kind) in entries {
            let tx = append_entry(&ledger, 1, *amount, *kind, "test").unwrap();
            ledger.push(tx);
        }
        ledger
    }

    #[test]
    fn half_hour_is_billed_as_full_hour() {
        let price = compute_rental_price(at(10, 0), at(10, 30), 100.0).unwrap();
        assert_eq!(price, 100.0);
    }

    #[test]
    fn exact_hours_are_not_rounded_up() {
        let price = compute_rental_price(at(10, 0), at(13, 0), 100.0).unwrap();
        assert_eq!(price, 300.0);
    }

    #[test]
    fn empty_or_inverted_window_is_rejected() {
        assert!(matches!(
            compute_rental_price(at(10, 0), at(10, 0), 100.0),
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            compute_rental_price(at(10, 0), at(9, 0), 100.0),
            Err(ServiceError::Validation(_))
        ));
    }

    #[test]
    fn append_rejects_non_positive_amount() {
        assert!(matches!(
            append_entry(&[], 1, 0.0, TxKind::Credit, "test"),
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            append_entry(&[], 1, -5.0, TxKind::Credit, "test"),
            Err(ServiceError::Validation(_))
        ));
    }

    #[test]
    fn debit_may_overdraw_outside_settlement() {
        let ledger = ledger_of(&[(100.0, TxKind::Credit)]);
        let tx = append_entry(&ledger, 1, 250.0, TxKind::Debit, "test").unwrap();
        assert_eq!(tx.running_balance, -150.0);
    }

    #[test]
    fn running_balance_chains_entry_by_entry() {
        let ledger = ledger_of(&[
            (500.0, TxKind::Credit),
            (200.0, TxKind::Debit),
            (50.0, TxKind::Credit),
        ]);
        assert_eq!(ledger[0].running_balance, 500.0);
        assert_eq!(ledger[1].running_balance, 300.0);
        assert_eq!(ledger[2].running_balance, 350.0);
        assert_eq!(balance(&ledger), 350.0);
    }

    #[test]
    fn credit_then_settle_drains_balance() {
        let ledger = ledger_of(&[(500.0, TxKind::Credit)]);
        assert_eq!(balance(&ledger), 500.0);

        let (debit, paid) = settle_booking(&ledger, &booking(500.0, "pending")).unwrap();

        assert_eq!(debit.kind, "debit");
        assert_eq!(debit.amount, 500.0);
        assert_eq!(debit.running_balance, 0.0);
        assert_eq!(paid.payment_status, "Paid");
    }

    #[test]
    fn settle_with_insufficient_balance_fails() {
        let err = settle_booking(&[], &booking(1.0, "pending")).unwrap_err();
        assert!(matches!(err, ServiceError::InsufficientFunds(_)));
    }

    #[test]
    fn second_settle_is_a_conflict() {
        let mut ledger = ledger_of(&[(500.0, TxKind::Credit)]);
        let (debit, paid) = settle_booking(&ledger, &booking(500.0, "pending")).unwrap();
        ledger.push(debit);

        let err = settle_booking(&ledger, &paid).unwrap_err();

        assert!(matches!(err, ServiceError::Conflict(_)));
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn extend_requires_strictly_later_end() {
        let b = booking(200.0, "pending");
        assert!(matches!(
            extend_booking(&b, &car(100.0), b.rental_end),
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            extend_booking(&b, &car(100.0), at(11, 0)),
            Err(ServiceError::Validation(_))
        ));
    }

    #[test]
    fn extend_bills_partial_hour_as_full() {
        let b = booking(200.0, "pending");
        let extended = extend_booking(&b, &car(100.0), at(12, 30)).unwrap();
        assert_eq!(extended.total_price, 300.0);
        assert_eq!(extended.rental_end, at(12, 30));
    }

    #[test]
    fn extend_keeps_paid_payment_status() {
        let b = booking(200.0, "Paid");
        let extended = extend_booking(&b, &car(100.0), at(14, 0)).unwrap();
        assert_eq!(extended.total_price, 400.0);
        assert_eq!(extended.payment_status, "Paid");
    }

    proptest! {
        #[test]
        fn price_is_positive_whole_multiple_of_rate(
            minutes in 1i64..10_000,
            rate in 1i64..=500,
        ) {
            let start = at(0, 0);
            let end = start + chrono::Duration::minutes(minutes);
            let price = compute_rental_price(start, end, rate as f64).unwrap();

            prop_assert!(price > 0.0);
            let hours = price / rate as f64;
            prop_assert_eq!(hours, hours.trunc());
            prop_assert_eq!(hours as i64, (minutes + 59) / 60);
        }

        #[test]
        fn price_grows_with_each_added_hour(
            minutes in 1i64..5_000,
            extra_hours in 1i64..50,
            rate in 1i64..=500,
        ) {
            let start = at(0, 0);
            let shorter = compute_rental_price(
                start,
                start + chrono::Duration::minutes(minutes),
                rate as f64,
            ).unwrap();
            let longer = compute_rental_price(
                start,
                start + chrono::Duration::minutes(minutes + extra_hours * 60),
                rate as f64,
            ).unwrap();

            prop_assert!(longer > shorter);
            prop_assert_eq!(longer - shorter, (extra_hours * rate) as f64);
        }

        #[test]
        fn final_balance_is_credits_minus_debits(
            entries in prop::collection::vec((1i64..=1_000, prop::bool::ANY), 1..40),
        ) {
            let typed: Vec<(f64, TxKind)> = entries
                .iter()
                .map(|(amount, credit)| {
                    (*amount as f64, if *credit { TxKind::Credit } else { TxKind::Debit })
                })
                .collect();
            let ledger = ledger_of(&typed);

            let credits: f64 = typed.iter()
                .filter(|(_, k)| *k == TxKind::Credit)
                .map(|(a, _)| a)
                .sum();
            let debits: f64 = typed.iter()
                .filter(|(_, k)| *k == TxKind::Debit)
                .map(|(a, _)| a)
                .sum();

            prop_assert_eq!(ledger.last().unwrap().running_balance, credits - debits);
            prop_assert_eq!(balance(&ledger), credits - debits);
        }
    }
}
