//! allocation.rs
//!
//! Этот модуль реализует генерацию плана рассадки на экзамен.
//!
//! Ключевые компоненты:
//! 1.  **PlanContext**: Контекст запроса генерации (экзамен, класс, секция,
//!     кабинет по умолчанию для заголовка плана).
//! 2.  **allocate_seats**: Чистая функция, которая раскладывает реестр
//!     учеников по правилам диапазонов номеров. Вся работа с базой остаётся
//!     на уровне контроллера, здесь только вычисление.

use crate::models::{NewSeatAssignment, SeatRule, Student};

use super::ServiceError;

/// Контекст одного запроса генерации плана.
#[derive(Debug, Clone)]
pub struct PlanContext {
    pub exam_id: i64,
    pub class_name: String,
    pub section: String,
    /// Кабинет уровня плана. Хранится в заголовке ответа, каждое место
    /// при этом несёт кабинет своего правила.
    pub room_number: String,
}

/// Раскладывает реестр по правилам рассадки.
///
/// Номер места один на весь план: счётчик начинается с 1 и никогда не
/// сбрасывается между правилами. Правила обрабатываются в порядке запроса,
/// каждое правило просматривает весь реестр. Если после обработки правила
/// во всём накопленном плане нет ни одного места с рядом этого правила,
/// добавляется ровно одна заглушка со `student_id = None`.
///
/// Ученик, попавший в диапазоны двух правил, получает два места. Это
/// документированное поведение, дедупликация не выполняется.
pub fn allocate_seats(
    roster: &[Student],
    rules: &[SeatRule],
    ctx: &PlanContext,
) -> Result<Vec<NewSeatAssignment>, ServiceError> {
    if rules.is_empty() {
        return Err(ServiceError::Validation(
            "Не передано ни одного правила рассадки".to_string(),
        ));
    }
    for rule in rules {
        if rule.start_roll > rule.end_roll {
            return Err(ServiceError::Validation(format!(
                "Неверный диапазон номеров: {} > {}",
                rule.start_roll, rule.end_roll
            )));
        }
    }

    let mut plan: Vec<NewSeatAssignment> = Vec::new();
    let mut next_seat: i32 = 1;

    for rule in rules {
        for student in roster {
            if student.roll_number >= rule.start_roll && student.roll_number <= rule.end_roll {
                plan.push(NewSeatAssignment {
                    exam_id: ctx.exam_id,
                    seat_number: next_seat,
                    student_id: Some(student.id),
                    student_name: Some(format!("{} {}", student.first_name, student.surname)),
                    room_number: rule.room_number.clone(),
                    row_label: rule.row_label.clone(),
                    class_name: ctx.class_name.clone(),
                    section: ctx.section.clone(),
                });
                next_seat += 1;
            }
        }

        // Заглушка ставится только когда ряд пуст во всём накопленном
        // плане, а не только в выводе текущего правила
        let row_is_empty = !plan.iter().any(|s| s.row_label == rule.row_label);
        if row_is_empty {
            plan.push(NewSeatAssignment {
                exam_id: ctx.exam_id,
                seat_number: next_seat,
                student_id: None,
                student_name: None,
                room_number: rule.room_number.clone(),
                row_label: rule.row_label.clone(),
                class_name: ctx.class_name.clone(),
                section: ctx.section.clone(),
            });
            next_seat += 1;
        }
    }

    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fake::faker::name::en::{FirstName, LastName};
    use fake::Fake;
    use proptest::prelude::*;

    fn student(id: i64, roll: i32) -> Student {
        Student {
            id,
            roll_number: roll,
            first_name: FirstName().fake(),
            surname: LastName().fake(),
            class_name: "10".to_string(),
            section: "A".to_string(),
        }
    }

    fn rule(start: i32, end: i32, row: &str, room: &str) -> SeatRule {
        SeatRule {
            start_roll: start,
            end_roll: end,
            row_label: row.to_string(),
            room_number: room.to_string(),
        }
    }

    fn ctx() -> PlanContext {
        PlanContext {
            exam_id: 7,
            class_name: "10".to_string(),
            section: "A".to_string(),
            room_number: "101".to_string(),
        }
    }

    #[test]
    fn in_range_students_get_sequential_seats() {
        let roster = vec![student(1, 1), student(2, 2), student(3, 50)];
        let rules = vec![rule(1, 10, "A", "101")];

        let plan = allocate_seats(&roster, &rules, &ctx()).unwrap();

        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].seat_number, 1);
        assert_eq!(plan[0].student_id, Some(1));
        assert_eq!(plan[1].seat_number, 2);
        assert_eq!(plan[1].student_id, Some(2));
        assert!(plan.iter().all(|s| s.student_id.is_some()));
    }

    #[test]
    fn empty_range_yields_single_placeholder() {
        let roster = vec![student(1, 1)];
        let rules = vec![rule(100, 110, "B", "101")];

        let plan = allocate_seats(&roster, &rules, &ctx()).unwrap();

        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].seat_number, 1);
        assert_eq!(plan[0].student_id, None);
        assert_eq!(plan[0].student_name, None);
        assert_eq!(plan[0].row_label, "B");
    }

    #[test]
    fn seat_counter_never_resets_between_rules() {
        let roster = vec![student(1, 1), student(2, 2), student(3, 11)];
        let rules = vec![rule(1, 10, "A", "101"), rule(11, 20, "B", "102")];

        let plan = allocate_seats(&roster, &rules, &ctx()).unwrap();

        let numbers: Vec<i32> = plan.iter().map(|s| s.seat_number).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(plan[2].student_id, Some(3));
        assert_eq!(plan[2].row_label, "B");
    }

    #[test]
    fn overlapping_rules_duplicate_students() {
        let roster = vec![student(1, 5)];
        let rules = vec![rule(1, 10, "A", "101"), rule(5, 6, "B", "102")];

        let plan = allocate_seats(&roster, &rules, &ctx()).unwrap();

        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0].student_id, Some(1));
        assert_eq!(plan[1].student_id, Some(1));
        assert_eq!(plan[0].row_label, "A");
        assert_eq!(plan[1].row_label, "B");
    }

    #[test]
    fn two_empty_rules_sharing_row_yield_one_placeholder() {
        let roster = vec![student(1, 1)];
        let rules = vec![rule(50, 60, "C", "101"), rule(70, 80, "C", "102")];

        let plan = allocate_seats(&roster, &rules, &ctx()).unwrap();

        // Второе правило видит заглушку первого в накопленном плане
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].student_id, None);
    }

    #[test]
    fn populated_row_suppresses_placeholder() {
        let roster = vec![student(1, 5)];
        let rules = vec![rule(1, 10, "A", "101"), rule(90, 99, "A", "102")];

        let plan = allocate_seats(&roster, &rules, &ctx()).unwrap();

        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].student_id, Some(1));
    }

    #[test]
    fn empty_roster_yields_placeholder_per_distinct_row() {
        let roster: Vec<Student> = vec![];
        let rules = vec![rule(1, 10, "A", "101"), rule(11, 20, "B", "102")];

        let plan = allocate_seats(&roster, &rules, &ctx()).unwrap();

        assert_eq!(plan.len(), 2);
        assert!(plan.iter().all(|s| s.student_id.is_none()));
        assert_eq!(plan[0].seat_number, 1);
        assert_eq!(plan[1].seat_number, 2);
    }

    #[test]
    fn no_rules_is_rejected() {
        let roster = vec![student(1, 1)];

        let err = allocate_seats(&roster, &[], &ctx()).unwrap_err();

        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[test]
    fn inverted_range_is_rejected() {
        let roster = vec![student(1, 1)];
        let rules = vec![rule(10, 1, "A", "101")];

        let err = allocate_seats(&roster, &rules, &ctx()).unwrap_err();

        assert!(matches!(err, ServiceError::Validation(_)));
    }

    prop_compose! {
        fn arb_roster()(rolls in prop::collection::btree_set(1..200i32, 0..30)) -> Vec<Student> {
            rolls.into_iter()
                .enumerate()
                .map(|(i, roll)| student(i as i64 + 1, roll))
                .collect()
        }
    }

    prop_compose! {
        fn arb_rule()(a in 1..200i32, b in 1..200i32, row in 0..4usize) -> SeatRule {
            let rows = ["A", "B", "C", "D"];
            rule(a.min(b), a.max(b), rows[row], "101")
        }
    }

    proptest! {
        #[test]
        fn seat_numbers_are_gapless_from_one(
            roster in arb_roster(),
            rules in prop::collection::vec(arb_rule(), 1..6),
        ) {
            let plan = allocate_seats(&roster, &rules, &ctx()).unwrap();
            for (i, seat) in plan.iter().enumerate() {
                prop_assert_eq!(seat.seat_number, i as i32 + 1);
            }
        }

        #[test]
        fn every_match_emits_exactly_one_seat(
            roster in arb_roster(),
            rules in prop::collection::vec(arb_rule(), 1..6),
        ) {
            let plan = allocate_seats(&roster, &rules, &ctx()).unwrap();
            for s in &roster {
                let expected = rules
                    .iter()
                    .filter(|r| s.roll_number >= r.start_roll && s.roll_number <= r.end_roll)
                    .count();
                let actual = plan
                    .iter()
                    .filter(|seat| seat.student_id == Some(s.id))
                    .count();
                prop_assert_eq!(actual, expected);
            }
        }
    }
}
