//! Property-based tests for recurrence dates and billing periods.

use chrono::{Datelike, NaiveDate, TimeZone, Utc};
use ledgerly_core::accounts::BillingDays;
use ledgerly_core::invoices::billing_period::{next_period, period_containing};
use ledgerly_core::recurring::recurrence::{advance, occurrences_until};
use ledgerly_core::recurring::{Frequency, RecurringTransactionTemplate};
use ledgerly_core::transactions::TransactionType;
use ledgerly_core::utils::time_utils::days_in_month;
use proptest::prelude::*;
use rust_decimal::Decimal;

// =============================================================================
// Generators
// =============================================================================

fn arb_frequency() -> impl Strategy<Value = Frequency> {
    prop_oneof![
        Just(Frequency::Daily),
        Just(Frequency::Weekly),
        Just(Frequency::Biweekly),
        Just(Frequency::Monthly),
        Just(Frequency::Quarterly),
        Just(Frequency::Semiannual),
        Just(Frequency::Annual),
    ]
}

/// Any date between 2000-01-01 and roughly 2040.
fn arb_date() -> impl Strategy<Value = NaiveDate> {
    (0..14_600u64).prop_map(|offset| {
        NaiveDate::from_ymd_opt(2000, 1, 1)
            .unwrap()
            .checked_add_days(chrono::Days::new(offset))
            .unwrap()
    })
}

fn template(
    frequency: Frequency,
    start: NaiveDate,
    day_of_month: Option<u32>,
) -> RecurringTransactionTemplate {
    let created = Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap();
    RecurringTransactionTemplate {
        id: "tpl-prop".to_string(),
        owner_id: "owner-1".to_string(),
        account_id: "checking-1".to_string(),
        category_id: None,
        transaction_type: TransactionType::Expense,
        amount: Decimal::ONE_HUNDRED,
        description: "Subscription".to_string(),
        frequency,
        start_date: start,
        end_date: None,
        day_of_month,
        tags: vec![],
        next_due_date: start,
        last_materialized_date: None,
        is_active: true,
        is_deleted: false,
        created_at: created,
        updated_at: created,
    }
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    /// Advancing always moves forward.
    #[test]
    fn prop_advance_moves_forward(
        date in arb_date(),
        frequency in arb_frequency(),
        anchor in 1..=31u32,
    ) {
        let next = advance(date, frequency, anchor).unwrap();
        prop_assert!(next > date);
    }

    /// Month-based steps land on the anchor day, clamped to the month length.
    #[test]
    fn prop_monthly_steps_respect_anchor(date in arb_date(), anchor in 1..=31u32) {
        let next = advance(date, Frequency::Monthly, anchor).unwrap();
        let expected_day = anchor.min(days_in_month(next.year(), next.month()));
        prop_assert_eq!(next.day(), expected_day);

        let months_apart = (next.year() - date.year()) * 12 + next.month() as i32 - date.month() as i32;
        prop_assert_eq!(months_apart, 1);
    }

    /// Catch-up yields one strictly increasing date per missed period, all
    /// within the window, and resumes exactly where the window ends.
    #[test]
    fn prop_occurrences_cover_the_window(
        start in arb_date(),
        span in 0..800u64,
        frequency in arb_frequency(),
        anchor in prop::option::of(1..=31u32),
    ) {
        let as_of = start.checked_add_days(chrono::Days::new(span)).unwrap();
        let template = template(frequency, start, anchor);
        let dates = occurrences_until(&template, as_of).unwrap();

        prop_assert_eq!(dates.first().copied(), Some(start));
        prop_assert!(dates.windows(2).all(|w| w[0] < w[1]));
        prop_assert!(dates.iter().all(|d| *d <= as_of));

        let last = *dates.last().unwrap();
        let following = advance(last, frequency, template.anchor_day()).unwrap();
        prop_assert!(following > as_of);

        if frequency == Frequency::Daily {
            prop_assert_eq!(dates.len() as u64, span + 1);
        }
    }

    /// Nothing is produced before the first due date.
    #[test]
    fn prop_no_occurrences_before_start(start in arb_date(), back in 1..400u64, frequency in arb_frequency()) {
        let as_of = start.checked_sub_days(chrono::Days::new(back)).unwrap();
        let dates = occurrences_until(&template(frequency, start, None), as_of).unwrap();
        prop_assert!(dates.is_empty());
    }

    /// Every date falls in exactly one billing period, and consecutive periods
    /// tile the calendar with no gap or overlap.
    #[test]
    fn prop_billing_periods_tile_the_calendar(
        date in arb_date(),
        closing_day in 1..=31u32,
        due_day in 1..=31u32,
    ) {
        let days = BillingDays { closing_day, due_day };
        let period = period_containing(date, days).unwrap();
        prop_assert!(period.contains(date));
        prop_assert!(period.due_date > period.end);
        prop_assert_eq!(
            period.reference_month.clone(),
            period.due_date.format("%Y-%m").to_string()
        );

        let next = next_period(&period, days).unwrap();
        prop_assert_eq!(next.start, period.end.succ_opt().unwrap());
        prop_assert!(next.end >= next.start);
        prop_assert!(!next.contains(period.end));
    }
}
