//! Overnight shift correction and worked-hours calculation.
//!
//! A punch whose clock-in time of day is later than its clock-out time of day
//! crossed midnight, so its clock-out moves forward by one day. Clock-outs
//! that already lie on the next day (imputed `1 days 08:00:00`, say) are left
//! alone so a shift is never pushed forward twice.

use chrono::Duration;
use rust_decimal::Decimal;

use crate::audit::{AuditLog, NEGATIVE_SPAN};
use crate::models::{TimedPunch, WorkedPunch, duration_hours, one_day, time_of_day};

const STAGE: &str = "shift_adjust";

/// The result of shift adjustment.
#[derive(Debug, Clone)]
pub struct ShiftAdjustmentResult {
    /// Punches with final clock values and hours worked, in input order.
    pub punches: Vec<WorkedPunch>,
    /// Number of clock-outs moved to the next day.
    pub adjusted: usize,
    /// Number of punches without hours because a clock value is unknown.
    pub without_hours: usize,
}

/// Returns true if the punch crossed midnight and its clock-out still needs
/// the 24-hour correction.
///
/// # Examples
///
/// ```
/// use branch_salary_engine::transform::crosses_midnight;
/// use chrono::Duration;
///
/// assert!(crosses_midnight(Duration::hours(22), Duration::hours(6)));
/// assert!(!crosses_midnight(Duration::hours(14), Duration::hours(32)));
/// assert!(!crosses_midnight(Duration::hours(9), Duration::hours(17)));
/// ```
pub fn crosses_midnight(clock_in: Duration, clock_out: Duration) -> bool {
    clock_out < one_day() && time_of_day(clock_in) > time_of_day(clock_out)
}

/// Corrects overnight clock-outs and computes hours worked per punch.
///
/// # Examples
///
/// ```
/// use branch_salary_engine::audit::AuditLog;
/// use branch_salary_engine::models::TimedPunch;
/// use branch_salary_engine::transform::adjust_shifts;
/// use chrono::{Duration, NaiveDate};
/// use rust_decimal::Decimal;
///
/// let punch = TimedPunch {
///     punch_id: "t1".to_string(),
///     employee_id: "E1".to_string(),
///     date: NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
///     clock_in: Some(Duration::hours(22)),
///     clock_out: Some(Duration::hours(6)),
/// };
///
/// let mut log = AuditLog::default();
/// let result = adjust_shifts(vec![punch], &mut log);
/// assert_eq!(result.punches[0].hours_worked, Some(Decimal::new(8, 0)));
/// assert_eq!(result.adjusted, 1);
/// ```
pub fn adjust_shifts(punches: Vec<TimedPunch>, log: &mut AuditLog) -> ShiftAdjustmentResult {
    let input_count = punches.len();
    let mut adjusted = 0;
    let mut without_hours = 0;
    let mut worked = Vec::with_capacity(input_count);

    for punch in punches {
        let mut clock_out = punch.clock_out;

        let hours_worked = match (punch.clock_in, clock_out) {
            (Some(clock_in), Some(out)) => {
                let out = if crosses_midnight(clock_in, out) {
                    adjusted += 1;
                    out + one_day()
                } else {
                    out
                };
                clock_out = Some(out);

                let span = out - clock_in;
                if span < Duration::zero() {
                    log.warn(
                        NEGATIVE_SPAN,
                        "high",
                        format!(
                            "Punch {} ends before it starts after overnight correction; hours left null",
                            punch.punch_id
                        ),
                    );
                    without_hours += 1;
                    None
                } else {
                    Some(duration_hours(span))
                }
            }
            _ => {
                without_hours += 1;
                None
            }
        };

        worked.push(WorkedPunch {
            punch_id: punch.punch_id,
            employee_id: punch.employee_id,
            date: punch.date,
            clock_in: punch.clock_in,
            clock_out,
            hours_worked,
        });
    }

    let total_hours: Decimal = worked.iter().filter_map(|p| p.hours_worked).sum();

    log.step(
        STAGE,
        "overnight_adjustment",
        "Overnight Shift Adjustment",
        serde_json::json!({ "punches": input_count }),
        serde_json::json!({
            "adjusted": adjusted,
            "without_hours": without_hours,
            "total_hours": total_hours.normalize().to_string()
        }),
        if adjusted > 0 {
            format!(
                "Moved clock-out to the next day for {} punch(es) where clock-in > clock-out",
                adjusted
            )
        } else {
            "No clock-out times needed adjustment".to_string()
        },
    );

    ShiftAdjustmentResult {
        punches: worked,
        adjusted,
        without_hours,
    }
}
